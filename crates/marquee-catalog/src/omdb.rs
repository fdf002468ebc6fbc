//! [`OmdbClient`] — an OMDb-backed [`Catalog`].

use std::time::Duration;

use marquee_core::{
  catalog::Catalog,
  movie::{MovieId, MovieInfo},
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{Error, Result};

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_base_url() -> String { "https://www.omdbapi.com/".to_owned() }

fn default_timeout_secs() -> u64 { 10 }

/// Connection settings for the catalog, deserialised from the `[catalog]`
/// section of the bot config.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
  #[serde(default = "default_base_url")]
  pub base_url:     String,
  #[serde(default)]
  pub api_key:      String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      base_url:     default_base_url(),
      api_key:      String::new(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async HTTP client for the OMDb API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OmdbClient {
  client: reqwest::Client,
  config: CatalogConfig,
}

impl OmdbClient {
  pub fn new(config: CatalogConfig) -> Result<Self> {
    if config.api_key.trim().is_empty() {
      tracing::warn!("no catalog API key configured; lookups will be rejected by OMDb");
    }
    let client = reqwest::Client::builder()
      .user_agent(concat!("marquee/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  async fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
    let resp = self
      .client
      .get(&self.config.base_url)
      .query(&[("apikey", self.config.api_key.as_str())])
      .query(params)
      .send()
      .await?;

    // OMDb reports most failures as a JSON body, even on 401.
    let status = resp.status();
    match resp.json::<T>().await {
      Ok(body) => Ok(body),
      Err(_) if !status.is_success() => Err(Error::Status(status.as_u16())),
      Err(e) => Err(e.into()),
    }
  }
}

impl Catalog for OmdbClient {
  type Error = Error;

  async fn resolve_by_id(&self, id: MovieId) -> Result<Option<MovieInfo>> {
    let imdb_id = id.to_string();
    tracing::debug!(%id, "catalog resolve");
    let body: TitleResponse = self.get(&[("i", imdb_id.as_str())]).await?;
    decode_title(body)
  }

  async fn search_by_text(&self, query: &str) -> Result<Vec<MovieInfo>> {
    tracing::debug!(query, "catalog search");
    let body: SearchResponse = self.get(&[("s", query), ("type", "movie")]).await?;
    decode_search(body)
  }
}

// ─── Payloads ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TitleResponse {
  response: String,
  error:    Option<String>,
  title:    Option<String>,
  year:     Option<String>,
  #[serde(rename = "imdbID")]
  imdb_id:  Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResponse {
  response: String,
  error:    Option<String>,
  #[serde(default)]
  search:   Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchHit {
  title:   String,
  year:    Option<String>,
  #[serde(rename = "imdbID")]
  imdb_id: String,
}

/// `Err` for real failures, `Ok(false)` when OMDb merely found nothing.
fn check_response(response: &str, error: Option<&str>) -> Result<bool> {
  if response.eq_ignore_ascii_case("true") {
    return Ok(true);
  }
  let message = error.unwrap_or("unknown error");
  let lowered = message.to_ascii_lowercase();
  if lowered.contains("not found") || lowered.contains("incorrect imdb id") {
    Ok(false)
  } else {
    Err(Error::Api(message.to_owned()))
  }
}

fn decode_title(body: TitleResponse) -> Result<Option<MovieInfo>> {
  if !check_response(&body.response, body.error.as_deref())? {
    return Ok(None);
  }
  let (Some(title), Some(imdb_id)) = (body.title, body.imdb_id) else {
    return Err(Error::Api("title response without Title/imdbID".to_owned()));
  };
  let movie_id = imdb_id
    .parse::<MovieId>()
    .map_err(|e| Error::Api(e.to_string()))?;
  Ok(Some(MovieInfo { movie_id, title, year: body.year.as_deref().and_then(parse_year) }))
}

fn decode_search(body: SearchResponse) -> Result<Vec<MovieInfo>> {
  if !check_response(&body.response, body.error.as_deref())? {
    return Ok(vec![]);
  }
  Ok(
    body
      .search
      .into_iter()
      .filter_map(|hit| {
        let movie_id = hit.imdb_id.parse::<MovieId>().ok()?;
        Some(MovieInfo {
          movie_id,
          title: hit.title,
          year: hit.year.as_deref().and_then(parse_year),
        })
      })
      .collect(),
  )
}

/// OMDb years look like `1994`, `2011–2019` or `N/A`.
fn parse_year(s: &str) -> Option<i32> {
  let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
  if digits.len() == 4 { digits.parse().ok() } else { None }
}
