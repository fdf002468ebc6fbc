//! Message text for every reply the bot sends.

use marquee_core::movie::{MovieInfo, MovieSummary};

/// Discord's cap on message content length, in characters.
pub const MESSAGE_LIMIT: usize = 2000;

pub const CATALOG_MISS: &str = "Sorry, I couldn't find a matching movie.";
pub const STORE_MISS: &str = "That movie isn't in the database for this server yet.";
pub const EMPTY_LEADERBOARD: &str = "No movies have been added yet.";
pub const GUILD_ONLY: &str = "This command only works in a server.";
pub const FAILURE: &str = "Something went wrong, please try again later.";

/// The message a newly started movie is posted with.
pub fn announcement(info: &MovieInfo) -> String {
  let heading = match info.year {
    Some(year) => format!("{} ({year})", info.title),
    None => info.title.clone(),
  };
  format!("**{heading}**\n{}", info.movie_id.catalog_url())
}

fn ratings_count(n: u64) -> String {
  if n == 1 { "1 rating".to_owned() } else { format!("{n} ratings") }
}

fn aggregate(summary: &MovieSummary) -> String {
  match summary.avg_rating {
    Some(avg) => format!("{avg:.2}⭐ ({})", ratings_count(summary.total_ratings)),
    None => "no ratings yet".to_owned(),
  }
}

pub fn movie_summary(summary: &MovieSummary) -> String {
  let record = &summary.record;
  let mut out = format!(
    "**{}**\n{}\nAverage: {}",
    record.display_title(),
    record.movie_id.catalog_url(),
    aggregate(summary),
  );
  if let Some(at) = record.registered_at {
    out.push_str(&format!("\nTracked since {}", at.format("%Y-%m-%d")));
  }
  out
}

/// Numbered leaderboard lines. Stops early rather than exceed
/// [`MESSAGE_LIMIT`].
pub fn leaderboard(entries: &[MovieSummary]) -> String {
  if entries.is_empty() {
    return EMPTY_LEADERBOARD.to_owned();
  }
  let mut out = String::from("**Top movies**");
  for (rank, entry) in entries.iter().enumerate() {
    let line = format!(
      "\n{}. **{}** — {}",
      rank + 1,
      entry.record.display_title(),
      aggregate(entry)
    );
    if out.chars().count() + line.chars().count() > MESSAGE_LIMIT {
      break;
    }
    out.push_str(&line);
  }
  out
}

pub fn rated(value: u8) -> String { format!("You rated this movie {value}⭐") }
