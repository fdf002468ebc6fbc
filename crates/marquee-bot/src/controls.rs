//! The ten rating buttons attached to a movie message.
//!
//! Each button carries its movie and value in the component custom id,
//! `rate:<movie_id>:<rating>`, so a press can be handled without any state
//! kept between interactions.

use marquee_core::{movie::MovieId, rating::Rating};

use crate::{Error, error::Result};

const PREFIX: &str = "rate";

/// Buttons per action row.
pub const ROW_WIDTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingButton {
  pub custom_id: String,
  pub label:     String,
}

/// A decoded button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingPress {
  pub movie_id: MovieId,
  pub rating:   Rating,
}

pub fn custom_id(movie_id: MovieId, rating: Rating) -> String {
  format!("{PREFIX}:{}:{rating}", movie_id.0)
}

/// `Ok(None)` for components that aren't rating buttons.
pub fn parse_custom_id(id: &str) -> Result<Option<RatingPress>> {
  let mut parts = id.split(':');
  if parts.next() != Some(PREFIX) {
    return Ok(None);
  }
  let (Some(movie), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
    return Err(Error::MalformedControl(id.to_owned()));
  };
  let movie_id = movie.parse::<MovieId>()?;
  let value: i64 = value
    .parse()
    .map_err(|_| Error::MalformedControl(id.to_owned()))?;
  let rating = Rating::try_from(value)?;
  Ok(Some(RatingPress { movie_id, rating }))
}

/// Half a star per point: one `⭐` for every two, `.5` for an odd remainder.
pub fn star_label(rating: Rating) -> String {
  let value = rating.get();
  let mut label = "⭐".repeat(usize::from(value / 2));
  if value % 2 != 0 {
    label.push_str(".5");
  }
  label
}

/// The buttons for `movie_id`, one row per [`ROW_WIDTH`] ratings.
pub fn rating_rows(movie_id: MovieId) -> Vec<Vec<RatingButton>> {
  let buttons: Vec<RatingButton> = Rating::all()
    .map(|rating| RatingButton {
      custom_id: custom_id(movie_id, rating),
      label:     star_label(rating),
    })
    .collect();
  buttons.chunks(ROW_WIDTH).map(<[RatingButton]>::to_vec).collect()
}
