//! The 1–10 star rating value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A validated rating. Only values in `MIN..=MAX` can be constructed, so any
/// `Rating` handed to a store is already in range.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 10;

  pub fn new(value: u8) -> Result<Self> {
    Self::try_from(i64::from(value))
  }

  pub fn get(self) -> u8 { self.0 }

  /// Every valid rating in ascending order.
  pub fn all() -> impl Iterator<Item = Rating> {
    (Self::MIN..=Self::MAX).map(Rating)
  }
}

impl TryFrom<i64> for Rating {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self> {
    if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
      Ok(Self(value as u8))
    } else {
      Err(Error::RatingOutOfRange(value))
    }
  }
}

impl From<Rating> for u8 {
  fn from(r: Rating) -> u8 { r.0 }
}

impl fmt::Display for Rating {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}
