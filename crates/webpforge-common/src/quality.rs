//! Encode quality newtype.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Lossy encode quality in the range 1-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// Baseline quality for derived artifacts and thumbnails.
    pub const ARTIFACT_DEFAULT: Quality = Quality(82);

    /// Quality used when re-encoding an unscaled source that thumbnails derive from.
    pub const SOURCE: Quality = Quality(92);

    /// Create a quality value, rejecting anything outside 1-100.
    pub fn new(value: u8) -> Result<Self> {
        if (1..=100).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::invalid_input(format!(
                "quality must be between 1 and 100, got {}",
                value
            )))
        }
    }

    /// The raw value.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Quality {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
