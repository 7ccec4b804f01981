use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const WIRE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Expiry date must be in the format yyyy-MM-dd (e.g., 2024-12-31)")]
pub struct InvalidExpiryDate;

/// Calendar date a product expires on, carried on the wire as `yyyy-MM-dd`.
///
/// Parsing is strict: exactly four year digits, two month digits and two day
/// digits. A parsed value formats back to the identical literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpiryDate(NaiveDate);

impl ExpiryDate {
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for ExpiryDate {
    type Err = InvalidExpiryDate;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let well_shaped = trimmed.len() == 10
            && trimmed.bytes().enumerate().all(|(index, byte)| match index {
                4 | 7 => byte == b'-',
                _ => byte.is_ascii_digit(),
            });
        if !well_shaped {
            return Err(InvalidExpiryDate);
        }
        NaiveDate::parse_from_str(trimmed, WIRE_FORMAT)
            .map(Self)
            .map_err(|_| InvalidExpiryDate)
    }
}

impl fmt::Display for ExpiryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(WIRE_FORMAT))
    }
}

impl Serialize for ExpiryDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ExpiryDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
