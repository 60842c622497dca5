use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a scheduled screening, as issued by the reservation service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowtimeId(String);

impl ShowtimeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShowtimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seat position in an auditorium: a row label (`A`, `B`, ... `AA`) and a
/// 1-based column. Text and wire form is the row followed by the column, e.g. `C7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatId {
    row: String,
    column: u16,
}

impl SeatId {
    pub fn new(row: &str, column: u16) -> Result<Self, SeatIdError> {
        if row.is_empty() || !row.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(SeatIdError::InvalidRow(row.to_string()));
        }
        if column == 0 {
            return Err(SeatIdError::InvalidColumn(row.to_string()));
        }
        Ok(Self { row: row.to_string(), column })
    }

    pub fn row(&self) -> &str {
        &self.row
    }

    pub fn column(&self) -> u16 {
        self.column
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.column)
    }
}

impl FromStr for SeatId {
    type Err = SeatIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(|| SeatIdError::InvalidColumn(s.to_string()))?;
        let (row, column) = s.split_at(split);
        let column: u16 = column
            .parse()
            .map_err(|_| SeatIdError::InvalidColumn(s.to_string()))?;
        Self::new(&row.to_ascii_uppercase(), column)
    }
}

impl TryFrom<String> for SeatId {
    type Error = SeatIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeatId> for String {
    fn from(value: SeatId) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatIdError {
    #[error("Invalid seat row: {0:?}")]
    InvalidRow(String),

    #[error("Invalid seat column in {0:?}")]
    InvalidColumn(String),
}
