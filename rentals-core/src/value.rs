//! Typed cell values stored in a [`Table`](crate::Table).

use chrono::NaiveDateTime;
use std::fmt;

/// A single table cell.
///
/// Numeric columns hold [`Value::Number`], converted date columns hold
/// [`Value::Timestamp`], and every other column keeps its raw text. Empty
/// cells and values that failed conversion are [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing or unparseable value.
    Null,
    /// Finite decimal number.
    Number(f64),
    /// Text kept verbatim from the source.
    Text(String),
    /// Date-time without a time zone.
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Return the number held by this cell, if any.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Return the text held by this cell, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Return the timestamp held by this cell, if any.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(timestamp) => Some(*timestamp),
            _ => None,
        }
    }

    /// Report whether the cell is [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Classify the cell.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Number(_) => ValueKind::Number,
            Self::Text(_) => ValueKind::Text,
            Self::Timestamp(_) => ValueKind::Timestamp,
        }
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(timestamp: NaiveDateTime) -> Self {
        Self::Timestamp(timestamp)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Self>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Discriminant of a [`Value`], used in column summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    /// [`Value::Null`].
    Null,
    /// [`Value::Number`].
    Number,
    /// [`Value::Text`].
    Text,
    /// [`Value::Timestamp`].
    Timestamp,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Null => "null",
            Self::Number => "number",
            Self::Text => "text",
            Self::Timestamp => "timestamp",
        };
        f.write_str(label)
    }
}
