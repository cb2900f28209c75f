use serde::{Deserialize, Serialize};
use std::fmt;

/// Duration class of a pass request.
///
/// Short-term passes cover a single day; long-term passes cover a period and
/// always require first-stage review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "duration_class", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DurationClass {
    ShortTerm,
    LongTerm,
}

impl fmt::Display for DurationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationClass::ShortTerm => write!(f, "SHORT_TERM"),
            DurationClass::LongTerm => write!(f, "LONG_TERM"),
        }
    }
}

/// Nationality class of a visitor entry. Foreign visitors always route to
/// first-stage review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "nationality_class", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NationalityClass {
    Local,
    Foreign,
}

impl fmt::Display for NationalityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NationalityClass::Local => write!(f, "LOCAL"),
            NationalityClass::Foreign => write!(f, "FOREIGN"),
        }
    }
}
