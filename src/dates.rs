use chrono::{Datelike, Months, NaiveDate};
use std::fmt;
use thiserror::Error;

pub const ISO_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("malformed date `{0}` (expected YYYY-MM-DD or D/M/YYYY)")]
    Malformed(String),

    #[error("date `{0}` is not a real calendar day")]
    OutOfRange(String),

    #[error("malformed tuition month `{0}` (expected M/YYYY)")]
    MalformedMonth(String),
}

/// Cut a time component off a date cell, e.g. `2024-01-01T17:00:00.000Z`.
pub fn clean_date(raw: &str) -> &str {
    let raw = raw.trim();
    let raw = raw.split('T').next().unwrap_or_default();
    raw.split(' ').next().unwrap_or_default()
}

fn parse_component<T: std::str::FromStr>(component: &str, input: &str) -> Result<T, DateError> {
    let component = component.trim();
    if component.is_empty() || !component.chars().all(|c| c.is_ascii_digit()) {
        return Err(DateError::Malformed(input.to_string()));
    }
    component
        .parse()
        .map_err(|_| DateError::Malformed(input.to_string()))
}

/// Parse either `YYYY-MM-DD` or `D/M/YYYY` (zero padding optional).
pub fn parse_date(input: &str) -> Result<NaiveDate, DateError> {
    let trimmed = input.trim();

    let (year, month, day) = if trimmed.contains('-') {
        let parts: Vec<&str> = trimmed.split('-').collect();
        if parts.len() != 3 {
            return Err(DateError::Malformed(input.to_string()));
        }
        (parts[0], parts[1], parts[2])
    } else if trimmed.contains('/') {
        let parts: Vec<&str> = trimmed.split('/').collect();
        if parts.len() != 3 {
            return Err(DateError::Malformed(input.to_string()));
        }
        (parts[2], parts[1], parts[0])
    } else {
        return Err(DateError::Malformed(input.to_string()));
    };

    let year: i32 = parse_component(year, input)?;
    let month: u32 = parse_component(month, input)?;
    let day: u32 = parse_component(day, input)?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| DateError::OutOfRange(input.to_string()))
}

/// Canonical `D/M/YYYY` form, the encoding of the attendance field.
/// Blank input normalizes to an empty string.
pub fn normalize(input: &str) -> Result<String, DateError> {
    if input.trim().is_empty() {
        return Ok(String::new());
    }
    parse_date(input).map(format_dmy)
}

pub fn format_dmy(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.day(), date.month(), date.year())
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// A calendar month, ordered chronologically. Tuition tokens decode to this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse a `M/YYYY` token. Zero-padded months are accepted.
    pub fn parse_token(token: &str) -> Result<Self, DateError> {
        let malformed = || DateError::MalformedMonth(token.to_string());
        let (month, year) = token.trim().split_once('/').ok_or_else(malformed)?;
        let month: u32 = parse_component(month, token).map_err(|_| malformed())?;
        let year: i32 = parse_component(year, token).map_err(|_| malformed())?;
        Self::new(year, month).ok_or_else(malformed)
    }

    /// Wire form: unpadded month, `9/2024`.
    pub fn token(&self) -> String {
        format!("{}/{}", self.month, self.year)
    }

    /// Display form: `T09/2024`.
    pub fn label(&self) -> String {
        format!("T{:02}/{}", self.month, self.year)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn days(&self) -> u32 {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .map(|last| last.day())
            .unwrap_or(31)
    }

    /// Every month from `self` up to and including `last`. Empty when `last` is earlier.
    pub fn through(self, last: MonthKey) -> impl Iterator<Item = MonthKey> {
        std::iter::successors(Some(self), |m| Some(m.next())).take_while(move |m| *m <= last)
    }

    /// Every month from `self` up to but excluding `end`.
    pub fn until(self, end: MonthKey) -> impl Iterator<Item = MonthKey> {
        std::iter::successors(Some(self), |m| Some(m.next())).take_while(move |m| *m < end)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
