//! Timestamp display helpers.
//!
//! Pure functions of their inputs: the current time is always passed in, and
//! absolute formats render in the formatter's fixed UTC offset.

mod locale;

pub use locale::Locale;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, Utc};

use crate::error::FormatError;

const MS_PER_DAY: i64 = 86_400_000;
const EDIT_GAP_MS: i64 = 60_000;

/// Primary and optional secondary label for a note's timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeDisplay {
    pub primary: String,
    pub secondary: Option<String>,
}

/// Formats server timestamps for one locale and UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFormatter {
    locale: Locale,
    offset: FixedOffset,
}

impl TimeFormatter {
    /// Formatter in the machine's current local offset.
    pub fn new(locale: Locale) -> Self {
        Self::with_offset(locale, Local::now().offset().fix())
    }

    pub const fn with_offset(locale: Locale, offset: FixedOffset) -> Self {
        Self { locale, offset }
    }

    /// Bucketed age of `timestamp`: today, yesterday, days, weeks, months, years.
    ///
    /// Days are whole elapsed 24-hour periods; timestamps in the future read as
    /// today.
    pub fn relative_time(&self, timestamp: &str, now: DateTime<Utc>) -> Result<String, FormatError> {
        let then = parse_timestamp(timestamp)?;
        let elapsed_ms = (now - then).num_milliseconds();
        let days = elapsed_ms.div_euclid(MS_PER_DAY).max(0);
        Ok(self.locale.relative_days(days))
    }

    pub fn date(&self, timestamp: &str) -> Result<String, FormatError> {
        let value = parse_timestamp(timestamp)?.with_timezone(&self.offset);
        Ok(self.locale.date(&value))
    }

    pub fn date_time(&self, timestamp: &str) -> Result<String, FormatError> {
        let value = parse_timestamp(timestamp)?.with_timezone(&self.offset);
        Ok(self.locale.date_time(&value))
    }

    /// Shows the update age when the note was edited more than a minute after
    /// creation, with the creation date as secondary text.
    pub fn display_text(
        &self,
        created_at: &str,
        updated_at: &str,
        now: DateTime<Utc>,
    ) -> Result<TimeDisplay, FormatError> {
        let created = parse_timestamp(created_at)?;
        let updated = parse_timestamp(updated_at)?;
        let gap_ms = (updated - created).num_milliseconds().abs();

        if gap_ms > EDIT_GAP_MS {
            Ok(TimeDisplay {
                primary: self.relative_time(updated_at, now)?,
                secondary: Some(format!(
                    "{}{}",
                    self.locale.created_prefix(),
                    self.date(created_at)?
                )),
            })
        } else {
            Ok(TimeDisplay {
                primary: self.relative_time(created_at, now)?,
                secondary: None,
            })
        }
    }
}

impl Default for TimeFormatter {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

/// Parses an RFC 3339 timestamp. Values without an offset are read as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, FormatError> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(FormatError::InvalidTimestamp(value.to_string()))
}

/// [`TimeFormatter::relative_time`] in the default locale, against the clock.
pub fn format_relative_time(timestamp: &str) -> Result<String, FormatError> {
    TimeFormatter::default().relative_time(timestamp, Utc::now())
}

pub fn format_date(timestamp: &str) -> Result<String, FormatError> {
    TimeFormatter::default().date(timestamp)
}

pub fn format_date_time(timestamp: &str) -> Result<String, FormatError> {
    TimeFormatter::default().date_time(timestamp)
}

pub fn time_display_text(created_at: &str, updated_at: &str) -> Result<TimeDisplay, FormatError> {
    TimeFormatter::default().display_text(created_at, updated_at, Utc::now())
}
