//! Timestamp and duration literals.
//!
//! Date predicates (`before:`, `after:`, `since:`, `until:`) are written in a
//! single canonical UTC form, `yyyy-MM-dd HH:mm:ss.SSS`, described once and
//! used for both writing and reading.

use std::fmt;
use std::str::FromStr;

use time::format_description::BorrowedFormatItem;
use time::macros::{datetime, format_description};
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// The canonical literal, read and written in UTC.
const CANONICAL: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

/// Instants outside four-digit years are clamped to this range.
const EARLIEST: OffsetDateTime = datetime!(0000-01-01 00:00:00 UTC);
const LATEST: OffsetDateTime = datetime!(9999-12-31 23:59:59.999999999 UTC);

/// Formats `at` in the canonical UTC form (without surrounding quotes).
///
/// Sub-millisecond precision is truncated. Instants before year 0 or after
/// year 9999 are clamped to the first or last representable millisecond.
///
/// ```
/// use gerrit_filter::format_timestamp;
/// use time::macros::datetime;
///
/// let at = datetime!(2017-03-04 05:06:07.089 +02:00);
/// assert_eq!(format_timestamp(at), "2017-03-04 03:06:07.089");
/// ```
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let at = at.clamp(EARLIEST, LATEST).to_offset(UtcOffset::UTC);
    // Every clamped instant fits the description.
    at.format(CANONICAL).unwrap_or_default()
}

/// Parses a timestamp literal into a UTC instant.
///
/// Accepts the canonical form plus the variants seen in query strings written
/// by hand or by older clients:
/// - `yyyy-MM-dd HH:mm:ss.SSS` (canonical, UTC)
/// - `yyyy-MM-dd HH:mm:ss.SSS +hhmm` (explicit offset)
/// - `yyyy-MM-dd HH:mm:ss` (UTC)
/// - `yyyy-MM-dd` (midnight UTC)
pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();

    PrimitiveDateTime::parse(value, CANONICAL)
        .map(PrimitiveDateTime::assume_utc)
        .or_else(|_| {
            OffsetDateTime::parse(
                value,
                format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3] [offset_hour sign:mandatory][offset_minute]"
                ),
            )
            .ok()
            .filter(|at| (EARLIEST..=LATEST).contains(at))
            .map(|at| at.to_offset(UtcOffset::UTC))
            .ok_or(())
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(
                value,
                format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
            )
            .map(PrimitiveDateTime::assume_utc)
        })
        .or_else(|_| {
            Date::parse(value, format_description!("[year]-[month]-[day]"))
                .map(|date| date.midnight().assume_utc())
        })
        .ok()
}

/// Unit of an `age:` duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 7] = [
        TimeUnit::Seconds,
        TimeUnit::Minutes,
        TimeUnit::Hours,
        TimeUnit::Days,
        TimeUnit::Weeks,
        TimeUnit::Months,
        TimeUnit::Years,
    ];

    /// Canonical suffix written after the amount (`1d`, `3mon`).
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
            TimeUnit::Weeks => "w",
            TimeUnit::Months => "mon",
            TimeUnit::Years => "y",
        }
    }

    /// Every spelling the server accepts for this unit.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            TimeUnit::Seconds => &["s", "sec", "secs", "second", "seconds"],
            TimeUnit::Minutes => &["m", "min", "mins", "minute", "minutes"],
            TimeUnit::Hours => &["h", "hr", "hrs", "hour", "hours"],
            TimeUnit::Days => &["d", "day", "days"],
            TimeUnit::Weeks => &["w", "week", "weeks"],
            TimeUnit::Months => &["mon", "mons", "month", "months"],
            TimeUnit::Years => &["y", "year", "years"],
        }
    }

    /// Renders `amount` of this unit (`age:` argument).
    pub fn format(self, amount: u32) -> String {
        format!("{}{}", amount, self.suffix())
    }

    /// Parses an `age:` argument such as `3d` or `2weeks`.
    pub fn parse_duration(value: &str) -> Result<(TimeUnit, u32), String> {
        let split = value
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(value.len());
        let (digits, unit) = value.split_at(split);
        if digits.is_empty() {
            return Err(format!("age '{value}' must start with a number"));
        }
        let amount = digits
            .parse::<u32>()
            .map_err(|_| format!("age amount '{digits}' is out of range"))?;
        let unit = unit.parse::<TimeUnit>()?;
        Ok((unit, amount))
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        TimeUnit::ALL
            .into_iter()
            .find(|unit| unit.aliases().contains(&lower.as_str()))
            .ok_or_else(|| format!("unknown time unit '{s}'"))
    }
}
