//! # Date-Range Resolver
//!
//! Turns a named period token plus "now" into a [`PeriodWindow`] and its
//! comparison window, with every boundary computed in the fixed business
//! timezone.
//!
//! ## Tokens
//! ```text
//! ┌──────────┬──────────────────────────────────┬────────────────────────┐
//! │ Token    │ Start (business tz)              │ End                    │
//! ├──────────┼──────────────────────────────────┼────────────────────────┤
//! │ daily    │ today 00:00                      │ now                    │
//! │ weekly   │ most recent Monday 00:00         │ now                    │
//! │ mtd      │ 1st of this month 00:00          │ now                    │
//! │ ytd      │ Jan 1st 00:00                    │ now                    │
//! │ all      │ now - 180 days                   │ now                    │
//! │ YYYY-MM  │ 1st of that month 00:00          │ last instant of month  │
//! └──────────┴──────────────────────────────────┴────────────────────────┘
//! ```
//!
//! The comparison window is always the preceding span of identical length
//! (see [`PeriodWindow::comparison_window`]). Callers never derive it
//! themselves.
//!
//! ## Usage
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use pulse_core::period::{DateRangeResolver, PeriodToken};
//!
//! let resolver = DateRangeResolver::from_name("Australia/Brisbane").unwrap();
//! let now = Utc.with_ymd_and_hms(2025, 10, 15, 2, 0, 0).unwrap();
//! let token: PeriodToken = "mtd".parse().unwrap();
//!
//! let windows = resolver.resolve(&token, now).unwrap();
//! assert_eq!(windows.current.end, now);
//! assert_eq!(windows.comparison.end, windows.current.start);
//! ```

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::PeriodWindow;
use crate::ALL_TIME_LOOKBACK_DAYS;

// =============================================================================
// Period Token
// =============================================================================

/// A named reporting period requested by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodToken {
    Daily,
    Weekly,
    MonthToDate,
    YearToDate,
    All,
    /// A full calendar month (`YYYY-MM`), not clipped to now.
    Month { year: i32, month: u32 },
}

impl PeriodToken {
    /// Human-readable label shown on dashboard cards.
    pub fn label(&self) -> String {
        match self {
            PeriodToken::Daily => "Today".to_string(),
            PeriodToken::Weekly => "This Week".to_string(),
            PeriodToken::MonthToDate => "Month to Date".to_string(),
            PeriodToken::YearToDate => "Year to Date".to_string(),
            PeriodToken::All => format!("All Time ({} days)", ALL_TIME_LOOKBACK_DAYS),
            PeriodToken::Month { year, month } => match NaiveDate::from_ymd_opt(*year, *month, 1) {
                Some(first) => first.format("%B %Y").to_string(),
                None => format!("{:04}-{:02}", year, month),
            },
        }
    }
}

impl fmt::Display for PeriodToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodToken::Daily => f.write_str("daily"),
            PeriodToken::Weekly => f.write_str("weekly"),
            PeriodToken::MonthToDate => f.write_str("mtd"),
            PeriodToken::YearToDate => f.write_str("ytd"),
            PeriodToken::All => f.write_str("all"),
            PeriodToken::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
        }
    }
}

impl FromStr for PeriodToken {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidPeriodToken(s.to_string());

        match s.trim().to_lowercase().as_str() {
            "daily" => return Ok(PeriodToken::Daily),
            "weekly" => return Ok(PeriodToken::Weekly),
            "mtd" => return Ok(PeriodToken::MonthToDate),
            "ytd" => return Ok(PeriodToken::YearToDate),
            "all" => return Ok(PeriodToken::All),
            _ => {}
        }

        // Strict YYYY-MM: four digit year, two digit month
        let key = s.trim();
        let (year, month) = key.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        if !year.chars().chain(month.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(PeriodToken::Month { year, month })
    }
}

// =============================================================================
// Resolved Windows
// =============================================================================

/// A current window and the same-length window immediately before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ResolvedWindows {
    pub current: PeriodWindow,
    pub comparison: PeriodWindow,
}

// =============================================================================
// Resolver
// =============================================================================

/// Computes period windows in a fixed business timezone.
///
/// The caller's local zone is irrelevant: two users in different zones asking
/// for `daily` at the same instant get the same window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeResolver {
    tz: Tz,
}

impl DateRangeResolver {
    pub fn new(tz: Tz) -> Self {
        DateRangeResolver { tz }
    }

    /// Creates a resolver from an IANA zone name.
    ///
    /// ## Errors
    /// `CoreError::UnknownTimezone` if the name is not a known zone.
    pub fn from_name(name: &str) -> CoreResult<Self> {
        let tz: Tz = name
            .trim()
            .parse()
            .map_err(|_| CoreError::UnknownTimezone(name.to_string()))?;
        Ok(DateRangeResolver { tz })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// The business-calendar date an instant falls on.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// First instant of a business-calendar date.
    pub fn start_of_day(&self, date: NaiveDate) -> CoreResult<DateTime<Utc>> {
        start_of_day(self.tz, date)
    }

    /// Resolves a token into its window.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use pulse_core::period::{DateRangeResolver, PeriodToken};
    ///
    /// let resolver = DateRangeResolver::from_name("UTC").unwrap();
    /// let now = Utc.with_ymd_and_hms(2025, 10, 15, 9, 30, 0).unwrap();
    /// let window = resolver.resolve_window(&PeriodToken::Daily, now).unwrap();
    /// assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 10, 15, 0, 0, 0).unwrap());
    /// assert_eq!(window.label, "Today");
    /// ```
    pub fn resolve_window(&self, token: &PeriodToken, now: DateTime<Utc>) -> CoreResult<PeriodWindow> {
        let today = self.local_date(now);
        let label = token.label();

        let (start, end) = match token {
            PeriodToken::Daily => (self.start_of_day(today)?, now),
            PeriodToken::Weekly => {
                let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                (self.start_of_day(monday)?, now)
            }
            PeriodToken::MonthToDate => (self.start_of_day(first_of_month(today.year(), today.month())?)?, now),
            PeriodToken::YearToDate => (self.start_of_day(first_of_month(today.year(), 1)?)?, now),
            PeriodToken::All => (now - Duration::days(ALL_TIME_LOOKBACK_DAYS), now),
            PeriodToken::Month { year, month } => {
                let first = first_of_month(*year, *month)?;
                let (next_year, next_month) = next_month(*year, *month);
                let next_first = first_of_month(next_year, next_month)?;
                (
                    self.start_of_day(first)?,
                    self.start_of_day(next_first)? - Duration::milliseconds(1),
                )
            }
        };

        Ok(PeriodWindow::new(start, end, label))
    }

    /// Parses a token string and resolves it.
    pub fn resolve_str(&self, token: &str, now: DateTime<Utc>) -> CoreResult<PeriodWindow> {
        let token: PeriodToken = token.parse()?;
        self.resolve_window(&token, now)
    }

    /// Resolves a token into the current window plus its comparison window.
    pub fn resolve(&self, token: &PeriodToken, now: DateTime<Utc>) -> CoreResult<ResolvedWindows> {
        let current = self.resolve_window(token, now)?;
        let comparison = current.comparison_window();
        Ok(ResolvedWindows { current, comparison })
    }
}

// =============================================================================
// Calendar Helpers
// =============================================================================

/// First instant of `date` in `tz`.
///
/// When local midnight does not exist (a DST gap at 00:00) the day starts at
/// the first hour that does.
pub fn start_of_day(tz: Tz, date: NaiveDate) -> CoreResult<DateTime<Utc>> {
    for hour in 0..24 {
        let naive = date
            .and_hms_opt(hour, 0, 0)
            .ok_or_else(|| CoreError::DateOutOfRange(format!("start of {}", date)))?;
        if let Some(local) = tz.from_local_datetime(&naive).earliest() {
            return Ok(local.with_timezone(&Utc));
        }
    }
    Err(CoreError::DateOutOfRange(format!("start of {}", date)))
}

pub(crate) fn first_of_month(year: i32, month: u32) -> CoreResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CoreError::DateOutOfRange(format!("{:04}-{:02}", year, month)))
}

pub(crate) fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Number of days in a calendar month.
pub fn days_in_month(year: i32, month: u32) -> CoreResult<i64> {
    let first = first_of_month(year, month)?;
    let (next_year, next_month) = next_month(year, month);
    let next_first = first_of_month(next_year, next_month)?;
    Ok((next_first - first).num_days())
}

// =============================================================================
// Unit Tests
// =============================================================================
