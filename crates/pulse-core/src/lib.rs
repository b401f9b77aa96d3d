//! # pulse-core: Pure Aggregation Engine for Storefront Pulse
//!
//! This crate turns raw order records into the numbers the sales dashboard
//! shows. Everything here is a pure function over in-memory data.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Pulse Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Presentation layer (external)                    │   │
//! │  │     Summary cards ─ Trend charts ─ Rankings ─ Reorder table     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        pulse-service (order source, dashboard queries)          │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────────────┐  ┌────▼──────────────────┐   │
//! │  │      ★ pulse-core (THIS CRATE) ★     │  │ pulse-store (SQLite)  │   │
//! │  │                                      │  │ inbound shipments     │   │
//! │  │  period ─► timeseries ─► ranking     │  └───────────────────────┘   │
//! │  │              │            summary    │                              │
//! │  │              ▼                       │                              │
//! │  │   inventory ─► reorder   forecast    │                              │
//! │  │   redistribute                       │                              │
//! │  │                                      │                              │
//! │  │  NO I/O • NO DATABASE • NO NETWORK   │                              │
//! │  └──────────────────────────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Order records, buckets, windows, inventory and inbound types
//! - [`money`] - Integer cents
//! - [`error`] - Domain error types
//! - [`validation`] - Record validation and quarantine
//! - [`period`] - Period tokens and the date-range resolver
//! - [`timeseries`] - Daily bucketing and rollups
//! - [`ranking`] - Top variants and period comparison
//! - [`summary`] - Headline metric cards
//! - [`inventory`] - Weeks of cover and stock status
//! - [`reorder`] - Production reorder suggestions
//! - [`redistribute`] - Exact-sum proportional scaling
//! - [`forecast`] - Next-month moving average
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same orders and window in, same output out
//! 2. **One Timezone**: every calendar boundary uses the business timezone
//! 3. **Sentinels, not Errors**: zero denominators resolve to defined values
//! 4. **Ascending Output**: every series is sorted by date
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use pulse_core::period::{DateRangeResolver, PeriodToken};
//! use pulse_core::ranking::compare;
//! use pulse_core::summary::PeriodTotals;
//!
//! let resolver = DateRangeResolver::from_name("Australia/Brisbane").unwrap();
//! let now = Utc.with_ymd_and_hms(2025, 10, 15, 2, 0, 0).unwrap();
//! let windows = resolver.resolve(&PeriodToken::Weekly, now).unwrap();
//!
//! let current = PeriodTotals::from_orders(&[], &windows.current);
//! let previous = PeriodTotals::from_orders(&[], &windows.comparison);
//! assert_eq!(compare(current.order_count, previous.order_count).pct_change, 0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod forecast;
pub mod inventory;
pub mod money;
pub mod period;
pub mod ranking;
pub mod redistribute;
pub mod reorder;
pub mod summary;
pub mod timeseries;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use period::{DateRangeResolver, PeriodToken, ResolvedWindows};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default length of a top-variants list.
pub const DEFAULT_TOP_N: usize = 10;

/// Records per page requested from the order source (the platform's cap).
pub const DEFAULT_PAGE_SIZE: u32 = 250;

/// How far back the `all` period reaches.
pub const ALL_TIME_LOOKBACK_DAYS: i64 = 180;

/// Weeks per month used for both velocity and weeks-of-cover.
///
/// `weeksOfCover = onHand / monthlyVelocity × 4`
pub const WEEKS_PER_MONTH: f64 = 4.0;
