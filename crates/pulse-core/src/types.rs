//! # Domain Types
//!
//! Core data model shared by the aggregation engine, the store and the
//! dashboard service.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  INPUT (fetched, immutable)        OUTPUT (recomputed per query)        │
//! │  ┌─────────────────┐               ┌─────────────────┐                  │
//! │  │  OrderRecord    │──bucket──────►│  Bucket         │ (day/wk/mo/qtr)  │
//! │  │  id, createdAt  │               └─────────────────┘                  │
//! │  │  totalAmount    │──rank────────►┌─────────────────┐                  │
//! │  │  lineItems[]    │               │ VariantRanking  │                  │
//! │  └─────────────────┘               └─────────────────┘                  │
//! │  ┌─────────────────┐               ┌─────────────────┐                  │
//! │  │ InventoryLevel  │──project─────►│ InventoryStatus │                  │
//! │  │ SalesVelocity   │               │ weeksOfCover    │                  │
//! │  │ InboundOrder    │ (persisted)   │ StockStatus     │                  │
//! │  └─────────────────┘               └─────────────────┘                  │
//! │                                                                         │
//! │  PeriodWindow: [start, end] instants, comparison = preceding same span  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## SKU Identity
//! `sku` is the join key for every product-level aggregation and is treated
//! as an opaque string. Nothing in this crate parses it.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{deserialize_amount, Money};

// =============================================================================
// Order Records
// =============================================================================

/// One order as supplied by the order source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderRecord {
    /// Platform order id (opaque).
    pub id: String,

    /// When the order was placed.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Order total including everything the platform charges.
    #[serde(deserialize_with = "deserialize_amount")]
    pub total_amount: Money,

    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl OrderRecord {
    /// Total units across all line items.
    pub fn units(&self) -> i64 {
        self.line_items.iter().map(|item| item.quantity).sum()
    }

    /// Returns true if any line item carries the given SKU.
    pub fn contains_sku(&self, sku: &str) -> bool {
        self.line_items.iter().any(|item| item.sku == sku)
    }
}

/// A single line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    pub sku: String,
    pub quantity: i64,
    #[serde(default)]
    pub variant_title: String,
    #[serde(default)]
    pub product_title: String,
    /// Line total (quantity already applied).
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Money,
}

// =============================================================================
// Period Window
// =============================================================================

/// A time interval used to filter orders.
///
/// Current windows are closed, `[start, end]`. Comparison windows are
/// half-open, `[start, end)`, because their `end` is the current window's
/// `start` and an order on that instant belongs to the current period only.
///
/// ## Invariant
/// `start <= end`. Only the resolver in [`crate::period`] constructs windows
/// from tokens; `new` is for fixtures and explicit ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PeriodWindow {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
    pub label: String,
    #[serde(default)]
    pub end_exclusive: bool,
}

impl PeriodWindow {
    /// Creates a window, swapping the bounds if they arrive reversed.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, label: impl Into<String>) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        PeriodWindow {
            start,
            end,
            label: label.into(),
            end_exclusive: false,
        }
    }

    /// Length of the window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Containment check honouring `end_exclusive`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start
            && if self.end_exclusive {
                instant < self.end
            } else {
                instant <= self.end
            }
    }

    /// The immediately preceding window of identical length, open at its end.
    ///
    /// ```text
    ///   comparisonStart          start                end
    ///        [<---- same length ---->)[<---- window ---->]
    /// ```
    pub fn comparison_window(&self) -> PeriodWindow {
        let span = self.duration();
        PeriodWindow {
            start: self.start - span,
            end: self.start,
            label: format!("Previous {}", self.label),
            end_exclusive: true,
        }
    }
}

// =============================================================================
// Buckets
// =============================================================================

/// An aggregated sum of facts for one calendar interval.
///
/// `date` is the first day of the interval: the day itself, the ISO Monday,
/// the first of the month, or the first day of the quarter.
///
/// A day with no orders may be absent or present with all-zero fields;
/// the two are equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Bucket {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub units: i64,
    pub gross_sales: Money,
    pub order_count: i64,
}

/// A bucket at day granularity.
pub type DailyBucket = Bucket;

impl Bucket {
    /// An all-zero bucket for the given date.
    pub fn empty(date: NaiveDate) -> Self {
        Bucket {
            date,
            units: 0,
            gross_sales: Money::zero(),
            order_count: 0,
        }
    }

    /// Adds another bucket's facts into this one.
    pub fn absorb(&mut self, other: &Bucket) {
        self.units += other.units;
        self.gross_sales += other.gross_sales;
        self.order_count += other.order_count;
    }

    pub fn is_empty(&self) -> bool {
        self.units == 0 && self.gross_sales.is_zero() && self.order_count == 0
    }
}

/// Bucket size for rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
}

impl FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            "quarter" | "quarterly" => Ok(Granularity::Quarter),
            _ => Err(ValidationError::NotAllowed {
                field: "granularity".to_string(),
                allowed: vec![
                    "day".to_string(),
                    "week".to_string(),
                    "month".to_string(),
                    "quarter".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Rankings
// =============================================================================

/// Per-SKU sales totals over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VariantRanking {
    pub sku: String,
    pub product_title: String,
    pub variant_title: String,
    pub units_sold: i64,
    pub gross_sales: Money,
    /// Number of distinct orders containing the SKU.
    pub orders_count: i64,
}

// =============================================================================
// Inventory
// =============================================================================

/// On-hand snapshot for a SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryLevel {
    pub sku: String,
    pub on_hand: i64,
}

/// Average units sold per month for a SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesVelocity {
    pub sku: String,
    pub monthly_velocity: f64,
}

/// Weeks until stock runs out.
///
/// Zero velocity means stock never depletes; that is a distinct state, not a
/// very large number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum WeeksOfCover {
    Finite(f64),
    Unbounded,
}

impl WeeksOfCover {
    /// The finite number of weeks, if any.
    pub fn weeks(&self) -> Option<f64> {
        match self {
            WeeksOfCover::Finite(weeks) => Some(*weeks),
            WeeksOfCover::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, WeeksOfCover::Unbounded)
    }

    /// True if cover is strictly below `weeks`. Unbounded cover never is.
    pub fn is_below(&self, weeks: f64) -> bool {
        matches!(self, WeeksOfCover::Finite(w) if *w < weeks)
    }
}

/// Stock health classification derived from weeks of cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum StockStatus {
    Critical,
    Low,
    Adequate,
    Healthy,
}

impl StockStatus {
    /// True for statuses that need a reorder decision.
    pub fn is_at_risk(&self) -> bool {
        matches!(self, StockStatus::Critical | StockStatus::Low)
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StockStatus::Critical => "Critical",
            StockStatus::Low => "Low",
            StockStatus::Adequate => "Adequate",
            StockStatus::Healthy => "Healthy",
        };
        f.write_str(label)
    }
}

/// Projected inventory position for a SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryStatus {
    pub sku: String,
    pub on_hand: i64,
    /// On-hand plus inbound quantities that have not arrived yet.
    pub effective_on_hand: i64,
    pub monthly_velocity: f64,
    pub weeks_of_cover: WeeksOfCover,
    /// Absent when cover is unbounded.
    #[ts(as = "Option<String>")]
    pub projected_stockout_date: Option<NaiveDate>,
    pub status: StockStatus,
}

// =============================================================================
// Inbound Orders
// =============================================================================

/// How a production run is shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum FreightMode {
    Air,
    Sea,
}

impl FreightMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FreightMode::Air => "air",
            FreightMode::Sea => "sea",
        }
    }
}

impl fmt::Display for FreightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FreightMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "air" => Ok(FreightMode::Air),
            "sea" => Ok(FreightMode::Sea),
            _ => Err(ValidationError::NotAllowed {
                field: "freight_mode".to_string(),
                allowed: vec!["air".to_string(), "sea".to_string()],
            }),
        }
    }
}

/// Lifecycle of an inbound shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum InboundStatus {
    /// Ordered, not yet shipped.
    #[default]
    Pending,
    InTransit,
    /// Received into on-hand stock; no longer counted as inbound.
    Arrived,
    Cancelled,
}

impl InboundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InboundStatus::Pending => "pending",
            InboundStatus::InTransit => "in_transit",
            InboundStatus::Arrived => "arrived",
            InboundStatus::Cancelled => "cancelled",
        }
    }

    /// True while the quantity is still on its way.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, InboundStatus::Pending | InboundStatus::InTransit)
    }
}

impl fmt::Display for InboundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InboundStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(InboundStatus::Pending),
            "in_transit" | "in-transit" | "transit" => Ok(InboundStatus::InTransit),
            "arrived" | "received" => Ok(InboundStatus::Arrived),
            "cancelled" | "canceled" => Ok(InboundStatus::Cancelled),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec![
                    "pending".to_string(),
                    "in_transit".to_string(),
                    "arrived".to_string(),
                    "cancelled".to_string(),
                ],
            }),
        }
    }
}

/// A scheduled shipment of stock for a SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InboundOrder {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub sku: String,
    pub quantity: i64,
    pub freight_mode: FreightMode,
    #[ts(as = "String")]
    pub expected_arrival: NaiveDate,
    /// Deposit already paid to the manufacturer.
    pub deposit_paid: Money,
    pub status: InboundStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Manufacturer deposit owed per ordered unit (10 cents).
pub const DEFAULT_DEPOSIT_PER_UNIT: Money = Money::from_cents(10);

impl InboundOrder {
    /// True while this shipment still adds to effective on-hand.
    pub fn is_outstanding(&self) -> bool {
        self.status.is_outstanding()
    }

    /// Total deposit owed for the run.
    pub fn deposit_due(&self, per_unit: Money) -> Money {
        per_unit * self.quantity
    }

    /// Deposit still to pay. Never negative; an overpaid deposit owes nothing.
    pub fn deposit_remaining(&self, per_unit: Money) -> Money {
        let remaining = self.deposit_due(per_unit) - self.deposit_paid;
        if remaining.is_negative() {
            Money::zero()
        } else {
            remaining
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
