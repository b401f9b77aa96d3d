//! # Ranking & Comparison Engine
//!
//! Top-N variant rankings for a window, and the single period-over-period
//! comparison used by every metric card.
//!
//! ## Comparison Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  raw       = current - previous                                        │
//! │  trend     = raw >= 0 ? Up : Down                                      │
//! │  pctChange = previous == 0 ? (current > 0 ? 100 : 0)                   │
//! │                            : round(raw / previous * 100)               │
//! │                                                                         │
//! │  compare(0, 0)   => Up,   0,   0                                       │
//! │  compare(10, 0)  => Up,   100, 10                                      │
//! │  compare(5, 10)  => Down, -50, -5                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `previous == 0` case is an approximation, not a real percentage.
//! Orders, revenue, units and AOV all go through [`compare`]; there is no
//! second formula anywhere.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{OrderRecord, PeriodWindow, VariantRanking};

// =============================================================================
// Top Variants
// =============================================================================

/// Groups line items inside `window` by SKU and returns the top `n` by units.
///
/// Ties keep discovery order (stable sort). Titles come from the first line
/// item seen for the SKU. `ordersCount` counts each order once per SKU.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use pulse_core::ranking::top_variants;
/// use pulse_core::types::PeriodWindow;
///
/// let window = PeriodWindow::new(
///     Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2025, 10, 31, 0, 0, 0).unwrap(),
///     "October",
/// );
/// assert!(top_variants(&[], &window, 10).is_empty());
/// ```
pub fn top_variants(orders: &[OrderRecord], window: &PeriodWindow, n: usize) -> Vec<VariantRanking> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rankings: Vec<VariantRanking> = Vec::new();

    for order in orders.iter().filter(|o| window.contains(o.created_at)) {
        let mut seen_in_order: Vec<usize> = Vec::new();

        for item in &order.line_items {
            let slot = *index.entry(item.sku.as_str()).or_insert_with(|| {
                rankings.push(VariantRanking {
                    sku: item.sku.clone(),
                    product_title: item.product_title.clone(),
                    variant_title: item.variant_title.clone(),
                    units_sold: 0,
                    gross_sales: Money::zero(),
                    orders_count: 0,
                });
                rankings.len() - 1
            });

            let entry = &mut rankings[slot];
            entry.units_sold += item.quantity;
            entry.gross_sales += item.amount;
            if !seen_in_order.contains(&slot) {
                entry.orders_count += 1;
                seen_in_order.push(slot);
            }
        }
    }

    // Vec::sort_by is stable
    rankings.sort_by(|a, b| b.units_sold.cmp(&a.units_sold));
    rankings.truncate(n);
    rankings
}

// =============================================================================
// Comparison
// =============================================================================

/// Direction of change. Zero change counts as up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Trend {
    Up,
    Down,
}

/// Current-vs-previous delta for one scalar metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Comparison {
    pub trend: Trend,
    pub pct_change: i64,
    pub raw: i64,
}

/// Compares two scalar values.
///
/// Monetary metrics pass their cents.
pub fn compare(current: i64, previous: i64) -> Comparison {
    let raw = current - previous;
    let trend = if raw >= 0 { Trend::Up } else { Trend::Down };

    let pct_change = if previous == 0 {
        if current > 0 {
            100
        } else {
            0
        }
    } else {
        let ratio = raw as f64 / previous as f64 * 100.0;
        (ratio + 0.5).floor() as i64
    };

    Comparison { trend, pct_change, raw }
}

/// [`compare`] for money amounts.
pub fn compare_money(current: Money, previous: Money) -> Comparison {
    compare(current.cents(), previous.cents())
}

// =============================================================================
// Unit Tests
// =============================================================================
