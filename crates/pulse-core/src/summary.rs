//! # Summary Cards
//!
//! Window totals (orders, revenue, units, average order value) and the
//! current-vs-previous cards built from them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::ranking::{compare, Comparison};
use crate::types::{OrderRecord, PeriodWindow};

/// Scalar totals for one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PeriodTotals {
    pub order_count: i64,
    pub gross_sales: Money,
    pub units: i64,
    pub average_order_value: Money,
}

impl PeriodTotals {
    /// Totals over the orders that fall inside `window`.
    pub fn from_orders(orders: &[OrderRecord], window: &PeriodWindow) -> Self {
        let mut totals = PeriodTotals::default();
        for order in orders.iter().filter(|o| window.contains(o.created_at)) {
            totals.order_count += 1;
            totals.gross_sales += order.total_amount;
            totals.units += order.units();
        }
        totals.average_order_value = totals.gross_sales.divide_rounded(totals.order_count);
        totals
    }
}

/// One metric card: values for both windows and their comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MetricCard {
    pub label: String,
    pub current: i64,
    pub previous: i64,
    pub comparison: Comparison,
}

impl MetricCard {
    pub fn new(label: &str, current: i64, previous: i64) -> Self {
        MetricCard {
            label: label.to_string(),
            current,
            previous,
            comparison: compare(current, previous),
        }
    }
}

/// The dashboard's headline cards for a period.
///
/// Monetary cards carry cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SummaryCards {
    pub period_label: String,
    pub current: PeriodTotals,
    pub previous: PeriodTotals,
    pub orders: MetricCard,
    pub revenue: MetricCard,
    pub units: MetricCard,
    pub average_order_value: MetricCard,
}

impl SummaryCards {
    pub fn build(period_label: impl Into<String>, current: PeriodTotals, previous: PeriodTotals) -> Self {
        SummaryCards {
            period_label: period_label.into(),
            orders: MetricCard::new("Orders", current.order_count, previous.order_count),
            revenue: MetricCard::new("Revenue", current.gross_sales.cents(), previous.gross_sales.cents()),
            units: MetricCard::new("Units", current.units, previous.units),
            average_order_value: MetricCard::new(
                "Average Order Value",
                current.average_order_value.cents(),
                previous.average_order_value.cents(),
            ),
            current,
            previous,
        }
    }
}
