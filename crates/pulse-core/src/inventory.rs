//! # Inventory Cover Projector
//!
//! Combines on-hand stock, trailing velocity and outstanding inbound
//! shipments into weeks of cover, a projected stockout date and a status.
//!
//! ## Projection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  effectiveOnHand = onHand + Σ inbound(sku, Pending | InTransit)        │
//! │                                                                         │
//! │  weeksOfCover    = velocity > 0 ? effectiveOnHand / velocity × 4       │
//! │                                 : Unbounded                            │
//! │                                                                         │
//! │  stockout        = today + floor(weeks × 7) days   (none if Unbounded) │
//! │                                                                         │
//! │  status          <2 Critical │ [2,4) Low │ [4,8) Adequate │ ≥8 Healthy │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::types::{InboundOrder, InventoryLevel, InventoryStatus, SalesVelocity, StockStatus, WeeksOfCover};
use crate::WEEKS_PER_MONTH;

/// Stockout dates further out than this are clamped (about a century).
const MAX_PROJECTION_DAYS: i64 = 36_500;

// =============================================================================
// Thresholds
// =============================================================================

/// Status boundaries in weeks of cover; each is the inclusive lower bound of
/// the next status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockThresholds {
    pub critical_below_weeks: f64,
    pub low_below_weeks: f64,
    pub adequate_below_weeks: f64,
}

impl Default for StockThresholds {
    fn default() -> Self {
        StockThresholds {
            critical_below_weeks: 2.0,
            low_below_weeks: 4.0,
            adequate_below_weeks: 8.0,
        }
    }
}

impl StockThresholds {
    pub fn classify(&self, cover: WeeksOfCover) -> StockStatus {
        match cover {
            WeeksOfCover::Unbounded => StockStatus::Healthy,
            WeeksOfCover::Finite(weeks) if weeks < self.critical_below_weeks => StockStatus::Critical,
            WeeksOfCover::Finite(weeks) if weeks < self.low_below_weeks => StockStatus::Low,
            WeeksOfCover::Finite(weeks) if weeks < self.adequate_below_weeks => StockStatus::Adequate,
            WeeksOfCover::Finite(_) => StockStatus::Healthy,
        }
    }

    /// True when the boundaries are strictly increasing and non-negative.
    pub fn is_ordered(&self) -> bool {
        self.critical_below_weeks >= 0.0
            && self.critical_below_weeks < self.low_below_weeks
            && self.low_below_weeks < self.adequate_below_weeks
    }
}

// =============================================================================
// Projection
// =============================================================================

/// Quantity still on its way for a SKU.
pub fn inbound_quantity(sku: &str, inbound: &[InboundOrder]) -> i64 {
    inbound
        .iter()
        .filter(|order| order.sku == sku && order.is_outstanding())
        .map(|order| order.quantity)
        .sum()
}

/// Weeks of cover for a quantity at a monthly velocity.
///
/// Zero, negative or NaN velocity means no depletion.
pub fn weeks_of_cover(quantity: i64, monthly_velocity: f64) -> WeeksOfCover {
    if monthly_velocity > 0.0 {
        WeeksOfCover::Finite(quantity as f64 / monthly_velocity * WEEKS_PER_MONTH)
    } else {
        WeeksOfCover::Unbounded
    }
}

/// Projects the inventory position of one SKU.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use pulse_core::inventory::{project_cover, StockThresholds};
/// use pulse_core::types::{StockStatus, WeeksOfCover};
///
/// let today = NaiveDate::from_ymd_opt(2025, 10, 15).unwrap();
/// let status = project_cover("102270", 1000, 500.0, &[], today, &StockThresholds::default());
///
/// assert_eq!(status.weeks_of_cover, WeeksOfCover::Finite(8.0));
/// assert_eq!(status.status, StockStatus::Healthy);
/// ```
pub fn project_cover(
    sku: &str,
    on_hand: i64,
    monthly_velocity: f64,
    inbound: &[InboundOrder],
    today: NaiveDate,
    thresholds: &StockThresholds,
) -> InventoryStatus {
    let effective_on_hand = on_hand + inbound_quantity(sku, inbound);
    let cover = weeks_of_cover(effective_on_hand, monthly_velocity);

    let projected_stockout_date = cover.weeks().map(|weeks| {
        let days = (weeks * 7.0).floor().clamp(0.0, MAX_PROJECTION_DAYS as f64) as i64;
        today + Duration::days(days)
    });

    InventoryStatus {
        sku: sku.to_string(),
        on_hand,
        effective_on_hand,
        monthly_velocity: if monthly_velocity > 0.0 { monthly_velocity } else { 0.0 },
        weeks_of_cover: cover,
        projected_stockout_date,
        status: thresholds.classify(cover),
    }
}

// =============================================================================
// Report
// =============================================================================

/// Every tracked SKU's status, most urgent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryReport {
    pub statuses: Vec<InventoryStatus>,
    pub tracked: usize,
    /// Critical or Low.
    pub at_risk: usize,
    pub healthy: usize,
}

/// Projects every SKU in `levels`. A SKU with no velocity entry is treated as
/// not selling.
pub fn build_inventory_report(
    levels: &[InventoryLevel],
    velocities: &[SalesVelocity],
    inbound: &[InboundOrder],
    today: NaiveDate,
    thresholds: &StockThresholds,
) -> InventoryReport {
    let velocity_by_sku: HashMap<&str, f64> = velocities
        .iter()
        .map(|v| (v.sku.as_str(), v.monthly_velocity))
        .collect();

    let mut statuses: Vec<InventoryStatus> = levels
        .iter()
        .map(|level| {
            let velocity = velocity_by_sku.get(level.sku.as_str()).copied().unwrap_or(0.0);
            project_cover(&level.sku, level.on_hand, velocity, inbound, today, thresholds)
        })
        .collect();

    statuses.sort_by(|a, b| a.status.cmp(&b.status).then_with(|| a.sku.cmp(&b.sku)));

    InventoryReport {
        tracked: statuses.len(),
        at_risk: statuses.iter().filter(|s| s.status.is_at_risk()).count(),
        healthy: statuses.iter().filter(|s| s.status == StockStatus::Healthy).count(),
        statuses,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{FreightMode, InboundStatus};
    use chrono::Utc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
    }

    fn inbound(sku: &str, quantity: i64, status: InboundStatus) -> InboundOrder {
        InboundOrder {
            id: format!("{}-{}", sku, quantity),
            sku: sku.to_string(),
            quantity,
            freight_mode: FreightMode::Sea,
            expected_arrival: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            deposit_paid: Money::zero(),
            status,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_eight_weeks_is_healthy() {
        let status = project_cover("A", 1000, 500.0, &[], today(), &StockThresholds::default());
        assert_eq!(status.weeks_of_cover, WeeksOfCover::Finite(8.0));
        assert_eq!(status.status, StockStatus::Healthy);
        assert_eq!(status.projected_stockout_date, NaiveDate::from_ymd_opt(2025, 12, 10));
    }

    #[test]
    fn test_zero_velocity_is_unbounded() {
        let status = project_cover("A", 100, 0.0, &[], today(), &StockThresholds::default());
        assert_eq!(status.weeks_of_cover, WeeksOfCover::Unbounded);
        assert_eq!(status.projected_stockout_date, None);
        assert_eq!(status.status, StockStatus::Healthy);

        let nan = project_cover("A", 100, f64::NAN, &[], today(), &StockThresholds::default());
        assert!(nan.weeks_of_cover.is_unbounded());
    }

    #[test]
    fn test_threshold_boundaries() {
        let t = StockThresholds::default();
        assert_eq!(t.classify(WeeksOfCover::Finite(1.99)), StockStatus::Critical);
        assert_eq!(t.classify(WeeksOfCover::Finite(2.0)), StockStatus::Low);
        assert_eq!(t.classify(WeeksOfCover::Finite(4.0)), StockStatus::Adequate);
        assert_eq!(t.classify(WeeksOfCover::Finite(7.99)), StockStatus::Adequate);
        assert_eq!(t.classify(WeeksOfCover::Finite(8.0)), StockStatus::Healthy);
        assert!(t.is_ordered());
    }

    #[test]
    fn test_only_outstanding_inbound_counts() {
        let shipments = vec![
            inbound("A", 300, InboundStatus::Pending),
            inbound("A", 200, InboundStatus::InTransit),
            inbound("A", 999, InboundStatus::Arrived),
            inbound("A", 999, InboundStatus::Cancelled),
            inbound("B", 999, InboundStatus::Pending),
        ];
        let status = project_cover("A", 500, 1000.0, &shipments, today(), &StockThresholds::default());
        assert_eq!(status.effective_on_hand, 1000);
        assert_eq!(status.on_hand, 500);
        assert_eq!(status.weeks_of_cover, WeeksOfCover::Finite(4.0));
        assert_eq!(status.status, StockStatus::Adequate);
    }

    #[test]
    fn test_oversold_stock_is_critical_today() {
        let status = project_cover("A", -20, 100.0, &[], today(), &StockThresholds::default());
        assert_eq!(status.status, StockStatus::Critical);
        assert_eq!(status.projected_stockout_date, Some(today()));
    }

    #[test]
    fn test_tiny_velocity_clamps_stockout() {
        let status = project_cover("A", 1_000_000, 0.0001, &[], today(), &StockThresholds::default());
        let date = status.projected_stockout_date.unwrap();
        assert_eq!(date, today() + Duration::days(MAX_PROJECTION_DAYS));
    }

    #[test]
    fn test_report_sorted_by_urgency() {
        let levels = vec![
            InventoryLevel { sku: "healthy".into(), on_hand: 1000 },
            InventoryLevel { sku: "critical".into(), on_hand: 10 },
            InventoryLevel { sku: "idle".into(), on_hand: 5 },
            InventoryLevel { sku: "low".into(), on_hand: 300 },
        ];
        let velocities = vec![
            SalesVelocity { sku: "healthy".into(), monthly_velocity: 100.0 },
            SalesVelocity { sku: "critical".into(), monthly_velocity: 100.0 },
            SalesVelocity { sku: "low".into(), monthly_velocity: 400.0 },
        ];
        let report = build_inventory_report(&levels, &velocities, &[], today(), &StockThresholds::default());

        let order: Vec<_> = report.statuses.iter().map(|s| s.sku.as_str()).collect();
        assert_eq!(order, vec!["critical", "low", "healthy", "idle"]);
        assert_eq!(report.tracked, 4);
        assert_eq!(report.at_risk, 2);
        assert_eq!(report.healthy, 2);
    }
}
