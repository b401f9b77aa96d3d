//! # Reorder Recommendations
//!
//! Turns an [`InventoryStatus`] into a production order suggestion.
//!
//! ```text
//! lead time  = production weeks + freight (air days rounded up to weeks | sea weeks)
//! target     = ceil(weekly velocity × (lead time + safety buffer))
//! quantity   = max(0, target - effective on-hand)
//! order now  = weeks of cover < reorder trigger
//! order by   = projected stockout - lead time
//! ```

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{FreightMode, InventoryStatus};
use crate::WEEKS_PER_MONTH;

/// Supplier lead times and buffers, in weeks unless named otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReorderPolicy {
    pub production_weeks: u32,
    pub air_freight_days: u32,
    pub sea_freight_weeks: u32,
    pub safety_buffer_weeks: u32,
    pub reorder_trigger_weeks: f64,
}

impl Default for ReorderPolicy {
    fn default() -> Self {
        ReorderPolicy {
            production_weeks: 12,
            air_freight_days: 7,
            sea_freight_weeks: 6,
            safety_buffer_weeks: 4,
            reorder_trigger_weeks: 14.0,
        }
    }
}

impl ReorderPolicy {
    /// Production plus freight, in whole weeks.
    pub fn lead_time_weeks(&self, freight: FreightMode) -> u32 {
        let freight_weeks = match freight {
            FreightMode::Air => self.air_freight_days.div_ceil(7),
            FreightMode::Sea => self.sea_freight_weeks,
        };
        self.production_weeks + freight_weeks
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReorderRecommendation {
    pub sku: String,
    pub freight_mode: FreightMode,
    pub lead_time_weeks: u32,
    pub weekly_velocity: f64,
    pub recommended_quantity: i64,
    pub order_now: bool,
    /// Last day to place the order and still land before stockout.
    #[ts(as = "Option<String>")]
    pub order_by: Option<NaiveDate>,
}

pub fn recommend_reorder(status: &InventoryStatus, freight: FreightMode, policy: &ReorderPolicy) -> ReorderRecommendation {
    let lead_time_weeks = policy.lead_time_weeks(freight);
    let weekly_velocity = status.monthly_velocity / WEEKS_PER_MONTH;

    let horizon_weeks = (lead_time_weeks + policy.safety_buffer_weeks) as f64;
    let target = (weekly_velocity * horizon_weeks).ceil() as i64;
    let recommended_quantity = (target - status.effective_on_hand).max(0);

    ReorderRecommendation {
        sku: status.sku.clone(),
        freight_mode: freight,
        lead_time_weeks,
        weekly_velocity,
        recommended_quantity,
        order_now: status.weeks_of_cover.is_below(policy.reorder_trigger_weeks),
        order_by: status
            .projected_stockout_date
            .map(|stockout| stockout - Duration::weeks(lead_time_weeks as i64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{project_cover, StockThresholds};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
    }

    #[test]
    fn test_lead_times() {
        let policy = ReorderPolicy::default();
        assert_eq!(policy.lead_time_weeks(FreightMode::Air), 13);
        assert_eq!(policy.lead_time_weeks(FreightMode::Sea), 18);

        let slow_air = ReorderPolicy { air_freight_days: 10, ..policy };
        assert_eq!(slow_air.lead_time_weeks(FreightMode::Air), 14);
    }

    #[test]
    fn test_recommendation_for_fast_seller() {
        // 400/month => 100/week; 8 weeks of cover
        let status = project_cover("A", 800, 400.0, &[], today(), &StockThresholds::default());
        let rec = recommend_reorder(&status, FreightMode::Sea, &ReorderPolicy::default());

        assert_eq!(rec.lead_time_weeks, 18);
        assert_eq!(rec.recommended_quantity, 100 * 22 - 800);
        assert!(rec.order_now);
        assert_eq!(rec.order_by, Some(today() + Duration::weeks(8) - Duration::weeks(18)));
    }

    #[test]
    fn test_idle_sku_needs_nothing() {
        let status = project_cover("A", 50, 0.0, &[], today(), &StockThresholds::default());
        let rec = recommend_reorder(&status, FreightMode::Air, &ReorderPolicy::default());
        assert_eq!(rec.recommended_quantity, 0);
        assert!(!rec.order_now);
        assert_eq!(rec.order_by, None);
    }
}
