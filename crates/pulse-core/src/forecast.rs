//! # Next-Month Forecast
//!
//! A 3-month moving average over complete monthly buckets, graded by how
//! steady monthly order counts have been.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::Bucket;

/// Months averaged by the forecast.
pub const FORECAST_WINDOW_MONTHS: usize = 3;

/// Confidence grade from the coefficient of variation of monthly orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ForecastConfidence {
    High,
    Medium,
    Low,
}

impl ForecastConfidence {
    /// `High` below 0.15, `Medium` below 0.35, otherwise `Low`.
    pub fn from_variation(coefficient: f64) -> Self {
        if !coefficient.is_finite() {
            ForecastConfidence::Low
        } else if coefficient < 0.15 {
            ForecastConfidence::High
        } else if coefficient < 0.35 {
            ForecastConfidence::Medium
        } else {
            ForecastConfidence::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Forecast {
    /// Number of complete months the averages were taken over.
    pub based_on_months: usize,
    pub projected_orders: i64,
    pub projected_revenue: Money,
    pub projected_aov: Money,
    pub confidence: ForecastConfidence,
}

/// Forecasts next month from monthly buckets.
///
/// Buckets dated in the month containing `today` (or later) are incomplete
/// and skipped. Returns `None` when no complete month remains.
pub fn forecast_next_month(monthly: &[Bucket], today: NaiveDate) -> Option<Forecast> {
    let current_month = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?;

    let mut complete: Vec<&Bucket> = monthly.iter().filter(|b| b.date < current_month).collect();
    complete.sort_by_key(|b| b.date);
    let recent = &complete[complete.len().saturating_sub(FORECAST_WINDOW_MONTHS)..];
    if recent.is_empty() {
        return None;
    }

    let months = recent.len() as i64;
    let orders: Vec<f64> = recent.iter().map(|b| b.order_count as f64).collect();
    let mean = orders.iter().sum::<f64>() / orders.len() as f64;

    let projected_orders = mean.round() as i64;
    let projected_revenue = recent.iter().map(|b| b.gross_sales).sum::<Money>().divide_rounded(months);
    let projected_aov = projected_revenue.divide_rounded(projected_orders);

    // A single month says nothing about variability
    let confidence = if recent.len() < 2 || mean <= 0.0 {
        ForecastConfidence::Low
    } else {
        let variance = orders.iter().map(|o| (o - mean).powi(2)).sum::<f64>() / orders.len() as f64;
        ForecastConfidence::from_variation(variance.sqrt() / mean)
    };

    Some(Forecast {
        based_on_months: recent.len(),
        projected_orders,
        projected_revenue,
        projected_aov,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(y: i32, m: u32, orders: i64, revenue: i64) -> Bucket {
        Bucket {
            date: NaiveDate::from_ymd_opt(y, m, 1).unwrap(),
            units: orders,
            gross_sales: Money::from_cents(revenue),
            order_count: orders,
        }
    }

    #[test]
    fn test_moving_average_skips_current_month() {
        let buckets = vec![
            month(2025, 7, 9999, 1),
            month(2025, 8, 1000, 100_000),
            month(2025, 9, 1100, 110_000),
            month(2025, 10, 1200, 120_000),
            month(2025, 11, 50, 5_000),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 11, 10).unwrap();
        let forecast = forecast_next_month(&buckets, today).unwrap();

        assert_eq!(forecast.based_on_months, 3);
        assert_eq!(forecast.projected_orders, 1100);
        assert_eq!(forecast.projected_revenue.cents(), 110_000);
        assert_eq!(forecast.projected_aov.cents(), 100);
        assert_eq!(forecast.confidence, ForecastConfidence::High);
    }

    #[test]
    fn test_volatile_months_are_low_confidence() {
        let buckets = vec![month(2025, 8, 100, 1), month(2025, 9, 1000, 1), month(2025, 10, 300, 1)];
        let today = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        let forecast = forecast_next_month(&buckets, today).unwrap();
        assert_eq!(forecast.confidence, ForecastConfidence::Low);
    }

    #[test]
    fn test_not_enough_history() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        assert!(forecast_next_month(&[], today).is_none());
        assert!(forecast_next_month(&[month(2025, 11, 5, 5)], today).is_none());

        let single = forecast_next_month(&[month(2025, 10, 5, 500)], today).unwrap();
        assert_eq!(single.based_on_months, 1);
        assert_eq!(single.confidence, ForecastConfidence::Low);
    }

    #[test]
    fn test_confidence_grades() {
        assert_eq!(ForecastConfidence::from_variation(0.1), ForecastConfidence::High);
        assert_eq!(ForecastConfidence::from_variation(0.15), ForecastConfidence::Medium);
        assert_eq!(ForecastConfidence::from_variation(0.35), ForecastConfidence::Low);
    }
}
