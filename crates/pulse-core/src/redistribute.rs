//! # Proportional Redistribution
//!
//! Scales per-SKU totals to a new target while keeping the sum exact.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. scaled_i   = round(value_i × target / Σ value)                     │
//! │  2. residual   = target - Σ scaled_i                                   │
//! │  3. residual goes to the largest-share entry                           │
//! │     (ties: first entry; a negative residual that would push it below   │
//! │      zero spills over to the next largest)                             │
//! │                                                                         │
//! │  Σ output == target, always.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Used for prorating month-level product totals into a sub-month window,
//! and for synthesizing monthly product mixes from a fixed profile. The
//! synthetic path perturbs the profile with a generator seeded from the month
//! key, so the same inputs always produce the same mix.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::CoreResult;
use crate::period::{days_in_month, first_of_month};
use crate::types::PeriodWindow;

// =============================================================================
// Apportioning
// =============================================================================

/// Splits `target` across `weights` so the parts sum exactly to `target`.
///
/// Negative and non-finite weights count as zero. When every weight is zero
/// the split is even. A negative target is treated as zero.
fn apportion(weights: &[f64], target: i64) -> Vec<i64> {
    if weights.is_empty() {
        return Vec::new();
    }

    let target = target.max(0);
    let mut weights: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
        .collect();
    let mut sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        weights.iter_mut().for_each(|w| *w = 1.0);
        sum = weights.len() as f64;
    }

    let mut parts: Vec<i64> = weights
        .iter()
        .map(|w| (w * target as f64 / sum).round() as i64)
        .collect();

    // Largest share first; stable so ties keep input order
    let mut by_share: Vec<usize> = (0..weights.len()).collect();
    by_share.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]));

    let residual = target - parts.iter().sum::<i64>();
    if residual >= 0 {
        parts[by_share[0]] += residual;
    } else {
        let mut owed = -residual;
        for idx in by_share {
            let take = parts[idx].min(owed);
            parts[idx] -= take;
            owed -= take;
            if owed == 0 {
                break;
            }
        }
    }

    parts
}

/// Rescales per-SKU totals so they sum exactly to `target`.
///
/// Empty input gives empty output. Ties for the largest share resolve to the
/// first SKU in key order.
///
/// ## Example
/// ```rust
/// use std::collections::BTreeMap;
/// use pulse_core::redistribute::redistribute;
///
/// let month = BTreeMap::from([
///     ("A".to_string(), 50),
///     ("B".to_string(), 30),
///     ("C".to_string(), 20),
/// ]);
/// let week = redistribute(&month, 33);
/// assert_eq!(week.values().sum::<i64>(), 33);
/// ```
pub fn redistribute(totals: &BTreeMap<String, i64>, target: i64) -> BTreeMap<String, i64> {
    let weights: Vec<f64> = totals.values().map(|v| *v as f64).collect();
    let parts = apportion(&weights, target);
    totals.keys().cloned().zip(parts).collect()
}

// =============================================================================
// Prorating
// =============================================================================

/// Scales a month's per-SKU totals down to the days of that month covered by
/// `window`, in the business timezone.
///
/// The prorated total is `round(Σ month × covered days / days in month)`.
pub fn prorate_month(
    month_totals: &BTreeMap<String, i64>,
    year: i32,
    month: u32,
    window: &PeriodWindow,
    tz: Tz,
) -> CoreResult<BTreeMap<String, i64>> {
    let month_days = days_in_month(year, month)?;
    let first = first_of_month(year, month)?;
    let last = first + chrono::Duration::days(month_days - 1);

    let local = |instant: DateTime<Utc>| -> NaiveDate { instant.with_timezone(&tz).date_naive() };
    let overlap_start = first.max(local(window.start));
    let overlap_end = last.min(local(window.end));
    let covered = ((overlap_end - overlap_start).num_days() + 1).max(0);

    let sum: i64 = month_totals.values().map(|v| (*v).max(0)).sum();
    let target = (2 * sum * covered + month_days) / (2 * month_days);

    Ok(redistribute(month_totals, target))
}

// =============================================================================
// Synthetic Monthly Mix
// =============================================================================

/// One SKU's base share of a distribution profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProfileShare {
    pub sku: String,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MixEntry {
    pub sku: String,
    pub units: i64,
}

/// Breaks a month's total units into a product mix following `profile`.
///
/// Each share is perturbed by a month-wide factor between ±2.5% and ±7.5%,
/// drawn from a generator seeded with `seed` and the month key. SKUs that end
/// up with zero units are dropped. Output keeps profile order.
pub fn synthesize_monthly_mix(profile: &[ProfileShare], year: i32, month: u32, total_units: i64, seed: u64) -> Vec<MixEntry> {
    let month_key = (year as i64 * 100 + month as i64) as u64;
    let mut rng = StdRng::seed_from_u64(seed ^ month_key);

    let variation_factor = 0.05 + rng.gen::<f64>() * 0.1;
    let weights: Vec<f64> = profile
        .iter()
        .map(|entry| {
            let multiplier = 1.0 + (rng.gen::<f64>() - 0.5) * variation_factor;
            entry.share * multiplier
        })
        .collect();

    profile
        .iter()
        .zip(apportion(&weights, total_units))
        .filter(|(_, units)| *units > 0)
        .map(|(entry, units)| MixEntry {
            sku: entry.sku.clone(),
            units,
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn map(entries: &[(&str, i64)]) -> BTreeMap<String, i64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn profile() -> Vec<ProfileShare> {
        [
            ("102270", 0.438064),
            ("102269", 0.290281),
            ("102255", 0.144231),
            ("101972", 0.104447),
            ("102272", 0.011743),
            ("102273", 0.005812),
            ("102271", 0.005412),
        ]
        .iter()
        .map(|(sku, share)| ProfileShare {
            sku: sku.to_string(),
            share: *share,
        })
        .collect()
    }

    #[test]
    fn test_sum_is_exact_for_many_inputs() {
        for n in 1..8i64 {
            for target in [0, 1, 2, 3, 7, 99, 1000, 14_859] {
                let totals: BTreeMap<String, i64> =
                    (0..n).map(|i| (format!("sku-{}", i), (i * 37 + 11) % 23 + 1)).collect();
                let out = redistribute(&totals, target);
                assert_eq!(out.len(), totals.len());
                assert_eq!(out.values().sum::<i64>(), target, "n={} target={}", n, target);
                assert!(out.values().all(|v| *v >= 0));
            }
        }
    }

    #[test]
    fn test_residual_goes_to_largest() {
        // 1.43 + 7.14 + 1.43 rounds to 9; the missing unit lands on B
        let out = redistribute(&map(&[("A", 1), ("B", 5), ("C", 1)]), 10);
        assert_eq!(out.values().sum::<i64>(), 10);
        assert_eq!(out["B"], 8);
    }

    #[test]
    fn test_negative_residual_never_goes_below_zero() {
        // Every quarter share rounds up to 1; two must be taken back
        let out = redistribute(&map(&[("A", 1), ("B", 1), ("C", 1), ("D", 1)]), 2);
        assert_eq!(out.values().sum::<i64>(), 2);
        assert!(out.values().all(|v| *v >= 0));
        assert_eq!(out["A"], 0);
        assert_eq!(out["B"], 0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(redistribute(&BTreeMap::new(), 100).is_empty());

        let zeros = redistribute(&map(&[("A", 0), ("B", 0)]), 5);
        assert_eq!(zeros.values().sum::<i64>(), 5);

        let negative = redistribute(&map(&[("A", -10), ("B", 10)]), 4);
        assert_eq!(negative["A"], 0);
        assert_eq!(negative["B"], 4);
    }

    #[test]
    fn test_prorate_half_month() {
        let tz = chrono_tz::UTC;
        let window = PeriodWindow::new(
            Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 11, 15, 23, 59, 59).unwrap(),
            "first half",
        );
        let month = map(&[("A", 600), ("B", 300), ("C", 100)]);
        let out = prorate_month(&month, 2025, 11, &window, tz).unwrap();
        assert_eq!(out.values().sum::<i64>(), 500);
        assert_eq!(out["A"], 300);
    }

    #[test]
    fn test_prorate_window_outside_month() {
        let window = PeriodWindow::new(
            Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 12, 5, 0, 0, 0).unwrap(),
            "december",
        );
        let out = prorate_month(&map(&[("A", 600)]), 2025, 11, &window, chrono_tz::UTC).unwrap();
        assert_eq!(out["A"], 0);
    }

    #[test]
    fn test_synthetic_mix_is_seeded() {
        let first = synthesize_monthly_mix(&profile(), 2025, 10, 14_859, 7);
        let again = synthesize_monthly_mix(&profile(), 2025, 10, 14_859, 7);
        assert_eq!(first, again);
        assert_eq!(first.iter().map(|e| e.units).sum::<i64>(), 14_859);

        let next_month = synthesize_monthly_mix(&profile(), 2025, 11, 14_859, 7);
        assert_ne!(first, next_month);
    }

    #[test]
    fn test_synthetic_mix_stays_near_profile() {
        let total = 100_000;
        let mix = synthesize_monthly_mix(&profile(), 2026, 1, total, 42);
        for (entry, base) in mix.iter().zip(profile()) {
            assert_eq!(entry.sku, base.sku);
            let share = entry.units as f64 / total as f64;
            assert!((share - base.share).abs() <= base.share * 0.2 + 0.001, "{}", entry.sku);
        }
    }

    #[test]
    fn test_synthetic_mix_drops_empty_entries() {
        let mix = synthesize_monthly_mix(&profile(), 2025, 9, 5, 1);
        assert_eq!(mix.iter().map(|e| e.units).sum::<i64>(), 5);
        assert!(mix.iter().all(|e| e.units > 0));
        assert!(mix.len() < profile().len());
    }
}
