//! # Time-Series Aggregator
//!
//! Buckets order facts by business-calendar day, then rolls daily buckets up
//! into weekly, monthly or quarterly buckets.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OrderRecord[] ──filter(window)──► group by local date ──► DailyBucket[]│
//! │                                     (business tz)              │        │
//! │                                                                 ▼        │
//! │                                                        rollup(granularity)│
//! │                                                                 │        │
//! │            Week:    bucket date = ISO Monday                    │        │
//! │            Month:   bucket date = 1st of month                  ▼        │
//! │            Quarter: bucket date = 1st of Jan/Apr/Jul/Oct     Bucket[]   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every output is ascending by date. Aggregation is keyed through a
//! `BTreeMap`, so the same input always produces the same output.
//!
//! ## SKU Filter
//! Without a filter, a bucket sums whole orders: `grossSales` is the order's
//! `totalAmount` and `units` is every line's quantity. With a filter, only the
//! matching line items contribute, and an order containing the SKU counts
//! once toward `orderCount` no matter how many matching lines it has.

use chrono::{Datelike, Duration, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Bucket, DailyBucket, Granularity, OrderRecord, PeriodWindow};
use crate::WEEKS_PER_MONTH;

// =============================================================================
// Output Types
// =============================================================================

/// A daily series for one SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SkuSeries {
    pub sku: String,
    pub product_title: String,
    pub variant_title: String,
    pub buckets: Vec<DailyBucket>,
}

/// Sum of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SeriesTotals {
    pub units: i64,
    pub gross_sales: Money,
    pub order_count: i64,
}

// =============================================================================
// Daily Bucketing
// =============================================================================

/// Groups orders inside `window` into one bucket per business-calendar day.
///
/// Orders outside the window are ignored. A window with no orders yields an
/// empty vector.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use pulse_core::timeseries::bucket_daily;
/// use pulse_core::types::PeriodWindow;
///
/// let window = PeriodWindow::new(
///     Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2025, 10, 31, 0, 0, 0).unwrap(),
///     "October",
/// );
/// let buckets = bucket_daily(&[], &window, chrono_tz::UTC, None);
/// assert!(buckets.is_empty());
/// ```
pub fn bucket_daily(orders: &[OrderRecord], window: &PeriodWindow, tz: Tz, sku: Option<&str>) -> Vec<DailyBucket> {
    let mut by_day: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();

    for order in orders.iter().filter(|o| window.contains(o.created_at)) {
        let (units, gross) = match sku {
            None => (order.units(), order.total_amount),
            Some(sku) => {
                let mut matched = false;
                let mut units = 0;
                let mut gross = Money::zero();
                for item in order.line_items.iter().filter(|item| item.sku == sku) {
                    matched = true;
                    units += item.quantity;
                    gross += item.amount;
                }
                if !matched {
                    continue;
                }
                (units, gross)
            }
        };

        let date = order.created_at.with_timezone(&tz).date_naive();
        let bucket = by_day.entry(date).or_insert_with(|| Bucket::empty(date));
        bucket.units += units;
        bucket.gross_sales += gross;
        bucket.order_count += 1;
    }

    by_day.into_values().collect()
}

/// One daily series per SKU, in the order SKUs are first seen.
///
/// `grossSales` is the sum of line amounts. An order counts once per SKU.
pub fn bucket_daily_by_sku(orders: &[OrderRecord], window: &PeriodWindow, tz: Tz) -> Vec<SkuSeries> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut series: Vec<(SkuSeries, BTreeMap<NaiveDate, Bucket>)> = Vec::new();

    for order in orders.iter().filter(|o| window.contains(o.created_at)) {
        let date = order.created_at.with_timezone(&tz).date_naive();
        let mut counted: Vec<usize> = Vec::new();

        for item in &order.line_items {
            let slot = *index.entry(item.sku.clone()).or_insert_with(|| {
                series.push((
                    SkuSeries {
                        sku: item.sku.clone(),
                        product_title: item.product_title.clone(),
                        variant_title: item.variant_title.clone(),
                        buckets: Vec::new(),
                    },
                    BTreeMap::new(),
                ));
                series.len() - 1
            });

            let bucket = series[slot].1.entry(date).or_insert_with(|| Bucket::empty(date));
            bucket.units += item.quantity;
            bucket.gross_sales += item.amount;
            if !counted.contains(&slot) {
                bucket.order_count += 1;
                counted.push(slot);
            }
        }
    }

    series
        .into_iter()
        .map(|(mut meta, days)| {
            meta.buckets = days.into_values().collect();
            meta
        })
        .collect()
}

// =============================================================================
// Rollup
// =============================================================================

/// First day of the bucket that `date` belongs to.
pub fn bucket_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        Granularity::Month => date.with_day(1).unwrap_or(date),
        Granularity::Quarter => {
            let quarter_month = ((date.month() - 1) / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(date.year(), quarter_month, 1).unwrap_or(date)
        }
    }
}

/// Sums daily buckets into coarser buckets.
///
/// A pure sum of `units`, `grossSales` and `orderCount`: every input bucket
/// lands in exactly one output bucket. Input order does not matter; output
/// is ascending.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use pulse_core::timeseries::rollup;
/// use pulse_core::types::{Bucket, Granularity};
///
/// let mut a = Bucket::empty(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
/// a.units = 4;
/// let mut b = Bucket::empty(NaiveDate::from_ymd_opt(2025, 10, 8).unwrap());
/// b.units = 2;
///
/// let monthly = rollup(&[a, b], Granularity::Month);
/// assert_eq!(monthly.len(), 1);
/// assert_eq!(monthly[0].units, 6);
/// ```
pub fn rollup(daily: &[DailyBucket], granularity: Granularity) -> Vec<Bucket> {
    let mut grouped: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();

    for bucket in daily {
        let key = bucket_start(bucket.date, granularity);
        grouped
            .entry(key)
            .or_insert_with(|| Bucket::empty(key))
            .absorb(bucket);
    }

    grouped.into_values().collect()
}

// =============================================================================
// Series Utilities
// =============================================================================

/// Densifies a daily series over `[from, to]`, inserting zero buckets for
/// missing days. Buckets outside the range are dropped.
pub fn fill_missing_days(series: &[DailyBucket], from: NaiveDate, to: NaiveDate) -> Vec<DailyBucket> {
    if from > to {
        return Vec::new();
    }

    let existing: BTreeMap<NaiveDate, &Bucket> = series.iter().map(|b| (b.date, b)).collect();
    let mut filled = Vec::with_capacity((to - from).num_days() as usize + 1);

    let mut day = from;
    while day <= to {
        filled.push(existing.get(&day).map(|b| (*b).clone()).unwrap_or_else(|| Bucket::empty(day)));
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    filled
}

pub fn series_totals(series: &[Bucket]) -> SeriesTotals {
    series.iter().fold(SeriesTotals::default(), |mut acc, b| {
        acc.units += b.units;
        acc.gross_sales += b.gross_sales;
        acc.order_count += b.order_count;
        acc
    })
}

// =============================================================================
// CSV Export
// =============================================================================

const CSV_HEADER: [&str; 4] = ["Date", "Units Sold", "Gross Sales", "Orders"];

/// Renders a series as CSV, one row per bucket in the order given.
///
/// Callers pass the ascending output of [`fill_missing_days`] or [`rollup`],
/// so rows come out oldest first and empty days appear as zero rows.
///
/// ```rust
/// use chrono::NaiveDate;
/// use pulse_core::timeseries::series_to_csv;
/// use pulse_core::types::Bucket;
///
/// let day = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
/// let csv = series_to_csv(&[Bucket::empty(day)]).unwrap();
/// assert_eq!(csv, "Date,Units Sold,Gross Sales,Orders\n2025-10-01,0,0.00,0\n");
/// ```
pub fn series_to_csv(series: &[Bucket]) -> CoreResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER).map_err(export_error)?;

    for bucket in series {
        writer
            .write_record([
                bucket.date.format("%Y-%m-%d").to_string(),
                bucket.units.to_string(),
                bucket.gross_sales.to_decimal_string(),
                bucket.order_count.to_string(),
            ])
            .map_err(export_error)?;
    }

    let bytes = writer.into_inner().map_err(|e| CoreError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Export(e.to_string()))
}

/// Download name for a SKU's exported series, e.g. `102270_mtd_trends.csv`.
pub fn csv_filename(sku: &str, period: &str) -> String {
    format!("{}_{}_trends.csv", sku, period)
}

fn export_error(err: csv::Error) -> CoreError {
    CoreError::Export(err.to_string())
}

/// Average units per month over the trailing `window_weeks` weeks ending on
/// `today` (inclusive).
///
/// Uses the same four-weeks-per-month factor as weeks-of-cover so that a
/// steady seller projects consistently.
pub fn trailing_monthly_velocity(daily: &[DailyBucket], today: NaiveDate, window_weeks: u32) -> f64 {
    if window_weeks == 0 {
        return 0.0;
    }

    let first_day = today - Duration::days(window_weeks as i64 * 7 - 1);
    let units: i64 = daily
        .iter()
        .filter(|b| b.date >= first_day && b.date <= today)
        .map(|b| b.units)
        .sum();

    units as f64 / window_weeks as f64 * WEEKS_PER_MONTH
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::DateRangeResolver;
    use crate::period::PeriodToken;
    use crate::types::LineItem;
    use chrono::{DateTime, TimeZone, Utc};

    const BRISBANE: Tz = chrono_tz::Australia::Brisbane;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line(sku: &str, quantity: i64, cents: i64) -> LineItem {
        LineItem {
            sku: sku.to_string(),
            quantity,
            variant_title: format!("{} variant", sku),
            product_title: "Gummies".to_string(),
            amount: Money::from_cents(cents),
        }
    }

    fn order(id: &str, at: DateTime<Utc>, total: i64, lines: Vec<LineItem>) -> OrderRecord {
        OrderRecord {
            id: id.to_string(),
            created_at: at,
            total_amount: Money::from_cents(total),
            line_items: lines,
        }
    }

    fn october() -> PeriodWindow {
        let resolver = DateRangeResolver::new(BRISBANE);
        let now = Utc.with_ymd_and_hms(2025, 11, 5, 0, 0, 0).unwrap();
        resolver
            .resolve_window(&PeriodToken::Month { year: 2025, month: 10 }, now)
            .unwrap()
    }

    fn three_orders() -> Vec<OrderRecord> {
        vec![
            order("1", Utc.with_ymd_and_hms(2025, 10, 1, 1, 0, 0).unwrap(), 2000, vec![line("A", 2, 2000)]),
            order("2", Utc.with_ymd_and_hms(2025, 10, 1, 5, 0, 0).unwrap(), 2000, vec![line("A", 2, 2000)]),
            order("3", Utc.with_ymd_and_hms(2025, 10, 8, 3, 0, 0).unwrap(), 2000, vec![line("A", 2, 2000)]),
        ]
    }

    #[test]
    fn test_daily_then_weekly_rollup() {
        let daily = bucket_daily(&three_orders(), &october(), BRISBANE, None);
        assert_eq!(daily.len(), 2);

        let weekly = rollup(&daily, Granularity::Week);
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[0].date, date(2025, 9, 29));
        assert_eq!(weekly[0].units, 4);
        assert_eq!(weekly[1].date, date(2025, 10, 6));
        assert_eq!(weekly[1].units, 2);
        assert_eq!(series_totals(&weekly).units, 6);
    }

    #[test]
    fn test_days_follow_business_timezone() {
        // 2025-10-01 15:00 UTC is already 2025-10-02 in Brisbane
        let orders = vec![order(
            "late",
            Utc.with_ymd_and_hms(2025, 10, 1, 15, 0, 0).unwrap(),
            500,
            vec![line("A", 1, 500)],
        )];
        let daily = bucket_daily(&orders, &october(), BRISBANE, None);
        assert_eq!(daily[0].date, date(2025, 10, 2));

        let daily_utc = bucket_daily(&orders, &october(), chrono_tz::UTC, None);
        assert_eq!(daily_utc[0].date, date(2025, 10, 1));
    }

    #[test]
    fn test_sku_filter_counts_order_once() {
        let orders = vec![order(
            "1",
            Utc.with_ymd_and_hms(2025, 10, 3, 0, 0, 0).unwrap(),
            9000,
            vec![line("A", 1, 1000), line("B", 5, 5000), line("A", 2, 2000)],
        )];

        let filtered = bucket_daily(&orders, &october(), BRISBANE, Some("A"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].units, 3);
        assert_eq!(filtered[0].gross_sales.cents(), 3000);
        assert_eq!(filtered[0].order_count, 1);

        let whole = bucket_daily(&orders, &october(), BRISBANE, None);
        assert_eq!(whole[0].units, 8);
        assert_eq!(whole[0].gross_sales.cents(), 9000);

        assert!(bucket_daily(&orders, &october(), BRISBANE, Some("Z")).is_empty());
    }

    #[test]
    fn test_orders_outside_window_are_ignored() {
        let orders = vec![order(
            "sept",
            Utc.with_ymd_and_hms(2025, 9, 30, 13, 0, 0).unwrap(),
            100,
            vec![],
        )];
        assert!(bucket_daily(&orders, &october(), BRISBANE, None).is_empty());
    }

    #[test]
    fn test_bucket_daily_is_idempotent() {
        let orders = three_orders();
        let first = serde_json::to_string(&bucket_daily(&orders, &october(), BRISBANE, None)).unwrap();
        let second = serde_json::to_string(&bucket_daily(&orders, &october(), BRISBANE, None)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rollup_preserves_sums_at_every_granularity() {
        let daily: Vec<Bucket> = (0..200)
            .map(|i| {
                let mut b = Bucket::empty(date(2025, 1, 1) + Duration::days(i));
                b.units = i % 7;
                b.gross_sales = Money::from_cents(i * 13);
                b.order_count = i % 3;
                b
            })
            .collect();
        let expected = series_totals(&daily);

        for granularity in [Granularity::Day, Granularity::Week, Granularity::Month, Granularity::Quarter] {
            let rolled = rollup(&daily, granularity);
            assert_eq!(series_totals(&rolled), expected, "{:?}", granularity);
            assert!(rolled.windows(2).all(|w| w[0].date < w[1].date));
        }
    }

    #[test]
    fn test_bucket_start() {
        let d = date(2025, 8, 17); // Sunday
        assert_eq!(bucket_start(d, Granularity::Week), date(2025, 8, 11));
        assert_eq!(bucket_start(d, Granularity::Month), date(2025, 8, 1));
        assert_eq!(bucket_start(d, Granularity::Quarter), date(2025, 7, 1));
        assert_eq!(bucket_start(date(2025, 12, 31), Granularity::Quarter), date(2025, 10, 1));
    }

    #[test]
    fn test_bucket_daily_by_sku_discovery_order() {
        let orders = vec![
            order(
                "1",
                Utc.with_ymd_and_hms(2025, 10, 2, 0, 0, 0).unwrap(),
                0,
                vec![line("B", 1, 100), line("A", 1, 100), line("B", 1, 100)],
            ),
            order("2", Utc.with_ymd_and_hms(2025, 10, 3, 0, 0, 0).unwrap(), 0, vec![line("C", 4, 400)]),
        ];
        let series = bucket_daily_by_sku(&orders, &october(), BRISBANE);

        let skus: Vec<_> = series.iter().map(|s| s.sku.as_str()).collect();
        assert_eq!(skus, vec!["B", "A", "C"]);
        assert_eq!(series[0].buckets[0].units, 2);
        assert_eq!(series[0].buckets[0].order_count, 1);
        assert_eq!(series[0].variant_title, "B variant");
    }

    #[test]
    fn test_fill_missing_days() {
        let mut only = Bucket::empty(date(2025, 10, 3));
        only.units = 5;
        let filled = fill_missing_days(&[only], date(2025, 10, 1), date(2025, 10, 5));
        assert_eq!(filled.len(), 5);
        assert_eq!(filled[2].units, 5);
        assert!(filled[0].is_empty());
        assert!(fill_missing_days(&[], date(2025, 10, 5), date(2025, 10, 1)).is_empty());
    }

    #[test]
    fn test_series_csv_export() {
        let window = october();
        let daily = bucket_daily(&three_orders(), &window, BRISBANE, Some("A"));
        let filled = fill_missing_days(&daily, date(2025, 10, 1), date(2025, 10, 3));

        let csv = series_to_csv(&filled).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Date,Units Sold,Gross Sales,Orders",
                "2025-10-01,4,40.00,2",
                "2025-10-02,0,0.00,0",
                "2025-10-03,0,0.00,0",
            ]
        );
        assert_eq!(csv_filename("A", "mtd"), "A_mtd_trends.csv");
    }

    #[test]
    fn test_empty_series_csv_is_header_only() {
        assert_eq!(series_to_csv(&[]).unwrap(), "Date,Units Sold,Gross Sales,Orders\n");
    }

    #[test]
    fn test_trailing_monthly_velocity() {
        // 10 units a day for 4 weeks => 280 units => 280 per month
        let daily: Vec<Bucket> = (0..60)
            .map(|i| {
                let mut b = Bucket::empty(date(2025, 9, 1) + Duration::days(i));
                b.units = 10;
                b
            })
            .collect();
        let today = date(2025, 10, 15);
        assert!((trailing_monthly_velocity(&daily, today, 4) - 280.0).abs() < 1e-9);
        assert_eq!(trailing_monthly_velocity(&daily, today, 0), 0.0);
        assert_eq!(trailing_monthly_velocity(&[], today, 4), 0.0);
    }
}
