//! # Dashboard Service
//!
//! Query functions the presentation layer calls. Each one resolves a period,
//! fetches orders from the injected [`OrderSource`], and runs the pure
//! aggregation code from `pulse-core` over the result.
//!
//! ## Query Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         summary("mtd", now)                             │
//! │                                                                         │
//! │  "mtd" ──► PeriodToken ──► DateRangeResolver ──► ResolvedWindows       │
//! │                                                    │          │         │
//! │                              ┌─────────────────────┘          │         │
//! │                              ▼                                ▼         │
//! │                     fetch(current)      tokio::join!   fetch(previous)  │
//! │                              │                                │         │
//! │                  Ok ─► orders│                     Err ─► [] + warn!    │
//! │                              ▼                                ▼         │
//! │                     PeriodTotals::from_orders   PeriodTotals (zeroed)  │
//! │                              └───────────┬────────────────────┘         │
//! │                                          ▼                              │
//! │                          SummaryCards::build ─► compare() per metric    │
//! │                                                                         │
//! │  DataHealth records which windows were zeroed.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Rules
//! - A bad period token fails the call.
//! - A failed or timed-out fetch zeroes that window and is listed in
//!   [`DataHealth::failed_windows`]; the rest of the result is still built.
//! - Store errors (inbound orders) propagate.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use futures_util::future::join_all;
use pulse_core::forecast::{forecast_next_month, Forecast, FORECAST_WINDOW_MONTHS};
use pulse_core::inventory::{build_inventory_report, InventoryReport};
use pulse_core::ranking::top_variants;
use pulse_core::reorder::{recommend_reorder, ReorderPolicy, ReorderRecommendation};
use pulse_core::summary::{PeriodTotals, SummaryCards};
use pulse_core::timeseries::{
    bucket_daily, bucket_daily_by_sku, fill_missing_days, rollup, series_to_csv, series_totals,
    trailing_monthly_velocity, SeriesTotals,
};
use pulse_core::types::{
    Bucket, FreightMode, Granularity, InventoryLevel, InventoryStatus, OrderRecord, PeriodWindow,
    SalesVelocity, VariantRanking,
};
use pulse_core::{CoreError, DateRangeResolver, Money, PeriodToken, ResolvedWindows};
use pulse_store::Database;
use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::config::PulseConfig;
use crate::error::ServiceResult;
use crate::source::{fetch_window, FetchOptions, OrderSource};

// =============================================================================
// Result Types
// =============================================================================

/// What went wrong while gathering data for a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DataHealth {
    /// Labels of windows whose fetch failed and were reported as zero.
    pub failed_windows: Vec<String>,
    /// Records dropped as malformed.
    pub quarantined: usize,
    /// At least one window hit the page cap.
    pub truncated: bool,
}

impl DataHealth {
    fn failed(label: &str) -> Self {
        DataHealth {
            failed_windows: vec![label.to_string()],
            ..DataHealth::default()
        }
    }

    /// True when every window was fetched in full.
    pub fn is_complete(&self) -> bool {
        self.failed_windows.is_empty() && !self.truncated
    }

    pub fn merge(&mut self, other: &DataHealth) {
        for label in &other.failed_windows {
            if !self.failed_windows.contains(label) {
                self.failed_windows.push(label.clone());
            }
        }
        self.quarantined += other.quarantined;
        self.truncated |= other.truncated;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SummaryView {
    pub windows: ResolvedWindows,
    pub cards: SummaryCards,
    pub health: DataHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RankingView {
    pub window: PeriodWindow,
    pub rankings: Vec<VariantRanking>,
    pub health: DataHealth,
}

/// A chart-ready series. `sku` is `None` for the all-products series.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SeriesView {
    pub sku: Option<String>,
    pub product_title: Option<String>,
    pub variant_title: Option<String>,
    pub granularity: Granularity,
    pub window: PeriodWindow,
    pub buckets: Vec<Bucket>,
    pub totals: SeriesTotals,
    pub health: DataHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryView {
    /// Window the sales velocity was measured over.
    pub velocity_window: PeriodWindow,
    pub report: InventoryReport,
    pub reorders: Vec<ReorderRecommendation>,
    /// Deposit still owed across outstanding inbound runs.
    pub outstanding_deposits: Money,
    pub health: DataHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ForecastView {
    pub history_window: PeriodWindow,
    pub forecast: Option<Forecast>,
    pub health: DataHealth,
}

impl SeriesView {
    /// `Date,Units Sold,Gross Sales,Orders` rows, oldest bucket first.
    pub fn to_csv(&self) -> ServiceResult<String> {
        Ok(series_to_csv(&self.buckets)?)
    }
}

/// Everything the dashboard shows for one period.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardOverview {
    pub period_label: String,
    #[ts(as = "String")]
    pub generated_at: DateTime<Utc>,
    pub summary: SummaryView,
    pub rankings: RankingView,
    pub series: Vec<SeriesView>,
    pub inventory: InventoryView,
    pub forecast: ForecastView,
    /// Every section's health merged.
    pub health: DataHealth,
}

/// Orders for one window, or nothing if the fetch failed.
struct WindowOrders {
    orders: Vec<OrderRecord>,
    health: DataHealth,
}

// =============================================================================
// Service
// =============================================================================

/// Dashboard queries over an injected order source.
///
/// ## Example
/// ```rust,ignore
/// let source = InMemoryOrderSource::from_json_file("orders.json").await?;
/// let service = DashboardService::new(source, PulseConfig::load(None)?)?
///     .with_store(Database::new(DbConfig::new("inbound.db")).await?);
///
/// let overview = service.overview("mtd", Utc::now(), &levels).await?;
/// ```
pub struct DashboardService<S> {
    source: S,
    config: PulseConfig,
    resolver: DateRangeResolver,
    store: Option<Database>,
}

impl<S: OrderSource> DashboardService<S> {
    /// Creates the service. Fails if the configured timezone is unknown.
    pub fn new(source: S, config: PulseConfig) -> ServiceResult<Self> {
        let resolver = config.resolver()?;
        Ok(DashboardService {
            source,
            config,
            resolver,
            store: None,
        })
    }

    /// Reads inbound shipments from `store` when projecting inventory.
    pub fn with_store(mut self, store: Database) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &PulseConfig {
        &self.config
    }

    pub fn resolver(&self) -> &DateRangeResolver {
        &self.resolver
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    async fn fetch_or_empty(&self, window: &PeriodWindow, sku: Option<&str>) -> WindowOrders {
        let options = FetchOptions::from(&self.config.query);

        match fetch_window(&self.source, window, sku, options).await {
            Ok(fetched) => WindowOrders {
                health: DataHealth {
                    failed_windows: Vec::new(),
                    quarantined: fetched.quarantined.len(),
                    truncated: fetched.truncated,
                },
                orders: fetched.orders,
            },
            Err(err) => {
                warn!(
                    window = %window.label,
                    sku = sku.unwrap_or("*"),
                    error = %err,
                    "Order fetch failed, reporting zero for this window"
                );
                WindowOrders {
                    orders: Vec::new(),
                    health: DataHealth::failed(&window.label),
                }
            }
        }
    }

    /// Fetches the current and comparison windows concurrently.
    async fn fetch_pair(&self, windows: &ResolvedWindows, sku: Option<&str>) -> (WindowOrders, WindowOrders) {
        tokio::join!(
            self.fetch_or_empty(&windows.current, sku),
            self.fetch_or_empty(&windows.comparison, sku)
        )
    }

    fn resolve_window(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<PeriodWindow> {
        Ok(self.resolver.resolve_str(token, now)?)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Headline cards for a period against the same-length period before it.
    pub async fn summary(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<SummaryView> {
        let token: PeriodToken = token.parse()?;
        let windows = self.resolver.resolve(&token, now)?;

        let (current, previous) = self.fetch_pair(&windows, None).await;

        let cards = SummaryCards::build(
            windows.current.label.clone(),
            PeriodTotals::from_orders(&current.orders, &windows.current),
            PeriodTotals::from_orders(&previous.orders, &windows.comparison),
        );

        let mut health = current.health;
        health.merge(&previous.health);

        Ok(SummaryView { windows, cards, health })
    }

    /// Best-selling variants for a period, `query.top_n` long.
    pub async fn top_variants(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<RankingView> {
        let window = self.resolve_window(token, now)?;
        let fetched = self.fetch_or_empty(&window, None).await;
        let rankings = top_variants(&fetched.orders, &window, self.config.query.top_n);

        Ok(RankingView {
            window,
            rankings,
            health: fetched.health,
        })
    }

    /// Sales series for one SKU, or for all products when `sku` is `None`.
    pub async fn product_series(
        &self,
        token: &str,
        now: DateTime<Utc>,
        sku: Option<&str>,
        granularity: Granularity,
    ) -> ServiceResult<SeriesView> {
        let window = self.resolve_window(token, now)?;
        Ok(self.series_for_window(&window, sku, granularity).await)
    }

    /// One series per top variant, fetched concurrently.
    pub async fn top_variant_series(
        &self,
        token: &str,
        now: DateTime<Utc>,
        granularity: Granularity,
    ) -> ServiceResult<Vec<SeriesView>> {
        let window = self.resolve_window(token, now)?;
        let fetched = self.fetch_or_empty(&window, None).await;
        let leaders = top_variants(&fetched.orders, &window, self.config.query.series_variants);

        debug!(variants = leaders.len(), window = %window.label, "Fetching top variant series");

        let series = join_all(
            leaders
                .iter()
                .map(|ranking| self.series_for_window(&window, Some(ranking.sku.as_str()), granularity)),
        )
        .await;

        Ok(series)
    }

    async fn series_for_window(&self, window: &PeriodWindow, sku: Option<&str>, granularity: Granularity) -> SeriesView {
        let fetched = self.fetch_or_empty(window, sku).await;
        let daily = bucket_daily(&fetched.orders, window, self.resolver.timezone(), sku);

        let buckets = match granularity {
            Granularity::Day => fill_missing_days(
                &daily,
                self.resolver.local_date(window.start),
                self.resolver.local_date(window.end),
            ),
            coarser => rollup(&daily, coarser),
        };

        let item = sku.and_then(|sku| {
            fetched
                .orders
                .iter()
                .flat_map(|o| o.line_items.iter())
                .find(|item| item.sku == sku)
        });

        SeriesView {
            sku: sku.map(str::to_string),
            product_title: item.map(|i| i.product_title.clone()),
            variant_title: item.map(|i| i.variant_title.clone()),
            granularity,
            window: window.clone(),
            totals: series_totals(&buckets),
            buckets,
            health: fetched.health,
        }
    }

    /// Weeks of cover and reorder suggestions for every SKU in `levels`.
    ///
    /// Velocity comes from the trailing `inventory.velocity_window_weeks` of
    /// sales; inbound shipments come from the store when one is attached.
    pub async fn inventory_report(&self, levels: &[InventoryLevel], now: DateTime<Utc>) -> ServiceResult<InventoryView> {
        let today = self.resolver.local_date(now);
        let weeks = self.config.inventory.velocity_window_weeks;
        let first_day = today - Duration::days(weeks as i64 * 7 - 1);
        let window = PeriodWindow::new(
            self.resolver.start_of_day(first_day)?,
            now,
            format!("Trailing {} weeks", weeks),
        );

        let fetched = self.fetch_or_empty(&window, None).await;
        let velocities: Vec<SalesVelocity> = bucket_daily_by_sku(&fetched.orders, &window, self.resolver.timezone())
            .into_iter()
            .map(|series| SalesVelocity {
                monthly_velocity: trailing_monthly_velocity(&series.buckets, today, weeks),
                sku: series.sku,
            })
            .collect();

        let inbound = match &self.store {
            Some(db) => db.inbound_orders().list_outstanding().await?,
            None => Vec::new(),
        };

        let report = build_inventory_report(levels, &velocities, &inbound, today, &self.config.thresholds());
        let per_unit = self.config.inventory.deposit_per_unit();
        let outstanding_deposits: Money = inbound.iter().map(|order| order.deposit_remaining(per_unit)).sum();
        let policy = self.config.reorder_policy();
        let reorders: Vec<ReorderRecommendation> = report
            .statuses
            .iter()
            .filter_map(|status| choose_reorder(status, today, &policy))
            .collect();

        info!(
            tracked = report.tracked,
            at_risk = report.at_risk,
            inbound = inbound.len(),
            reorders = reorders.len(),
            "Inventory report built"
        );

        Ok(InventoryView {
            velocity_window: window,
            report,
            reorders,
            outstanding_deposits,
            health: fetched.health,
        })
    }

    /// Next month's projection from the last complete months.
    pub async fn forecast(&self, now: DateTime<Utc>) -> ServiceResult<ForecastView> {
        let today = self.resolver.local_date(now);
        let history_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
            .and_then(|first| first.checked_sub_months(Months::new(FORECAST_WINDOW_MONTHS as u32)))
            .ok_or_else(|| CoreError::DateOutOfRange("forecast history".to_string()))?;

        let window = PeriodWindow::new(self.resolver.start_of_day(history_start)?, now, "Forecast history");
        let fetched = self.fetch_or_empty(&window, None).await;

        let daily = bucket_daily(&fetched.orders, &window, self.resolver.timezone(), None);
        let monthly = rollup(&daily, Granularity::Month);

        Ok(ForecastView {
            forecast: forecast_next_month(&monthly, today),
            history_window: window,
            health: fetched.health,
        })
    }

    /// Every dashboard section for one period, gathered concurrently.
    pub async fn overview(
        &self,
        token: &str,
        now: DateTime<Utc>,
        levels: &[InventoryLevel],
    ) -> ServiceResult<DashboardOverview> {
        let parsed: PeriodToken = token.parse()?;
        let granularity = series_granularity(&parsed);

        let (summary, rankings, series, inventory, forecast) = tokio::try_join!(
            self.summary(token, now),
            self.top_variants(token, now),
            self.top_variant_series(token, now, granularity),
            self.inventory_report(levels, now),
            self.forecast(now)
        )?;

        let mut health = DataHealth::default();
        health.merge(&summary.health);
        health.merge(&rankings.health);
        for view in &series {
            health.merge(&view.health);
        }
        health.merge(&inventory.health);
        health.merge(&forecast.health);

        if health.is_complete() {
            info!(period = %parsed, "Dashboard overview built");
        } else {
            warn!(
                period = %parsed,
                failed = ?health.failed_windows,
                truncated = health.truncated,
                "Dashboard overview built from partial data"
            );
        }

        Ok(DashboardOverview {
            period_label: parsed.label(),
            generated_at: now,
            summary,
            rankings,
            series,
            inventory,
            forecast,
            health,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Chart granularity for a period: daily bars up to a month, weekly beyond.
pub fn series_granularity(token: &PeriodToken) -> Granularity {
    match token {
        PeriodToken::Daily | PeriodToken::Weekly | PeriodToken::MonthToDate | PeriodToken::Month { .. } => {
            Granularity::Day
        }
        PeriodToken::YearToDate | PeriodToken::All => Granularity::Week,
    }
}

/// Sea freight unless its order-by date has already passed, then air.
/// SKUs with nothing to order and no trigger are skipped.
fn choose_reorder(status: &InventoryStatus, today: NaiveDate, policy: &ReorderPolicy) -> Option<ReorderRecommendation> {
    let sea = recommend_reorder(status, FreightMode::Sea, policy);
    if !sea.order_now && sea.recommended_quantity == 0 {
        return None;
    }

    match sea.order_by {
        Some(order_by) if order_by < today => Some(recommend_reorder(status, FreightMode::Air, policy)),
        _ => Some(sea),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ServiceError, SourceError};
    use crate::source::{InMemoryOrderSource, OrderPage, OrderQuery};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use pulse_core::ranking::Trend;
    use pulse_core::types::{LineItem, StockStatus};
    use pulse_store::{DbConfig, NewInboundOrder};

    fn now() -> DateTime<Utc> {
        // 12:00 on Wednesday 2025-10-15 in Brisbane
        Utc.with_ymd_and_hms(2025, 10, 15, 2, 0, 0).unwrap()
    }

    fn order(id: &str, at: DateTime<Utc>, items: &[(&str, i64)], cents: i64) -> OrderRecord {
        OrderRecord {
            id: id.to_string(),
            created_at: at,
            total_amount: Money::from_cents(cents),
            line_items: items
                .iter()
                .map(|(sku, qty)| LineItem {
                    sku: sku.to_string(),
                    quantity: *qty,
                    variant_title: format!("{} variant", sku),
                    product_title: "Grip Socks".to_string(),
                    amount: Money::from_cents(cents / items.len() as i64),
                })
                .collect(),
        }
    }

    fn fixture() -> Vec<OrderRecord> {
        vec![
            order("jul", Utc.with_ymd_and_hms(2025, 7, 10, 2, 0, 0).unwrap(), &[("A", 1)], 3_000),
            order("aug", Utc.with_ymd_and_hms(2025, 8, 10, 2, 0, 0).unwrap(), &[("A", 1)], 3_000),
            order("sep", Utc.with_ymd_and_hms(2025, 9, 10, 2, 0, 0).unwrap(), &[("A", 1)], 3_000),
            // Previous week
            order("o-1", Utc.with_ymd_and_hms(2025, 10, 11, 0, 0, 0).unwrap(), &[("B", 1)], 1_000),
            // This week (Monday 13th onwards, Brisbane)
            order("o-2", Utc.with_ymd_and_hms(2025, 10, 13, 1, 0, 0).unwrap(), &[("A", 2)], 2_000),
            order("o-3", Utc.with_ymd_and_hms(2025, 10, 14, 3, 0, 0).unwrap(), &[("A", 1), ("B", 4)], 5_000),
        ]
    }

    fn service<S: OrderSource>(source: S) -> DashboardService<S> {
        DashboardService::new(source, PulseConfig::default()).unwrap()
    }

    /// Fails every query whose window ends at or before `fail_until`.
    struct FlakySource {
        inner: InMemoryOrderSource,
        fail_until: DateTime<Utc>,
    }

    #[async_trait]
    impl OrderSource for FlakySource {
        async fn fetch_page(&self, query: &OrderQuery) -> Result<OrderPage, SourceError> {
            if query.window_end <= self.fail_until {
                return Err(SourceError::Unavailable("503 Service Unavailable".to_string()));
            }
            self.inner.fetch_page(query).await
        }
    }

    struct DownSource;

    #[async_trait]
    impl OrderSource for DownSource {
        async fn fetch_page(&self, _query: &OrderQuery) -> Result<OrderPage, SourceError> {
            Err(SourceError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_summary_compares_against_previous_week() {
        let svc = service(InMemoryOrderSource::new(fixture()));
        let view = svc.summary("weekly", now()).await.unwrap();

        assert_eq!(view.cards.period_label, "This Week");
        assert_eq!(view.cards.orders.current, 2);
        assert_eq!(view.cards.orders.previous, 1);
        assert_eq!(view.cards.orders.comparison.pct_change, 100);
        assert_eq!(view.cards.revenue.current, 7_000);
        assert_eq!(view.cards.revenue.comparison.pct_change, 600);
        assert_eq!(view.cards.units.current, 7);
        assert!(view.health.is_complete());

        let current = &view.windows.current;
        let comparison = &view.windows.comparison;
        assert_eq!(current.end - current.start, comparison.end - comparison.start);
    }

    #[tokio::test]
    async fn test_failed_comparison_is_zeroed() {
        let svc = service(FlakySource {
            inner: InMemoryOrderSource::new(fixture()),
            fail_until: Utc.with_ymd_and_hms(2025, 10, 12, 14, 0, 0).unwrap(),
        });
        let view = svc.summary("weekly", now()).await.unwrap();

        assert_eq!(view.cards.orders.current, 2);
        assert_eq!(view.cards.orders.previous, 0);
        assert_eq!(view.cards.orders.comparison.pct_change, 100);
        assert_eq!(view.health.failed_windows, vec!["Previous This Week".to_string()]);
        assert!(!view.health.is_complete());
    }

    #[tokio::test]
    async fn test_source_down_still_answers() {
        let svc = service(DownSource);
        let view = svc.summary("mtd", now()).await.unwrap();

        assert_eq!(view.cards.orders.current, 0);
        assert_eq!(view.cards.orders.comparison.trend, Trend::Up);
        assert_eq!(view.cards.orders.comparison.pct_change, 0);
        assert_eq!(view.health.failed_windows.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_token_fails_fast() {
        let svc = service(InMemoryOrderSource::new(fixture()));
        let err = svc.summary("fortnight", now()).await.unwrap_err();
        assert!(err.is_bad_request());

        let err = svc.overview("2025-13", now(), &[]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::InvalidPeriodToken(_))));
    }

    #[tokio::test]
    async fn test_top_variants_for_week() {
        let svc = service(InMemoryOrderSource::new(fixture()));
        let view = svc.top_variants("weekly", now()).await.unwrap();

        let skus: Vec<&str> = view.rankings.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["B", "A"]);
        assert_eq!(view.rankings[0].units_sold, 4);
        assert_eq!(view.rankings[1].units_sold, 3);
        assert_eq!(view.rankings[1].orders_count, 2);
    }

    #[tokio::test]
    async fn test_product_series_fills_gaps() {
        let svc = service(InMemoryOrderSource::new(fixture()));
        let view = svc.product_series("weekly", now(), Some("A"), Granularity::Day).await.unwrap();

        let units: Vec<i64> = view.buckets.iter().map(|b| b.units).collect();
        assert_eq!(units, vec![2, 1, 0]);
        assert_eq!(view.buckets[0].date, NaiveDate::from_ymd_opt(2025, 10, 13).unwrap());
        assert_eq!(view.totals.units, 3);
        assert_eq!(view.totals.order_count, 2);
        assert_eq!(view.variant_title.as_deref(), Some("A variant"));
    }

    #[tokio::test]
    async fn test_series_view_exports_csv() {
        let svc = service(InMemoryOrderSource::new(fixture()));
        let view = svc.product_series("weekly", now(), Some("A"), Granularity::Day).await.unwrap();

        let csv = view.to_csv().unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(
            rows,
            vec![
                "Date,Units Sold,Gross Sales,Orders",
                "2025-10-13,2,20.00,1",
                "2025-10-14,1,25.00,1",
                "2025-10-15,0,0.00,0",
            ]
        );
    }

    #[test]
    fn test_overview_has_typescript_binding() {
        let decl = DashboardOverview::decl();
        assert!(decl.contains("generatedAt: string"));
        assert!(decl.contains("health: DataHealth"));
        assert!(DataHealth::decl().contains("failedWindows: Array<string>"));
    }

    #[tokio::test]
    async fn test_top_variant_series() {
        let svc = service(InMemoryOrderSource::new(fixture()));
        let series = svc.top_variant_series("weekly", now(), Granularity::Week).await.unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].sku.as_deref(), Some("B"));
        assert_eq!(series[0].buckets.len(), 1);
        assert_eq!(series[0].totals.units, 4);
    }

    #[tokio::test]
    async fn test_inventory_report_uses_inbound_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.inbound_orders()
            .create(NewInboundOrder {
                sku: "A".to_string(),
                quantity: 20,
                freight_mode: FreightMode::Sea,
                expected_arrival: NaiveDate::from_ymd_opt(2025, 11, 20).unwrap(),
                deposit_paid: Money::from_cents(50_000),
                notes: None,
            })
            .await
            .unwrap();

        let svc = service(InMemoryOrderSource::new(fixture())).with_store(db);
        let levels = vec![
            InventoryLevel { sku: "A".to_string(), on_hand: 10 },
            InventoryLevel { sku: "B".to_string(), on_hand: 0 },
        ];
        let view = svc.inventory_report(&levels, now()).await.unwrap();

        // B: 5 units in four weeks, nothing on hand
        let b = &view.report.statuses[0];
        assert_eq!(b.sku, "B");
        assert_eq!(b.status, StockStatus::Critical);

        // A: 3 units in four weeks, 10 on hand + 20 inbound = 40 weeks
        let a = &view.report.statuses[1];
        assert_eq!(a.effective_on_hand, 30);
        assert_eq!(a.monthly_velocity, 3.0);
        assert_eq!(a.status, StockStatus::Healthy);

        assert_eq!(view.report.at_risk, 1);
        assert_eq!(view.reorders.len(), 1);
        assert_eq!(view.reorders[0].sku, "B");
        assert_eq!(view.reorders[0].freight_mode, FreightMode::Air);
        assert!(view.reorders[0].order_now);
        assert_eq!(view.outstanding_deposits, Money::zero());
    }

    #[tokio::test]
    async fn test_inventory_report_sums_deposit_owed() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for (sku, quantity, paid) in [("A", 1_000, 4_000), ("B", 500, 0)] {
            db.inbound_orders()
                .create(NewInboundOrder {
                    sku: sku.to_string(),
                    quantity,
                    freight_mode: FreightMode::Sea,
                    expected_arrival: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                    deposit_paid: Money::from_cents(paid),
                    notes: None,
                })
                .await
                .unwrap();
        }

        let mut config = PulseConfig::default();
        config.inventory.deposit_per_unit_cents = 50;
        let svc = DashboardService::new(InMemoryOrderSource::new(fixture()), config)
            .unwrap()
            .with_store(db);
        let view = svc.inventory_report(&[], now()).await.unwrap();

        // A: 500.00 due, 40.00 paid. B: 250.00 due, nothing paid.
        assert_eq!(view.outstanding_deposits.cents(), 46_000 + 25_000);
    }

    #[tokio::test]
    async fn test_forecast_uses_complete_months() {
        let svc = service(InMemoryOrderSource::new(fixture()));
        let view = svc.forecast(now()).await.unwrap();
        let forecast = view.forecast.unwrap();

        assert_eq!(forecast.based_on_months, 3);
        assert_eq!(forecast.projected_orders, 1);
        assert_eq!(forecast.projected_revenue.cents(), 3_000);
    }

    #[tokio::test]
    async fn test_overview_merges_sections() {
        let svc = service(InMemoryOrderSource::new(fixture()));
        let levels = vec![InventoryLevel { sku: "A".to_string(), on_hand: 100 }];
        let overview = svc.overview("weekly", now(), &levels).await.unwrap();

        assert_eq!(overview.period_label, "This Week");
        assert_eq!(overview.summary.cards.orders.current, 2);
        assert_eq!(overview.rankings.rankings.len(), 2);
        assert_eq!(overview.series.len(), 2);
        assert_eq!(overview.inventory.report.tracked, 1);
        assert!(overview.forecast.forecast.is_some());
        assert!(overview.health.is_complete());

        let json = serde_json::to_value(&overview).unwrap();
        assert!(json["summary"]["cards"]["orders"]["comparison"]["pctChange"].is_number());
    }

    #[test]
    fn test_series_granularity() {
        assert_eq!(series_granularity(&PeriodToken::Weekly), Granularity::Day);
        assert_eq!(series_granularity(&PeriodToken::YearToDate), Granularity::Week);
    }

    #[test]
    fn test_health_merge() {
        let mut health = DataHealth::failed("Today");
        health.merge(&DataHealth::failed("Today"));
        health.merge(&DataHealth {
            failed_windows: Vec::new(),
            quarantined: 2,
            truncated: true,
        });
        assert_eq!(health.failed_windows, vec!["Today".to_string()]);
        assert_eq!(health.quarantined, 2);
        assert!(health.truncated);
    }
}
