//! # pulse-service: Dashboard Queries for Storefront Pulse
//!
//! This crate connects the pure aggregation engine to the outside world: it
//! pages orders out of an [`OrderSource`], reads inbound shipments from the
//! store, and answers the dashboard's queries.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Dashboard Service Architecture                     │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 DashboardService<S: OrderSource>                 │  │
//! │  │                                                                  │  │
//! │  │  summary · top_variants · product_series · top_variant_series   │  │
//! │  │  inventory_report · forecast · overview                          │  │
//! │  └──────────┬──────────────────────┬─────────────────────┬─────────┘  │
//! │             │                      │                     │             │
//! │             ▼                      ▼                     ▼             │
//! │  ┌────────────────────┐  ┌──────────────────┐  ┌──────────────────┐   │
//! │  │ source             │  │ pulse-core       │  │ pulse-store      │   │
//! │  │                    │  │                  │  │                  │   │
//! │  │ OrderSource trait  │  │ periods, buckets │  │ inbound orders   │   │
//! │  │ fetch_window()     │  │ rankings, cover  │  │ (SQLite)         │   │
//! │  │ paging + timeout   │  │ redistribution   │  │                  │   │
//! │  └────────────────────┘  └──────────────────┘  └──────────────────┘   │
//! │                                                                         │
//! │  Fetches for independent windows run concurrently. A failed fetch       │
//! │  zeroes its window and is reported in DataHealth.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - `PulseConfig` (TOML file + environment)
//! - [`error`] - Service and source error types
//! - [`source`] - Order source trait, paging, in-memory source
//! - [`dashboard`] - Dashboard query functions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pulse_service::{DashboardService, InMemoryOrderSource, PulseConfig};
//!
//! let config = PulseConfig::load_or_default(None);
//! let source = InMemoryOrderSource::from_json_file("orders.json").await?;
//! let service = DashboardService::new(source, config)?;
//!
//! let summary = service.summary("mtd", chrono::Utc::now()).await?;
//! println!("Orders: {}", summary.cards.orders.current);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod dashboard;
pub mod error;
pub mod source;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{BusinessSettings, InventorySettings, PulseConfig, QuerySettings, StoreSettings};
pub use dashboard::{
    DashboardOverview, DashboardService, DataHealth, ForecastView, InventoryView, RankingView,
    SeriesView, SummaryView,
};
pub use error::{ServiceError, ServiceResult, SourceError};
pub use source::{
    fetch_window, FetchOptions, FetchedOrders, InMemoryOrderSource, OrderPage, OrderQuery,
    OrderSource,
};
