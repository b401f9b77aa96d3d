//! # Order Source
//!
//! The boundary between the dashboard and wherever orders come from.
//!
//! ## Paging
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        fetch_window()                                   │
//! │                                                                         │
//! │  OrderQuery { window, sku?, page_size, token: None }                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  source.fetch_page() ──► OrderPage { records, has_more, next_token }   │
//! │       │                        │                                        │
//! │       │                        ▼                                        │
//! │       │                 partition_orders() ──► accepted / quarantined  │
//! │       │                                                                 │
//! │       ├── has_more && pages < max_pages ──► token = next_token, loop   │
//! │       ├── has_more && pages == max_pages ──► truncated = true, stop    │
//! │       └── !has_more ──► done                                           │
//! │                                                                         │
//! │  The whole loop runs under one tokio::time::timeout.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A single page is never assumed to be the whole window; only `has_more`
//! says whether more records exist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::types::{OrderRecord, PeriodWindow};
use pulse_core::validation::{partition_orders, QuarantinedOrder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::QuerySettings;
use crate::error::{ServiceResult, SourceError};

// =============================================================================
// Query / Page Shapes
// =============================================================================

/// One page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Exclude orders stamped exactly on `window_end`.
    #[serde(default)]
    pub end_exclusive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku_filter: Option<String>,
    pub page_size: u32,
    /// Opaque continuation token from the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

impl OrderQuery {
    /// First-page query for a window.
    pub fn for_window(window: &PeriodWindow, sku: Option<&str>, page_size: u32) -> Self {
        OrderQuery {
            window_start: window.start,
            window_end: window.end,
            end_exclusive: window.end_exclusive,
            sku_filter: sku.map(str::to_string),
            page_size,
            page_token: None,
        }
    }

    pub fn covers(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.window_start
            && if self.end_exclusive {
                instant < self.window_end
            } else {
                instant <= self.window_end
            }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub records: Vec<OrderRecord>,
    pub has_more: bool,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

// =============================================================================
// Source Trait
// =============================================================================

/// Anything that can answer paged order queries.
///
/// The dashboard is handed a source; it never builds one itself, so tests
/// substitute a fixture.
#[async_trait]
pub trait OrderSource: Send + Sync {
    async fn fetch_page(&self, query: &OrderQuery) -> Result<OrderPage, SourceError>;
}

// =============================================================================
// Window Fetching
// =============================================================================

/// Paging limits for one window fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub page_size: u32,
    pub max_pages: u32,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions::from(&QuerySettings::default())
    }
}

impl From<&QuerySettings> for FetchOptions {
    fn from(settings: &QuerySettings) -> Self {
        FetchOptions {
            page_size: settings.page_size,
            max_pages: settings.max_pages,
            timeout: Duration::from_secs(settings.fetch_timeout_secs),
        }
    }
}

/// Every valid order in a window, plus what was left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedOrders {
    pub orders: Vec<OrderRecord>,
    pub quarantined: Vec<QuarantinedOrder>,
    pub pages: u32,
    /// The page cap was hit (or the source stopped handing out tokens)
    /// while it still reported more records.
    pub truncated: bool,
}

/// Fetches every page of a window.
///
/// Malformed records are quarantined, not returned. The whole fetch is bounded
/// by `options.timeout`.
pub async fn fetch_window<S>(
    source: &S,
    window: &PeriodWindow,
    sku: Option<&str>,
    options: FetchOptions,
) -> Result<FetchedOrders, SourceError>
where
    S: OrderSource + ?Sized,
{
    match tokio::time::timeout(options.timeout, fetch_all_pages(source, window, sku, options)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(window = %window.label, timeout_secs = options.timeout.as_secs(), "Order fetch timed out");
            Err(SourceError::Timeout(options.timeout.as_secs()))
        }
    }
}

async fn fetch_all_pages<S>(
    source: &S,
    window: &PeriodWindow,
    sku: Option<&str>,
    options: FetchOptions,
) -> Result<FetchedOrders, SourceError>
where
    S: OrderSource + ?Sized,
{
    let mut query = OrderQuery::for_window(window, sku, options.page_size);
    let mut fetched = FetchedOrders::default();

    loop {
        let page = source.fetch_page(&query).await?;
        fetched.pages += 1;

        let (accepted, quarantined) = partition_orders(page.records);
        if !quarantined.is_empty() {
            warn!(count = quarantined.len(), window = %window.label, "Quarantined malformed order records");
        }
        fetched.orders.extend(accepted);
        fetched.quarantined.extend(quarantined);

        if !page.has_more {
            break;
        }

        let Some(token) = page.next_page_token else {
            warn!(window = %window.label, "Source reported more pages without a token");
            fetched.truncated = true;
            break;
        };

        if fetched.pages >= options.max_pages {
            warn!(
                window = %window.label,
                max_pages = options.max_pages,
                "Page cap reached, window is incomplete"
            );
            fetched.truncated = true;
            break;
        }

        query.page_token = Some(token);
    }

    debug!(
        window = %window.label,
        sku = sku.unwrap_or("*"),
        orders = fetched.orders.len(),
        pages = fetched.pages,
        "Window fetched"
    );

    Ok(fetched)
}

// =============================================================================
// In-Memory Source
// =============================================================================

/// A source backed by a fixed list of orders.
///
/// Page tokens are record offsets into the filtered, time-ordered list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderSource {
    orders: Vec<OrderRecord>,
}

impl InMemoryOrderSource {
    pub fn new(mut orders: Vec<OrderRecord>) -> Self {
        orders.sort_by_key(|o| o.created_at);
        InMemoryOrderSource { orders }
    }

    /// Reads a JSON array of order records.
    pub async fn from_json_file(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await?;
        let orders: Vec<OrderRecord> = serde_json::from_str(&contents)?;
        info!(path = %path.display(), count = orders.len(), "Loaded order fixture");
        Ok(Self::new(orders))
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[async_trait]
impl OrderSource for InMemoryOrderSource {
    async fn fetch_page(&self, query: &OrderQuery) -> Result<OrderPage, SourceError> {
        let offset = match &query.page_token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| SourceError::InvalidPageToken(token.clone()))?,
        };

        let matching: Vec<&OrderRecord> = self
            .orders
            .iter()
            .filter(|o| query.covers(o.created_at))
            .filter(|o| match &query.sku_filter {
                Some(sku) => o.contains_sku(sku),
                None => true,
            })
            .collect();

        if offset > matching.len() {
            return Err(SourceError::InvalidPageToken(offset.to_string()));
        }

        let end = (offset + query.page_size.max(1) as usize).min(matching.len());
        let has_more = end < matching.len();

        Ok(OrderPage {
            records: matching[offset..end].iter().map(|o| (*o).clone()).collect(),
            has_more,
            next_page_token: has_more.then(|| end.to_string()),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
