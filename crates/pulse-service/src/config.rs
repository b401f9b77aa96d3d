//! # Pulse Configuration
//!
//! Configuration for the dashboard service and the `pulse-report` binary.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PULSE_TIMEZONE=Australia/Sydney                                    │
//! │     PULSE_PAGE_SIZE=100                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/storefront-pulse/pulse.toml (Linux)                      │
//! │     ~/Library/Application Support/com.storefront.pulse/pulse.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Australia/Brisbane, 250 records per page, 2/4/8 week thresholds    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pulse.toml
//! [business]
//! timezone = "Australia/Brisbane"
//!
//! [query]
//! page_size = 250
//! max_pages = 40
//! top_n = 10
//! series_variants = 3
//! fetch_timeout_secs = 20
//!
//! [inventory]
//! critical_below_weeks = 2.0
//! low_below_weeks = 4.0
//! adequate_below_weeks = 8.0
//! production_weeks = 12
//! air_freight_days = 7
//! sea_freight_weeks = 6
//! safety_buffer_weeks = 4
//! reorder_trigger_weeks = 14.0
//! velocity_window_weeks = 4
//! deposit_per_unit_cents = 10
//!
//! [store]
//! database_path = "/var/lib/pulse/inbound.db"
//! ```

use pulse_core::inventory::StockThresholds;
use pulse_core::reorder::ReorderPolicy;
use pulse_core::types::DEFAULT_DEPOSIT_PER_UNIT;
use pulse_core::{DateRangeResolver, Money};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};

const CONFIG_FILE_NAME: &str = "pulse.toml";
const DATABASE_FILE_NAME: &str = "inbound.db";

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete configuration.
///
/// Every section is optional in the file; missing sections and fields take
/// their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Business calendar settings.
    #[serde(default)]
    pub business: BusinessSettings,

    /// Order source paging and dashboard sizes.
    #[serde(default)]
    pub query: QuerySettings,

    /// Stock status thresholds and reorder policy.
    #[serde(default)]
    pub inventory: InventorySettings,

    /// Inbound order store location.
    #[serde(default)]
    pub store: StoreSettings,
}

impl PulseConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (pulse.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ServiceResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading pulse config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load pulse config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ServiceResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ServiceError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Pulse config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ServiceResult<()> {
        // Fails with UnknownTimezone
        DateRangeResolver::from_name(&self.business.timezone)?;

        if self.query.page_size == 0 {
            return Err(ServiceError::InvalidConfig(
                "page_size must be greater than 0".into(),
            ));
        }

        if self.query.max_pages == 0 {
            return Err(ServiceError::InvalidConfig(
                "max_pages must be greater than 0".into(),
            ));
        }

        if self.query.fetch_timeout_secs == 0 {
            return Err(ServiceError::InvalidConfig(
                "fetch_timeout_secs must be greater than 0".into(),
            ));
        }

        if !self.inventory.thresholds().is_ordered() {
            return Err(ServiceError::InvalidConfig(format!(
                "stock thresholds must increase: critical {} < low {} < adequate {}",
                self.inventory.critical_below_weeks,
                self.inventory.low_below_weeks,
                self.inventory.adequate_below_weeks
            )));
        }

        if self.inventory.deposit_per_unit_cents < 0 {
            return Err(ServiceError::InvalidConfig(
                "deposit_per_unit_cents must not be negative".into(),
            ));
        }

        if self.inventory.velocity_window_weeks == 0 {
            return Err(ServiceError::InvalidConfig(
                "velocity_window_weeks must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies `PULSE_*` overrides read through `lookup`. A value that does
    /// not parse is logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(tz) = lookup("PULSE_TIMEZONE") {
            debug!(timezone = %tz, "Overriding timezone from environment");
            self.business.timezone = tz;
        }

        if let Some(size) = parse_override::<u32>(&lookup, "PULSE_PAGE_SIZE") {
            debug!(page_size = size, "Overriding page size from environment");
            self.query.page_size = size;
        }

        if let Some(n) = parse_override::<usize>(&lookup, "PULSE_TOP_N") {
            debug!(top_n = n, "Overriding top-N from environment");
            self.query.top_n = n;
        }

        if let Some(path) = lookup("PULSE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.store.database_path = Some(PathBuf::from(path));
        }

        if let Some(secs) = parse_override::<u64>(&lookup, "PULSE_FETCH_TIMEOUT_SECS") {
            debug!(timeout_secs = secs, "Overriding fetch timeout from environment");
            self.query.fetch_timeout_secs = secs;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storefront", "pulse")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Builds the date-range resolver for the business timezone.
    pub fn resolver(&self) -> ServiceResult<DateRangeResolver> {
        Ok(DateRangeResolver::from_name(&self.business.timezone)?)
    }

    pub fn thresholds(&self) -> StockThresholds {
        self.inventory.thresholds()
    }

    pub fn reorder_policy(&self) -> ReorderPolicy {
        self.inventory.reorder_policy()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.query.fetch_timeout_secs)
    }

    /// Returns the inbound store path, falling back to the platform data dir.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.store.database_path.clone().or_else(|| {
            directories::ProjectDirs::from("com", "storefront", "pulse")
                .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
        })
    }
}

// =============================================================================
// Business Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessSettings {
    /// IANA timezone every calendar boundary is computed in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "Australia/Brisbane".to_string()
}

impl Default for BusinessSettings {
    fn default() -> Self {
        BusinessSettings {
            timezone: default_timezone(),
        }
    }
}

// =============================================================================
// Query Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySettings {
    /// Records requested per page. The platform caps this at 250.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Pages followed per window before the result is marked truncated.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Length of the top-variants list.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// How many of the top variants get their own trend series.
    #[serde(default = "default_series_variants")]
    pub series_variants: usize,

    /// Upper bound on one window fetch, all pages included (seconds).
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_page_size() -> u32 {
    pulse_core::DEFAULT_PAGE_SIZE
}

fn default_max_pages() -> u32 {
    40
}

fn default_top_n() -> usize {
    pulse_core::DEFAULT_TOP_N
}

fn default_series_variants() -> usize {
    3
}

fn default_fetch_timeout() -> u64 {
    20
}

impl Default for QuerySettings {
    fn default() -> Self {
        QuerySettings {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            top_n: default_top_n(),
            series_variants: default_series_variants(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

// =============================================================================
// Inventory Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySettings {
    #[serde(default = "default_critical_below")]
    pub critical_below_weeks: f64,

    #[serde(default = "default_low_below")]
    pub low_below_weeks: f64,

    #[serde(default = "default_adequate_below")]
    pub adequate_below_weeks: f64,

    /// Manufacturing time before a run ships.
    #[serde(default = "default_production_weeks")]
    pub production_weeks: u32,

    #[serde(default = "default_air_freight_days")]
    pub air_freight_days: u32,

    #[serde(default = "default_sea_freight_weeks")]
    pub sea_freight_weeks: u32,

    #[serde(default = "default_safety_buffer_weeks")]
    pub safety_buffer_weeks: u32,

    /// Cover below this many weeks flags a reorder.
    #[serde(default = "default_reorder_trigger_weeks")]
    pub reorder_trigger_weeks: f64,

    /// Trailing weeks of sales used for velocity.
    #[serde(default = "default_velocity_window_weeks")]
    pub velocity_window_weeks: u32,

    /// Manufacturer deposit owed per ordered unit, in cents.
    #[serde(default = "default_deposit_per_unit_cents")]
    pub deposit_per_unit_cents: i64,
}

fn default_critical_below() -> f64 {
    StockThresholds::default().critical_below_weeks
}

fn default_low_below() -> f64 {
    StockThresholds::default().low_below_weeks
}

fn default_adequate_below() -> f64 {
    StockThresholds::default().adequate_below_weeks
}

fn default_production_weeks() -> u32 {
    ReorderPolicy::default().production_weeks
}

fn default_air_freight_days() -> u32 {
    ReorderPolicy::default().air_freight_days
}

fn default_sea_freight_weeks() -> u32 {
    ReorderPolicy::default().sea_freight_weeks
}

fn default_safety_buffer_weeks() -> u32 {
    ReorderPolicy::default().safety_buffer_weeks
}

fn default_reorder_trigger_weeks() -> f64 {
    ReorderPolicy::default().reorder_trigger_weeks
}

fn default_velocity_window_weeks() -> u32 {
    4
}

fn default_deposit_per_unit_cents() -> i64 {
    DEFAULT_DEPOSIT_PER_UNIT.cents()
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            critical_below_weeks: default_critical_below(),
            low_below_weeks: default_low_below(),
            adequate_below_weeks: default_adequate_below(),
            production_weeks: default_production_weeks(),
            air_freight_days: default_air_freight_days(),
            sea_freight_weeks: default_sea_freight_weeks(),
            safety_buffer_weeks: default_safety_buffer_weeks(),
            reorder_trigger_weeks: default_reorder_trigger_weeks(),
            velocity_window_weeks: default_velocity_window_weeks(),
            deposit_per_unit_cents: default_deposit_per_unit_cents(),
        }
    }
}

impl InventorySettings {
    pub fn thresholds(&self) -> StockThresholds {
        StockThresholds {
            critical_below_weeks: self.critical_below_weeks,
            low_below_weeks: self.low_below_weeks,
            adequate_below_weeks: self.adequate_below_weeks,
        }
    }

    pub fn deposit_per_unit(&self) -> Money {
        Money::from_cents(self.deposit_per_unit_cents)
    }

    pub fn reorder_policy(&self) -> ReorderPolicy {
        ReorderPolicy {
            production_weeks: self.production_weeks,
            air_freight_days: self.air_freight_days,
            sea_freight_weeks: self.sea_freight_weeks,
            safety_buffer_weeks: self.safety_buffer_weeks,
            reorder_trigger_weeks: self.reorder_trigger_weeks,
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite file for inbound orders. Unset means the platform data dir.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

fn parse_override<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
