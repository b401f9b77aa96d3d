//! # pulse-store: Inbound Shipment Store for Storefront Pulse
//!
//! Persists scheduled production shipments in SQLite. It is the only state
//! the analytics system keeps; everything else is recomputed per query.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  pulse-service (DashboardService::inventory_report)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   pulse-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐   ┌──────────────┐ │   │
//! │  │   │   Database    │    │  Repository      │   │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │◄───│  InboundOrder    │   │  (embedded)  │ │   │
//! │  │   └───────────────┘    └──────────────────┘   └──────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (platform data dir, or --db path)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pulse_store::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("pulse.db")).await?;
//! let outstanding = db.inbound_orders().list_outstanding().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};
pub use repository::inbound::{InboundOrderRepository, NewInboundOrder};
