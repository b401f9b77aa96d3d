//! # Repository Module
//!
//! Database repository implementations for the inbound order store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DashboardService::inventory_report                                    │
//! │       │                                                                 │
//! │       │  db.inbound_orders().list_outstanding()                        │
//! │       ▼                                                                 │
//! │  InboundOrderRepository                                                │
//! │  ├── create / insert                                                   │
//! │  ├── get_by_id / list / list_for_sku / list_outstanding                │
//! │  ├── update_status / delete                                            │
//! │  └── count                                                             │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database (inbound_orders)                                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`inbound::InboundOrderRepository`] - Scheduled production shipments

pub mod inbound;
