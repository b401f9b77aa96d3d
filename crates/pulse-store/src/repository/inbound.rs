//! # Inbound Order Repository
//!
//! Persistence for scheduled production shipments.
//!
//! ## Status Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create()                                                              │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  ┌─────────┐  update_status   ┌────────────┐  update_status  ┌───────┐ │
//! │  │ pending │ ───────────────► │ in_transit │ ──────────────► │arrived│ │
//! │  └────┬────┘                  └─────┬──────┘                 └───────┘ │
//! │       │                             │                                   │
//! │       └──────────► cancelled ◄──────┘                                   │
//! │                                                                         │
//! │  list_outstanding() = pending + in_transit                             │
//! │  (the only rows that add to effective on-hand)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Status changes are not restricted to the arrows above; a mistaken
//! `arrived` can be set back to `in_transit`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use pulse_core::validation::validate_inbound_order;
use pulse_core::{FreightMode, InboundOrder, InboundStatus, Money};

const SELECT_COLUMNS: &str = r#"
    SELECT
        id,
        sku,
        quantity,
        freight_mode,
        expected_arrival,
        deposit_paid_cents,
        status,
        notes,
        created_at
    FROM inbound_orders
"#;

const ORDER_BY_ARRIVAL: &str = "ORDER BY expected_arrival ASC, created_at ASC, id ASC";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct InboundOrderRow {
    id: String,
    sku: String,
    quantity: i64,
    freight_mode: FreightMode,
    expected_arrival: NaiveDate,
    deposit_paid_cents: i64,
    status: InboundStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<InboundOrderRow> for InboundOrder {
    fn from(row: InboundOrderRow) -> Self {
        InboundOrder {
            id: row.id,
            sku: row.sku,
            quantity: row.quantity,
            freight_mode: row.freight_mode,
            expected_arrival: row.expected_arrival,
            deposit_paid: Money::from_cents(row.deposit_paid_cents),
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

/// Fields supplied when scheduling a new shipment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInboundOrder {
    pub sku: String,
    pub quantity: i64,
    pub freight_mode: FreightMode,
    pub expected_arrival: NaiveDate,
    pub deposit_paid: Money,
    pub notes: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for inbound shipment operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.inbound_orders();
///
/// let order = repo.create(NewInboundOrder { sku: "102270".into(), .. }).await?;
/// repo.update_status(&order.id, InboundStatus::InTransit).await?;
/// let outstanding = repo.list_outstanding().await?;
/// ```
#[derive(Debug, Clone)]
pub struct InboundOrderRepository {
    pool: SqlitePool,
}

impl InboundOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InboundOrderRepository { pool }
    }

    /// Schedules a new shipment with a fresh id and `pending` status.
    pub async fn create(&self, new: NewInboundOrder) -> DbResult<InboundOrder> {
        let order = InboundOrder {
            id: Uuid::new_v4().to_string(),
            sku: new.sku.trim().to_string(),
            quantity: new.quantity,
            freight_mode: new.freight_mode,
            expected_arrival: new.expected_arrival,
            deposit_paid: new.deposit_paid,
            status: InboundStatus::Pending,
            notes: new.notes.filter(|n| !n.trim().is_empty()),
            created_at: Utc::now(),
        };

        self.insert(&order).await?;
        Ok(order)
    }

    /// Inserts a fully formed order, keeping its id.
    ///
    /// ## Errors
    /// - `DbError::Invalid` if the order fails validation
    /// - `DbError::UniqueViolation` if the id already exists
    pub async fn insert(&self, order: &InboundOrder) -> DbResult<()> {
        validate_inbound_order(order)?;

        debug!(
            id = %order.id,
            sku = %order.sku,
            quantity = order.quantity,
            freight = %order.freight_mode,
            "Inserting inbound order"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO inbound_orders (
                id, sku, quantity, freight_mode, expected_arrival,
                deposit_paid_cents, status, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(&order.sku)
        .bind(order.quantity)
        .bind(order.freight_mode)
        .bind(order.expected_arrival)
        .bind(order.deposit_paid.cents())
        .bind(order.status)
        .bind(&order.notes)
        .bind(order.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(id = %order.id, sku = %order.sku, "Inbound order stored");
                Ok(())
            }
            Err(err) => match DbError::from(err) {
                DbError::UniqueViolation { .. } => Err(DbError::duplicate("id", &order.id)),
                other => Err(other),
            },
        }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InboundOrder>> {
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, InboundOrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(InboundOrder::from))
    }

    /// All shipments, earliest expected arrival first.
    pub async fn list(&self) -> DbResult<Vec<InboundOrder>> {
        let sql = format!("{} {}", SELECT_COLUMNS, ORDER_BY_ARRIVAL);
        let rows = sqlx::query_as::<_, InboundOrderRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(InboundOrder::from).collect())
    }

    pub async fn list_for_sku(&self, sku: &str) -> DbResult<Vec<InboundOrder>> {
        let sql = format!("{} WHERE sku = ?1 {}", SELECT_COLUMNS, ORDER_BY_ARRIVAL);
        let rows = sqlx::query_as::<_, InboundOrderRow>(&sql)
            .bind(sku)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(InboundOrder::from).collect())
    }

    /// Shipments still counted as inbound (`pending` or `in_transit`).
    pub async fn list_outstanding(&self) -> DbResult<Vec<InboundOrder>> {
        let sql = format!(
            "{} WHERE status IN (?1, ?2) {}",
            SELECT_COLUMNS, ORDER_BY_ARRIVAL
        );
        let rows = sqlx::query_as::<_, InboundOrderRow>(&sql)
            .bind(InboundStatus::Pending)
            .bind(InboundStatus::InTransit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Loaded outstanding inbound orders");
        Ok(rows.into_iter().map(InboundOrder::from).collect())
    }

    pub async fn update_status(&self, id: &str, status: InboundStatus) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE inbound_orders SET
                status = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InboundOrder", id));
        }

        info!(id = %id, status = %status, "Inbound order status updated");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM inbound_orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InboundOrder", id));
        }

        info!(id = %id, "Inbound order deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inbound_orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> InboundOrderRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.inbound_orders()
    }

    fn shipment(sku: &str, quantity: i64, arrival_day: u32) -> NewInboundOrder {
        NewInboundOrder {
            sku: sku.to_string(),
            quantity,
            freight_mode: FreightMode::Sea,
            expected_arrival: NaiveDate::from_ymd_opt(2025, 12, arrival_day).unwrap(),
            deposit_paid: Money::from_cents(250_000),
            notes: Some("first production run".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repo().await;
        let created = repo.create(shipment("102270", 5000, 1)).await.unwrap();

        assert_eq!(created.status, InboundStatus::Pending);
        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.sku, "102270");
        assert_eq!(fetched.quantity, 5000);
        assert_eq!(fetched.freight_mode, FreightMode::Sea);
        assert_eq!(fetched.deposit_paid.cents(), 250_000);
        assert_eq!(fetched.expected_arrival, created.expected_arrival);
        assert_eq!(fetched.notes.as_deref(), Some("first production run"));

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_orders_by_arrival() {
        let repo = repo().await;
        repo.create(shipment("A", 10, 20)).await.unwrap();
        repo.create(shipment("B", 10, 5)).await.unwrap();
        repo.create(shipment("A", 10, 12)).await.unwrap();

        let days: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .iter()
            .map(|o| o.expected_arrival.format("%d").to_string())
            .collect();
        assert_eq!(days, vec!["05", "12", "20"]);

        assert_eq!(repo.list_for_sku("A").await.unwrap().len(), 2);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_outstanding_excludes_arrived_and_cancelled() {
        let repo = repo().await;
        let a = repo.create(shipment("A", 100, 1)).await.unwrap();
        let b = repo.create(shipment("A", 200, 2)).await.unwrap();
        let c = repo.create(shipment("A", 300, 3)).await.unwrap();
        let d = repo.create(shipment("A", 400, 4)).await.unwrap();

        repo.update_status(&b.id, InboundStatus::InTransit).await.unwrap();
        repo.update_status(&c.id, InboundStatus::Arrived).await.unwrap();
        repo.update_status(&d.id, InboundStatus::Cancelled).await.unwrap();

        let outstanding = repo.list_outstanding().await.unwrap();
        let ids: Vec<_> = outstanding.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), b.id.as_str()]);
        assert_eq!(outstanding[1].status, InboundStatus::InTransit);
    }

    #[tokio::test]
    async fn test_missing_rows_report_not_found() {
        let repo = repo().await;
        assert!(matches!(
            repo.update_status("nope", InboundStatus::Arrived).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(repo.delete("nope").await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        let order = repo.create(shipment("A", 1, 1)).await.unwrap();
        repo.delete(&order.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_orders_are_rejected() {
        let repo = repo().await;
        let result = repo.create(shipment("A", 0, 1)).await;
        assert!(matches!(result, Err(DbError::Invalid(_))));

        let result = repo.create(shipment("   ", 10, 1)).await;
        assert!(matches!(result, Err(DbError::Invalid(_))));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_id() {
        let repo = repo().await;
        let order = repo.create(shipment("A", 10, 1)).await.unwrap();
        assert!(matches!(
            repo.insert(&order).await,
            Err(DbError::UniqueViolation { .. })
        ));
    }
}
