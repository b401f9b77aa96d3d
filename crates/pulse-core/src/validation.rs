//! # Validation Module
//!
//! Record validation for data entering the aggregation engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  └── Shape: required fields, numeric types, timestamps                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Orders: quarantine records that would corrupt aggregates          │
//! │  └── Inbound orders: reject before they hit the store                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite CHECK constraints, inbound orders only)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A malformed order is never coerced to zeros. It is set aside with a
//! reason so the caller can report how much of a page was unusable.
//!
//! ## Usage
//! ```rust
//! use pulse_core::validation::validate_sku;
//!
//! assert!(validate_sku("102270").is_ok());
//! assert!(validate_sku("  ").is_err());
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{InboundOrder, LineItem, OrderRecord};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// An order that failed validation, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuarantinedOrder {
    pub id: String,
    pub reason: String,
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a SKU. SKUs are opaque, so the only rule is "not blank".
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    if sku.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }
    Ok(())
}

fn validate_line_item(item: &LineItem) -> ValidationResult<()> {
    validate_sku(&item.sku)?;

    if item.quantity < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }

    if item.amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "line amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates one order record.
///
/// ## Rules
/// - `id` must not be blank
/// - `totalAmount` must not be negative
/// - every line item has a SKU, `quantity >= 0` and a non-negative amount
///
/// Orders with no line items are valid: they still count toward order totals.
pub fn validate_order(order: &OrderRecord) -> ValidationResult<()> {
    if order.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    if order.total_amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "totalAmount".to_string(),
        });
    }

    order.line_items.iter().try_for_each(validate_line_item)
}

/// Splits a batch into valid orders and quarantined ones.
///
/// Accepted orders keep their original relative order.
pub fn partition_orders(orders: Vec<OrderRecord>) -> (Vec<OrderRecord>, Vec<QuarantinedOrder>) {
    let mut accepted = Vec::with_capacity(orders.len());
    let mut quarantined = Vec::new();

    for order in orders {
        match validate_order(&order) {
            Ok(()) => accepted.push(order),
            Err(err) => quarantined.push(QuarantinedOrder {
                id: order.id,
                reason: err.to_string(),
            }),
        }
    }

    (accepted, quarantined)
}

/// Validates an inbound shipment before it is stored.
pub fn validate_inbound_order(order: &InboundOrder) -> ValidationResult<()> {
    validate_sku(&order.sku)?;

    if order.quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if order.deposit_paid.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "deposit_paid".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{FreightMode, InboundStatus};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn order(id: &str, quantity: i64, amount: i64) -> OrderRecord {
        OrderRecord {
            id: id.to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap(),
            total_amount: Money::from_cents(amount.max(0)),
            line_items: vec![LineItem {
                sku: "A".to_string(),
                quantity,
                variant_title: String::new(),
                product_title: String::new(),
                amount: Money::from_cents(amount),
            }],
        }
    }

    #[test]
    fn test_validate_order() {
        assert!(validate_order(&order("1", 2, 100)).is_ok());
        assert!(validate_order(&order("1", 0, 0)).is_ok());
        assert!(validate_order(&order(" ", 2, 100)).is_err());
        assert!(validate_order(&order("1", -1, 100)).is_err());
        assert!(validate_order(&order("1", 1, -100)).is_err());
    }

    #[test]
    fn test_partition_keeps_order_and_reasons() {
        let batch = vec![order("1", 1, 10), order("2", -3, 10), order("3", 2, 20)];
        let (accepted, quarantined) = partition_orders(batch);

        let ids: Vec<_> = accepted.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(quarantined.len(), 1);
        assert_eq!(quarantined[0].id, "2");
        assert_eq!(quarantined[0].reason, "quantity must not be negative");
    }

    #[test]
    fn test_validate_inbound_order() {
        let mut inbound = InboundOrder {
            id: "x".to_string(),
            sku: "A".to_string(),
            quantity: 500,
            freight_mode: FreightMode::Sea,
            expected_arrival: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            deposit_paid: Money::from_cents(0),
            status: InboundStatus::Pending,
            notes: None,
            created_at: Utc::now(),
        };
        assert!(validate_inbound_order(&inbound).is_ok());

        inbound.quantity = 0;
        assert!(matches!(
            validate_inbound_order(&inbound),
            Err(ValidationError::MustBePositive { .. })
        ));

        inbound.quantity = 1;
        inbound.sku = String::new();
        assert!(validate_inbound_order(&inbound).is_err());
    }
}
