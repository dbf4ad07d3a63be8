//! Order domain types.
//!
//! An order carries either a list of catalog products or a free-text cake
//! description addressed to one baker. Both shapes share the same status
//! lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use keik_core::{IdentityId, OrderId, OrderStatus, ProductId};

use super::Party;

/// An order joined with the display fields of its customer and baker.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer: Party,
    /// `None` for product orders spanning several bakers, or after the
    /// assigned baker was removed.
    pub baker: Option<Party>,
    pub products: Vec<OrderLine>,
    pub cake_details: Option<String>,
    pub total_amount: Option<Decimal>,
    pub status: OrderStatus,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether `identity` placed this order.
    #[must_use]
    pub fn is_placed_by(&self, identity: IdentityId) -> bool {
        self.customer.id == identity
    }

    /// Whether `identity` is the baker this order is assigned to.
    #[must_use]
    pub fn is_assigned_to(&self, identity: IdentityId) -> bool {
        self.baker.as_ref().is_some_and(|b| b.id == identity)
    }
}

/// One product line of an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    /// `None` once the product has been removed from the catalog.
    pub product: Option<OrderLineProduct>,
    pub quantity: i32,
}

/// Product fields shown on an order line.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLineProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
}

/// What the customer is ordering.
#[derive(Debug, Clone)]
pub enum OrderPayload {
    /// Catalog products with quantities.
    Products(Vec<(ProductId, i32)>),
    /// Free-text description of a custom cake.
    CakeDetails(String),
}

/// A validated order, ready to insert with status `Pending`.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: IdentityId,
    pub baker_id: Option<IdentityId>,
    pub payload: OrderPayload,
    pub total_amount: Option<Decimal>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn party(id: i32) -> Party {
        Party {
            id: IdentityId::new(id),
            name: format!("party-{id}"),
            email: format!("p{id}@keik.test"),
        }
    }

    fn order(customer: i32, baker: Option<i32>) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(1),
            customer: party(customer),
            baker: baker.map(party),
            products: Vec::new(),
            cake_details: Some("chocolate".to_string()),
            total_amount: None,
            status: OrderStatus::Pending,
            estimated_arrival: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_ownership_checks() {
        let o = order(1, Some(2));
        assert!(o.is_placed_by(IdentityId::new(1)));
        assert!(!o.is_placed_by(IdentityId::new(2)));
        assert!(o.is_assigned_to(IdentityId::new(2)));
        assert!(!o.is_assigned_to(IdentityId::new(1)));
        assert!(!order(1, None).is_assigned_to(IdentityId::new(2)));
    }

    #[test]
    fn test_serializes_camel_case_with_display_status() {
        let json = serde_json::to_value(order(1, Some(2))).unwrap();
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["cakeDetails"], "chocolate");
        assert_eq!(json["baker"]["id"], 2);
        assert!(json["estimatedArrival"].is_null());
    }
}
