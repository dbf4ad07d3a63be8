//! Order repository.
//!
//! Orders are stored in `customer_order`; product lines live in `order_item`
//! and are attached after the main query.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use keik_core::{IdentityId, OrderId, OrderStatus, ProductId};

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderLine, OrderLineProduct, OrderPayload, Party};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    customer_id: i32,
    customer_name: String,
    customer_email: String,
    baker_id: Option<i32>,
    baker_name: Option<String>,
    baker_email: Option<String>,
    cake_details: Option<String>,
    total_amount: Option<Decimal>,
    status: OrderStatus,
    estimated_arrival: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, products: Vec<OrderLine>) -> Order {
        let baker = match (self.baker_id, self.baker_name, self.baker_email) {
            (Some(id), Some(name), Some(email)) => Some(Party {
                id: IdentityId::new(id),
                name,
                email,
            }),
            _ => None,
        };

        Order {
            id: OrderId::new(self.id),
            customer: Party {
                id: IdentityId::new(self.customer_id),
                name: self.customer_name,
                email: self.customer_email,
            },
            baker,
            products,
            cake_details: self.cake_details,
            total_amount: self.total_amount,
            status: self.status,
            estimated_arrival: self.estimated_arrival,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: i32,
    product_id: Option<i32>,
    product_name: Option<String>,
    product_price: Option<Decimal>,
    quantity: i32,
}

impl From<OrderItemRow> for OrderLine {
    fn from(row: OrderItemRow) -> Self {
        let product = match (row.product_id, row.product_name, row.product_price) {
            (Some(id), Some(name), Some(price)) => Some(OrderLineProduct {
                id: ProductId::new(id),
                name,
                price,
            }),
            _ => None,
        };
        Self {
            product,
            quantity: row.quantity,
        }
    }
}

const ORDER_SELECT: &str = "\
    SELECT o.id, o.customer_id, c.name AS customer_name, c.email AS customer_email, \
           o.baker_id, b.name AS baker_name, b.email AS baker_email, \
           o.cake_details, o.total_amount, o.status, o.estimated_arrival, \
           o.created_at, o.updated_at \
    FROM customer_order o \
    JOIN identity c ON c.id = o.customer_id \
    LEFT JOIN identity b ON b.id = o.baker_id";

const ORDER_ORDERING: &str = "ORDER BY o.created_at DESC, o.id DESC";

/// Which orders to list.
#[derive(Debug, Clone, Copy)]
pub enum OrderScope {
    /// Every order.
    All,
    /// Orders placed by one customer.
    PlacedBy(IdentityId),
    /// Orders assigned to one baker.
    AssignedTo(IdentityId),
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders in scope, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, scope: OrderScope) -> Result<Vec<Order>, RepositoryError> {
        let query = match scope {
            OrderScope::All => format!("{ORDER_SELECT} {ORDER_ORDERING}"),
            OrderScope::PlacedBy(_) => {
                format!("{ORDER_SELECT} WHERE o.customer_id = $1 {ORDER_ORDERING}")
            }
            OrderScope::AssignedTo(_) => {
                format!("{ORDER_SELECT} WHERE o.baker_id = $1 {ORDER_ORDERING}")
            }
        };

        let mut q = sqlx::query_as::<_, OrderRow>(&query);
        if let OrderScope::PlacedBy(id) | OrderScope::AssignedTo(id) = scope {
            q = q.bind(id);
        }
        let rows = q.fetch_all(self.pool).await?;

        self.attach_items(rows).await
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Insert an order with status `Pending`, together with its product lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let cake_details = match &order.payload {
            OrderPayload::CakeDetails(details) => Some(details.as_str()),
            OrderPayload::Products(_) => None,
        };

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO customer_order (customer_id, baker_id, cake_details, total_amount, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(order.customer_id)
        .bind(order.baker_id)
        .bind(cake_details)
        .bind(order.total_amount)
        .bind(OrderStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        if let OrderPayload::Products(lines) = &order.payload {
            let (product_ids, quantities): (Vec<i32>, Vec<i32>) =
                lines.iter().map(|(p, q)| (p.as_i32(), *q)).unzip();
            sqlx::query(
                "INSERT INTO order_item (order_id, product_id, quantity) \
                 SELECT $1, p, q FROM UNNEST($2::int4[], $3::int4[]) AS t(p, q)",
            )
            .bind(id)
            .bind(&product_ids)
            .bind(&quantities)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get(OrderId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Set status and/or estimated arrival. `None` leaves a field unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: Option<OrderStatus>,
        estimated_arrival: Option<DateTime<Utc>>,
    ) -> Result<Order, RepositoryError> {
        let result = sqlx::query(
            "UPDATE customer_order SET \
                status = COALESCE($2, status), \
                estimated_arrival = COALESCE($3, estimated_arrival), \
                updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(estimated_arrival)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete an order and its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customer_order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT i.order_id, i.product_id, p.name AS product_name, \
                    p.price AS product_price, i.quantity \
             FROM order_item i \
             LEFT JOIN product p ON p.id = i.product_id \
             WHERE i.order_id = ANY($1) \
             ORDER BY i.id",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<i32, Vec<OrderLine>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect())
    }
}
