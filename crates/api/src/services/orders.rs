//! Order workflow.
//!
//! Orders are created `Pending` and move through the status graph by admin or
//! baker updates. Updates that leave the graph (for example
//! `Completed -> Pending`) are applied but logged at WARN.
//!
//! An order addressed to a single baker is refused while that baker's
//! recorded subscription lies in the past. A baker who never subscribed is
//! not blocked.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use keik_core::{IdentityId, OrderId, OrderStatus, Price, ProductId, Role};

use crate::db::{
    BakerRepository, OrderRepository, OrderScope, ProductQuote, ProductRepository, RepositoryError,
};
use crate::error::AppError;
use crate::models::{NewOrder, Order, OrderPayload};
use crate::policy::authorize_order;
use crate::services::auth::Session;

const ORDER_NOT_FOUND: &str = "Order not found";
const INVALID_STATUS: &str = "Invalid status value";
const MISSING_FIELDS: &str = "Please provide all required fields";

/// Body of `POST /api/user/order`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CakeOrderInput {
    pub baker_id: Option<IdentityId>,
    pub cake_details: Option<String>,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductOrderInput {
    #[serde(default)]
    pub products: Vec<ProductLineInput>,
}

/// One requested product line.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductLineInput {
    pub product: ProductId,
    #[serde(default)]
    pub quantity: Option<i32>,
}

/// Body of the order status endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: Option<String>,
    pub estimated_arrival: Option<DateTime<Utc>>,
}

/// Order workflow service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
    bakers: BakerRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
            bakers: BakerRepository::new(pool),
        }
    }

    /// Place a free-text cake order with one baker.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if a field is missing or the baker's
    /// subscription has expired, `AppError::NotFound` if the baker is unknown.
    pub async fn create_cake_order(
        &self,
        customer: IdentityId,
        input: CakeOrderInput,
    ) -> Result<Order, AppError> {
        let details = input
            .cake_details
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let (Some(baker_id), Some(details)) = (input.baker_id, details) else {
            return Err(AppError::Validation(MISSING_FIELDS.to_string()));
        };

        let subscription = self
            .bakers
            .subscription(baker_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Home Baker not found".to_string()))?;
        if subscription.has_lapsed_at(Utc::now()) {
            return Err(expired());
        }

        let order = self
            .orders
            .create(&NewOrder {
                customer_id: customer,
                baker_id: Some(baker_id),
                payload: OrderPayload::CakeDetails(details),
                total_amount: None,
            })
            .await?;

        tracing::info!(order_id = %order.id, baker_id = %baker_id, "Cake order placed");
        Ok(order)
    }

    /// Place an order for catalog products. The total is priced from the
    /// catalog, and the baker is set when every product shares one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an empty list, a non-positive
    /// quantity, an unknown product, or an expired baker.
    pub async fn create_product_order(
        &self,
        customer: IdentityId,
        input: ProductOrderInput,
    ) -> Result<Order, AppError> {
        let lines = normalize_lines(input.products)?;

        let ids: Vec<ProductId> = lines.iter().map(|(id, _)| *id).collect();
        let quotes: HashMap<ProductId, ProductQuote> = self
            .products
            .quotes(&ids)
            .await?
            .into_iter()
            .map(|q| (q.id, q))
            .collect();

        let (total, baker_id) = price_lines(&lines, &quotes)?;
        if let Some(baker_id) = baker_id {
            let lapsed = self
                .bakers
                .subscription(baker_id)
                .await?
                .is_some_and(|s| s.has_lapsed_at(Utc::now()));
            if lapsed {
                return Err(expired());
            }
        }

        let order = self
            .orders
            .create(&NewOrder {
                customer_id: customer,
                baker_id,
                payload: OrderPayload::Products(lines),
                total_amount: Some(total),
            })
            .await?;

        tracing::info!(order_id = %order.id, total = %total, "Product order placed");
        Ok(order)
    }

    /// Orders in scope, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, scope: OrderScope) -> Result<Vec<Order>, AppError> {
        Ok(self.orders.list(scope).await?)
    }

    /// Orders visible to the caller: their own, their assigned ones, or all
    /// for an admin.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_for(&self, session: &Session) -> Result<Vec<Order>, AppError> {
        let scope = match session.role {
            Role::Admin => OrderScope::All,
            Role::Baker => OrderScope::AssignedTo(session.identity_id),
            Role::Customer => OrderScope::PlacedBy(session.identity_id),
        };
        self.list(scope).await
    }

    /// One order, if the caller owns it, is its baker, or is an admin.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if absent, `AppError::Forbidden` if the
    /// caller has no claim on it.
    pub async fn get(&self, id: OrderId, session: &Session) -> Result<Order, AppError> {
        let order = self.load(id).await?;
        authorize_order(session, &order)?;
        Ok(order)
    }

    /// Status update by the baker assigned to the order. Bakers may only set
    /// `In Progress`, `Completed` or `Cancelled`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a status the baker may not set,
    /// `AppError::NotFound` if the order is absent, `AppError::Forbidden` if
    /// it is assigned to another baker.
    pub async fn baker_update(
        &self,
        baker: IdentityId,
        id: OrderId,
        update: StatusUpdate,
    ) -> Result<Order, AppError> {
        let status = update.status.as_deref().map(parse_status).transpose()?;
        if status.is_some_and(|s| !OrderStatus::BAKER_SETTABLE.contains(&s)) {
            return Err(AppError::Validation(INVALID_STATUS.to_string()));
        }

        let current = self.load(id).await?;
        if !current.is_assigned_to(baker) {
            return Err(AppError::Forbidden("Access denied: Not your order".to_string()));
        }

        self.apply(&current, status, update.estimated_arrival).await
    }

    /// Status and arrival update by an admin. Both fields are optional.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an unrecognised status,
    /// `AppError::NotFound` if the order is absent.
    pub async fn admin_update(&self, id: OrderId, update: StatusUpdate) -> Result<Order, AppError> {
        let status = update.status.as_deref().map(parse_status).transpose()?;
        let current = self.load(id).await?;
        self.apply(&current, status, update.estimated_arrival).await
    }

    /// Status update through the generic order resource, where the status
    /// is required.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the status is missing or
    /// unrecognised, `AppError::NotFound` if the order is absent.
    pub async fn update(&self, id: OrderId, update: StatusUpdate) -> Result<Order, AppError> {
        if update.status.is_none() {
            return Err(AppError::Validation(INVALID_STATUS.to_string()));
        }
        self.admin_update(id, update).await
    }

    /// Remove an order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if absent.
    pub async fn delete(&self, id: OrderId) -> Result<(), AppError> {
        self.orders.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(ORDER_NOT_FOUND.to_string()),
            other => AppError::Database(other),
        })?;
        tracing::info!(order_id = %id, "Order deleted");
        Ok(())
    }

    async fn load(&self, id: OrderId) -> Result<Order, AppError> {
        self.orders
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(ORDER_NOT_FOUND.to_string()))
    }

    async fn apply(
        &self,
        current: &Order,
        status: Option<OrderStatus>,
        estimated_arrival: Option<DateTime<Utc>>,
    ) -> Result<Order, AppError> {
        if let Some(next) = status
            && next != current.status
            && !current.status.allows_transition_to(next)
        {
            tracing::warn!(
                order_id = %current.id,
                from = %current.status,
                to = %next,
                "Order status moved outside the lifecycle graph"
            );
        }

        self.orders
            .update_status(current.id, status, estimated_arrival)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AppError::NotFound(ORDER_NOT_FOUND.to_string()),
                other => AppError::Database(other),
            })
    }
}

fn expired() -> AppError {
    AppError::Validation("Home Baker subscription has expired".to_string())
}

fn parse_status(raw: &str) -> Result<OrderStatus, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(INVALID_STATUS.to_string()))
}

/// Apply the default quantity and merge repeated products.
fn normalize_lines(lines: Vec<ProductLineInput>) -> Result<Vec<(ProductId, i32)>, AppError> {
    if lines.is_empty() {
        return Err(AppError::Validation("Order must contain at least one product".to_string()));
    }

    let mut merged: Vec<(ProductId, i32)> = Vec::with_capacity(lines.len());
    for line in lines {
        let quantity = line.quantity.unwrap_or(1);
        if quantity <= 0 {
            return Err(AppError::Validation(
                "Quantity must be greater than zero".to_string(),
            ));
        }
        match merged.iter_mut().find(|(id, _)| *id == line.product) {
            Some((_, q)) => {
                *q = q.checked_add(quantity).ok_or_else(|| {
                    AppError::Validation("Quantity is too large".to_string())
                })?;
            }
            None => merged.push((line.product, quantity)),
        }
    }
    Ok(merged)
}

/// Total of the priced lines, plus the baker when every product shares one.
fn price_lines(
    lines: &[(ProductId, i32)],
    quotes: &HashMap<ProductId, ProductQuote>,
) -> Result<(Decimal, Option<IdentityId>), AppError> {
    let mut total = Decimal::ZERO;
    let mut bakers = BTreeSet::new();
    for (id, quantity) in lines {
        let quote = quotes
            .get(id)
            .ok_or_else(|| AppError::Validation(format!("Product {id} not found")))?;
        total = quote
            .price
            .times(*quantity)
            .and_then(|line| total.checked_add(line))
            .filter(|t| *t < Price::LIMIT)
            .ok_or_else(order_too_large)?;
        bakers.insert(quote.baker_id.as_i32());
    }

    let baker_id = match bakers.len() {
        1 => bakers.first().copied().map(IdentityId::new),
        _ => None,
    };
    Ok((total, baker_id))
}

fn order_too_large() -> AppError {
    AppError::Validation("Order total is too large".to_string())
}
