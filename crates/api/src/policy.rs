//! Authorization policy.
//!
//! One table maps every operation to the access rule it requires. Handlers
//! authenticate the caller with the [`Authenticated`](crate::middleware::Authenticated)
//! extractor and then call [`authorize`] once; operations guarded by
//! ownership additionally call [`authorize_order`] with the loaded order.

use keik_core::Role;

use crate::error::AppError;
use crate::models::Order;
use crate::services::auth::Session;

/// Every operation the API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    Login,
    SubmitContact,
    ListProducts,
    GetProduct,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    ListBakers,
    DeleteBaker,
    ListCustomers,
    DeleteCustomer,
    ListAllOrders,
    AdminUpdateOrder,
    GetOwnProfile,
    UpdateOwnProfile,
    UploadPortfolio,
    ListPortfolio,
    ListAssignedOrders,
    BakerUpdateOrder,
    Subscribe,
    ListActiveBakers,
    PlaceCakeOrder,
    ListPlacedOrders,
    PlaceProductOrder,
    ListOrders,
    GetOrder,
    UpdateOrder,
    DeleteOrder,
}

/// What a caller needs to perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, with or without a token.
    Public,
    /// Any valid token.
    Authenticated,
    /// A valid token carrying exactly this role.
    Role(Role),
    /// The order's customer, its assigned baker, or an admin.
    OwnerOrAdmin,
}

impl Operation {
    /// The policy table.
    #[must_use]
    pub const fn access(self) -> Access {
        match self {
            Self::Register
            | Self::Login
            | Self::SubmitContact
            | Self::ListProducts
            | Self::GetProduct => Access::Public,

            Self::CreateProduct
            | Self::UpdateProduct
            | Self::DeleteProduct
            | Self::ListBakers
            | Self::DeleteBaker
            | Self::ListCustomers
            | Self::DeleteCustomer
            | Self::ListAllOrders
            | Self::AdminUpdateOrder
            | Self::UpdateOrder
            | Self::DeleteOrder => Access::Role(Role::Admin),

            Self::GetOwnProfile
            | Self::UpdateOwnProfile
            | Self::UploadPortfolio
            | Self::ListPortfolio
            | Self::ListAssignedOrders
            | Self::BakerUpdateOrder
            | Self::Subscribe => Access::Role(Role::Baker),

            Self::ListActiveBakers
            | Self::PlaceCakeOrder
            | Self::ListPlacedOrders
            | Self::PlaceProductOrder => Access::Role(Role::Customer),

            Self::ListOrders => Access::Authenticated,

            Self::GetOrder => Access::OwnerOrAdmin,
        }
    }
}

/// Message returned when a caller's role does not match.
#[must_use]
pub const fn role_denied_message(required: Role) -> &'static str {
    match required {
        Role::Admin => "Access denied: Admins only",
        Role::Baker => "Access denied: Home Bakers only",
        Role::Customer => "Access denied: Users only",
    }
}

/// Check the caller against the operation's rule.
///
/// `OwnerOrAdmin` only requires a session here; ownership is decided by
/// [`authorize_order`] once the order is loaded.
///
/// # Errors
///
/// Returns `AppError::Forbidden` if the session's role does not satisfy the rule.
pub fn authorize(op: Operation, session: &Session) -> Result<(), AppError> {
    match op.access() {
        Access::Public | Access::Authenticated | Access::OwnerOrAdmin => Ok(()),
        Access::Role(required) if session.role == required => Ok(()),
        Access::Role(required) => {
            tracing::debug!(
                operation = ?op,
                role = %session.role,
                required = %required,
                "Role check failed"
            );
            Err(AppError::Forbidden(role_denied_message(required).to_string()))
        }
    }
}

/// Check ownership of a loaded order for an `OwnerOrAdmin` operation.
///
/// # Errors
///
/// Returns `AppError::Forbidden` unless the caller placed the order, is its
/// assigned baker, or is an admin.
pub fn authorize_order(session: &Session, order: &Order) -> Result<(), AppError> {
    let allowed = match session.role {
        Role::Admin => true,
        Role::Customer => order.is_placed_by(session.identity_id),
        Role::Baker => order.is_assigned_to(session.identity_id),
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden("Access denied".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use keik_core::{IdentityId, OrderId, OrderStatus};

    use super::*;
    use crate::models::Party;

    fn session(id: i32, role: Role) -> Session {
        Session {
            identity_id: IdentityId::new(id),
            role,
        }
    }

    fn party(id: i32) -> Party {
        Party {
            id: IdentityId::new(id),
            name: String::new(),
            email: String::new(),
        }
    }

    fn order(customer: i32, baker: Option<i32>) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(9),
            customer: party(customer),
            baker: baker.map(party),
            products: Vec::new(),
            cake_details: None,
            total_amount: None,
            status: OrderStatus::Pending,
            estimated_arrival: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_role_rules() {
        assert!(authorize(Operation::CreateProduct, &session(1, Role::Admin)).is_ok());
        let err = authorize(Operation::CreateProduct, &session(1, Role::Baker)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(m) if m == "Access denied: Admins only"));

        let err = authorize(Operation::Subscribe, &session(1, Role::Customer)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(m) if m == "Access denied: Home Bakers only"));

        let err = authorize(Operation::PlaceCakeOrder, &session(1, Role::Admin)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(m) if m == "Access denied: Users only"));
    }

    #[test]
    fn test_any_session_may_list_orders() {
        for role in Role::ALL {
            assert!(authorize(Operation::ListOrders, &session(1, role)).is_ok());
        }
    }

    #[test]
    fn test_every_mutation_requires_a_role() {
        for op in [
            Operation::CreateProduct,
            Operation::UpdateProduct,
            Operation::DeleteProduct,
            Operation::DeleteBaker,
            Operation::DeleteCustomer,
            Operation::UpdateOrder,
            Operation::DeleteOrder,
            Operation::BakerUpdateOrder,
            Operation::PlaceCakeOrder,
            Operation::PlaceProductOrder,
        ] {
            assert!(matches!(op.access(), Access::Role(_)), "{op:?}");
        }
    }

    #[test]
    fn test_order_ownership() {
        let o = order(1, Some(2));
        assert!(authorize_order(&session(1, Role::Customer), &o).is_ok());
        assert!(authorize_order(&session(2, Role::Baker), &o).is_ok());
        assert!(authorize_order(&session(99, Role::Admin), &o).is_ok());
        assert!(authorize_order(&session(3, Role::Customer), &o).is_err());
        assert!(authorize_order(&session(3, Role::Baker), &o).is_err());
    }
}
