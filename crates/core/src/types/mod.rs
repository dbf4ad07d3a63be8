//! Core types for Keik Craveiess.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod status;
pub mod subscription;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use role::{Role, RoleError};
pub use status::{OrderStatus, OrderStatusError};
pub use subscription::Subscription;
