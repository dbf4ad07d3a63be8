//! Domain models returned by repositories and serialized to API clients.
//!
//! Field names serialize in `camelCase`, matching what the web client reads.
//! Password hashes never appear on these types.

pub mod baker;
pub mod contact;
pub mod identity;
pub mod order;
pub mod product;

pub use baker::{Baker, PastOrder, PortfolioEntry, ProfileUpdate};
pub use contact::{ContactMessage, NewContactMessage};
pub use identity::{Identity, Party};
pub use order::{NewOrder, Order, OrderLine, OrderLineProduct, OrderPayload};
pub use product::{NewProduct, Product, ProductUpdate};
