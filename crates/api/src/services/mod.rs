//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Credential store and session tokens
//! - `bakers` - Baker profiles, portfolio and subscription
//! - `catalog` - Product catalog
//! - `contact` - Contact form intake
//! - `email` - SMTP notifications
//! - `images` - Portfolio image hosting
//! - `orders` - Order workflow
//!
//! Services borrow the pool for the duration of one request and return
//! `AppError` directly, so handlers stay thin.

pub mod auth;
pub mod bakers;
pub mod catalog;
pub mod contact;
pub mod email;
pub mod images;
pub mod orders;

pub use auth::AuthService;
pub use bakers::BakerService;
pub use catalog::CatalogService;
pub use contact::ContactService;
pub use orders::OrderService;
