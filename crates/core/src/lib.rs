//! Keik Core - Shared types library.
//!
//! This crate provides the domain types used across the Keik Craveiess
//! bakery marketplace:
//! - `api` - REST service for customers, home bakers, and admins
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, roles, order statuses, prices, and
//!   subscription arithmetic

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
