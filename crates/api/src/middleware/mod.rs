//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. CORS
//! 6. Panic catcher and body size limit
//!
//! Authentication is not a layer: handlers take the [`Authenticated`]
//! extractor and consult [`crate::policy`].

pub mod auth;
pub mod request_id;
pub mod security_headers;

pub use auth::{AUTH_TOKEN_HEADER, Authenticated};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
