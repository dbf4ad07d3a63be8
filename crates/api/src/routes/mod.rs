//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Welcome text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (database ping)
//!
//! # Auth (public)
//! POST /api/auth/register           - Create an identity in a role partition
//! POST /api/auth/login              - Issue a session token
//!
//! # Admin
//! GET    /api/admin/homebakers      - All bakers with profiles
//! DELETE /api/admin/homebakers/{id} - Remove a baker
//! GET    /api/admin/users           - All customers
//! DELETE /api/admin/users/{id}      - Remove a customer
//! GET    /api/admin/orders          - All orders
//! PUT    /api/admin/orders/{id}     - Set status and/or estimated arrival
//!
//! # Home baker
//! GET/PUT /api/homebaker/profile    - Own profile
//! POST    /api/homebaker/upload     - Portfolio images (multipart `images`)
//! GET     /api/homebaker/pastworks  - Own portfolio
//! GET     /api/homebaker/orders     - Assigned orders
//! PUT     /api/homebaker/orders/{id} - Update an assigned order
//!
//! # Customer
//! GET  /api/user/bakers             - Bakers with an active subscription
//! POST /api/user/order              - Cake order with one baker
//! GET  /api/user/orders             - Own orders
//!
//! # Catalog
//! GET    /api/products(/{id})       - Public browsing
//! POST   /api/products              - Admin
//! PUT    /api/products/{id}         - Admin
//! DELETE /api/products/{id}         - Admin
//!
//! # Orders
//! GET/POST /api/orders              - Visible orders / place a product order
//! GET      /api/orders/{id}         - Owner, assigned baker or admin
//! PUT/DELETE /api/orders/{id}       - Admin
//!
//! POST /api/payment/subscribe       - Baker: extend subscription one month
//! POST /api/contact                 - Public contact form
//! ```

pub mod admin;
pub mod auth;
pub mod contact;
pub mod homebaker;
pub mod orders;
pub mod payment;
pub mod products;
pub mod user;

use std::str::FromStr;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use crate::error::{AppError, msg};
use crate::state::AppState;

/// Welcome text served at `/`.
pub const WELCOME: &str = "Welcome to Keik Craveiess Backend!";

/// Parse a path identifier. A malformed id is reported like a missing entity.
pub(crate) fn parse_id<T: FromStr>(raw: &str, not_found: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(not_found.to_string()))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/homebakers", get(admin::list_bakers))
        .route("/homebakers/{id}", axum::routing::delete(admin::delete_baker))
        .route("/users", get(admin::list_users))
        .route("/users/{id}", axum::routing::delete(admin::delete_user))
        .route("/orders", get(admin::list_orders))
        .route("/orders/{id}", put(admin::update_order))
}

fn homebaker_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(homebaker::get_profile).put(homebaker::update_profile),
        )
        .route("/upload", post(homebaker::upload))
        .route("/pastworks", get(homebaker::past_works))
        .route("/orders", get(homebaker::list_orders))
        .route("/orders/{id}", put(homebaker::update_order))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/bakers", get(user::active_bakers))
        .route("/order", post(user::place_order))
        .route("/orders", get(user::orders))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route(
            "/{id}",
            get(orders::show).put(orders::update).delete(orders::destroy),
        )
}

/// All `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
        .nest("/homebaker", homebaker_routes())
        .nest("/user", user_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .route("/payment/subscribe", post(payment::subscribe))
        .route("/contact", post(contact::submit))
}

/// Every route, including health checks and the JSON 404 fallback.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
        .fallback(not_found)
}

async fn welcome() -> &'static str {
    WELCOME
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, msg("Route not found"))
}
