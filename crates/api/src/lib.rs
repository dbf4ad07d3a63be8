//! Keik Craveiess API library.
//!
//! REST backend for the home-baker marketplace: customers browse products
//! and place orders, home bakers manage profiles, portfolios and assigned
//! orders, and admins oversee everything. The binary in `main.rs` only wires
//! configuration, logging and the listener around [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod services;
pub mod state;

use std::any::Any;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode, header},
    response::{IntoResponse, Response},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::error::{SERVER_ERROR_MSG, msg};
use crate::services::images::{MAX_IMAGE_BYTES, MAX_IMAGES_PER_UPLOAD};
use crate::state::AppState;

/// Request body ceiling: a full upload plus multipart framing.
const BODY_LIMIT_BYTES: usize = MAX_IMAGES_PER_UPLOAD * MAX_IMAGE_BYTES + 1024 * 1024;

/// Build the application with its full middleware stack.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_origins);

    routes::routes()
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        identity_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS policy: any origin when none are configured, else the listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(middleware::AUTH_TOKEN_HEADER),
        ])
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, msg(SERVER_ERROR_MSG)).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use http_body_util::BodyExt;
    use keik_core::{IdentityId, Role};
    use secrecy::SecretString;
    use tower::ServiceExt;

    use super::*;
    use crate::config::ApiConfig;

    const SECRET: &str = "k3!k-test-signing-secret-with-enough-entropy";

    fn state() -> AppState {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://keik@127.0.0.1:1/keik"),
            host: [127, 0, 0, 1].into(),
            port: 0,
            jwt_secret: SecretString::from(SECRET),
            cors_origins: Vec::new(),
            email: None,
            images: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = db::create_lazy_pool(&config.database_url).unwrap();
        AppState::new(config, pool).unwrap()
    }

    fn token(state: &AppState, role: Role) -> String {
        state.tokens().issue(IdentityId::new(42), role).unwrap()
    }

    async fn send(
        state: AppState,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, Response<Body>) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app(state).oneshot(request.body(body).unwrap()).await.unwrap();
        (response.status(), response)
    }

    async fn json_msg(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["msg"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_welcome_and_liveness() {
        let (status, response) = send(state(), Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], routes::WELCOME.as_bytes());

        let (status, _) = send(state(), Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, response) = send(state(), Method::GET, "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_msg(response).await, "Route not found");
    }

    #[tokio::test]
    async fn test_every_response_carries_security_headers_and_request_id() {
        let (_, response) = send(state(), Method::GET, "/health", None, None).await;
        let headers = response.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_missing_token_is_401() {
        let (status, response) = send(state(), Method::GET, "/api/admin/users", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json_msg(response).await, "No token, authorization denied");
    }

    #[tokio::test]
    async fn test_invalid_token_is_401() {
        let (status, response) = send(
            state(),
            Method::GET,
            "/api/user/orders",
            Some("not.a.jwt"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json_msg(response).await, "Token is not valid");
    }

    #[tokio::test]
    async fn test_legacy_token_header_is_accepted() {
        let state = state();
        let token = token(&state, Role::Customer);
        let request = Request::get("/api/admin/users")
            .header(middleware::AUTH_TOKEN_HEADER, token)
            .body(Body::empty())
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();
        // Authenticated, so the role check decides.
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_issued_token_reaches_role_protected_handler() {
        let state = state();
        let admin = token(&state, Role::Admin);
        let (status, response) = send(
            state,
            Method::PUT,
            "/api/admin/orders/not-an-id",
            Some(&admin),
            Some("{}"),
        )
        .await;
        // Past authentication and the admin check; the handler itself answers.
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_msg(response).await, "Order not found");
    }

    #[tokio::test]
    async fn test_role_mismatch_is_403() {
        let state = state();
        let customer = token(&state, Role::Customer);
        let baker = token(&state, Role::Baker);
        let admin = token(&state, Role::Admin);

        let (status, response) = send(
            state.clone(),
            Method::GET,
            "/api/admin/homebakers",
            Some(&customer),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json_msg(response).await, "Access denied: Admins only");

        let (status, response) = send(
            state.clone(),
            Method::POST,
            "/api/payment/subscribe",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json_msg(response).await, "Access denied: Home Bakers only");

        let (status, response) = send(
            state,
            Method::POST,
            "/api/user/order",
            Some(&baker),
            Some(r#"{"bakerId":1,"cakeDetails":"chocolate"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json_msg(response).await, "Access denied: Users only");
    }

    #[tokio::test]
    async fn test_contact_rejects_bad_email() {
        let (status, response) = send(
            state(),
            Method::POST,
            "/api/contact",
            None,
            Some(r#"{"name":"A","email":"bad-email","subject":"s","message":"m"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_msg(response).await, "Please enter a valid email address.");
    }

    #[tokio::test]
    async fn test_contact_requires_every_field() {
        let (status, response) = send(
            state(),
            Method::POST,
            "/api/contact",
            None,
            Some(r#"{"name":"A","email":"a@keik.test","subject":"","message":"m"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_msg(response).await, "Please fill in all fields.");
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let (status, response) =
            send(state(), Method::POST, "/api/contact", None, Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!json_msg(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_registration_validates_before_storage() {
        let (status, response) = send(
            state(),
            Method::POST,
            "/api/auth/register",
            None,
            Some(r#"{"name":"Ada","email":"ada@keik.test","password":"123","role":"user"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json_msg(response).await,
            "Password must be at least 6 characters"
        );

        let (status, response) = send(
            state(),
            Method::POST,
            "/api/auth/register",
            None,
            Some(r#"{"email":"ada@keik.test","password":"123456"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_msg(response).await, "Please provide all required fields");
    }

    #[tokio::test]
    async fn test_malformed_ids_are_404() {
        let (status, response) =
            send(state(), Method::GET, "/api/products/abc", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_msg(response).await, "Product not found");

        let state = state();
        let customer = token(&state, Role::Customer);
        let (status, response) = send(
            state,
            Method::GET,
            "/api/orders/xyz",
            Some(&customer),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_msg(response).await, "Order not found");
    }

    #[tokio::test]
    async fn test_cake_order_requires_fields() {
        let state = state();
        let customer = token(&state, Role::Customer);
        let (status, response) = send(
            state,
            Method::POST,
            "/api/user/order",
            Some(&customer),
            Some(r#"{"bakerId":3}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_msg(response).await, "Please provide all required fields");
    }

    #[tokio::test]
    async fn test_status_values_are_checked_before_lookup() {
        let state = state();
        let baker = token(&state, Role::Baker);
        let admin = token(&state, Role::Admin);

        let (status, response) = send(
            state.clone(),
            Method::PUT,
            "/api/homebaker/orders/1",
            Some(&baker),
            Some(r#"{"status":"Pending"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_msg(response).await, "Invalid status value");

        let (status, response) = send(
            state.clone(),
            Method::PUT,
            "/api/admin/orders/1",
            Some(&admin),
            Some(r#"{"status":"Shipped"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_msg(response).await, "Invalid status value");

        let (status, _) = send(
            state,
            Method::PUT,
            "/api/orders/1",
            Some(&admin),
            Some("{}"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_product_create_requires_fields() {
        let state = state();
        let admin = token(&state, Role::Admin);
        let (status, response) = send(
            state,
            Method::POST,
            "/api/products",
            Some(&admin),
            Some(r#"{"name":"Sponge","price":12}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_msg(response).await, "Please provide all required fields");
    }

    #[tokio::test]
    async fn test_product_order_rejects_empty_list() {
        let state = state();
        let customer = token(&state, Role::Customer);
        let (status, _) = send(
            state,
            Method::POST,
            "/api/orders",
            Some(&customer),
            Some(r#"{"products":[]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_body_limit_fits_a_full_upload() {
        assert!(BODY_LIMIT_BYTES > MAX_IMAGES_PER_UPLOAD * MAX_IMAGE_BYTES);
    }
}
