//! Integration tests for the Keik Craveiess API.
//!
//! The tests talk to a running server over HTTP and, where a scenario needs
//! state the API cannot produce (an expired subscription), to its database.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p keik-cli -- migrate
//! cargo run -p keik-api &
//! cargo test -p keik-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `KEIK_BASE_URL` - API base URL (default `http://localhost:5000`)
//! - `KEIK_DATABASE_URL` - Same database the server uses

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

/// Password used for every test account.
pub const PASSWORD: &str = "s3cret-cake";

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("KEIK_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// A fresh address so reruns never collide.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@keik.test", Uuid::new_v4().simple())
}

/// Decoded JSON body and status of a response.
pub async fn read(resp: Response) -> (StatusCode, Value) {
    let status = resp.status();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

/// An account created for one test.
#[derive(Debug, Clone)]
pub struct Account {
    pub email: String,
    pub role: &'static str,
    pub token: String,
    pub id: i32,
}

/// HTTP client bound to the server under test.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: base_url(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Connect to the server's database.
    pub async fn pool(&self) -> PgPool {
        dotenvy::dotenv().ok();
        let url = std::env::var("KEIK_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("KEIK_DATABASE_URL not set");
        PgPool::connect(&url).await.expect("Failed to connect to database")
    }

    pub async fn register(&self, email: &str, role: &str) -> Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "name": format!("Test {role}"),
                "email": email,
                "password": PASSWORD,
                "role": role,
            }))
            .send()
            .await
            .expect("Failed to send register request")
    }

    pub async fn login(&self, email: &str, password: &str, role: &str) -> Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password, "role": role }))
            .send()
            .await
            .expect("Failed to send login request")
    }

    /// Register and log in a new account of `role`.
    pub async fn account(&self, role: &'static str) -> Account {
        let email = unique_email(role);
        let resp = self.register(&email, role).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let (status, body) = read(self.login(&email, PASSWORD, role).await).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let token = body["token"].as_str().expect("token").to_string();

        let id = self.own_id(&token, role).await;
        Account {
            email,
            role,
            token,
            id,
        }
    }

    /// A baker with a paid month.
    pub async fn subscribed_baker(&self) -> Account {
        let baker = self.account("homebaker").await;
        let resp = self
            .post(&baker.token, "/api/payment/subscribe", &json!({}))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        baker
    }

    async fn own_id(&self, token: &str, role: &str) -> i32 {
        if role != "homebaker" {
            // Only bakers can read their own profile; other ids are not needed.
            return 0;
        }
        let (_, body) = read(self.get(token, "/api/homebaker/profile").await).await;
        i32::try_from(body["id"].as_i64().expect("id")).expect("id fits i32")
    }

    pub async fn get(&self, token: &str, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn post(&self, token: &str, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn put(&self, token: &str, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }
}
