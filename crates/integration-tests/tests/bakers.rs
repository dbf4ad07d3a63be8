//! Subscriptions, the active-baker directory and the catalog.
//!
//! Requires a running API server and migrated database.
//! Run with: cargo test -p keik-integration-tests -- --ignored

use chrono::{DateTime, Months, Utc};
use keik_integration_tests::{TestContext, read};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::json;

fn expiry(body: &serde_json::Value) -> DateTime<Utc> {
    body["subscriptionExpiry"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_back_to_back_subscriptions_compound() {
    let ctx = TestContext::new();
    let baker = ctx.account("homebaker").await;

    let (status, first) = read(ctx.post(&baker.token, "/api/payment/subscribe", &json!({})).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["msg"], "Subscription activated successfully");

    let (_, second) = read(ctx.post(&baker.token, "/api/payment/subscribe", &json!({})).await).await;

    let first = expiry(&first);
    assert_eq!(expiry(&second), first.checked_add_months(Months::new(1)).unwrap());
    assert!(first > Utc::now());
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_only_active_bakers_are_listed() {
    let ctx = TestContext::new();
    let active = ctx.subscribed_baker().await;
    let inactive = ctx.account("homebaker").await;
    let customer = ctx.account("user").await;

    let (status, bakers) = read(ctx.get(&customer.token, "/api/user/bakers").await).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = bakers
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|b| b["id"].as_i64())
        .collect();
    assert!(ids.contains(&i64::from(active.id)));
    assert!(!ids.contains(&i64::from(inactive.id)));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_profile_update_round_trip() {
    let ctx = TestContext::new();
    let baker = ctx.account("homebaker").await;

    let (status, profile) = read(
        ctx.put(
            &baker.token,
            "/api/homebaker/profile",
            &json!({
                "bankDetails": "IBAN 123",
                "pastOrders": [{ "image": "https://img/1.png", "description": "tiered" }]
            }),
        )
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["bankDetails"], "IBAN 123");
    assert_eq!(profile["pastOrders"][0]["description"], "tiered");

    let (_, works) = read(ctx.get(&baker.token, "/api/homebaker/pastworks").await).await;
    assert!(works.as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_product_create_then_get() {
    let ctx = TestContext::new();
    let admin = ctx.account("admin").await;
    let baker = ctx.account("homebaker").await;

    let (status, created) = read(
        ctx.post(
            &admin.token,
            "/api/products",
            &json!({
                "name": "Carrot cake",
                "description": "Spiced sponge",
                "price": 18.5,
                "imageUrl": "https://img/carrot.png",
                "bakerId": baker.id
            }),
        )
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");

    let path = format!("/api/products/{}", created["id"]);
    let (status, fetched) = read(ctx.client.get(ctx.url(&path)).send().await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
    assert_eq!(fetched["baker"]["email"], baker.email);

    let (status, body) = read(
        ctx.client
            .delete(ctx.url(&path))
            .bearer_auth(&admin.token)
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Product removed");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_contact_scenarios() {
    let ctx = TestContext::new();

    let (status, body) = read(
        ctx.client
            .post(ctx.url("/api/contact"))
            .json(&json!({ "name": "A", "email": "bad-email", "subject": "s", "message": "m" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Please enter a valid email address.");

    let (status, body) = read(
        ctx.client
            .post(ctx.url("/api/contact"))
            .json(&json!({ "name": "A", "email": "a@keik.test", "subject": "s", "message": "m" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Your message has been sent successfully!");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_removed_baker_cannot_upload() {
    let ctx = TestContext::new();
    let admin = ctx.account("admin").await;
    let baker = ctx.account("homebaker").await;

    let (status, _) = read(
        ctx.client
            .delete(ctx.url(&format!("/api/admin/homebakers/{}", baker.id)))
            .bearer_auth(&admin.token)
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let image = Part::bytes(vec![0x89, b'P', b'N', b'G'])
        .file_name("cake.png")
        .mime_str("image/png")
        .unwrap();
    let (status, body) = read(
        ctx.client
            .post(ctx.url("/api/homebaker/upload"))
            .bearer_auth(&baker.token)
            .multipart(Form::new().part("images", image))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "Home Baker not found");
}
