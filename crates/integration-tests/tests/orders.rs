//! Order workflow: subscription gate, ownership, status updates.
//!
//! Requires a running API server and migrated database.
//! Run with: cargo test -p keik-integration-tests -- --ignored

use keik_integration_tests::{TestContext, read};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn place_cake_order(ctx: &TestContext, customer: &str, baker_id: i32) -> (StatusCode, Value) {
    read(
        ctx.post(
            customer,
            "/api/user/order",
            &json!({ "bakerId": baker_id, "cakeDetails": "chocolate" }),
        )
        .await,
    )
    .await
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cake_order_with_active_baker() {
    let ctx = TestContext::new();
    let baker = ctx.subscribed_baker().await;
    let customer = ctx.account("user").await;

    let (status, order) = place_cake_order(&ctx, &customer.token, baker.id).await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["cakeDetails"], "chocolate");
    assert_eq!(order["baker"]["id"], baker.id);

    // The customer sees it, and so does the baker.
    let (_, mine) = read(ctx.get(&customer.token, "/api/user/orders").await).await;
    assert!(mine.as_array().unwrap().iter().any(|o| o["id"] == order["id"]));
    let (_, assigned) = read(ctx.get(&baker.token, "/api/homebaker/orders").await).await;
    assert!(assigned.as_array().unwrap().iter().any(|o| o["id"] == order["id"]));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_expired_baker_cannot_receive_orders() {
    let ctx = TestContext::new();
    let baker = ctx.subscribed_baker().await;
    let customer = ctx.account("user").await;

    sqlx::query(
        "UPDATE baker_profile SET subscription_expiry = NOW() - INTERVAL '1 day' \
         WHERE identity_id = $1",
    )
    .bind(baker.id)
    .execute(&ctx.pool().await)
    .await
    .unwrap();

    let (status, body) = place_cake_order(&ctx, &customer.token, baker.id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Home Baker subscription has expired");

    let (_, mine) = read(ctx.get(&customer.token, "/api/user/orders").await).await;
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_baker_cannot_touch_another_bakers_order() {
    let ctx = TestContext::new();
    let baker = ctx.subscribed_baker().await;
    let other = ctx.subscribed_baker().await;
    let customer = ctx.account("user").await;

    let (_, order) = place_cake_order(&ctx, &customer.token, baker.id).await;
    let path = format!("/api/homebaker/orders/{}", order["id"]);

    let (status, body) = read(
        ctx.put(&other.token, &path, &json!({ "status": "Completed" }))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["msg"], "Access denied: Not your order");

    let (_, fetched) = read(ctx.get(&baker.token, &format!("/api/orders/{}", order["id"])).await).await;
    assert_eq!(fetched["status"], "Pending");

    // The assigned baker may move it along.
    let (status, updated) = read(
        ctx.put(&baker.token, &path, &json!({ "status": "In Progress" }))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "In Progress");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_admin_invalid_status_leaves_order_unchanged() {
    let ctx = TestContext::new();
    let admin = ctx.account("admin").await;
    let baker = ctx.subscribed_baker().await;
    let customer = ctx.account("user").await;

    let (_, order) = place_cake_order(&ctx, &customer.token, baker.id).await;
    let path = format!("/api/admin/orders/{}", order["id"]);

    let (status, body) = read(ctx.put(&admin.token, &path, &json!({ "status": "Shipped" })).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Invalid status value");

    let (_, fetched) = read(ctx.get(&admin.token, &format!("/api/orders/{}", order["id"])).await).await;
    assert_eq!(fetched["status"], "Pending");

    let (status, updated) = read(
        ctx.put(
            &admin.token,
            &path,
            &json!({ "status": "Cancelled", "estimatedArrival": "2030-01-01T00:00:00Z" }),
        )
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Cancelled");
    assert!(updated["estimatedArrival"].is_string());
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_order_lookup_is_owner_or_admin() {
    let ctx = TestContext::new();
    let baker = ctx.subscribed_baker().await;
    let customer = ctx.account("user").await;
    let stranger = ctx.account("user").await;

    let (_, order) = place_cake_order(&ctx, &customer.token, baker.id).await;
    let path = format!("/api/orders/{}", order["id"]);

    assert_eq!(ctx.get(&customer.token, &path).await.status(), StatusCode::OK);
    assert_eq!(ctx.get(&baker.token, &path).await.status(), StatusCode::OK);

    let (status, body) = read(ctx.get(&stranger.token, &path).await).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["msg"], "Access denied");

    let (status, _) = read(ctx.get(&customer.token, "/api/orders/999999999").await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
