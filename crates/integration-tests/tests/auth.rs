//! Registration partitions and login.
//!
//! Requires a running API server and migrated database.
//! Run with: cargo test -p keik-integration-tests -- --ignored

use keik_integration_tests::{PASSWORD, TestContext, read, unique_email};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_registration_is_per_role() {
    let ctx = TestContext::new();
    let email = unique_email("dup");

    let (status, body) = read(ctx.register(&email, "user").await).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["msg"], "User registered successfully");

    let (status, body) = read(ctx.register(&email, "user").await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "User already exists");

    // Same email, different partition.
    let (status, body) = read(ctx.register(&email, "homebaker").await).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["msg"], "Homebaker registered successfully");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let ctx = TestContext::new();
    let account = ctx.account("user").await;

    let (status, wrong_password) = read(ctx.login(&account.email, "not-it", "user").await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, unknown) =
        read(ctx.login(&unique_email("ghost"), PASSWORD, "user").await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(wrong_password, unknown);
    assert_eq!(unknown["msg"], "Invalid credentials");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_login_is_scoped_to_role() {
    let ctx = TestContext::new();
    let account = ctx.account("homebaker").await;

    let (status, _) = read(ctx.login(&account.email, PASSWORD, "user").await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = read(ctx.login(&account.email, PASSWORD, "homebaker").await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "homebaker");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}
