//! Live service integration tests.
//!
//! These tests talk to a running prediction service and require network access.
//! Point them at it with `TRADEX_API_URL`, and supply an approved account via
//! `TRADEX_TEST_EMAIL` and `TRADEX_TEST_PASSWORD`.
//! Run with: `cargo test --features integration-tests`

#![cfg(feature = "integration-tests")]

use std::sync::Arc;

use tradex::TradexError;
use tradex::config::fetch_config;
use tradex::credentials::SessionContext;
use tradex::gateway::{Gateway, GatewayClient};
use tradex::guard::{Capability, Decision, check_access};
use tradex::refresh::{HistoryRefresher, PredictionRequest, PredictionRunner, RunOutcome};

fn client() -> GatewayClient {
    let config = fetch_config().expect("Failed to load config");
    GatewayClient::new(&config.api, SessionContext::in_memory()).expect("Failed to build client")
}

fn account() -> (String, String) {
    (
        std::env::var("TRADEX_TEST_EMAIL").expect("TRADEX_TEST_EMAIL not set"),
        std::env::var("TRADEX_TEST_PASSWORD").expect("TRADEX_TEST_PASSWORD not set"),
    )
}

#[tokio::test]
async fn test_anonymous_session_is_denied() {
    let client = client();
    let err = client.who_am_i().await.unwrap_err();
    assert!(matches!(err, TradexError::Unauthorized));

    let decision = check_access(Capability::Authenticated, &client, client.session()).await;
    assert!(matches!(decision, Decision::Deny { .. }));
}

#[tokio::test]
async fn test_login_and_guard() {
    let client = client();
    let (email, password) = account();

    client.login(&email, &password).await.expect("Failed to log in");
    let me = client.who_am_i().await.expect("Failed to fetch current user");
    assert_eq!(me.email.as_deref(), Some(email.as_str()));

    let decision = check_access(Capability::Authenticated, &client, client.session()).await;
    assert_eq!(decision, Decision::Allow);
}

#[tokio::test]
async fn test_bad_password_is_rejected() {
    let client = client();
    let (email, _) = account();

    let err = client.login(&email, "definitely-wrong").await.unwrap_err();
    assert!(matches!(err, TradexError::Auth { .. }));
    assert!(!client.session().is_present());
}

#[tokio::test]
async fn test_prediction_round() {
    let client = client();
    let (email, password) = account();
    client.login(&email, &password).await.expect("Failed to log in");

    let session = client.session().clone();
    let gateway = Arc::new(client);
    let history = Arc::new(HistoryRefresher::new(gateway.clone(), session.clone()));
    let runner = PredictionRunner::new(gateway, session, history);

    let outcome = runner.run(&PredictionRequest::default()).await;
    assert_eq!(outcome, RunOutcome::Applied);
    assert!(!runner.history().is_empty());
}
