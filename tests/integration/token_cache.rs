//! Token cache and single-flight refresh

use crate::mock_server::MockServerFixture;
use futures::future::join_all;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_token_reused_within_margin() {
    let fixture = MockServerFixture::new().await;
    let token_mock = fixture.mock_token("tok-1", 1).await;
    let client = fixture.create_test_client();

    let first = assert_ok!(client.tokens().get_token().await);
    let second = assert_ok!(client.tokens().get_token().await);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.token(), "tok-1");
    assert_eq!(first.scope(), "SALUTE_SPEECH_PERS");
    token_mock.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_callers_share_one_refresh() {
    let fixture = MockServerFixture::new().await;
    let token_mock = fixture.mock_token("tok-1", 1).await;
    let client = fixture.create_test_client();

    let results = join_all((0..8).map(|_| {
        let client = client.clone();
        async move { client.tokens().get_token().await }
    }))
    .await;

    let tokens: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();
    assert!(tokens.iter().all(|t| Arc::ptr_eq(t, &tokens[0])));
    token_mock.assert_async().await;
}

#[tokio::test]
async fn test_invalidate_triggers_exactly_one_refresh() {
    let fixture = MockServerFixture::new().await;
    let token_mock = fixture.mock_token("tok-1", 2).await;
    let client = fixture.create_test_client();

    let stale = assert_ok!(client.tokens().get_token().await);
    client.tokens().invalidate(&stale);
    assert!(client.tokens().cached().is_none());

    let results = join_all((0..4).map(|_| {
        let client = client.clone();
        async move { client.tokens().get_token().await }
    }))
    .await;
    let fresh: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();
    assert!(fresh.iter().all(|t| Arc::ptr_eq(t, &fresh[0])));
    assert!(!Arc::ptr_eq(&stale, &fresh[0]));
    token_mock.assert_async().await;
}

#[tokio::test]
async fn test_token_without_expiry_is_not_cached() {
    let fixture = MockServerFixture::new().await;
    let _m = fixture
        .mock_token_body(200, r#"{"access_token":"tok-1"}"#)
        .await;
    let client = fixture.create_test_client();

    let err = assert_err!(client.tokens().get_token().await);
    assert_eq!(err.kind(), "TokenRequestError");
    assert!(client.tokens().cached().is_none());
}

#[tokio::test]
async fn test_oauth_rejection_carries_status() {
    let fixture = MockServerFixture::new().await;
    let _m = fixture
        .mock_token_body(401, r#"{"code":6,"message":"credentials doesn't match db data"}"#)
        .await;
    let client = fixture.create_test_client();

    let err = assert_err!(client.tokens().get_token().await);
    assert_eq!(err.kind(), "TokenRequestError");
    assert_eq!(err.http_status(), Some(401));
}
