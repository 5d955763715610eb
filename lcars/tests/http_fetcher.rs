#![cfg(feature = "http")]

use httpmock::prelude::*;

use lcars::{Fetcher, ReqwestFetcher};

#[tokio::test]
async fn passes_status_headers_and_body_through_unchanged() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/tv/314/season/1/episode/1");
            then.status(200)
                .header("content-type", "application/json")
                .body("{\"name\":\"Broken Bow\"}");
        })
        .await;

    let fetcher = ReqwestFetcher::new();
    let response = fetcher
        .fetch(&server.url("/tv/314/season/1/episode/1"), &[])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"{\"name\":\"Broken Bow\"}");
    assert!(
        response
            .headers
            .iter()
            .any(|(name, value)| name == "content-type" && value == "application/json")
    );
}

#[tokio::test]
async fn error_statuses_are_responses_not_errors() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        })
        .await;

    let fetcher = ReqwestFetcher::new();
    let response = fetcher.fetch(&server.url("/missing"), &[]).await.unwrap();

    // Exactly one request: the fetcher never retries internally.
    mock.assert_hits_async(1).await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn request_headers_are_forwarded() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/auth")
                .header("authorization", "Bearer token");
            then.status(200);
        })
        .await;

    let fetcher = ReqwestFetcher::new();
    let response = fetcher
        .fetch(
            &server.url("/auth"),
            &[("authorization".to_string(), "Bearer token".to_string())],
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, 200);
}
