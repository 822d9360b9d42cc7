use httpmock::prelude::*;
use serde_json::json;
use yt_data_client::{ApiError, Credential, Rating, YouTubeClient};

type TestResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn client(server: &MockServer) -> YouTubeClient {
    YouTubeClient::new(server.base_url(), Credential::Static("test-token".to_string()))
        .expect("client")
}

#[tokio::test]
async fn rate_video_sends_like_with_bearer_token() -> TestResult<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/youtube/v3/videos/rate")
                .query_param("id", "dQw4w9WgXcQ")
                .query_param("rating", "like")
                .header("authorization", "Bearer test-token");
            then.status(204);
        })
        .await;

    client(&server).rate_video("dQw4w9WgXcQ", Rating::Like).await?;
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn insert_subscription_returns_subscription_id() -> TestResult<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/youtube/v3/subscriptions")
                .query_param("part", "snippet")
                .json_body(json!({
                    "snippet": {"resourceId": {"kind": "youtube#channel", "channelId": "UC1234567890abcdefghijkl"}}
                }));
            then.status(200)
                .json_body(json!({"kind": "youtube#subscription", "id": "sub-42"}));
        })
        .await;

    let id = client(&server)
        .insert_subscription("UC1234567890abcdefghijkl")
        .await?;
    assert_eq!(id, "sub-42");
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn insert_comment_thread_posts_top_level_comment() -> TestResult<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/youtube/v3/commentThreads")
                .query_param("part", "snippet")
                .json_body(json!({
                    "snippet": {
                        "videoId": "dQw4w9WgXcQ",
                        "topLevelComment": {"snippet": {"textOriginal": "Great video, thanks!"}}
                    }
                }));
            then.status(200).json_body(json!({"id": "thread-7"}));
        })
        .await;

    let id = client(&server)
        .insert_comment_thread("dQw4w9WgXcQ", "Great video, thanks!")
        .await?;
    assert_eq!(id, "thread-7");
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn handle_lookup_strips_at_sign() -> TestResult<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/youtube/v3/channels")
                .query_param("forHandle", "rustlang")
                .query_param("part", "id");
            then.status(200)
                .json_body(json!({"items": [{"id": "UCaYhcUwRBNscFNUKTjgPFiA"}]}));
        })
        .await;

    let id = client(&server).channel_id_for_handle("@rustlang").await?;
    assert_eq!(id.as_deref(), Some("UCaYhcUwRBNscFNUKTjgPFiA"));
    Ok(())
}

#[tokio::test]
async fn unknown_handle_yields_none() -> TestResult<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/youtube/v3/channels");
            then.status(200).json_body(json!({"kind": "youtube#channelListResponse"}));
        })
        .await;

    assert_eq!(client(&server).channel_id_for_handle("nobody").await?, None);
    Ok(())
}

#[tokio::test]
async fn search_channel_takes_first_result() -> TestResult<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/youtube/v3/search")
                .query_param("q", "Rust Programming")
                .query_param("type", "channel")
                .query_param("maxResults", "1");
            then.status(200).json_body(json!({
                "items": [{"snippet": {"channelId": "UCfirstfirstfirstfirst12"}}]
            }));
        })
        .await;

    let id = client(&server).search_channel("Rust Programming").await?;
    assert_eq!(id.as_deref(), Some("UCfirstfirstfirstfirst12"));
    Ok(())
}

#[tokio::test]
async fn error_status_is_surfaced_with_body() -> TestResult<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/youtube/v3/videos/rate");
            then.status(403)
                .json_body(json!({"error": {"code": 403, "message": "quotaExceeded"}}));
        })
        .await;

    let err = client(&server)
        .rate_video("dQw4w9WgXcQ", Rating::Like)
        .await
        .unwrap_err();
    match &err {
        ApiError::Http { status, body } => {
            assert_eq!(*status, 403);
            assert!(body.contains("quotaExceeded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_transient());
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_decode_error() -> TestResult<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/youtube/v3/subscriptions");
            then.status(200).body("not json");
        })
        .await;

    let err = client(&server)
        .insert_subscription("UC1234567890abcdefghijkl")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
    Ok(())
}
