//! HTTP server bridging the REST API onto the amplifier client.

pub mod api;
pub mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use state::WebState;

/// Build the API router. Static assets, when configured, are served from `/`.
pub fn router(web_state: WebState, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route(
            "/v1/state/:variable",
            get(api::query_state)
                .patch(api::modify_state)
                .fallback(api::invalid_method),
        )
        // Return 404 in JSON for all unknown requests under /api/
        .fallback(api::not_found);

    let mut app = Router::new().nest("/api", api).with_state(web_state);
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }
    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the API server.
pub async fn start_web_server(
    listen_addr: SocketAddr,
    web_state: WebState,
    static_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(web_state, static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    log::info!("API listening on http://{}", listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{client_with, FakeAmp, FakePort};
    use crate::client::AmpClient;
    use crate::transport::Transport;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_with(replies: Vec<&'static [u8]>, enable_volume: bool) -> (Router, Arc<std::sync::Mutex<FakeAmp>>) {
        let (client, amp) = client_with(replies, enable_volume);
        let app = router(WebState::new(Arc::new(client)), None);
        (app, amp)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn patch(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("PATCH")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_query_power() {
        let (app, amp) = app_with(vec![b"Power=On\r"], false);
        let response = app.oneshot(get("/api/v1/state/power")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"power": true}));
        assert_eq!(amp.lock().unwrap().written, vec![b"Power?\r".to_vec()]);
    }

    #[tokio::test]
    async fn test_query_source_passes_string_through() {
        let (app, _amp) = app_with(vec![b"Source=CD\r"], false);
        let response = app.oneshot(get("/api/v1/state/source")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"source": "CD"}));
    }

    #[tokio::test]
    async fn test_boolean_interpretation_is_case_insensitive() {
        for (reply, expected) in [
            (b"Mute=ON\r" as &'static [u8], true),
            (b"Mute=on\r", true),
            (b"Mute=Off\r", false),
            (b"Mute=\r", false),
        ] {
            let (app, _amp) = app_with(vec![reply], false);
            let response = app.oneshot(get("/api/v1/state/mute")).await.unwrap();
            assert_eq!(body_json(response).await, json!({"mute": expected}));
        }
    }

    #[tokio::test]
    async fn test_modify_mute_with_boolean() {
        let (app, amp) = app_with(vec![b"Mute=Off\r"], false);
        let response = app
            .oneshot(patch("/api/v1/state/mute", r#"{"value": false}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"mute": false}));
        assert_eq!(amp.lock().unwrap().written, vec![b"Mute=Off\r".to_vec()]);
    }

    #[tokio::test]
    async fn test_modify_speaker_group() {
        let (app, amp) = app_with(vec![b"SpeakerA=On\r"], false);
        let response = app
            .oneshot(patch("/api/v1/state/speakera", r#"{"value": true}"#))
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!({"speakerA": true}));
        assert_eq!(amp.lock().unwrap().written, vec![b"SpeakerA=On\r".to_vec()]);
    }

    #[tokio::test]
    async fn test_volume_step_disabled() {
        let (app, amp) = app_with(vec![], false);
        let response = app
            .oneshot(patch("/api/v1/state/volume", r#"{"value": "+"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(amp.lock().unwrap().written.is_empty());
    }

    #[tokio::test]
    async fn test_volume_step_enabled() {
        let (app, amp) = app_with(vec![b"Volume-21\r"], true);
        let response = app
            .oneshot(patch("/api/v1/state/volume", r#"{"value": "+"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"volume": "-21"}));
        assert_eq!(amp.lock().unwrap().written, vec![b"Volume+\r".to_vec()]);
    }

    #[tokio::test]
    async fn test_query_unknown_variable() {
        let (app, _amp) = app_with(vec![], false);
        let response = app.oneshot(get("/api/v1/state/foo")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"status": 400, "message": "Invalid command: foo?"})
        );
    }

    #[tokio::test]
    async fn test_query_shorthand_forbidden_on_patch() {
        let (app, amp) = app_with(vec![], false);
        let response = app
            .oneshot(patch("/api/v1/state/power", r#"{"value": "?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(amp.lock().unwrap().written.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_body() {
        let (app, _amp) = app_with(vec![], false);
        let response = app
            .oneshot(patch("/api/v1/state/power", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"status": 400, "message": "Malformed JSON"})
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_generic_500() {
        let amp = FakeAmp::with_replies(vec![]);
        amp.lock().unwrap().fail_writes = true;
        let transport = Transport::from_port(Box::new(FakePort(Arc::clone(&amp))));
        let app = router(WebState::new(Arc::new(AmpClient::new(transport, false))), None);

        let response = app
            .oneshot(patch("/api/v1/state/power", r#"{"value": true}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["status"], 500);
        // The underlying error never reaches the client.
        assert!(!body["message"].as_str().unwrap().contains("device gone"));
    }

    #[tokio::test]
    async fn test_unknown_api_path() {
        let (app, _amp) = app_with(vec![], false);
        let response = app.oneshot(get("/api/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"status": 404, "message": "Not found"})
        );
    }

    #[tokio::test]
    async fn test_state_resource_itself_is_not_found() {
        let (app, _amp) = app_with(vec![], false);
        let response = app.oneshot(get("/api/v1/state/state")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let (app, _amp) = app_with(vec![], false);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/state/power")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_modify_unknown_source_rejected() {
        let (app, amp) = app_with(vec![], false);
        let response = app
            .oneshot(patch("/api/v1/state/source", r#"{"value": "Spotify"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(amp.lock().unwrap().written.is_empty());
    }
}
