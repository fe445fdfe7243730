//! # routes
//!
//! | Method | Path        | Description                                         |
//! |--------|-------------|-----------------------------------------------------|
//! | POST   | `/callback` | LINE webhook (signature-checked), one reply per text |
//! | GET    | `/health`   | Liveness + counters                                 |

pub mod callback;
pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{auth::verify_line_signature, state::SharedState};

use callback::handle_callback;
use health::health_check;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/callback",
            post(handle_callback)
                .layer(middleware::from_fn_with_state(state.clone(), verify_line_signature)),
        )
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tokio::sync::Barrier;
    use tower::ServiceExt;

    use super::*;
    use crate::ai::{FunctionSpec, LanguageModel, ModelMessage};
    use crate::auth::{sign, SIGNATURE_HEADER};
    use crate::models::reply::NO_DATA_REPLY;
    use crate::state::AppState;
    use crate::testing::{self, ticker_call, RecordingMessenger, ScriptedModel, StubQuotes, SECRET};

    fn webhook(body: &Value, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/callback")
            .header("content-type", "application/json");
        if let Some(sig) = signature {
            builder = builder.header(SIGNATURE_HEADER, sig);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn signed(body: &Value) -> Request<Body> {
        webhook(body, Some(sign(SECRET, body.to_string().as_bytes())))
    }

    fn text_event(token: &str, text: &str) -> Value {
        json!({
            "type": "message",
            "replyToken": token,
            "timestamp": 1_700_000_000_000_i64,
            "message": { "type": "text", "id": "m", "text": text }
        })
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn doubles() -> (Arc<ScriptedModel>, Arc<RecordingMessenger>, Arc<StubQuotes>) {
        (
            Arc::new(ScriptedModel::with_ticker("undefined")),
            Arc::new(RecordingMessenger::default()),
            Arc::new(StubQuotes::failing()),
        )
    }

    #[tokio::test]
    async fn test_missing_signature_is_401() {
        let (model, messenger, quotes) = doubles();
        let app = build_router(testing::state(&model, &messenger, &quotes));

        let body = json!({ "events": [text_event("r", "台積電")] });
        let response = app.oneshot(webhook(&body, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(model.extraction_count(), 0);
        assert!(messenger.replies().is_empty());
    }

    #[tokio::test]
    async fn test_bad_signature_is_401() {
        let (model, messenger, quotes) = doubles();
        let app = build_router(testing::state(&model, &messenger, &quotes));

        let body = json!({ "events": [text_event("r", "台積電")] });
        let forged = sign("some-other-secret", body.to_string().as_bytes());
        let response = app.oneshot(webhook(&body, Some(forged))).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["ok"], false);
        assert_eq!(model.extraction_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_is_200() {
        let (model, messenger, quotes) = doubles();
        let app = build_router(testing::state(&model, &messenger, &quotes));

        let response = app
            .oneshot(signed(&json!({ "destination": "U123", "events": [] })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_mixed_batch_reports_each_outcome() {
        let (model, messenger, quotes) = doubles();
        let app = build_router(testing::state(&model, &messenger, &quotes));

        let body = json!({
            "events": [
                text_event("r-1", "今天天氣如何"),
                { "type": "follow", "replyToken": "r-2" },
                {
                    "type": "message",
                    "replyToken": "r-3",
                    "message": { "type": "sticker", "id": "s" }
                }
            ]
        });
        let response = app.oneshot(signed(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!([{ "status": "no_data" }, { "status": "ignored" }, { "status": "ignored" }])
        );
        assert_eq!(messenger.replies().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_event_is_500_but_siblings_finish() {
        let model = Arc::new(ScriptedModel::answering(|text| {
            if text.contains("FAIL") {
                anyhow::bail!("OpenAI API error 500: upstream");
            }
            Ok(ticker_call("undefined"))
        }));
        let messenger = Arc::new(RecordingMessenger::default());
        let quotes = Arc::new(StubQuotes::failing());
        let app = build_router(testing::state(&model, &messenger, &quotes));

        let body = json!({ "events": [text_event("r-1", "FAIL"), text_event("r-2", "ok")] });
        let response = app.oneshot(signed(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "internal server error");
        assert_eq!(messenger.replies(), vec![("r-2".to_string(), NO_DATA_REPLY.to_string())]);
    }

    #[tokio::test]
    async fn test_standby_event_is_ignored_not_fatal() {
        let (model, messenger, quotes) = doubles();
        let app = build_router(testing::state(&model, &messenger, &quotes));

        let body = json!({
            "events": [
                {
                    "type": "message",
                    "mode": "standby",
                    "timestamp": 1_700_000_000_000_i64,
                    "message": { "type": "image", "id": "i" }
                },
                text_event("r-1", "今天天氣如何")
            ]
        });
        let response = app.oneshot(signed(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!([{ "status": "ignored" }, { "status": "no_data" }])
        );
        assert_eq!(messenger.replies(), vec![("r-1".to_string(), NO_DATA_REPLY.to_string())]);
    }

    /// Holds each extraction call until the other one is in flight too.
    struct RendezvousModel {
        barrier: Barrier,
    }

    #[async_trait]
    impl LanguageModel for RendezvousModel {
        async fn chat(&self, system: &str, _user: &str) -> anyhow::Result<String> {
            Ok(format!("{system}回覆"))
        }

        async fn chat_with_function(
            &self,
            _system: &str,
            _user: &str,
            _function: &FunctionSpec,
        ) -> anyhow::Result<ModelMessage> {
            self.barrier.wait().await;
            Ok(ticker_call("undefined"))
        }
    }

    #[tokio::test]
    async fn test_batch_events_are_in_flight_together() {
        let messenger = Arc::new(RecordingMessenger::default());
        let state = Arc::new(AppState::new(
            SECRET,
            Arc::new(RendezvousModel { barrier: Barrier::new(2) }),
            messenger.clone(),
            Arc::new(StubQuotes::failing()),
        ));
        let app = build_router(state);

        let body = json!({ "events": [text_event("r-1", "台積電"), text_event("r-2", "鴻海")] });
        let response = tokio::time::timeout(Duration::from_secs(5), app.oneshot(signed(&body)))
            .await
            .expect("events were handled one after another")
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(messenger.replies().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400_json() {
        let (model, messenger, quotes) = doubles();
        let app = build_router(testing::state(&model, &messenger, &quotes));

        let raw = r#"{"events": "nope"}"#;
        let request = Request::builder()
            .method("POST")
            .uri("/callback")
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, sign(SECRET, raw.as_bytes()))
            .body(Body::from(raw))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["ok"], false);
        assert_eq!(model.extraction_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_400_json() {
        let (model, messenger, quotes) = doubles();
        let app = build_router(testing::state(&model, &messenger, &quotes));

        let raw = r#"{"events": []}"#;
        let request = Request::builder()
            .method("POST")
            .uri("/callback")
            .header(SIGNATURE_HEADER, sign(SECRET, raw.as_bytes()))
            .body(Body::from(raw))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["ok"], false);
    }

    #[tokio::test]
    async fn test_health_needs_no_signature() {
        let (model, messenger, quotes) = doubles();
        let app = build_router(testing::state(&model, &messenger, &quotes));

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "ok": true, "events_handled": 0, "replies_sent": 0 })
        );
    }
}
