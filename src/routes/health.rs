//! # routes::health
//!
//! `GET /health`: liveness probe, outside the signature check.

use std::sync::atomic::Ordering;

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::state::SharedState;

pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    let events_handled = state.events_handled.load(Ordering::Relaxed);
    let replies_sent   = state.replies_sent.load(Ordering::Relaxed);

    Json(json!({
        "ok":             true,
        "events_handled": events_handled,
        "replies_sent":   replies_sent,
    }))
}
