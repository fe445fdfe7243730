//! # routes::callback
//!
//! `POST /callback`: the LINE Messaging API webhook.
//!
//! The signature has already been checked by [`crate::auth`] by the time the
//! handler runs.  Every event in the batch is processed concurrently; the
//! response waits for all of them.
//!
//! ### Response
//! * `200 OK` with one [`EventOutcome`] per event, in delivery order
//! * `400` if the verified body is not a webhook payload
//! * `500` if any event handler failed (its siblings still run to completion)

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use futures_util::future::join_all;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    engine::pipeline::{self, EventOutcome},
    error::AppError,
    models::WebhookBody,
    state::SharedState,
};

pub async fn handle_callback(
    State(state): State<SharedState>,
    payload: Result<Json<WebhookBody>, JsonRejection>,
) -> Result<Json<Vec<EventOutcome>>, AppError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "❌ Webhook body rejected");
        AppError::BadRequest(rejection.body_text())
    })?;

    info!(
        events      = body.events.len(),
        destination = body.destination.as_deref().unwrap_or("-"),
        "📨 Webhook received"
    );

    let handlers = body.events.iter().map(|event| {
        let span = info_span!("event", request_id = %Uuid::new_v4(), kind = event.kind());
        pipeline::handle_event(&state, event).instrument(span)
    });

    let results = join_all(handlers).await;

    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        error!(error = %format!("{err:#}"), "Event handler failed");
    }

    let outcomes = results
        .into_iter()
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(AppError::Internal)?;

    Ok(Json(outcomes))
}
