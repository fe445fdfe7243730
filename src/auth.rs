//! # auth: LINE webhook signature middleware
//!
//! LINE signs every webhook delivery with
//! `x-line-signature: base64(HMAC-SHA256(channel_secret, raw_body))`.
//! The middleware buffers the body, checks the signature in constant time,
//! and hands the untouched bytes on to the `Json` extractor.
//!
//! Only `/callback` is wrapped; `/health` stays open.

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::{error::AppError, state::SharedState};

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// LINE batches are small; anything above this is not a real delivery.
const MAX_BODY_BYTES: usize = 1024 * 1024;

type HmacSha256 = Hmac<Sha256>;

/// Axum middleware: rejects requests whose signature does not match.
pub async fn verify_line_signature(
    State(state): State<SharedState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();

    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let Some(signature) = signature else {
        warn!("❌ Webhook rejected: missing x-line-signature");
        return Err(AppError::Unauthorized("missing x-line-signature header".into()));
    };

    let bytes: Bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("unreadable body: {e}")))?;

    if !signature_matches(state.channel_secret.as_bytes(), &bytes, &signature) {
        warn!(body_len = bytes.len(), "❌ Webhook rejected: signature mismatch");
        return Err(AppError::Unauthorized("signature validation failed".into()));
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// `true` when `signature` is the base64 HMAC-SHA256 of `body` under `secret`.
pub fn signature_matches(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}
