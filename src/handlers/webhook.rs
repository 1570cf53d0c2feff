use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::errors::AppError;
use crate::services::conversation::{self, TRY_AGAIN_LATER};
use crate::services::messaging::OutboundMessage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub reply_token: Option<String>,
    pub source: Option<EventSource>,
    pub message: Option<EventMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
}

impl WebhookEvent {
    /// `(reply_token, user_id, text)` for text message events.
    pub fn text_message(&self) -> Option<(&str, &str, &str)> {
        if self.kind != "message" {
            return None;
        }
        let message = self.message.as_ref()?;
        if message.kind != "text" {
            return None;
        }
        Some((
            self.reply_token.as_deref()?,
            self.source.as_ref()?.user_id.as_deref()?,
            message.text.as_deref()?,
        ))
    }
}

/// Checks `X-Line-Signature`: base64 of HMAC-SHA256 over the raw body.
pub fn verify_signature(channel_secret: &str, signature: &str, body: &[u8]) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature.trim()) else {
        return false;
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

pub async fn line_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Skip signature validation if the channel secret is empty (dev mode)
    if !state.config.line_channel_secret.is_empty() {
        let signature = headers
            .get("x-line-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() {
            tracing::warn!("missing X-Line-Signature header");
            return AppError::InvalidSignature.into_response();
        }
        if !verify_signature(&state.config.line_channel_secret, signature, &body) {
            tracing::warn!("invalid LINE signature");
            return AppError::InvalidSignature.into_response();
        }
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "undecodable webhook payload");
            return AppError::BadRequest(format!("invalid payload: {e}")).into_response();
        }
    };

    tracing::debug!(
        destination = payload.destination.as_deref().unwrap_or(""),
        events = payload.events.len(),
        "webhook received"
    );

    let mut should_retry = false;

    for event in &payload.events {
        let Some((reply_token, user_id, text)) = event.text_message() else {
            tracing::debug!(kind = %event.kind, "ignoring non-text event");
            continue;
        };

        tracing::info!(user_id, text, "incoming message");

        let reply = match conversation::process_message(&state, user_id, text).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, user_id, "message processing failed");
                should_retry |= e.is_transient();
                Some(OutboundMessage::text(TRY_AGAIN_LATER))
            }
        };

        if let Some(message) = reply {
            if let Err(e) = state.messaging.reply(reply_token, &[message]).await {
                tracing::error!(error = %e, user_id, "failed to send reply");
            }
        }
    }

    if should_retry {
        (StatusCode::INTERNAL_SERVER_ERROR, "Error").into_response()
    } else {
        (StatusCode::OK, "OK").into_response()
    }
}
