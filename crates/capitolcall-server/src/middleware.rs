//! Webhook request preparation.
//!
//! Every voice route runs behind this middleware. It buffers the form
//! body, verifies the provider signature when enabled, merges query and
//! form parameters into a typed [`RequestParams`], and stores the result
//! in request extensions for the handler.

use axum::{
    body::{Body, Bytes},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use capitolcall_flow::session::RequestParams;
use std::sync::Arc;

use crate::signature;
use crate::AppState;

/// Wrapper for the parsed webhook parameters stored in request extensions.
#[derive(Clone, Debug)]
pub struct WebhookParams(pub RequestParams);

fn decode_pairs(input: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(input)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Middleware preparing provider voice webhooks.
///
/// Rejects requests whose signature does not verify (401) and requests
/// that lack a call id (404), since neither can have come from the
/// provider.
pub async fn webhook_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    let (mut parts, body) = req.into_parts();
    let body_bytes: Bytes = axum::body::to_bytes(body, 64 * 1024)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let query_pairs = parts
        .uri
        .query()
        .map(|q| decode_pairs(q.as_bytes()))
        .unwrap_or_default();
    let form_pairs = decode_pairs(&body_bytes);

    if state.validate_signatures {
        // The provider signs the full public URL plus the POST form
        // parameters. Query-only GET requests sign the URL alone.
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| parts.uri.path());
        let url = format!("{}{}", state.public_url, path_and_query);

        let provided = parts
            .headers
            .get("X-Twilio-Signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !signature::validate(&state.auth_token, &url, &form_pairs, provided) {
            tracing::warn!(path = %parts.uri.path(), "rejected webhook with bad signature");
            return Err(StatusCode::UNAUTHORIZED);
        }
    }

    // Form parameters are appended after query parameters so they win on
    // duplicate names.
    let mut pairs = query_pairs;
    pairs.extend(form_pairs);
    let params = RequestParams::from_pairs(pairs).map_err(|_| StatusCode::NOT_FOUND)?;

    parts.extensions.insert(WebhookParams(params));
    let req = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(req).await)
}
