//! Request correlation.
//!
//! Every request carries a request id: the caller's `X-Request-ID` when it is
//! usable, a fresh UUID otherwise. Import handlers copy it into the sync
//! context so phase logs share it with the access log.

use axum::{
    body::Body,
    http::{header::HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

const MAX_REQUEST_ID_LEN: usize = 128;

#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Accepts a caller-supplied id only if it is short printable ASCII.
fn accept_request_id(value: Option<&HeaderValue>) -> Option<String> {
    let id = value?.to_str().ok()?.trim();
    let printable = id.bytes().all(|b| b.is_ascii_graphic());
    (!id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN && printable).then(|| id.to_string())
}

pub async fn trace_id(mut req: Request<Body>, next: Next) -> Response {
    let request_id = accept_request_id(req.headers().get(REQUEST_ID_HEADER))
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    let started = Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;

    span.in_scope(|| {
        tracing::info!(
            status = response.status().as_u16(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-request-id"), value);
    }
    response
}
