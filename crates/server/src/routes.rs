//! Gateway route definitions and handlers.
//!
//! Every inbound request lands in the fallback handler: GETs are offered to
//! the interception pipeline, the configured form path is relayed with
//! enqueue-on-failure, and everything else is relayed upstream unmodified.
//! Sync triggers are exposed under `/-/sync/{tag}` so external schedulers
//! can fire them.

use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use url::Url;
use uuid::Uuid;

use squall_core::{PendingSubmission, ResponseSnapshot};
use squall_worker::{Destination, FetchRequest, Intercept, PERIODIC_SYNC_TAG, RequestMode};

use crate::state::AppState;

/// Headers that must not be copied from a stored or relayed response:
/// reqwest has already decoded the transfer, so the upstream framing and
/// encoding no longer apply.
const SKIP_HEADERS: &[&str] = &["connection", "content-length", "content-encoding", "transfer-encoding"];

/// Create the gateway router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/-/healthz", get(healthz))
        .route("/-/sync/{tag}", post(trigger_sync))
        .fallback(gateway)
        .with_state(state)
}

async fn healthz(State(state): State<AppState>) -> Response {
    match state.outbox.pending_count().await {
        Ok(pending) => Json(json!({"status": "ok", "pending_submissions": pending})).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "degraded", "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn trigger_sync(State(state): State<AppState>, Path(tag): Path<String>) -> Response {
    let result = if tag == PERIODIC_SYNC_TAG {
        state.worker.handle_periodic_sync(&tag).await
    } else {
        state.worker.handle_sync(&tag).await
    };

    match result {
        Ok(Some(report)) => {
            Json(json!({"tag": tag, "delivered": report.delivered, "retained": report.retained})).into_response()
        }
        Ok(None) => (StatusCode::ACCEPTED, Json(json!({"tag": tag, "ignored": true}))).into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": e.to_string()}))).into_response(),
    }
}

/// Fallback handler: the gateway entry point for site traffic.
async fn gateway(State(state): State<AppState>, request: Request) -> Response {
    if request.method() == Method::POST && request.uri().path() == state.config.submit_path {
        return submit(state, request).await;
    }

    if request.method() == Method::GET {
        return intercept(state, request).await;
    }

    relay(state, request).await
}

/// Offer a GET to the interception pipeline; relay on passthrough.
async fn intercept(state: AppState, request: Request) -> Response {
    let url = match upstream_url(&state, request.uri()) {
        Ok(url) => url,
        Err(response) => return response,
    };

    let mode = header_str(&request, "sec-fetch-mode")
        .map(RequestMode::from_header)
        .unwrap_or_default();
    let destination = header_str(&request, "sec-fetch-dest").and_then(Destination::from_header);

    let mut fetch_request = FetchRequest::get(url).with_mode(mode);
    fetch_request.destination = destination;

    match state.worker.handle_fetch(&fetch_request).await {
        Intercept::Respond(snapshot) => snapshot_response(&snapshot),
        Intercept::Passthrough => relay(state, request).await,
    }
}

/// Relay the configured form path upstream; queue the payload when the
/// network is down.
async fn submit(state: AppState, request: Request) -> Response {
    let bytes = match axum::body::to_bytes(request.into_body(), state.config.max_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, Json(json!({"error": e.to_string()}))).into_response();
        }
    };

    let payload: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": format!("invalid JSON body: {e}")})))
                .into_response();
        }
    };

    let endpoint = state.worker.sync_agent().endpoint().clone();
    match state.relay.post(endpoint.as_str()).json(&payload).send().await {
        Ok(upstream) => upstream_response(upstream).await,
        Err(e) => {
            tracing::info!(error = %e, "submission endpoint unreachable, queueing");

            let id = payload
                .get("id")
                .and_then(|v| v.as_str())
                .map(String::from)
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            match state.outbox.enqueue(&PendingSubmission::new(id.clone(), payload)).await {
                Ok(()) => (StatusCode::ACCEPTED, Json(json!({"queued": true, "id": id}))).into_response(),
                Err(e) => {
                    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": e.to_string()}))).into_response()
                }
            }
        }
    }
}

/// Forward a request upstream unmodified.
async fn relay(state: AppState, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let url = match upstream_url(&state, &parts.uri) {
        Ok(url) => url,
        Err(response) => return response,
    };

    let bytes = match axum::body::to_bytes(body, state.config.max_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, Json(json!({"error": e.to_string()}))).into_response();
        }
    };

    let mut upstream = state.relay.request(parts.method, url.as_str());
    for (name, value) in &parts.headers {
        if name != "host" {
            upstream = upstream.header(name, value);
        }
    }

    match upstream.body(bytes).send().await {
        Ok(response) => upstream_response(response).await,
        Err(e) => (StatusCode::BAD_GATEWAY, Json(json!({"error": e.to_string()}))).into_response(),
    }
}

/// Resolve an inbound path against the configured origin.
fn upstream_url(state: &AppState, uri: &Uri) -> Result<Url, Response> {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    state
        .origin
        .join(path_and_query)
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()}))).into_response())
}

fn header_str<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Convert a stored snapshot into an axum response.
fn snapshot_response(snapshot: &ResponseSnapshot) -> Response {
    let status = StatusCode::from_u16(snapshot.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder().status(status);

    for (name, value) in &snapshot.headers {
        let lower = name.to_ascii_lowercase();
        if !SKIP_HEADERS.contains(&lower.as_str()) {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }

    builder
        .body(Body::from(snapshot.body.clone()))
        .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
}

/// Convert a live upstream response into an axum response.
async fn upstream_response(response: reqwest::Response) -> Response {
    let status = response.status();
    let headers = response.headers().clone();

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            return (StatusCode::BAD_GATEWAY, Json(json!({"error": e.to_string()}))).into_response();
        }
    };

    let mut builder = Response::builder().status(status);
    for (name, value) in &headers {
        if !SKIP_HEADERS.contains(&name.as_str()) {
            builder = builder.header(name, value);
        }
    }

    builder
        .body(Body::from(bytes))
        .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
}
