use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tgt_store::KeyValueStore;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::state::AppState;

pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";
pub const REPLAYED_HEADER: &str = "idempotent-replayed";

const IN_FLIGHT: &str = "IN_FLIGHT";
const MAX_KEY_LEN: usize = 255;
const MAX_STORED_BODY: usize = 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
struct StoredResponse {
    status: u16,
    content_type: Option<String>,
    body: String,
}

impl StoredResponse {
    fn replay(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        let mut response = (status, self.body).into_response();
        let headers = response.headers_mut();
        if let Some(content_type) = self.content_type.and_then(|c| HeaderValue::from_str(&c).ok()) {
            headers.insert(header::CONTENT_TYPE, content_type);
        }
        headers.insert(REPLAYED_HEADER, HeaderValue::from_static("true"));
        response
    }
}

fn storage_key(method: &Method, path: &str, key: &str) -> String {
    format!("idem:{}:{}:{}", method, path, key)
}

enum Lookup {
    Missing,
    InFlight,
    Completed(StoredResponse),
}

async fn lookup(state: &AppState, key: &str) -> Result<Lookup, AppError> {
    match state.store.get(key).await? {
        None => Ok(Lookup::Missing),
        Some(raw) if raw == IN_FLIGHT => Ok(Lookup::InFlight),
        Some(raw) => Ok(Lookup::Completed(serde_json::from_str(&raw)?)),
    }
}

fn in_progress() -> Response {
    AppError::ConflictError("A request with this Idempotency-Key is already in progress".to_string()).into_response()
}

/// Set-once idempotency for mutating requests carrying an `Idempotency-Key`.
///
/// The first request claims the key and its response is recorded; repeats
/// replay the record. Server errors release the claim so the client can retry.
pub async fn idempotency_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return next.run(req).await;
    }

    let client_key = match req.headers().get(IDEMPOTENCY_HEADER) {
        None => return next.run(req).await,
        Some(value) => match value.to_str().map(str::trim) {
            Ok(k) if !k.is_empty() && k.len() <= MAX_KEY_LEN => k.to_string(),
            _ => {
                return AppError::ValidationError(format!(
                    "Idempotency-Key must be 1-{} visible ASCII characters",
                    MAX_KEY_LEN
                ))
                .into_response()
            }
        },
    };
    let key = storage_key(req.method(), req.uri().path(), &client_key);

    match lookup(&state, &key).await {
        Ok(Lookup::Missing) => {}
        Ok(Lookup::InFlight) => return in_progress(),
        Ok(Lookup::Completed(stored)) => {
            debug!("Replaying stored response for {}", key);
            return stored.replay();
        }
        Err(e) => return e.into_response(),
    }

    match state.store.set_if_absent(&key, IN_FLIGHT, state.idempotency_ttl()).await {
        Ok(true) => {}
        // Lost the race; the winner may already have finished.
        Ok(false) => {
            return match lookup(&state, &key).await {
                Ok(Lookup::Completed(stored)) => stored.replay(),
                Ok(_) => in_progress(),
                Err(e) => e.into_response(),
            }
        }
        Err(e) => return AppError::from(e).into_response(),
    }

    let response = next.run(req).await;

    if response.status().is_server_error() {
        release(state.store.as_ref(), &key).await;
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_STORED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            release(state.store.as_ref(), &key).await;
            return AppError::InternalServerError(format!("Failed to buffer response: {}", e)).into_response();
        }
    };

    let stored = StoredResponse {
        status: parts.status.as_u16(),
        content_type: parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    };
    match serde_json::to_string(&stored) {
        Ok(raw) => {
            if let Err(e) = state.store.set(&key, &raw, state.idempotency_ttl()).await {
                warn!("Failed to record idempotent response for {}: {}", key, e);
                release(state.store.as_ref(), &key).await;
            }
        }
        Err(e) => {
            warn!("Failed to encode idempotent response for {}: {}", key, e);
            release(state.store.as_ref(), &key).await;
        }
    }

    Response::from_parts(parts, Body::from(bytes))
}

/// Drops a claimed key so the work can be retried. Store failures are only logged.
pub(crate) async fn release(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.delete(key).await {
        warn!("Failed to release key {}: {}", key, e);
    }
}
