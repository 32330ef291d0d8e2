//! # HTTP Transport
//!
//! Maps the three ledger routes onto the [`LedgerApi`] and ledger errors onto
//! status codes:
//!
//! | route            | success             | failures                      |
//! |------------------|---------------------|-------------------------------|
//! | `POST /add`      | 201, plain text     | 400, 409, 500                 |
//! | `GET /get?id=`   | 200, JSON record    | 400, 404, 500                 |
//! | `POST /update`   | 200, plain text     | 400, 404, 500                 |
//!
//! Store calls do blocking file I/O, so each one runs on tokio's blocking
//! pool. Bodies are parsed here rather than with axum's `Json` extractor so
//! that any unparsable body is a 400, regardless of its content type.

use crate::api::{LedgerApi, LIVENESS_PROBE_ID};
use crate::error::{ErrorKind, LedgerError, Result};
use crate::store::RecordStore;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

const PROBE_REPLY: &str = "server is running";

pub fn build_router<S: RecordStore + 'static>(api: LedgerApi<S>) -> Router {
    Router::new()
        .route("/add", post(add_handler::<S>))
        .route("/get", get(get_handler::<S>))
        .route("/update", post(update_handler::<S>))
        .with_state(api)
}

/// Serves the ledger on `listener` until `shutdown` resolves.
pub async fn serve<S, F>(api: LedgerApi<S>, listener: TcpListener, shutdown: F) -> Result<()>
where
    S: RecordStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(api))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// A failed request: the status and the plain-text body sent back.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    /// Classifies `err` and logs it against `route`.
    fn from_error(route: &'static str, err: LedgerError) -> Self {
        let status = status_for(err.kind());
        if status.is_server_error() {
            error!(route, status = status.as_u16(), error = %err, "request failed");
        } else {
            warn!(route, status = status.as_u16(), error = %err, "request rejected");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::StorageFailure | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Deserialize)]
struct GetParams {
    id: Option<String>,
}

async fn add_handler<S: RecordStore + 'static>(
    State(api): State<LedgerApi<S>>,
    body: Bytes,
) -> std::result::Result<impl IntoResponse, ApiFailure> {
    let payload = parse_body("/add", &body)?;
    let result = run_blocking(move || api.create_coupon(payload))
        .await
        .map_err(|e| ApiFailure::from_error("/add", e))?;

    if let Some(record) = result.affected_records.first() {
        info!(id = %record.id, monay = record.balance, "coupon created");
    }
    Ok((StatusCode::CREATED, result.summary()))
}

async fn get_handler<S: RecordStore + 'static>(
    State(api): State<LedgerApi<S>>,
    Query(params): Query<GetParams>,
) -> std::result::Result<Response, ApiFailure> {
    if params.id.as_deref() == Some(LIVENESS_PROBE_ID) {
        return Ok(PROBE_REPLY.into_response());
    }

    let result = run_blocking(move || api.get_coupon(params.id))
        .await
        .map_err(|e| ApiFailure::from_error("/get", e))?;

    match result.affected_records.into_iter().next() {
        Some(record) => {
            info!(id = %record.id, "coupon read");
            Ok(Json(record).into_response())
        }
        None => Err(ApiFailure::from_error(
            "/get",
            LedgerError::Io(std::io::Error::other("store returned no record")),
        )),
    }
}

async fn update_handler<S: RecordStore + 'static>(
    State(api): State<LedgerApi<S>>,
    body: Bytes,
) -> std::result::Result<impl IntoResponse, ApiFailure> {
    let payload = parse_body("/update", &body)?;
    let result = run_blocking(move || api.update_coupon(payload))
        .await
        .map_err(|e| ApiFailure::from_error("/update", e))?;

    if let Some(record) = result.affected_records.first() {
        info!(
            id = %record.id,
            monay = record.balance,
            counter = record.use_count,
            "coupon updated"
        );
    }
    Ok((StatusCode::OK, result.summary()))
}

fn parse_body<T: DeserializeOwned>(
    route: &'static str,
    body: &[u8],
) -> std::result::Result<T, ApiFailure> {
    serde_json::from_slice(body).map_err(|e| {
        ApiFailure::from_error(
            route,
            LedgerError::Validation(format!("unreadable request body: {}", e)),
        )
    })
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| LedgerError::Io(std::io::Error::other(e)))?
}
