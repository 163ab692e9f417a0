//! HTTP/JSON transport for the mailing list RPC service.
//!
//! # Responsibility
//! - Route `POST /rpc/<Operation>` to the façade and encode its results.
//! - Map façade failures to stable error envelopes and HTTP statuses.
//! - Run the listener until Ctrl-C / SIGTERM.
//!
//! # Invariants
//! - Absent entries are `200 OK` with `"email_entry": null`.
//! - Every non-2xx response carries an `ErrorEnvelope` body.

use crate::api::{ApiError, MailingListApi};
use crate::config::ServerConfig;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use mailinglist_core::db::{open_db, DbError};
use mailinglist_core::proto::{
    CreateEmailRequest, DeleteEmailRequest, ErrorEnvelope, ErrorKind, GetEmailBatchRequest,
    GetEmailRequest, RpcMethod, UpdateEmailRequest,
};
use serde::Serialize;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use tokio::net::TcpListener;

/// Fatal server startup or runtime failure.
#[derive(Debug)]
pub enum ServeError {
    Db(DbError),
    Bind {
        addr: String,
        source: std::io::Error,
    },
    Io(std::io::Error),
}

impl Display for ServeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "failed to open store: {err}"),
            Self::Bind { addr, source } => write!(f, "failed to bind {addr}: {source}"),
            Self::Io(err) => write!(f, "server failed: {err}"),
        }
    }
}

impl Error for ServeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Bind { source, .. } => Some(source),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<DbError> for ServeError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Builds the RPC router around `api`.
pub fn router(api: MailingListApi) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(RpcMethod::CreateEmail.path(), post(create_email))
        .route(RpcMethod::GetEmail.path(), post(get_email))
        .route(RpcMethod::UpdateEmail.path(), post(update_email))
        .route(RpcMethod::DeleteEmail.path(), post(delete_email))
        .route(RpcMethod::GetEmailBatch.path(), post(get_email_batch))
        .with_state(api)
}

/// Opens the store, binds the listener and serves until a shutdown signal.
///
/// Store and bind failures are returned before any request is accepted.
pub async fn serve(config: ServerConfig) -> Result<(), ServeError> {
    let conn = open_db(&config.db_path)?;
    let api = MailingListApi::new(conn).with_call_timeout(config.call_timeout);

    let listener = bind_listener(&config.bind).await?;
    let local_addr = listener.local_addr().map_err(ServeError::Io)?;
    info!(
        "event=server_start module=rpc status=ok bind={} db={} timeout_ms={}",
        local_addr,
        config.db_path.display(),
        config.call_timeout.as_millis()
    );

    serve_listener(listener, api, shutdown_signal())
        .await
        .map_err(ServeError::Io)?;

    info!("event=server_stop module=rpc status=ok");
    Ok(())
}

/// Resolves `addr` (`host:port`) and binds the first address that accepts.
pub async fn bind_listener(addr: &str) -> Result<TcpListener, ServeError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Serves `api` on an already-bound listener until `shutdown` resolves.
pub async fn serve_listener(
    listener: TcpListener,
    api: MailingListApi,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(api))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("event=signal_install module=rpc status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("event=signal_install module=rpc status=error signal=sigterm error={err}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
    info!("event=shutdown_signal module=rpc status=ok");
}

async fn healthz() -> Response {
    Json(json!({ "ok": true, "version": mailinglist_core::core_version() })).into_response()
}

async fn create_email(
    State(api): State<MailingListApi>,
    payload: Result<Json<CreateEmailRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(request)) => respond(api.create_email(request).await),
        Err(rejection) => rejection_response(rejection),
    }
}

async fn get_email(
    State(api): State<MailingListApi>,
    payload: Result<Json<GetEmailRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(request)) => respond(api.get_email(request).await),
        Err(rejection) => rejection_response(rejection),
    }
}

async fn update_email(
    State(api): State<MailingListApi>,
    payload: Result<Json<UpdateEmailRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(request)) => respond(api.update_email(request).await),
        Err(rejection) => rejection_response(rejection),
    }
}

async fn delete_email(
    State(api): State<MailingListApi>,
    payload: Result<Json<DeleteEmailRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(request)) => respond(api.delete_email(request).await),
        Err(rejection) => rejection_response(rejection),
    }
}

async fn get_email_batch(
    State(api): State<MailingListApi>,
    payload: Result<Json<GetEmailBatchRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(request)) => respond(api.get_email_batch(request).await),
        Err(rejection) => rejection_response(rejection),
    }
}

fn respond<T: Serialize>(result: Result<T, ApiError>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &ApiError) -> Response {
    let status = status_for(err.kind());
    (status, Json(ErrorEnvelope::new(err.kind(), err.to_string()))).into_response()
}

fn rejection_response(rejection: JsonRejection) -> Response {
    let body = ErrorEnvelope::new(ErrorKind::InvalidArgument, rejection.body_text());
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
