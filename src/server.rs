//! HTTP surface for one strategy.
//!
//! Routes:
//! - `GET /process` - run one request through the handler
//! - `GET /stats` - repository counters
//!
//! Handlers block, so both routes hand each call to tokio's blocking pool.
//! That keeps the async workers free to accept connections while requests
//! queue up on the repository lock.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::handler::{ProcessResponse, RequestHandler};
use crate::repository::RepositoryStats;

type SharedHandler = Arc<dyn RequestHandler>;

/// Errors returned to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub(crate) enum AppError {
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Builds the router for `handler`.
pub fn router(handler: Arc<dyn RequestHandler>) -> Router {
    Router::new()
        .route("/process", get(process))
        .route("/stats", get(stats))
        .with_state(handler)
}

/// GET /process - Run one request through the handler.
async fn process(
    State(handler): State<SharedHandler>,
) -> std::result::Result<Json<ProcessResponse>, AppError> {
    let strategy = handler.strategy();
    let response = tokio::task::spawn_blocking(move || handler.handle())
        .await
        .map_err(|e| {
            error!(%strategy, error = %e, "handler task failed");
            AppError::Internal(format!("{strategy} handler did not complete: {e}"))
        })?;

    debug!(
        %strategy,
        id = response.counter,
        duration_us = response.duration,
        "processed request"
    );
    Ok(Json(response))
}

/// GET /stats - Repository counters.
///
/// Reading the locked repository can wait behind a held-lock request, so
/// this runs on the blocking pool too.
async fn stats(
    State(handler): State<SharedHandler>,
) -> std::result::Result<Json<RepositoryStats>, AppError> {
    let strategy = handler.strategy();
    let stats = tokio::task::spawn_blocking(move || handler.stats())
        .await
        .map_err(|e| {
            error!(%strategy, error = %e, "stats task failed");
            AppError::Internal(format!("{strategy} stats did not complete: {e}"))
        })?;
    Ok(Json(stats))
}

/// Serves `handler` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    handler: Arc<dyn RequestHandler>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| Error::io("reading listener address", e))?;
    let strategy = handler.strategy();
    info!(%strategy, %addr, "server listening");

    axum::serve(listener, router(handler))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::io(format!("serving {strategy} on {addr}"), e))?;

    info!(%strategy, %addr, "server stopped");
    Ok(())
}

/// Binds `addr`, mapping failures to a contextual IO error.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| Error::io(format!("binding {addr}"), e))
}

/// A server running in a background task.
///
/// Dropping the handle without calling [`ServerHandle::shutdown`] leaves the
/// server running until the runtime shuts down.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl ServerHandle {
    /// Binds `addr` and starts serving `handler` in the background.
    ///
    /// Use port 0 to let the OS pick a free port; [`ServerHandle::addr`]
    /// reports the one actually bound.
    pub async fn spawn(addr: SocketAddr, handler: Arc<dyn RequestHandler>) -> Result<Self> {
        let listener = bind(addr).await?;
        let addr = listener
            .local_addr()
            .map_err(|e| Error::io("reading listener address", e))?;

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(serve(listener, handler, async move {
            let _ = rx.await;
        }));

        Ok(Self {
            addr,
            shutdown: Some(tx),
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL, e.g. `http://127.0.0.1:8081`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL of the `/process` endpoint.
    pub fn process_url(&self) -> String {
        format!("{}/process", self.url())
    }

    /// Signals graceful shutdown and waits for the server task.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(Error::io(
                "joining server task",
                std::io::Error::other(e.to_string()),
            )),
        }
    }
}
