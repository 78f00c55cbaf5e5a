//! HTTP API
//!
//! Assembles the routes that accept submissions and list stored URLs.

mod handlers;

pub use handlers::MAX_LISTED_URLS;

use crate::ingest::Submitter;
use crate::store::RecordStore;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler
///
/// Holds a `Submitter` clone; the ingestion queue stays open while any
/// router built from this state is alive.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub submitter: Submitter,
}

/// Builds the application router with its middleware
///
/// Requests get an `x-request-id` (kept if the caller sent one) that is
/// echoed on the response. A panicking handler becomes a 500.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods([
        Method::GET,
        Method::PUT,
        Method::POST,
        Method::DELETE,
    ]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/store", post(handlers::store_url))
        .route("/urls", get(handlers::list_urls))
        .layer(cors)
        .layer(CatchPanicLayer::new())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// Serves the API on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening on {}", addr);
    }

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
