// memgate: HTTP service surface (§6)
//
// Bootstrap (TcpListener + axum::serve + listening banner) is grounded on
// knhk-sidecar::rest_api's start_rest_api; routing/response shaping is this
// crate's own work over the L1-L8 core.

pub mod proxy;
pub mod routes;

use std::sync::Arc;

use axum::http::header::{HeaderName, HeaderValue};
use axum::Router;
use reqwest::Client;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::archive::ArchiveRegistry;
use crate::bench::BenchmarkBroker;
use crate::bench::BenchmarkTap;
use crate::error::{MemgateError, MemgateResult};
use crate::fetch::FetchSettings;

pub const GENERATOR: &str = concat!("memgate/", env!("CARGO_PKG_VERSION"));

/// Shared state handed to every axum handler (§6).
#[derive(Clone)]
pub struct AppState {
    pub client: Client,
    pub registry: Arc<ArchiveRegistry>,
    pub settings: FetchSettings,
    pub top_k: usize,
    pub tap: BenchmarkTap,
    pub map_base: String,
    pub gate_base: String,
    pub service_base: String,
    pub static_dir: Option<String>,
    pub broker: Option<BenchmarkBroker>,
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", axum::routing::get(routes::welcome))
        .route("/timemap/:format/*urir", axum::routing::get(routes::timemap))
        .route("/timegate/*urir", axum::routing::get(routes::timegate))
        .route("/memento/:format/:datetime/*urir", axum::routing::get(routes::memento_describe_or_proxy))
        .route("/memento/:datetime/*urir", axum::routing::get(routes::memento_redirect))
        .route("/api/:format/:datetime/*urir", axum::routing::get(routes::memento_describe_or_proxy))
        .route("/api/:datetime/*urir", axum::routing::get(routes::memento_redirect));

    if state.broker.is_some() {
        router = router.route("/monitor", axum::routing::get(routes::monitor));
    }
    if let Some(dir) = state.static_dir.clone() {
        router = router.nest_service("/static", tower_http::services::ServeDir::new(dir));
    }

    // Access-Control-Allow-Origin / Access-Control-Expose-Headers / X-Generator
    // apply uniformly to every response (§6 "Response headers").
    let cors = CorsLayer::new().allow_origin(Any).expose_headers([
        HeaderName::from_static("link"),
        HeaderName::from_static("location"),
        HeaderName::from_static("x-memento-count"),
        HeaderName::from_static("x-generator"),
    ]);
    let generator_header = SetResponseHeaderLayer::if_not_present(
        HeaderName::from_static("x-generator"),
        HeaderValue::from_static(GENERATOR),
    );

    router.with_state(state).layer(cors).layer(generator_header)
}

/// Bind and serve (§6 "HTTP service endpoints").
pub async fn serve(host: &str, port: u16, state: AppState) -> MemgateResult<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| MemgateError::Internal(format!("failed to bind {addr}: {e}")))?;

    info!(%addr, "memgate listening");
    info!("  GET  /                               - welcome/service info");
    info!("  GET  /timemap/{{link|json|cdxj}}/{{URI-R}} - full TimeMap");
    info!("  GET  /timegate/{{URI-R}}                - TimeGate redirect");
    info!("  GET  /memento/{{...}}/{{YYYY../URI-R}}     - memento description or proxy");
    info!("  GET  /api/...                        - synonym of /memento/...");

    axum::serve(listener, app)
        .await
        .map_err(|e| MemgateError::Internal(format!("server error: {e}")))?;
    Ok(())
}
