//! Relay gateway: streams model output to callers and delivers an exact
//! structured metadata envelope once generation completes.

pub mod config;
pub mod error;
pub mod routes;
pub mod upstream;

pub use config::Config;
pub use error::Error;
pub use upstream::{HttpBackend, ModelBackend, StreamEvent, UpstreamCall};

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

/// Shared application state.
///
/// Each call runs on an independent task; the configuration (including the
/// deployment secret inside the backend) is the only state shared across
/// calls, and it is immutable.
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn ModelBackend>,
}

/// Build the full gateway router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::generate::router(state))
        .layer(TraceLayer::new_for_http())
}
