//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderName, Method},
    routing::{get, post},
    Router,
};
use clado_client::CladoClient;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::expert_search::ExpertSearchService;
use crate::kernel::{BaseSearchJobApi, CladoAdapter, PostgresProjectStore, ServerDeps};
use crate::server::routes::{
    expert_search_handler, expert_search_job_handler, health_handler, CALL_ID_HEADER,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: ExpertSearchService,
}

/// Wire production dependencies from configuration.
///
/// A missing API key leaves `search_api` empty; the server still starts and
/// rejects submissions.
pub fn build_deps(config: &Config, pool: PgPool) -> ServerDeps {
    let search_api = config.clado_api_key.clone().map(|key| {
        let client = match &config.clado_base_url {
            Some(base_url) => CladoClient::with_base_url(key, base_url.clone()),
            None => CladoClient::new(key),
        };
        Arc::new(CladoAdapter::new(Arc::new(client))) as Arc<dyn BaseSearchJobApi>
    });

    if search_api.is_none() {
        tracing::warn!("CLADO_API_KEY not set, expert searches will be rejected");
    }

    ServerDeps::new(search_api, Arc::new(PostgresProjectStore::new(pool)))
}

/// Build the Axum application router
pub fn build_app(service: ExpertSearchService) -> Router {
    let app_state = AppState { service };

    // CORS configuration - allow any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(CALL_ID_HEADER)]);

    Router::new()
        .route("/expert-search", post(expert_search_handler))
        .route("/expert-search/:call_id", get(expert_search_job_handler))
        .route("/health", get(health_handler))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
