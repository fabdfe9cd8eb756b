//! Test harness wiring the expert search service to in-memory doubles.
//!
//! Tests that exercise the poll cadence run with `start_paused = true`, so
//! `tokio::time::sleep` advances the clock instantly once every poller has
//! gone idle.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use expert_search::domains::expert_search::ExpertSearchService;
use expert_search::kernel::{BaseSearchJobApi, MockProjectStore, MockSearchJobApi, ServerDeps};
use expert_search::server::build_app;

pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

pub struct TestHarness {
    pub api: Arc<MockSearchJobApi>,
    pub store: Arc<MockProjectStore>,
    pub service: ExpertSearchService,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Harness whose service has no remote API credential.
    pub fn without_api_key() -> Self {
        Self::build(false)
    }

    fn build(with_api: bool) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let api = Arc::new(MockSearchJobApi::new());
        let store = Arc::new(MockProjectStore::new());
        let search_api = with_api.then(|| api.clone() as Arc<dyn BaseSearchJobApi>);
        let deps = ServerDeps::new(search_api, store.clone());

        Self {
            api,
            store,
            service: ExpertSearchService::new(deps, POLL_INTERVAL),
        }
    }

    pub fn app(&self) -> Router {
        build_app(self.service.clone())
    }
}

/// Let simulated time pass.
pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}
