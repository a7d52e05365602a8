use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::tracker::ActivityStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    pub config: Config,
    /// Pluggable activity log. Default: JSONL file next to the output dir.
    pub tracker: Arc<dyn ActivityStore>,
}
