mod config;
mod docx;
mod errors;
mod extract;
mod llm_client;
mod routes;
mod state;
mod tailoring;
mod tracker;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tracker::JsonlStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_directive(&config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Output directory for tailored resumes and cover letters
    tokio::fs::create_dir_all(&config.output_dir).await?;
    info!("Writing tailored documents to {}", config.output_dir.display());

    // Activity log (JSONL, counters primed from the existing file)
    let tracker = Arc::new(JsonlStore::open(config.activity_log_path.clone()).await?);
    info!("Activity log at {}", config.activity_log_path.display());

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let state = AppState {
        llm,
        config: config.clone(),
        tracker,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Default tracing filter directive. Tracing targets use the module path, so
/// the crate name must be its underscored form, not the package name.
fn default_log_directive(level: &str) -> String {
    format!("{}={level}", env!("CARGO_CRATE_NAME"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_directive_matches_module_path_targets() {
        let directive = default_log_directive("info");
        assert_eq!(directive, "tailor_api=info");
        assert!(!directive.contains('-'));
    }
}
