pub mod api;
mod db;
pub mod engine;
pub mod feed;
pub mod feedback;
pub mod fingerprint;
pub mod inference;
pub mod settings;
pub mod signals;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

pub use api::{ApiError, HttpApi, RemoteApi};
pub use db::FeedbackEntry;
pub use engine::ContextEngine;
pub use feed::{FeedPhase, RecommendationCard, SwipeDirection};
pub use feedback::{ContentTags, EventKind, Polarity};
pub use fingerprint::Fingerprint;
pub use inference::{FailureKind, InferenceResult, InferenceSource, UiMode};
pub use settings::{EngineSettings, SettingsStore};
pub use signals::{HostPlatform, Platform, SignalSnapshot};
pub use utils::init_logging;

const ENV_DATA_DIR: &str = "BHARAT_DATA_DIR";
const DEFAULT_DATA_DIR: &str = ".bharat-engine";

fn data_dir() -> PathBuf {
    std::env::var_os(ENV_DATA_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Run one session against the configured service from this host and print
/// what the UI would receive.
pub async fn run() -> Result<()> {
    init_logging();
    log::info!("Bharat context engine starting up...");

    let data_dir = data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let settings = SettingsStore::new(data_dir.join("settings.json"))?.current();

    let api = HttpApi::new(settings.api_base_url.clone(), settings.inference_timeout())?;
    if !api.check_health().await {
        log::warn!(
            "service at {} is not answering; expect offline results",
            api.base_url()
        );
    }

    let engine = ContextEngine::open(
        &data_dir,
        settings,
        Arc::new(HostPlatform::default()),
        Arc::new(api),
    )?;

    let started = Instant::now();
    let result = engine.initialize().await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    for card in engine.current_cards().await {
        println!("[{}] {} - {}", card.id, card.title, card.description);
    }
    if let Some(card) = engine.swipe(SwipeDirection::Right).await {
        log::info!("liked '{}'", card.title);
    }

    engine.end_session(started.elapsed()).await;
    engine.shutdown().await;
    Ok(())
}
