//! speakerkeep entrypoint.
//!
//! Loads configuration from the environment, wires up the Transcriber,
//! Diarizer, Embedder, and Transcoder collaborators, and serves the HTTP
//! API until interrupted.

use speakerkeep::collaborators::{Diarizer, Embedder, FfmpegTranscoder, HttpEmbedder, HttpTranscriber, SubprocessDiarizer, Transcoder, Transcriber};
use speakerkeep::session::SessionStore;
use speakerkeep::{Config, Orchestrator};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("speakerkeep=info,warn")),
        )
        .with_target(false)
        .init();

    tracing::info!("============================================================");
    tracing::info!("starting speakerkeep");
    tracing::info!("============================================================");

    let config = Config::from_env();

    let transcriber: Arc<dyn Transcriber> =
        Arc::new(HttpTranscriber::new(config.transcriber_url.clone(), config.transcribe_timeout));
    let diarizer: Arc<dyn Diarizer> =
        Arc::new(SubprocessDiarizer::new(config.diarizer_command.clone(), config.diarizer_model.clone()));
    let transcoder: Arc<dyn Transcoder> = Arc::new(FfmpegTranscoder::new());
    let embedder: Option<Arc<dyn Embedder>> = config
        .embedder_url
        .clone()
        .map(|url| Arc::new(HttpEmbedder::new(url, config.embedder_api_key.clone())) as Arc<dyn Embedder>);

    if embedder.is_none() {
        tracing::warn!("no embedder configured; cross-chunk speaker continuity is disabled");
    }

    let sessions = Arc::new(SessionStore::new(config.speaker_persist_dir.clone()));
    let orchestrator = Arc::new(Orchestrator::new(
        transcriber.clone(),
        diarizer.clone(),
        transcoder,
        embedder.clone(),
        sessions.clone(),
    ));

    let handle =
        speakerkeep::server::start(&config, orchestrator, transcriber, diarizer, embedder, sessions).await?;

    tracing::info!(addr = %handle.addr(), "speakerkeep ready");
    tracing::info!("============================================================");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    handle.shutdown().await;

    Ok(())
}
