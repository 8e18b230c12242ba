mod action;
mod app;
mod catalog_source;
mod components;
mod dial;
mod theme;

use std::time::Duration;

use tokio::sync::mpsc;

use wradio_core::{
    config, AudioPipeline, ElementEvent, PlaybackController, SimulatedBackend, ThreadRngSource,
    TrackSelector,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = config::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("wradio.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress
    // connection-level DEBUG from HTTP client internals.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("wradio log: {}", log_path.display());

    tracing::info!("wradio starting…");

    // ── Load config and stations ─────────────────────────────────────────────
    let config = config::Config::load().unwrap_or_default();
    let stations = catalog_source::resolve(&config).await?;

    // ── Element event channel (playback element → app loop) ──────────────────
    let (element_tx, element_rx) = mpsc::channel::<ElementEvent>(64);

    // ── Build the receiver ───────────────────────────────────────────────────
    let controller = if stations.is_empty() {
        tracing::warn!("no stations; receiver stays inert");
        None
    } else {
        let backend = SimulatedBackend::new(
            element_tx,
            Duration::from_secs(config.audio.sim_track_secs.max(1)),
        );
        let mut controller = PlaybackController::new(
            stations,
            TrackSelector::new(ThreadRngSource),
            AudioPipeline::new(backend),
        );
        controller.set_volume(config.audio.default_volume_pct);
        controller.set_tone(config.audio.default_tone_pct);
        Some(controller)
    };

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(&config, controller);
    app.run(element_rx).await?;

    Ok(())
}
