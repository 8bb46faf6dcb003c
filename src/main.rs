use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use voxpad::{
    create_router, AppState, CaptureConfig, CaptureDeviceFactory, CaptureSource, Config,
    HttpTranscriptionService, RecordingSession, SessionConfig, UploadCoordinator,
};

#[derive(Parser)]
#[command(name = "voxpad")]
#[command(about = "Recording session service with an HTTP control surface")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(cli.config.as_deref())?;

    let bind = cli.bind.unwrap_or_else(|| cfg.service.http.bind.clone());
    let port = cli.port.unwrap_or(cfg.service.http.port);

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let source = match cfg.capture.source.as_str() {
        "file" => CaptureSource::File(PathBuf::from(&cfg.capture.wav_path)),
        "microphone" => CaptureSource::Microphone,
        other => bail!("Unknown capture source: {}", other),
    };

    let capture_config = CaptureConfig {
        fragment_duration_ms: cfg.capture.fragment_duration_ms,
        spectrum_interval_ms: cfg.capture.spectrum_interval_ms,
        spectrum_bins: cfg.capture.spectrum_bins,
    };

    let device = CaptureDeviceFactory::create(source, capture_config)
        .context("Failed to create capture device")?;

    let transcription = HttpTranscriptionService::new(
        &cfg.transcription.endpoint,
        Duration::from_secs(cfg.transcription.timeout_secs),
    )
    .context("Failed to create transcription service")?;
    let coordinator = Arc::new(UploadCoordinator::new(Box::new(transcription)));

    let session = Arc::new(RecordingSession::new(
        SessionConfig::default(),
        device,
        Arc::clone(&coordinator),
    ));

    // Log lifecycle notices as they fire
    let mut notices = session.subscribe();
    tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            info!("Session notice: {:?}", notice);
        }
    });

    let state = AppState::new(
        Arc::clone(&session),
        coordinator,
        PathBuf::from(&cfg.storage.recordings_path),
    );
    let app = create_router(state);

    let addr = format!("{}:{}", bind, port);
    info!("HTTP control surface listening on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    session.shutdown().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
