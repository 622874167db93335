use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use screen_recorder::{
    create_router, AppState, CaptureStrategy, ChannelSink, Config, FanOut, LoggingSink,
    NotificationSink, NotificationType, RecordingSessionController, StatusBoard,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How long the encoder gets to finalize the file after the stop input
const FINALIZE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "screen-recorder")]
#[command(about = "Screen and audio recorder driving an external encoder")]
#[command(version)]
struct Cli {
    /// Configuration file, extension optional
    #[arg(short, long, default_value = "config/screen-recorder")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the capture devices the encoder reports
    Devices,

    /// Record until Ctrl-C or the duration elapses
    Record {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Stop automatically after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Serve the HTTP control API
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Screen recorder v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Encoder: {} ({})",
        cfg.encoder.binary_path.display(),
        cfg.encoder.platform
    );

    match cli.command {
        Commands::Devices => list_devices(&cfg).await,
        Commands::Record { output, duration } => record(&cfg, output, duration).await,
        Commands::Serve => serve(&cfg).await,
    }
}

fn build_controller(cfg: &Config, sink: Arc<dyn NotificationSink>) -> RecordingSessionController {
    let controller =
        RecordingSessionController::new(Arc::new(cfg.platform()), cfg.session_config(), sink);
    match cfg.extension() {
        Some(extension) => controller.with_extension(Arc::new(extension)),
        None => controller,
    }
}

async fn list_devices(cfg: &Config) -> Result<()> {
    let session = cfg.session_config();
    let strategy = CaptureStrategy::for_platform(cfg.encoder.platform, session.probe_timeout);
    let catalog = strategy
        .enumerator
        .enumerate(&cfg.encoder.binary_path)
        .await
        .context("Device probe failed")?;

    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}

async fn record(cfg: &Config, output: PathBuf, duration: Option<u64>) -> Result<()> {
    let (channel, mut events) = ChannelSink::new();
    let sinks: Vec<Arc<dyn NotificationSink>> = vec![Arc::new(LoggingSink), Arc::new(channel)];
    let controller = build_controller(cfg, Arc::new(FanOut(sinks)));

    controller.start(output.clone()).await?;

    let limit = async {
        match duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(limit);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping recording");
                break;
            }
            _ = &mut limit => {
                info!("Duration reached, stopping recording");
                break;
            }
            event = events.recv() => match event {
                Some(n) if n.kind == NotificationType::Fatal => bail!("Recording failed: {}", n.message),
                Some(n) if n.kind == NotificationType::Completed => {
                    warn!("Encoder exited before stop was requested");
                    return Ok(());
                }
                Some(_) => continue,
                None => bail!("Notification channel closed"),
            }
        }
    }

    controller.stop().await?;

    loop {
        let event = tokio::time::timeout(FINALIZE_TIMEOUT, events.recv())
            .await
            .context("Encoder did not finish in time")?;
        match event {
            Some(n) if n.kind == NotificationType::Completed => break,
            Some(n) if n.kind == NotificationType::Fatal => bail!("Recording failed: {}", n.message),
            Some(_) => continue,
            None => bail!("Notification channel closed"),
        }
    }

    info!("Recording saved to {}", output.display());
    Ok(())
}

async fn serve(cfg: &Config) -> Result<()> {
    let board = Arc::new(StatusBoard::default());
    let sinks: Vec<Arc<dyn NotificationSink>> = vec![
        Arc::new(LoggingSink),
        board.clone() as Arc<dyn NotificationSink>,
    ];
    let controller = Arc::new(build_controller(cfg, Arc::new(FanOut(sinks))));

    let state = AppState::new(Arc::clone(&controller), board, cfg.recording.output_dir.clone());
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.http.bind, cfg.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    controller.shutdown().await;
    Ok(())
}
