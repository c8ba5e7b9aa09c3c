use anyhow::Result;
use motion_config::{AppConfig, SourceConfig, StreamKind};
use motion_imu::pose::to_render_transform;
use motion_imu::MotionClient;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Frames between info-level heartbeats.
const HEARTBEAT_FRAMES: u64 = 300;

/// Open the configured motion source, falling back to the mock device.
async fn open_source(source: &SourceConfig, alpha: f32) -> MotionClient {
    if let Some(addr) = &source.address {
        match MotionClient::connect(addr, alpha).await {
            Ok(client) => return client,
            Err(e) => warn!(?e, %addr, "Motion stream not available"),
        }
    }

    if let Some(path) = &source.replay_path {
        match MotionClient::replay(path, alpha, source.paced_replay).await {
            Ok(client) => return client,
            Err(e) => warn!(?e, ?path, "Recording not available"),
        }
    }

    warn!("Using mock motion source (device at rest)");
    MotionClient::mock(alpha, source.mock_rate_hz)
}

/// Per-frame consumer: hands the current orientation or transform to the view.
async fn frame_loop(config: &AppConfig, client: &MotionClient) {
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(
        1.0 / config.frame_rate_hz as f64,
    ));
    let mut frame_count: u64 = 0;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!(frames = frame_count, "Shutting down");
                return;
            }
        }

        match config.stream {
            StreamKind::Imu => {
                let o = client.orientation();
                debug!(
                    pitch = o.pitch(),
                    yaw = o.yaw(),
                    roll = o.roll(),
                    initialized = o.initialized,
                    "Orientation"
                );
            }
            StreamKind::Pose => match client.pose() {
                Some(pose) => {
                    let transform = to_render_transform(&pose);
                    debug!(?transform, "Pose transform");
                }
                None => debug!("No pose yet"),
            },
        }

        frame_count += 1;
        if frame_count % HEARTBEAT_FRAMES == 0 {
            info!(
                frames = frame_count,
                samples = client.samples_processed(),
                "Frame heartbeat"
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rs_motion=info,motion_imu=info,motion_config=info".into()),
        )
        .init();

    info!("rs-motion starting");

    // Load config.
    let config = motion_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    info!(
        stream = ?config.stream,
        alpha = config.estimator.alpha,
        frame_rate_hz = config.frame_rate_hz,
        "Config loaded"
    );

    let client = open_source(&config.source, config.estimator.alpha).await;
    frame_loop(&config, &client).await;

    Ok(())
}
