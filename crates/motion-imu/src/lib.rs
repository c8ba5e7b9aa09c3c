pub mod fusion;
pub mod pose;
pub mod protocol;
pub mod types;

use anyhow::Result;
use fusion::RotationEstimator;
use glam::Vec3;
use protocol::ProtocolParser;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use types::{
    AngularRateSample, FusedPose, LinearAccelSample, MotionFrame, MotionSample, Orientation,
};

/// Accelerometer reading of a device resting level, in m/s^2.
const GRAVITY: Vec3 = Vec3::new(0.0, 0.0, 9.81);

/// Fastest rate the mock device will tick at.
const MAX_MOCK_RATE_HZ: u32 = 10_000;

/// Client for a motion stream.
///
/// A background task reads framed motion records, feeds gyro and accelerometer
/// samples to a shared [`RotationEstimator`], and publishes the latest fused pose.
pub struct MotionClient {
    estimator: Arc<RotationEstimator>,
    pose_rx: watch::Receiver<Option<FusedPose>>,
    samples: Arc<AtomicU64>,
    task: tokio::task::JoinHandle<()>,
}

impl MotionClient {
    /// Connect to a motion stream over TCP.
    pub async fn connect(addr: &str, alpha: f32) -> Result<Self> {
        tracing::info!(%addr, "Connecting to motion stream");
        let stream = TcpStream::connect(addr).await?;
        tracing::info!("Connected to motion stream");
        Ok(Self::from_reader(stream, alpha))
    }

    /// Replay a recorded motion stream from disk.
    ///
    /// With `paced` set, frames are released at the rate of their timestamps.
    pub async fn replay(path: &Path, alpha: f32, paced: bool) -> Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        tracing::info!(?path, paced, "Replaying motion recording");
        Ok(Self::spawn(file, alpha, paced))
    }

    /// Read motion frames from any byte source.
    pub fn from_reader<R>(reader: R, alpha: f32) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::spawn(reader, alpha, false)
    }

    /// Create a mock client for development without a device connected.
    ///
    /// Emits a level, motionless device at `rate_hz`: gravity on the
    /// accelerometer, zero angular rate, and an identity pose.
    pub fn mock(alpha: f32, rate_hz: u32) -> Self {
        let estimator = Arc::new(RotationEstimator::new(alpha));
        let (pose_tx, pose_rx) = watch::channel(None);
        let samples = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(mock_loop(
            Arc::clone(&estimator),
            pose_tx,
            Arc::clone(&samples),
            rate_hz.clamp(1, MAX_MOCK_RATE_HZ),
        ));

        Self {
            estimator,
            pose_rx,
            samples,
            task,
        }
    }

    fn spawn<R>(reader: R, alpha: f32, paced: bool) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let estimator = Arc::new(RotationEstimator::new(alpha));
        let (pose_tx, pose_rx) = watch::channel(None);
        let samples = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(motion_read_loop(
            reader,
            Arc::clone(&estimator),
            pose_tx,
            Arc::clone(&samples),
            paced,
        ));

        Self {
            estimator,
            pose_rx,
            samples,
            task,
        }
    }

    /// Latest estimated orientation (non-blocking).
    pub fn orientation(&self) -> Orientation {
        self.estimator.orientation()
    }

    /// Latest pose from the stream, if any pose frame has arrived.
    pub fn pose(&self) -> Option<FusedPose> {
        *self.pose_rx.borrow()
    }

    /// Shared handle to the estimator fed by this client.
    pub fn estimator(&self) -> Arc<RotationEstimator> {
        Arc::clone(&self.estimator)
    }

    /// Number of frames routed so far.
    pub fn samples_processed(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }
}

impl Drop for MotionClient {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Hand one decoded frame to its consumer.
fn route_frame(
    frame: &MotionFrame,
    estimator: &RotationEstimator,
    pose_tx: &watch::Sender<Option<FusedPose>>,
) {
    match frame.sample {
        MotionSample::Gyro(rate) => estimator.process_angular_rate(&AngularRateSample {
            rate,
            timestamp_ms: frame.timestamp_ms,
        }),
        MotionSample::Accel(accel) => {
            estimator.process_linear_accel(&LinearAccelSample { accel })
        }
        MotionSample::Pose(pose) => {
            let _ = pose_tx.send(Some(pose));
        }
    }
}

/// Background task: read the byte stream, parse frames, route them.
async fn motion_read_loop<R>(
    mut reader: R,
    estimator: Arc<RotationEstimator>,
    pose_tx: watch::Sender<Option<FusedPose>>,
    samples: Arc<AtomicU64>,
    paced: bool,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut parser = ProtocolParser::new();
    let mut buf = [0u8; 4096];
    let mut last_ts: Option<f64> = None;

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                tracing::info!(
                    samples = samples.load(Ordering::Relaxed),
                    "Motion stream closed"
                );
                break;
            }
            Ok(n) => {
                parser.push_data(&buf[..n]);

                // Drain all available frames.
                while let Some(result) = parser.next_frame() {
                    match result {
                        Ok(frame) => {
                            if paced {
                                if let Some(prev) = last_ts {
                                    let wait = replay_delay(prev, frame.timestamp_ms);
                                    if let Some(wait) = wait {
                                        tokio::time::sleep(wait).await;
                                    }
                                }
                                last_ts = Some(frame.timestamp_ms);
                            }

                            route_frame(&frame, &estimator, &pose_tx);

                            let count = samples.fetch_add(1, Ordering::Relaxed) + 1;
                            if count % 1000 == 0 {
                                tracing::debug!(count, "Motion frames processed");
                            }
                        }
                        Err(e) => {
                            tracing::trace!(?e, "Skipping undecodable frame");
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(?e, "Motion stream read error");
                break;
            }
        }
    }
}

/// Wait before releasing a replayed frame stamped `ts` after one stamped `prev`.
///
/// Gaps that are negative, NaN, or too large for a `Duration` release the frame
/// immediately.
fn replay_delay(prev: f64, ts: f64) -> Option<Duration> {
    let wait_ms = ts - prev;
    if !(wait_ms > 0.0) {
        return None;
    }
    match Duration::try_from_secs_f64(wait_ms / 1000.0) {
        Ok(wait) => Some(wait),
        Err(e) => {
            tracing::warn!(prev, ts, %e, "Replay gap out of range, not pacing");
            None
        }
    }
}

/// Background task: synthesize a motionless device.
async fn mock_loop(
    estimator: Arc<RotationEstimator>,
    pose_tx: watch::Sender<Option<FusedPose>>,
    samples: Arc<AtomicU64>,
    rate_hz: u32,
) {
    let period = Duration::from_secs_f64(1.0 / rate_hz as f64);
    let mut ticker = tokio::time::interval(period);
    let start = tokio::time::Instant::now();

    loop {
        ticker.tick().await;
        let timestamp_ms = start.elapsed().as_secs_f64() * 1000.0;

        for sample in [
            MotionSample::Accel(GRAVITY),
            MotionSample::Gyro(Vec3::ZERO),
            MotionSample::Pose(FusedPose::default()),
        ] {
            let frame = MotionFrame {
                timestamp_ms,
                sample,
            };
            route_frame(&frame, &estimator, &pose_tx);
            samples.fetch_add(1, Ordering::Relaxed);
        }
    }
}
