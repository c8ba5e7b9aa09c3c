use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound for loop rates; the tick period must stay representable.
pub const MAX_RATE_HZ: u32 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Which motion path drives the view.
    pub stream: StreamKind,
    /// Rate of the per-frame consumer loop.
    pub frame_rate_hz: u32,
    /// Orientation estimator configuration.
    pub estimator: EstimatorConfig,
    /// Where motion frames come from.
    pub source: SourceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stream: StreamKind::Imu,
            frame_rate_hz: 60,
            estimator: EstimatorConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reject values the estimator and loops cannot run with.
    pub fn validate(&self) -> Result<()> {
        let alpha = self.estimator.alpha;
        ensure!(
            alpha > 0.0 && alpha < 1.0,
            "estimator.alpha must lie in (0, 1), got {alpha}"
        );
        ensure!(
            (1..=MAX_RATE_HZ).contains(&self.frame_rate_hz),
            "frame_rate_hz must lie in 1..={MAX_RATE_HZ}, got {}",
            self.frame_rate_hz
        );
        ensure!(
            (1..=MAX_RATE_HZ).contains(&self.source.mock_rate_hz),
            "source.mock_rate_hz must lie in 1..={MAX_RATE_HZ}, got {}",
            self.source.mock_rate_hz
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    /// Raw gyroscope + accelerometer, fused locally.
    Imu,
    /// Already-fused 6-DoF pose from a tracking device.
    Pose,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Complementary filter weight on gyro integration. Higher = smoother, more drift.
    pub alpha: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self { alpha: 0.98 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// TCP `host:port` of a live motion stream.
    pub address: Option<String>,
    /// Recorded motion stream to replay when no address is set.
    pub replay_path: Option<PathBuf>,
    /// Release replayed frames at the rate of their timestamps.
    pub paced_replay: bool,
    /// Sample rate of the synthetic source used when nothing else is configured.
    pub mock_rate_hz: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            address: None,
            replay_path: None,
            paced_replay: true,
            mock_rate_hz: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_roundtrip_through_toml() {
        let config = AppConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();

        assert_eq!(parsed.stream, StreamKind::Imu);
        assert_eq!(parsed.frame_rate_hz, 60);
        assert!((parsed.estimator.alpha - 0.98).abs() < 1e-6);
        assert!(parsed.source.paced_replay);
        parsed.validate().unwrap();
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            stream = "Pose"

            [source]
            address = "127.0.0.1:7000"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.stream, StreamKind::Pose);
        assert_eq!(parsed.source.address.as_deref(), Some("127.0.0.1:7000"));
        assert_eq!(parsed.source.mock_rate_hz, 200);
        assert!((parsed.estimator.alpha - 0.98).abs() < 1e-6);
    }

    #[test]
    fn alpha_out_of_range_is_rejected() {
        for alpha in [0.0, 1.0, -0.5, 1.5, f32::NAN] {
            let mut config = AppConfig::default();
            config.estimator.alpha = alpha;
            assert!(config.validate().is_err(), "alpha {alpha} accepted");
        }
    }

    #[test]
    fn zero_frame_rate_is_rejected() {
        let mut config = AppConfig::default();
        config.frame_rate_hz = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rates_above_limit_are_rejected() {
        let mut config = AppConfig::default();
        config.frame_rate_hz = MAX_RATE_HZ;
        config.source.mock_rate_hz = MAX_RATE_HZ;
        config.validate().unwrap();

        config.frame_rate_hz = u32::MAX;
        assert!(config.validate().is_err());

        config.frame_rate_hz = 60;
        config.source.mock_rate_hz = MAX_RATE_HZ + 1;
        assert!(config.validate().is_err());
    }
}
