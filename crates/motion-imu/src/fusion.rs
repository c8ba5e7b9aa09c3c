use crate::types::{AngularRateSample, LinearAccelSample, Orientation};
use glam::Vec3;
use parking_lot::Mutex;
use std::f32::consts::PI;

/// Default weight of gyro integration against accelerometer inclination.
pub const DEFAULT_ALPHA: f32 = 0.98;

/// Yaw assigned on the first accelerometer sample. Gravity carries no yaw.
const INITIAL_YAW: f32 = PI;

/// Complementary filter fusing gyroscope and accelerometer streams.
///
/// Gyro rates are integrated into `theta` on every sample; accelerometer
/// inclination pulls pitch and roll back toward gravity with weight `1 - alpha`.
/// The first accelerometer sample seeds the whole estimate. Yaw is driven by the
/// gyro alone.
///
/// Both producers and the reader take `&self`, so one estimator can be shared
/// across threads behind an `Arc`. Each call holds the lock only for its own
/// arithmetic.
///
/// Inputs are not validated: NaN or infinite samples propagate into the estimate.
pub struct RotationEstimator {
    state: Mutex<EstimatorState>,
    alpha: f32,
}

struct EstimatorState {
    /// (pitch, yaw, roll) in radians.
    theta: Vec3,
    initialized: bool,
    last_gyro_ts: Option<f64>,
}

impl RotationEstimator {
    /// `alpha` should lie in (0, 1). Values near 1 trust the gyro more.
    pub fn new(alpha: f32) -> Self {
        Self {
            state: Mutex::new(EstimatorState {
                theta: Vec3::ZERO,
                initialized: false,
                last_gyro_ts: None,
            }),
            alpha,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Integrate one gyro sample.
    ///
    /// The first sample only records its timestamp, since there is no interval
    /// to integrate over yet.
    pub fn process_angular_rate(&self, sample: &AngularRateSample) {
        let mut state = self.state.lock();

        let Some(last_ts) = state.last_gyro_ts.replace(sample.timestamp_ms) else {
            return;
        };

        let dt = ((sample.timestamp_ms - last_ts) / 1000.0) as f32;
        let delta = sample.rate * dt;

        // Sensor axes to render axes: roll and yaw flip sign, pitch lands on z.
        state.theta += Vec3::new(-delta.z, -delta.y, delta.x);
    }

    /// Blend one accelerometer sample into pitch and roll.
    pub fn process_linear_accel(&self, sample: &LinearAccelSample) {
        let a = sample.accel;
        let roll = a.y.atan2(a.z);
        let pitch = a.x.atan2((a.y * a.y + a.z * a.z).sqrt());

        let mut state = self.state.lock();
        if !state.initialized {
            state.theta = Vec3::new(pitch, INITIAL_YAW, roll);
            state.initialized = true;
            tracing::debug!(pitch, roll, "Orientation seeded from accelerometer");
        } else {
            let alpha = self.alpha;
            state.theta.x = state.theta.x * alpha + pitch * (1.0 - alpha);
            state.theta.z = state.theta.z * alpha + roll * (1.0 - alpha);
        }
    }

    /// Current estimate as a consistent snapshot.
    pub fn orientation(&self) -> Orientation {
        let state = self.state.lock();
        Orientation {
            theta: state.theta,
            initialized: state.initialized,
        }
    }
}

impl Default for RotationEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}
