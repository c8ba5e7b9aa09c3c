use glam::{Quat, Vec3};

/// Gyroscope reading from the motion stream.
#[derive(Debug, Clone, Copy)]
pub struct AngularRateSample {
    /// Angular velocity (rad/s): x = pitch rate, y = yaw rate, z = roll rate.
    pub rate: Vec3,
    /// Device timestamp in milliseconds. Monotonically increasing.
    pub timestamp_ms: f64,
}

/// Accelerometer reading (gravity plus motion), in sensor units.
#[derive(Debug, Clone, Copy)]
pub struct LinearAccelSample {
    pub accel: Vec3,
}

/// Externally fused 6-DoF pose, as delivered by a tracking device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedPose {
    /// Rotation as a quaternion (expected to be unit length).
    pub rotation: Quat,
    /// Translation in meters.
    pub translation: Vec3,
}

impl Default for FusedPose {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation: Vec3::ZERO,
        }
    }
}

/// Snapshot of the estimated orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    /// (pitch, yaw, roll) in radians.
    pub theta: Vec3,
    /// Whether an accelerometer sample has seeded the estimate yet.
    pub initialized: bool,
}

impl Orientation {
    pub fn pitch(&self) -> f32 {
        self.theta.x
    }

    pub fn yaw(&self) -> f32 {
        self.theta.y
    }

    pub fn roll(&self) -> f32 {
        self.theta.z
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self {
            theta: Vec3::ZERO,
            initialized: false,
        }
    }
}

/// Payload of a decoded motion frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionSample {
    /// Angular velocity in rad/s.
    Gyro(Vec3),
    /// Acceleration vector in sensor units.
    Accel(Vec3),
    /// Already-fused pose from a tracking device.
    Pose(FusedPose),
}

/// One record of a motion stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionFrame {
    /// Device timestamp in milliseconds.
    pub timestamp_ms: f64,
    pub sample: MotionSample,
}
