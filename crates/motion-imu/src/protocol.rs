use crate::types::{FusedPose, MotionFrame, MotionSample};
use glam::{Quat, Vec3};
use std::collections::VecDeque;
use thiserror::Error;

/// Frame start marker.
const HEADER: [u8; 4] = *b"RSMF";

const TAG_GYRO: u8 = 1;
const TAG_ACCEL: u8 = 2;
const TAG_POSE: u8 = 3;

/// Header + stream tag + f64 timestamp.
const PREFIX_LEN: usize = HEADER.len() + 1 + 8;
/// 3 x f32.
const MOTION_PAYLOAD_LEN: usize = 12;
/// 7 x f32: quaternion xyzw then translation xyz.
const POSE_PAYLOAD_LEN: usize = 28;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unknown motion stream tag {0:#04x}")]
    UnknownStream(u8),
}

/// Streaming parser for framed motion records.
///
/// Feed raw bytes via `push_data`, then drain decoded frames via `next_frame`.
pub struct ProtocolParser {
    buffer: VecDeque<u8>,
}

impl ProtocolParser {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(4096),
        }
    }

    /// Append received bytes to the internal buffer.
    pub fn push_data(&mut self, data: &[u8]) {
        self.buffer.extend(data);
    }

    /// Try to extract the next complete frame from the buffer.
    /// Returns `None` if no complete frame is available yet.
    pub fn next_frame(&mut self) -> Option<Result<MotionFrame, ProtocolError>> {
        let buf = self.buffer.make_contiguous();

        let Some(header_pos) = find_pattern(buf, &HEADER) else {
            // Keep a possible partial header at the tail.
            let keep = (HEADER.len() - 1).min(buf.len());
            let stale = buf.len() - keep;
            self.buffer.drain(..stale);
            return None;
        };

        let frame = &buf[header_pos..];
        if frame.len() < PREFIX_LEN {
            self.buffer.drain(..header_pos);
            return None;
        }

        let tag = frame[HEADER.len()];
        let payload_len = match tag {
            TAG_GYRO | TAG_ACCEL => MOTION_PAYLOAD_LEN,
            TAG_POSE => POSE_PAYLOAD_LEN,
            other => {
                // Resync past this header.
                self.buffer.drain(..header_pos + HEADER.len());
                return Some(Err(ProtocolError::UnknownStream(other)));
            }
        };

        if frame.len() < PREFIX_LEN + payload_len {
            self.buffer.drain(..header_pos);
            return None;
        }

        let timestamp_ms = read_f64(&frame[HEADER.len() + 1..PREFIX_LEN]);
        let payload = &frame[PREFIX_LEN..PREFIX_LEN + payload_len];
        let f = |i: usize| read_f32(&payload[i * 4..i * 4 + 4]);

        let sample = match tag {
            TAG_GYRO => MotionSample::Gyro(Vec3::new(f(0), f(1), f(2))),
            TAG_ACCEL => MotionSample::Accel(Vec3::new(f(0), f(1), f(2))),
            _ => MotionSample::Pose(FusedPose {
                rotation: Quat::from_xyzw(f(0), f(1), f(2), f(3)),
                translation: Vec3::new(f(4), f(5), f(6)),
            }),
        };

        self.buffer.drain(..header_pos + PREFIX_LEN + payload_len);

        Some(Ok(MotionFrame {
            timestamp_ms,
            sample,
        }))
    }
}

impl Default for ProtocolParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionFrame {
    /// Serialize into the wire layout read by [`ProtocolParser`].
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PREFIX_LEN + POSE_PAYLOAD_LEN);
        out.extend_from_slice(&HEADER);

        let values: Vec<f32> = match self.sample {
            MotionSample::Gyro(v) => {
                out.push(TAG_GYRO);
                v.to_array().to_vec()
            }
            MotionSample::Accel(v) => {
                out.push(TAG_ACCEL);
                v.to_array().to_vec()
            }
            MotionSample::Pose(pose) => {
                out.push(TAG_POSE);
                let mut v = pose.rotation.to_array().to_vec();
                v.extend_from_slice(&pose.translation.to_array());
                v
            }
        };

        out.extend_from_slice(&self.timestamp_ms.to_le_bytes());
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }
}

fn read_f32(bytes: &[u8]) -> f32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    f32::from_le_bytes(raw)
}

fn read_f64(bytes: &[u8]) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    f64::from_le_bytes(raw)
}

/// Find the first occurrence of `pattern` in `data`.
fn find_pattern(data: &[u8], pattern: &[u8]) -> Option<usize> {
    data.windows(pattern.len())
        .position(|window| window == pattern)
}
