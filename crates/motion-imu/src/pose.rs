use crate::types::FusedPose;
use glam::Mat4;

/// Column-major 4x4 transform, laid out for direct upload to the renderer.
pub type RenderTransform = [f32; 16];

/// Convert a fused pose into a render transform.
///
/// The rotation block is the usual quaternion-to-matrix expansion with columns
/// 0 and 2 negated, a 180 degree turn about Y that maps the tracker frame onto
/// the render frame. Translation goes in column 3 unchanged.
///
/// The quaternion is not normalized first. A non-unit quaternion still yields a
/// matrix, just not a rotation.
pub fn to_render_transform(pose: &FusedPose) -> RenderTransform {
    let q = pose.rotation;
    let t = pose.translation;

    let (xx, yy, zz) = (q.x * q.x, q.y * q.y, q.z * q.z);
    let (xy, xz, yz) = (q.x * q.y, q.x * q.z, q.y * q.z);
    let (xw, yw, zw) = (q.x * q.w, q.y * q.w, q.z * q.w);

    [
        // column 0 (negated)
        -(1.0 - 2.0 * yy - 2.0 * zz),
        -(2.0 * xy + 2.0 * zw),
        -(2.0 * xz - 2.0 * yw),
        0.0,
        // column 1
        2.0 * xy - 2.0 * zw,
        1.0 - 2.0 * xx - 2.0 * zz,
        2.0 * yz + 2.0 * xw,
        0.0,
        // column 2 (negated)
        -(2.0 * xz + 2.0 * yw),
        -(2.0 * yz - 2.0 * xw),
        -(1.0 - 2.0 * xx - 2.0 * yy),
        0.0,
        // column 3
        t.x,
        t.y,
        t.z,
        1.0,
    ]
}

impl FusedPose {
    /// Render transform as a `Mat4`.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array(&to_render_transform(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn assert_mat_close(a: &[f32; 16], b: &[f32; 16]) {
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < 1e-5, "element {i}: {x} != {y}");
        }
    }

    #[test]
    fn identity_pose_is_axis_flip() {
        let m = to_render_transform(&FusedPose::default());
        let expected = [
            -1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, -1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        assert_eq!(m, expected);
    }

    #[test]
    fn translation_is_not_flipped() {
        let pose = FusedPose {
            rotation: Quat::IDENTITY,
            translation: Vec3::new(1.0, -2.0, 3.5),
        };
        let m = to_render_transform(&pose);
        assert_eq!(&m[12..], &[1.0, -2.0, 3.5, 1.0]);
        assert_eq!([m[3], m[7], m[11]], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn matches_glam_with_flip() {
        let flip = Mat4::from_scale(Vec3::new(-1.0, 1.0, -1.0));
        let rotations = [
            Quat::from_rotation_x(0.3),
            Quat::from_rotation_y(-1.2),
            Quat::from_rotation_z(2.5),
            Quat::from_euler(glam::EulerRot::YXZ, 0.4, -0.7, 1.1),
        ];

        for rotation in rotations {
            let translation = Vec3::new(0.1, 0.2, -0.3);
            let pose = FusedPose {
                rotation,
                translation,
            };
            let expected = Mat4::from_rotation_translation(rotation, translation) * flip;
            assert_mat_close(&to_render_transform(&pose), &expected.to_cols_array());
        }
    }

    #[test]
    fn half_turn_about_y_cancels_flip() {
        let pose = FusedPose {
            rotation: Quat::from_rotation_y(std::f32::consts::PI),
            translation: Vec3::ZERO,
        };
        assert_mat_close(
            &to_render_transform(&pose),
            &Mat4::IDENTITY.to_cols_array(),
        );
    }

    #[test]
    fn non_unit_quaternion_still_produces_matrix() {
        let pose = FusedPose {
            rotation: Quat::from_xyzw(0.0, 0.0, 0.0, 2.0),
            translation: Vec3::ZERO,
        };
        let m = pose.to_mat4();
        assert!(m.to_cols_array().iter().all(|v| v.is_finite()));
        assert_eq!(m.w_axis.w, 1.0);
    }
}
