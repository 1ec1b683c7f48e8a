//! Quaternion for 3D rotations

use crate::vector::Vec3;

/// Quaternion for representing 3D rotations
///
/// Quaternions avoid gimbal lock and interpolate smoothly, which is why
/// rotation deltas are applied through `slerp` rather than linear addition.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    /// Identity quaternion (no rotation)
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Create from axis-angle representation (angle in radians)
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let half_angle = angle * 0.5;
        let s = half_angle.sin();
        let len = axis.length();

        if len < 1e-6 {
            return Self::IDENTITY;
        }

        let inv_len = 1.0 / len;
        Self {
            x: axis.x * inv_len * s,
            y: axis.y * inv_len * s,
            z: axis.z * inv_len * s,
            w: half_angle.cos(),
        }
    }

    pub fn normalize(&self) -> Self {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len < 1e-6 {
            return Self::IDENTITY;
        }
        let inv = 1.0 / len;
        Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
    }

    pub fn dot(&self, other: &Quat) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Hamilton product: the rotation `other` followed by `self`
    pub fn mul(&self, other: &Self) -> Self {
        Self {
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
        }
    }

    /// Spherical linear interpolation
    ///
    /// `t` is not clamped: fractional values compose (`q^a * q^b = q^(a+b)`),
    /// and negative values walk the rotation backwards.
    pub fn slerp(&self, other: Quat, t: f32) -> Quat {
        let mut cos_half_theta = self.dot(&other);

        // Negate one side if needed so interpolation takes the shorter path
        let mut other = other;
        if cos_half_theta < 0.0 {
            other = Quat::new(-other.x, -other.y, -other.z, -other.w);
            cos_half_theta = -cos_half_theta;
        }

        // Nearly parallel: fall back to normalized lerp
        if cos_half_theta > 0.9995 {
            return Quat::new(
                self.x + t * (other.x - self.x),
                self.y + t * (other.y - self.y),
                self.z + t * (other.z - self.z),
                self.w + t * (other.w - self.w),
            )
            .normalize();
        }

        let half_theta = cos_half_theta.acos();
        let sin_half_theta = (1.0 - cos_half_theta * cos_half_theta).sqrt();

        let ratio_a = ((1.0 - t) * half_theta).sin() / sin_half_theta;
        let ratio_b = (t * half_theta).sin() / sin_half_theta;

        Quat::new(
            self.x * ratio_a + other.x * ratio_b,
            self.y * ratio_a + other.y * ratio_b,
            self.z * ratio_a + other.z * ratio_b,
            self.w * ratio_a + other.w * ratio_b,
        )
    }

    /// Approximate equality up to sign (q and -q are the same rotation)
    pub fn approx_eq(&self, other: &Quat, epsilon: f32) -> bool {
        self.dot(other).abs() > 1.0 - epsilon
    }
}
