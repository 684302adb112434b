//! Rigid-body pose math.
//!
//! A [`Pose`] is a translation plus a unit-quaternion rotation.  Poses are
//! authored as six numbers `[x, y, z, roll, pitch, yaw]` with the rotation
//! applied as `Rz(yaw) · Ry(pitch) · Rx(roll)`.
//!
//! Composition follows the homogeneous-transform convention with the parent on
//! the left: if `a` is the pose of frame B in frame A and `b` is the pose of
//! frame C in frame B, then `a * b` is the pose of frame C in frame A.
//!
//! # Example
//!
//! ```rust
//! use sdfgraph_types::pose::Pose;
//! use std::f64::consts::FRAC_PI_2;
//!
//! let link = Pose::new(2.0, 0.0, 0.0, 0.0, FRAC_PI_2, 0.0);
//! let frame = Pose::new(0.0, 0.0, 2.0, 0.0, 0.0, 0.0);
//!
//! // Pitching by 90° maps the link's +Z onto the model's +X.
//! let composed = link * frame;
//! assert!(composed.approx_eq(&Pose::new(4.0, 0.0, 0.0, 0.0, FRAC_PI_2, 0.0), 1e-9));
//! ```

use std::fmt;
use std::ops::Mul;

use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::Schema;
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Primitive types
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D translation vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    pub fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// A unit quaternion representing a 3-D rotation (w, x, y, z convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1).
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Build a rotation from roll (about X), pitch (about Y) and yaw (about Z),
    /// applied as `Rz(yaw) · Ry(pitch) · Rx(roll)`.
    pub fn from_euler(roll: f64, pitch: f64, yaw: f64) -> Self {
        let (sr, cr) = (roll * 0.5).sin_cos();
        let (sp, cp) = (pitch * 0.5).sin_cos();
        let (sy, cy) = (yaw * 0.5).sin_cos();
        Self::new(
            cr * cp * cy + sr * sp * sy,
            sr * cp * cy - cr * sp * sy,
            cr * sp * cy + sr * cp * sy,
            cr * cp * sy - sr * sp * cy,
        )
    }

    /// Recover `(roll, pitch, yaw)`.  Pitch is clamped to ±π/2 at the
    /// gimbal-lock singularity.
    pub fn to_euler(self) -> (f64, f64, f64) {
        let roll = (2.0 * (self.w * self.x + self.y * self.z))
            .atan2(1.0 - 2.0 * (self.x * self.x + self.y * self.y));
        let sinp = 2.0 * (self.w * self.y - self.z * self.x);
        let pitch = if sinp.abs() >= 1.0 {
            std::f64::consts::FRAC_PI_2.copysign(sinp)
        } else {
            sinp.asin()
        };
        let yaw = (2.0 * (self.w * self.z + self.x * self.y))
            .atan2(1.0 - 2.0 * (self.y * self.y + self.z * self.z));
        (roll, pitch, yaw)
    }

    /// Hamilton product: compose two rotations.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rescale to unit length.  A zero quaternion becomes the identity.
    pub fn normalized(self) -> Self {
        let n = (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if n == 0.0 {
            return Self::identity();
        }
        Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Vector3) -> Vector3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let rotated = self.mul(p).mul(self.conjugate());
        Vector3::new(rotated.x, rotated.y, rotated.z)
    }

    /// `true` when both quaternions describe the same rotation (q and -q are
    /// the same rotation).
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        let close = |s: f64| {
            (self.w - s * other.w).abs() <= epsilon
                && (self.x - s * other.x).abs() <= epsilon
                && (self.y - s * other.y).abs() <= epsilon
                && (self.z - s * other.z).abs() <= epsilon
        };
        close(1.0) || close(-1.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// A rigid-body transform: rotation followed by translation.
///
/// Represents the pose of a child frame in its parent: a point expressed in
/// the child frame is mapped into the parent by rotating it by `rotation` and
/// adding `position`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 6]", into = "[f64; 6]")]
pub struct Pose {
    pub position: Vector3,
    pub rotation: Quaternion,
}

impl Pose {
    /// Build a pose from a translation and roll/pitch/yaw angles in radians.
    pub fn new(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self::from_parts(Vector3::new(x, y, z), Quaternion::from_euler(roll, pitch, yaw))
    }

    pub fn from_parts(position: Vector3, rotation: Quaternion) -> Self {
        Self { position, rotation }
    }

    /// The identity pose.
    pub fn identity() -> Self {
        Self::from_parts(Vector3::zero(), Quaternion::identity())
    }

    /// Compose two poses, `self` being the parent: if `self` = T_A_B and
    /// `child` = T_B_C, the result is T_A_C.
    pub fn compose(self, child: Self) -> Self {
        let position = self.position.add(self.rotation.rotate(child.position));
        let rotation = self.rotation.mul(child.rotation);
        Self::from_parts(position, rotation)
    }

    /// The inverse transform: T_B_A for `self` = T_A_B.
    pub fn inverse(self) -> Self {
        let rotation = self.rotation.conjugate();
        let position = rotation.rotate(self.position.neg());
        Self::from_parts(position, rotation)
    }

    /// `(roll, pitch, yaw)` of the rotation.
    pub fn euler(&self) -> (f64, f64, f64) {
        self.rotation.to_euler()
    }

    /// Compare positions and rotations component-wise within `epsilon`.
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.position.x - other.position.x).abs() <= epsilon
            && (self.position.y - other.position.y).abs() <= epsilon
            && (self.position.z - other.position.z).abs() <= epsilon
            && self.rotation.approx_eq(&other.rotation, epsilon)
    }

    fn to_array(self) -> [f64; 6] {
        let (roll, pitch, yaw) = self.euler();
        [self.position.x, self.position.y, self.position.z, roll, pitch, yaw]
    }
}

impl Mul for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        self.compose(rhs)
    }
}

impl From<[f64; 6]> for Pose {
    fn from(v: [f64; 6]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4], v[5])
    }
}

impl From<Pose> for [f64; 6] {
    fn from(pose: Pose) -> Self {
        pose.to_array()
    }
}

impl fmt::Display for Pose {
    /// Six space-separated numbers; honours the formatter's precision.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.to_array();
        for (i, v) in values.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            // Avoid printing "-0".
            let v = if v.abs() < 1e-12 { 0.0 } else { *v };
            match f.precision() {
                Some(p) => write!(f, "{v:.p$}")?,
                None => write!(f, "{v}")?,
            }
        }
        Ok(())
    }
}

impl JsonSchema for Pose {
    fn schema_name() -> String {
        "Pose".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        <[f64; 6]>::json_schema(generator)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
