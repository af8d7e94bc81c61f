//! Kinematic state of a kart.
//!
//! Axes: Z is up and is the axis karts turn about. A kart's forward axis is
//! its orientation applied to `+X`. Positions are in world units (see
//! [`BodyParams::units_per_meter`](crate::config::BodyParams)); velocities are
//! in metres per second.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World up axis; steering rotates about it.
pub const UP: Vec3 = Vec3::Z;

/// Local forward axis of a kart.
pub const FORWARD: Vec3 = Vec3::X;

/// Position and rotation of a kart in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World position
    pub position: Vec3,
    /// World rotation
    pub rotation: Quat,
}

impl Transform {
    /// Transform at the origin with no rotation.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Creates a transform from a position and rotation.
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// World-space forward axis.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * FORWARD
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Everything the physics step reads and writes for one kart.
///
/// Owned by whichever role is simulating the kart this tick. It is never
/// shared mutably between roles; only copies cross the network.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KinematicState {
    /// World position, in world units
    pub position: Vec3,
    /// World orientation
    pub orientation: Quat,
    /// Velocity, in metres per second
    pub velocity: Vec3,
}

impl KinematicState {
    /// Creates a state at rest at `position`, facing `heading` radians from
    /// `+X` around the up axis.
    #[must_use]
    pub fn at_rest(position: Vec3, heading: f32) -> Self {
        Self {
            position,
            orientation: Quat::from_axis_angle(UP, heading),
            velocity: Vec3::ZERO,
        }
    }

    /// Creates a state from a transform and velocity.
    #[must_use]
    pub fn from_transform(transform: Transform, velocity: Vec3) -> Self {
        Self {
            position: transform.position,
            orientation: transform.rotation,
            velocity,
        }
    }

    /// The pose part of this state.
    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.orientation)
    }

    /// World-space forward axis.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.orientation * FORWARD
    }

    /// Speed along the forward axis; negative when reversing.
    #[must_use]
    pub fn forward_speed(&self) -> f32 {
        self.forward().dot(self.velocity)
    }

    /// Returns `true` if every component is within `tolerance` of `other`.
    ///
    /// Orientations are compared through `1 - |dot|`, so `q` and `-q` are
    /// equal.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        self.position.abs_diff_eq(other.position, tolerance)
            && self.velocity.abs_diff_eq(other.velocity, tolerance)
            && 1.0 - self.orientation.dot(other.orientation).abs() <= tolerance
    }

    /// Deterministic hash of the exact bit pattern of this state.
    ///
    /// Two runs that are bit-for-bit identical produce the same checksum.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for value in self
            .position
            .to_array()
            .into_iter()
            .chain(self.orientation.to_array())
            .chain(self.velocity.to_array())
        {
            value.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}
