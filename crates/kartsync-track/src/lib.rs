//! # Kartsync Track
//!
//! Static world geometry for the kart simulation.
//!
//! A [`Track`] is an outer boundary box plus a list of obstacle boxes. Its only
//! job is to answer one question for the physics step: "if the kart moves by
//! this delta from here, where does it end up and did it hit something?"
//!
//! - **Bounds**: axis-aligned boxes with the usual containment helpers
//! - **Sweeps**: a sphere of the kart's radius swept along a segment
//! - **Hits**: time of impact along the segment plus the surface normal
//!
//! ## Quick Start
//!
//! ```
//! use glam::Vec3;
//! use kartsync_track::{Bounds, Track};
//!
//! let track = Track::new(Bounds::new(4000.0, 4000.0, 400.0))
//!     .with_obstacle(Bounds::from_min_max(
//!         Vec3::new(500.0, -100.0, -50.0),
//!         Vec3::new(600.0, 100.0, 50.0),
//!     ));
//!
//! let sweep = track.sweep(Vec3::ZERO, Vec3::new(1000.0, 0.0, 0.0));
//! assert!(sweep.hit.is_some());
//! assert!(sweep.end.x < 500.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod track;

pub use track::{Hit, HitSurface, SweepResult, Track};

use glam::Vec3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Bounds {
    /// Create bounds from dimensions (centered at origin).
    #[must_use]
    pub fn new(width: f32, depth: f32, height: f32) -> Self {
        Self {
            min: Vec3::new(-width / 2.0, -depth / 2.0, -height / 2.0),
            max: Vec3::new(width / 2.0, depth / 2.0, height / 2.0),
        }
    }

    /// Create bounds from min/max corners.
    ///
    /// Corners are sorted per axis, so swapped inputs still give a valid box.
    #[must_use]
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create bounds of the given half extents around a center point.
    #[must_use]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Get the center of the bounds.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size of the bounds.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Check if a point is inside the bounds (faces inclusive).
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Grow (or shrink, for negative `margin`) every face by `margin`.
    ///
    /// Shrinking never inverts the box: an axis that would collapse is
    /// pinned to its center.
    #[must_use]
    pub fn expanded(&self, margin: f32) -> Self {
        let center = self.center();
        let min = (self.min - Vec3::splat(margin)).min(center);
        let max = (self.max + Vec3::splat(margin)).max(center);
        Self { min, max }
    }

    /// Check if this bounds intersects a sphere.
    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        center.distance_squared(closest) <= radius * radius
    }

    /// First time in `[0, 1]` at which the segment `origin + t * delta`
    /// enters this box from outside, with the normal of the entered face.
    ///
    /// Segments that start inside the box never report an entry, so a body
    /// that ends up overlapping an obstacle can always move back out.
    #[must_use]
    pub fn segment_entry(&self, origin: Vec3, delta: Vec3) -> Option<(f32, Vec3)> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut normal = Vec3::ZERO;

        for axis in 0..3 {
            let o = origin[axis];
            let d = delta[axis];
            if d.abs() <= f32::EPSILON {
                // Parallel to this slab: either always inside it or never.
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (self.min[axis] - o) * inv;
            let mut t1 = (self.max[axis] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            if t0 > t_enter {
                t_enter = t0;
                normal = Vec3::ZERO;
                normal[axis] = -d.signum();
            }
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        if (0.0..=1.0).contains(&t_enter) {
            Some((t_enter, normal))
        } else {
            None
        }
    }

    /// First time in `[0, 1]` at which the segment `origin + t * delta`
    /// crosses a face of this box while heading outward, with the inward
    /// normal of that face.
    ///
    /// A point already outside and still moving away reports `t = 0`.
    #[must_use]
    pub fn segment_exit(&self, origin: Vec3, delta: Vec3) -> Option<(f32, Vec3)> {
        let mut best: Option<(f32, Vec3)> = None;

        for axis in 0..3 {
            let d = delta[axis];
            let (face, inward) = if d > 0.0 {
                (self.max[axis], -1.0)
            } else if d < 0.0 {
                (self.min[axis], 1.0)
            } else {
                continue;
            };

            let t = ((face - origin[axis]) / d).max(0.0);
            if t <= 1.0 && best.map_or(true, |(b, _)| t < b) {
                let mut normal = Vec3::ZERO;
                normal[axis] = inward;
                best = Some((t, normal));
            }
        }

        best
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(100.0, 100.0, 100.0)
    }
}
