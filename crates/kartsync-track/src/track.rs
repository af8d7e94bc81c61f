//! Tracks: the static geometry a kart drives through.
//!
//! The kart is treated as a sphere of `kart_radius`. Sweeping a sphere
//! against a box is done as a segment test against the box grown by the
//! radius, which over-approximates at the box corners. That is acceptable
//! for wall and barrier geometry.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::Bounds;

/// Distance kept between the kart and the surface it stopped against, in
/// world units. Keeps the next sweep from starting in contact.
pub const CONTACT_SKIN: f32 = 0.1;

/// Which surface a sweep ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitSurface {
    /// The outer wall of the track.
    Boundary,
    /// An obstacle, by index into [`Track::obstacles`].
    Obstacle(usize),
}

/// A blocking hit reported by [`Track::sweep`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Fraction of the requested delta travelled before contact, in `[0, 1]`.
    pub time_of_impact: f32,
    /// Surface normal at the contact, pointing back toward the kart.
    pub normal: Vec3,
    /// The surface that was hit.
    pub surface: HitSurface,
}

/// Outcome of sweeping the kart along a delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    /// Where the kart ends up: the full destination, or just short of the hit.
    pub end: Vec3,
    /// The first blocking hit along the way, if any.
    pub hit: Option<Hit>,
}

impl SweepResult {
    /// Returns `true` if the sweep was blocked.
    #[must_use]
    pub fn blocked(&self) -> bool {
        self.hit.is_some()
    }
}

/// A drivable area: an outer boundary with box obstacles inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Outer wall; the kart's center stays `kart_radius` inside it.
    pub boundary: Bounds,
    /// Solid boxes inside the boundary.
    pub obstacles: Vec<Bounds>,
    /// Collision radius of a kart, in world units.
    pub kart_radius: f32,
}

impl Track {
    /// Default kart collision radius in world units (centimetres).
    pub const DEFAULT_KART_RADIUS: f32 = 50.0;

    /// Creates an empty track with the given outer boundary.
    #[must_use]
    pub fn new(boundary: Bounds) -> Self {
        Self {
            boundary,
            obstacles: Vec::new(),
            kart_radius: Self::DEFAULT_KART_RADIUS,
        }
    }

    /// Adds an obstacle box.
    #[must_use]
    pub fn with_obstacle(mut self, obstacle: Bounds) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// Sets the kart collision radius.
    #[must_use]
    pub fn with_kart_radius(mut self, radius: f32) -> Self {
        self.kart_radius = radius.max(0.0);
        self
    }

    /// Sweeps the kart from `from` along `delta` and reports where it stops.
    ///
    /// The earliest of the boundary exit and every obstacle entry wins. On a
    /// hit the kart stops [`CONTACT_SKIN`] short of the contact point (never
    /// behind `from`).
    #[must_use]
    pub fn sweep(&self, from: Vec3, delta: Vec3) -> SweepResult {
        let mut first: Option<Hit> = self
            .boundary
            .expanded(-self.kart_radius)
            .segment_exit(from, delta)
            .map(|(t, normal)| Hit {
                time_of_impact: t,
                normal,
                surface: HitSurface::Boundary,
            });

        for (index, obstacle) in self.obstacles.iter().enumerate() {
            let Some((t, normal)) = obstacle
                .expanded(self.kart_radius)
                .segment_entry(from, delta)
            else {
                continue;
            };
            if first.map_or(true, |hit| t < hit.time_of_impact) {
                first = Some(Hit {
                    time_of_impact: t,
                    normal,
                    surface: HitSurface::Obstacle(index),
                });
            }
        }

        match first {
            None => SweepResult {
                end: from + delta,
                hit: None,
            },
            Some(hit) => {
                let length = delta.length();
                let skin = if length > f32::EPSILON {
                    CONTACT_SKIN / length
                } else {
                    0.0
                };
                let travelled = (hit.time_of_impact - skin).max(0.0);
                tracing::trace!(
                    surface = ?hit.surface,
                    time_of_impact = hit.time_of_impact,
                    "sweep blocked"
                );
                SweepResult {
                    end: from + delta * travelled,
                    hit: Some(hit),
                }
            }
        }
    }
}

impl Default for Track {
    /// A 200 m x 200 m open arena with no obstacles.
    fn default() -> Self {
        Self::new(Bounds::new(20_000.0, 20_000.0, 2_000.0))
    }
}
