//! Tunables for the kart body, the authority, and remote smoothing.
//!
//! Every struct deserializes with missing fields falling back to their
//! defaults, so a config file only needs the values it changes:
//!
//! ```
//! use kartsync_core::config::{InterpolationMode, KartConfig};
//!
//! let config = KartConfig::from_json(r#"{
//!     "body": { "mass": 250.0 },
//!     "smoothing": { "mode": "linear" }
//! }"#).unwrap();
//!
//! assert_eq!(config.body.mass, 250.0);
//! assert_eq!(config.body.throttle_force, 1000.0);
//! assert_eq!(config.smoothing.mode, InterpolationMode::Linear);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Gravitational acceleration used by the friction model, in m/s².
pub const GRAVITY: f32 = 9.8;

/// Physical parameters of a kart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyParams {
    /// Mass in kilograms.
    pub mass: f32,
    /// Drive force at full throttle, in newtons.
    pub throttle_force: f32,
    /// Turning radius at full steering lock, in metres.
    pub min_turning_radius: f32,
    /// Coefficient of kinetic friction with the ground, in `[0, 1]`.
    pub friction_coefficient: f32,
    /// Quadratic air drag coefficient, in `[0, 1]`.
    pub drag_coefficient: f32,
    /// Fraction of speed kept when bouncing off a wall, in `[0, 1]`.
    pub bounce_factor: f32,
    /// World units per metre; positions move by `velocity * dt * units_per_meter`.
    pub units_per_meter: f32,
}

impl Default for BodyParams {
    fn default() -> Self {
        Self {
            mass: 100.0,
            throttle_force: 1000.0,
            min_turning_radius: 10.0,
            friction_coefficient: 0.5,
            drag_coefficient: 0.5,
            bounce_factor: 0.8,
            units_per_meter: 100.0,
        }
    }
}

impl BodyParams {
    /// Checks that every parameter is usable by the physics step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        positive("body.mass", self.mass)?;
        positive("body.min_turning_radius", self.min_turning_radius)?;
        positive("body.units_per_meter", self.units_per_meter)?;
        finite("body.throttle_force", self.throttle_force)?;
        unit_range("body.friction_coefficient", self.friction_coefficient)?;
        unit_range("body.drag_coefficient", self.drag_coefficient)?;
        unit_range("body.bounce_factor", self.bounce_factor)?;
        Ok(())
    }
}

/// Move validation settings on the authority.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Reject moves that would push a client's simulated time past the
    /// server clock.
    pub validate_clock: bool,
    /// Slack, in seconds, allowed before a move counts as ahead of the clock.
    pub clock_tolerance: f64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            validate_clock: true,
            clock_tolerance: 0.0,
        }
    }
}

/// How an observer blends between two authoritative samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Straight-line position blend.
    Linear,
    /// Cubic Hermite curve matching velocity at both samples.
    #[default]
    Cubic,
}

/// Where a new interpolation window starts when a sample arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartSample {
    /// The previous authoritative sample.
    #[default]
    PreviousTarget,
    /// Whatever pose and velocity are on screen at arrival time. Avoids a
    /// visible jump back when the kart was being extrapolated.
    DisplayedPose,
}

/// Remote smoothing settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Interpolation curve
    pub mode: InterpolationMode,
    /// Start of each new window
    pub start_sample: StartSample,
    /// Arrival intervals at or below this many seconds are treated as zero.
    pub min_interval: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            mode: InterpolationMode::Cubic,
            start_sample: StartSample::PreviousTarget,
            min_interval: 1e-4,
        }
    }
}

/// Full configuration for one kart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KartConfig {
    /// Physical parameters
    pub body: BodyParams,
    /// Authority-side validation
    pub authority: AuthorityConfig,
    /// Observer-side smoothing
    pub smoothing: SmoothingConfig,
    /// Unacknowledged moves kept by the owning client
    pub buffer_capacity: usize,
}

impl Default for KartConfig {
    fn default() -> Self {
        Self {
            body: BodyParams::default(),
            authority: AuthorityConfig::default(),
            smoothing: SmoothingConfig::default(),
            buffer_capacity: 256,
        }
    }
}

impl KartConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] for malformed JSON and
    /// [`Error::InvalidConfig`] for out-of-range values.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        self.body.validate()?;
        if !(self.authority.clock_tolerance.is_finite() && self.authority.clock_tolerance >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "authority.clock_tolerance must be >= 0, got {}",
                self.authority.clock_tolerance
            )));
        }
        if !(self.smoothing.min_interval.is_finite() && self.smoothing.min_interval >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "smoothing.min_interval must be >= 0, got {}",
                self.smoothing.min_interval
            )));
        }
        if self.buffer_capacity == 0 {
            return Err(Error::InvalidConfig(
                "buffer_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn positive(field: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{field} must be > 0, got {value}")))
    }
}

fn finite(field: &str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{field} must be finite")))
    }
}

fn unit_range(field: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{field} must be within [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(KartConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_json_gives_defaults() {
        let config = KartConfig::from_json("{}").unwrap();
        assert_eq!(config, KartConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = KartConfig::from_json(
            r#"{ "authority": { "clock_tolerance": 0.25 }, "buffer_capacity": 32 }"#,
        )
        .unwrap();
        assert!(config.authority.validate_clock);
        assert!((config.authority.clock_tolerance - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.buffer_capacity, 32);
    }

    #[test]
    fn zero_mass_is_rejected() {
        let err = KartConfig::from_json(r#"{ "body": { "mass": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(msg) if msg.contains("body.mass")));
    }

    #[test]
    fn bounce_outside_unit_range_is_rejected() {
        let body = BodyParams {
            bounce_factor: 1.5,
            ..BodyParams::default()
        };
        assert!(body.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = KartConfig::from_json("{ body: ").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn modes_use_snake_case() {
        let json = serde_json::to_string(&StartSample::DisplayedPose).unwrap();
        assert_eq!(json, "\"displayed_pose\"");
    }
}
