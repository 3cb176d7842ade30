//! Locomotion tuning parsed from locomotion.toml files.
//!
//! Angle limits are validated and converted to cosine thresholds once at
//! load time; the simulation core only ever sees the derived [`Tuning`].

use serde::Deserialize;
use std::path::Path;

use crate::sim::constants::tuning as defaults;

/// Raw locomotion configuration from locomotion.toml
#[derive(Debug, Clone, Deserialize)]
pub struct LocomotionConfig {
    /// Maximum ground speed in m/s
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    /// Maximum speed while climbing
    #[serde(default = "default_max_climb_speed")]
    pub max_climb_speed: f32,
    /// Maximum speed while swimming
    #[serde(default = "default_max_swim_speed")]
    pub max_swim_speed: f32,
    /// Maximum ground acceleration in m/s²
    #[serde(default = "default_max_acceleration")]
    pub max_acceleration: f32,
    /// Maximum acceleration while airborne
    #[serde(default = "default_max_air_acceleration")]
    pub max_air_acceleration: f32,
    /// Maximum acceleration while climbing
    #[serde(default = "default_max_climb_acceleration")]
    pub max_climb_acceleration: f32,
    /// Maximum acceleration while swimming
    #[serde(default = "default_max_swim_acceleration")]
    pub max_swim_acceleration: f32,
    /// Jump apex height in meters
    #[serde(default = "default_jump_height")]
    pub jump_height: f32,
    /// Number of extra jumps allowed while airborne
    #[serde(default = "default_max_air_jumps")]
    pub max_air_jumps: u32,
    /// Steepest walkable slope in degrees (0-90)
    #[serde(default = "default_max_ground_angle")]
    pub max_ground_angle: f32,
    /// Steepest walkable stair surface in degrees (0-90)
    #[serde(default = "default_max_stairs_angle")]
    pub max_stairs_angle: f32,
    /// Steepest climbable overhang in degrees (90-180)
    #[serde(default = "default_max_climb_angle")]
    pub max_climb_angle: f32,
    /// Above this speed the character lifts off instead of snapping down
    #[serde(default = "default_max_snap_speed")]
    pub max_snap_speed: f32,
    /// Length of the downward ground-snap probe ray
    #[serde(default = "default_probe_distance")]
    pub probe_distance: f32,
    /// Height above the body origin where submergence is measured
    #[serde(default = "default_submergence_offset")]
    pub submergence_offset: f32,
    /// Vertical span over which submergence goes from 0 to 1
    #[serde(default = "default_submergence_range")]
    pub submergence_range: f32,
    /// Linear drag applied in proportion to submergence (0-10)
    #[serde(default = "default_water_drag")]
    pub water_drag: f32,
    /// Buoyancy factor; 1 is neutrally buoyant, above 1 floats
    #[serde(default = "default_buoyancy")]
    pub buoyancy: f32,
    /// Submergence fraction at which swimming takes over (0.01-1)
    #[serde(default = "default_swim_threshold")]
    pub swim_threshold: f32,
    /// Optional override for the climb-crack cancellation threshold: a
    /// summed climb normal with an up-dot at or above this falls back to
    /// the last single climb normal. Defaults to the ground threshold.
    #[serde(default)]
    pub crack_up_dot: Option<f32>,
}

fn default_max_speed() -> f32 {
    defaults::MAX_SPEED
}
fn default_max_climb_speed() -> f32 {
    defaults::MAX_CLIMB_SPEED
}
fn default_max_swim_speed() -> f32 {
    defaults::MAX_SWIM_SPEED
}
fn default_max_acceleration() -> f32 {
    defaults::MAX_ACCELERATION
}
fn default_max_air_acceleration() -> f32 {
    defaults::MAX_AIR_ACCELERATION
}
fn default_max_climb_acceleration() -> f32 {
    defaults::MAX_CLIMB_ACCELERATION
}
fn default_max_swim_acceleration() -> f32 {
    defaults::MAX_SWIM_ACCELERATION
}
fn default_jump_height() -> f32 {
    defaults::JUMP_HEIGHT
}
fn default_max_air_jumps() -> u32 {
    defaults::MAX_AIR_JUMPS
}
fn default_max_ground_angle() -> f32 {
    defaults::MAX_GROUND_ANGLE
}
fn default_max_stairs_angle() -> f32 {
    defaults::MAX_STAIRS_ANGLE
}
fn default_max_climb_angle() -> f32 {
    defaults::MAX_CLIMB_ANGLE
}
fn default_max_snap_speed() -> f32 {
    defaults::MAX_SNAP_SPEED
}
fn default_probe_distance() -> f32 {
    defaults::PROBE_DISTANCE
}
fn default_submergence_offset() -> f32 {
    defaults::SUBMERGENCE_OFFSET
}
fn default_submergence_range() -> f32 {
    defaults::SUBMERGENCE_RANGE
}
fn default_water_drag() -> f32 {
    defaults::WATER_DRAG
}
fn default_buoyancy() -> f32 {
    defaults::BUOYANCY
}
fn default_swim_threshold() -> f32 {
    defaults::SWIM_THRESHOLD
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            max_speed: default_max_speed(),
            max_climb_speed: default_max_climb_speed(),
            max_swim_speed: default_max_swim_speed(),
            max_acceleration: default_max_acceleration(),
            max_air_acceleration: default_max_air_acceleration(),
            max_climb_acceleration: default_max_climb_acceleration(),
            max_swim_acceleration: default_max_swim_acceleration(),
            jump_height: default_jump_height(),
            max_air_jumps: default_max_air_jumps(),
            max_ground_angle: default_max_ground_angle(),
            max_stairs_angle: default_max_stairs_angle(),
            max_climb_angle: default_max_climb_angle(),
            max_snap_speed: default_max_snap_speed(),
            probe_distance: default_probe_distance(),
            submergence_offset: default_submergence_offset(),
            submergence_range: default_submergence_range(),
            water_drag: default_water_drag(),
            buoyancy: default_buoyancy(),
            swim_threshold: default_swim_threshold(),
            crack_up_dot: None,
        }
    }
}

impl LocomotionConfig {
    /// Load locomotion configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, LocomotionConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LocomotionConfigError::IoError(path.to_path_buf(), e))?;

        toml::from_str(&content)
            .map_err(|e| LocomotionConfigError::ParseError(path.to_path_buf(), e))
    }

    /// Load locomotion configuration from a directory
    /// Looks for locomotion.toml in the given directory
    pub fn from_dir(dir: &Path) -> Result<Self, LocomotionConfigError> {
        let config_path = dir.join("locomotion.toml");
        Self::from_file(&config_path)
    }

    /// Validates ranges and converts angle limits to their cosine
    /// thresholds, producing the runtime tuning the simulation consumes.
    pub fn tuning(&self) -> Result<Tuning, LocomotionConfigError> {
        range("max_speed", self.max_speed, 0.0, 100.0)?;
        range("max_climb_speed", self.max_climb_speed, 0.0, 100.0)?;
        range("max_swim_speed", self.max_swim_speed, 0.0, 100.0)?;
        range("max_acceleration", self.max_acceleration, 0.0, 100.0)?;
        range("max_air_acceleration", self.max_air_acceleration, 0.0, 100.0)?;
        range(
            "max_climb_acceleration",
            self.max_climb_acceleration,
            0.0,
            100.0,
        )?;
        range(
            "max_swim_acceleration",
            self.max_swim_acceleration,
            0.0,
            100.0,
        )?;
        range("jump_height", self.jump_height, 0.0, 10.0)?;
        if self.max_air_jumps > 5 {
            return Err(LocomotionConfigError::OutOfRange {
                field: "max_air_jumps",
                value: self.max_air_jumps as f32,
            });
        }
        range("max_ground_angle", self.max_ground_angle, 0.0, 90.0)?;
        range("max_stairs_angle", self.max_stairs_angle, 0.0, 90.0)?;
        range("max_climb_angle", self.max_climb_angle, 90.0, 180.0)?;
        range("max_snap_speed", self.max_snap_speed, 0.0, 100.0)?;
        range("probe_distance", self.probe_distance, 0.0, f32::INFINITY)?;
        range(
            "submergence_offset",
            self.submergence_offset,
            0.0,
            f32::INFINITY,
        )?;
        range(
            "submergence_range",
            self.submergence_range,
            0.1,
            f32::INFINITY,
        )?;
        range("water_drag", self.water_drag, 0.0, 10.0)?;
        range("buoyancy", self.buoyancy, 0.0, f32::INFINITY)?;
        range("swim_threshold", self.swim_threshold, 0.01, 1.0)?;
        if let Some(dot) = self.crack_up_dot {
            range("crack_up_dot", dot, -1.0, 1.0)?;
        }

        let min_ground_dot = self.max_ground_angle.to_radians().cos();
        Ok(Tuning {
            max_speed: self.max_speed,
            max_climb_speed: self.max_climb_speed,
            max_swim_speed: self.max_swim_speed,
            max_acceleration: self.max_acceleration,
            max_air_acceleration: self.max_air_acceleration,
            max_climb_acceleration: self.max_climb_acceleration,
            max_swim_acceleration: self.max_swim_acceleration,
            jump_height: self.jump_height,
            max_air_jumps: self.max_air_jumps,
            max_snap_speed: self.max_snap_speed,
            probe_distance: self.probe_distance,
            submergence_offset: self.submergence_offset,
            submergence_range: self.submergence_range,
            water_drag: self.water_drag,
            buoyancy: self.buoyancy,
            swim_threshold: self.swim_threshold,
            min_ground_dot,
            min_stairs_dot: self.max_stairs_angle.to_radians().cos(),
            min_climb_dot: self.max_climb_angle.to_radians().cos(),
            crack_up_dot: self.crack_up_dot.unwrap_or(min_ground_dot),
        })
    }
}

fn range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), LocomotionConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(LocomotionConfigError::OutOfRange { field, value })
    }
}

/// Validated runtime tuning with precomputed dot-product thresholds.
#[derive(Debug, Clone)]
pub struct Tuning {
    pub max_speed: f32,
    pub max_climb_speed: f32,
    pub max_swim_speed: f32,
    pub max_acceleration: f32,
    pub max_air_acceleration: f32,
    pub max_climb_acceleration: f32,
    pub max_swim_acceleration: f32,
    pub jump_height: f32,
    pub max_air_jumps: u32,
    pub max_snap_speed: f32,
    pub probe_distance: f32,
    pub submergence_offset: f32,
    pub submergence_range: f32,
    pub water_drag: f32,
    pub buoyancy: f32,
    pub swim_threshold: f32,
    /// cos(max_ground_angle)
    pub min_ground_dot: f32,
    /// cos(max_stairs_angle)
    pub min_stairs_dot: f32,
    /// cos(max_climb_angle); negative for overhanging climb limits
    pub min_climb_dot: f32,
    /// Crack-cancellation cutoff for summed climb normals
    pub crack_up_dot: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        LocomotionConfig::default()
            .tuning()
            .expect("default locomotion config is valid")
    }
}

/// Errors that can occur when loading locomotion configuration
#[derive(Debug)]
pub enum LocomotionConfigError {
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, toml::de::Error),
    OutOfRange { field: &'static str, value: f32 },
}

impl std::fmt::Display for LocomotionConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocomotionConfigError::IoError(path, e) => {
                write!(f, "Failed to read {}: {}", path.display(), e)
            }
            LocomotionConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse {}: {}", path.display(), e)
            }
            LocomotionConfigError::OutOfRange { field, value } => {
                write!(f, "Configuration value out of range: {} = {}", field, value)
            }
        }
    }
}

impl std::error::Error for LocomotionConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: LocomotionConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_speed, 10.0);
        assert_eq!(config.max_air_jumps, 0);
        assert_eq!(config.swim_threshold, 0.5);
    }

    #[test]
    fn test_partial_config_overrides() {
        let toml = r#"
            max_speed = 8.0
            max_air_jumps = 2
            max_ground_angle = 40.0
        "#;
        let config: LocomotionConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_speed, 8.0);
        assert_eq!(config.max_air_jumps, 2);
        assert_eq!(config.max_ground_angle, 40.0);
        // Unset fields keep their defaults.
        assert_eq!(config.max_climb_speed, 2.0);
    }

    #[test]
    fn test_angle_thresholds_are_cosines() {
        let tuning = LocomotionConfig::default().tuning().unwrap();
        assert!((tuning.min_ground_dot - 25.0_f32.to_radians().cos()).abs() < 1e-6);
        assert!((tuning.min_stairs_dot - 50.0_f32.to_radians().cos()).abs() < 1e-6);
        assert!((tuning.min_climb_dot - 140.0_f32.to_radians().cos()).abs() < 1e-6);
        // Stairs accept steeper surfaces than plain ground.
        assert!(tuning.min_stairs_dot < tuning.min_ground_dot);
        // 140° climb limit reaches past vertical.
        assert!(tuning.min_climb_dot < 0.0);
    }

    #[test]
    fn test_crack_cutoff_defaults_to_ground_threshold() {
        let tuning = LocomotionConfig::default().tuning().unwrap();
        assert_eq!(tuning.crack_up_dot, tuning.min_ground_dot);

        let config = LocomotionConfig {
            crack_up_dot: Some(0.5),
            ..Default::default()
        };
        assert_eq!(config.tuning().unwrap().crack_up_dot, 0.5);
    }

    #[test]
    fn test_out_of_range_angle_rejected() {
        let config = LocomotionConfig {
            max_ground_angle: 120.0,
            ..Default::default()
        };
        let err = config.tuning().unwrap_err();
        match err {
            LocomotionConfigError::OutOfRange { field, .. } => {
                assert_eq!(field, "max_ground_angle")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_climb_angle_below_vertical_rejected() {
        let config = LocomotionConfig {
            max_climb_angle: 45.0,
            ..Default::default()
        };
        assert!(config.tuning().is_err());
    }

    #[test]
    fn test_nonsense_values_rejected() {
        let config = LocomotionConfig {
            max_speed: f32::NAN,
            ..Default::default()
        };
        assert!(config.tuning().is_err());

        let config = LocomotionConfig {
            swim_threshold: 0.0,
            ..Default::default()
        };
        assert!(config.tuning().is_err());
    }
}
