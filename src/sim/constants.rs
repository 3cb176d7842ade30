//! Locomotion tuning defaults and numeric guards.
//! Centralizing these prevents bugs from duplicated hardcoded values.

/// Default controller tuning (overridable via `config::LocomotionConfig`)
pub mod tuning {
    /// Maximum ground speed in m/s
    pub const MAX_SPEED: f32 = 10.0;

    /// Maximum speed while climbing
    pub const MAX_CLIMB_SPEED: f32 = 2.0;

    /// Maximum speed while swimming
    pub const MAX_SWIM_SPEED: f32 = 5.0;

    /// Maximum ground acceleration in m/s²
    pub const MAX_ACCELERATION: f32 = 10.0;

    /// Maximum acceleration while airborne
    pub const MAX_AIR_ACCELERATION: f32 = 1.0;

    /// Maximum acceleration while climbing
    pub const MAX_CLIMB_ACCELERATION: f32 = 20.0;

    /// Maximum acceleration while swimming
    pub const MAX_SWIM_ACCELERATION: f32 = 5.0;

    /// Jump apex height in meters
    pub const JUMP_HEIGHT: f32 = 2.0;

    /// Number of extra jumps allowed while airborne
    pub const MAX_AIR_JUMPS: u32 = 0;

    /// Steepest slope still walkable, in degrees
    pub const MAX_GROUND_ANGLE: f32 = 25.0;

    /// Steepest stair surface still walkable, in degrees
    pub const MAX_STAIRS_ANGLE: f32 = 50.0;

    /// Steepest overhang still climbable, in degrees (90 = vertical wall)
    pub const MAX_CLIMB_ANGLE: f32 = 140.0;

    /// Above this speed the character lifts off instead of snapping down
    pub const MAX_SNAP_SPEED: f32 = 100.0;

    /// Length of the downward ground-snap probe ray
    pub const PROBE_DISTANCE: f32 = 1.0;

    /// Height above the body origin where submergence is measured
    pub const SUBMERGENCE_OFFSET: f32 = 0.5;

    /// Vertical span over which submergence goes from 0 to 1
    pub const SUBMERGENCE_RANGE: f32 = 1.0;

    /// Linear drag applied in proportion to submergence
    pub const WATER_DRAG: f32 = 1.0;

    /// Buoyancy factor; 1 is neutrally buoyant, above 1 floats
    pub const BUOYANCY: f32 = 1.0;

    /// Submergence fraction at which swimming takes over
    pub const SWIM_THRESHOLD: f32 = 0.5;
}

/// Physics adapter constants
pub mod physics {
    /// Default gravity magnitude in m/s²
    pub const DEFAULT_GRAVITY: f32 = 9.81;

    /// Fixed timestep for physics simulation (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// Default character capsule radius
    pub const CHARACTER_RADIUS: f32 = 0.5;

    /// Default character capsule total height
    pub const CHARACTER_HEIGHT: f32 = 2.0;

    /// Default character mass
    pub const CHARACTER_MASS: f32 = 1.0;

    /// Small epsilon for float comparisons
    pub const EPSILON: f32 = 1e-4;

    /// Contact points separated by less than this count as touching
    pub const CONTACT_SLOP: f32 = 1e-3;

    /// Contacts with an up-dot below this are overhangs, not steep walls
    pub const STEEP_UP_DOT_LIMIT: f32 = -0.01;

    /// Squared speed below which a grounded character counts as at rest
    pub const REST_SPEED_SQ: f32 = 0.01;

    /// Fraction of climb acceleration used to press into the climbed surface
    pub const CLIMB_GRIP_FACTOR: f32 = 0.9;
}
