//! Shared vocabulary between the simulation core and the physics adapter.

use nalgebra::{Isometry3, Vector3};

/// Stable identifier for a body in the physics world.
///
/// The simulation core never holds engine handles; it refers to bodies by id
/// and resolves them through [`WorldProbe::body_frame`]. A vanished body
/// simply resolves to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(pub u64);

/// Surface classification decided once by the physics adapter at
/// contact-query time, consumed as plain data by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCategory {
    Ground,
    Stairs,
    Climbable,
    Other,
}

/// Pose and support-eligibility data for a body the character touches.
#[derive(Debug, Clone, Copy)]
pub struct BodyFrame {
    /// World-space pose of the body this step.
    pub isometry: Isometry3<f32>,
    /// Mass in kg; kinematic and fixed bodies report their nominal mass.
    pub mass: f32,
    /// True for bodies driven by the dynamics solver (not kinematic/fixed).
    pub dynamic: bool,
}

/// Which colliders a probe ray may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeLayer {
    /// Solid walkable geometry (ground, stairs, climbable surfaces).
    Solid,
    /// Water volumes only.
    Water,
}

/// Result of a synchronous ray query.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub distance: f32,
    pub normal: Vector3<f32>,
    pub surface: SurfaceCategory,
    pub body: Option<BodyId>,
}

/// Read-only world access the simulation core needs beyond the per-step
/// contact list: point raycasts and connected-body poses.
pub trait WorldProbe {
    /// Casts a ray and returns the closest hit within `max_distance`.
    /// `direction` must be unit length.
    fn cast_ray(
        &self,
        origin: Vector3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        layer: ProbeLayer,
    ) -> Option<RayHit>;

    /// Current pose of a body, or `None` if it no longer exists.
    fn body_frame(&self, body: BodyId) -> Option<BodyFrame>;
}

/// Per-step control intent supplied by the input layer.
#[derive(Debug, Clone, Copy)]
pub struct StepInput {
    /// Movement intent: x = right, z = forward, y = swim up/down.
    /// Clamped to unit magnitude inside the step.
    pub movement: Vector3<f32>,
    /// Jump requested this step (latched by the caller between steps).
    pub jump: bool,
    /// Character wants to grab climbable surfaces.
    pub climb: bool,
    /// Input-space right axis (e.g. from the camera transform).
    pub right: Vector3<f32>,
    /// Input-space forward axis.
    pub forward: Vector3<f32>,
}

impl Default for StepInput {
    fn default() -> Self {
        Self {
            movement: Vector3::zeros(),
            jump: false,
            climb: false,
            right: Vector3::x(),
            forward: Vector3::z(),
        }
    }
}

/// The resolved locomotion mode for one step, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocomotionMode {
    Climbing,
    Swimming,
    Grounded,
    Airborne,
}
