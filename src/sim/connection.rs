//! Tracks the body currently supporting the character and derives its
//! velocity at the contact point by finite difference.
//!
//! Sampling the connection point in the platform's local frame and pushing
//! it back through the platform's next pose captures rotation as well as
//! translation without needing the engine to compose angular and linear
//! velocity for us.

use nalgebra::{Point3, Vector3};

use super::types::{BodyId, WorldProbe};

#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    connected: Option<BodyId>,
    previous: Option<BodyId>,
    velocity: Vector3<f32>,
    /// Character position at the previous sample, world frame.
    world_position: Vector3<f32>,
    /// Same point expressed in the connected body's local frame at the time
    /// of sampling.
    local_position: Vector3<f32>,
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self {
            connected: None,
            previous: None,
            velocity: Vector3::zeros(),
            world_position: Vector3::zeros(),
            local_position: Vector3::zeros(),
        }
    }
}

impl ConnectionTracker {
    /// Records a connection candidate for this step. `None` leaves any
    /// earlier candidate in place.
    pub fn offer(&mut self, body: Option<BodyId>) {
        if body.is_some() {
            self.connected = body;
        }
    }

    pub fn connected(&self) -> Option<BodyId> {
        self.connected
    }

    /// Platform velocity at the connection point, zero when unsupported or
    /// on the first step of a new connection.
    pub fn velocity(&self) -> Vector3<f32> {
        self.velocity
    }

    /// Resolves this step's connection: checks support eligibility, derives
    /// the platform velocity when the same body carried us last step, and
    /// samples the connection point for the next step.
    ///
    /// A body qualifies as support only when it is kinematic/fixed or at
    /// least as heavy as the character; a missing body means no platform.
    pub fn update(
        &mut self,
        character_position: Vector3<f32>,
        character_mass: f32,
        world: &impl WorldProbe,
        dt: f32,
    ) {
        let Some(body) = self.connected else {
            return;
        };
        let Some(frame) = world.body_frame(body) else {
            self.connected = None;
            return;
        };
        if frame.dynamic && frame.mass < character_mass {
            return;
        }

        if self.previous == Some(body) && dt > 0.0 {
            let carried = frame
                .isometry
                .transform_point(&Point3::from(self.local_position));
            self.velocity = (carried.coords - self.world_position) / dt;
        }

        self.world_position = character_position;
        self.local_position = frame
            .isometry
            .inverse_transform_point(&Point3::from(character_position))
            .coords;
    }

    /// End-of-step rotation: this step's connection becomes history.
    pub fn clear_step(&mut self) {
        self.previous = self.connected;
        self.connected = None;
        self.velocity = Vector3::zeros();
    }
}
