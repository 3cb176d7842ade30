//! Per-step locomotion state machine.
//!
//! One call to [`CharacterState::step`] consumes a frame's worth of input
//! and contact data and produces the corrected velocity: submergence and
//! contact classification first, then support resolution (climb / swim /
//! ground / snap / steep promotion), then the velocity adjustment, jump
//! handling and gravity integration. Per-step accumulators are cleared at
//! the start of the next step so external queries between steps observe the
//! resolved state.

use nalgebra::Vector3;

use super::buoyancy::SubmergenceTracker;
use super::connection::ConnectionTracker;
use super::constants::physics as consts;
use super::contacts::{min_support_dot, ContactBuckets, FrameContacts};
use super::gravity::GravityField;
use super::math::{clamp_magnitude, lerp, normalize_or_zero, project_direction_on_plane};
use super::types::{BodyId, LocomotionMode, ProbeLayer, StepInput, WorldProbe};
use crate::config::Tuning;

/// Full locomotion state for one controlled body.
#[derive(Debug, Clone)]
pub struct CharacterState {
    position: Vector3<f32>,
    velocity: Vector3<f32>,
    up_axis: Vector3<f32>,
    right_axis: Vector3<f32>,
    forward_axis: Vector3<f32>,
    contacts: ContactBuckets,
    connection: ConnectionTracker,
    submergence: SubmergenceTracker,
    jump_phase: u32,
    steps_since_last_grounded: u32,
    steps_since_last_jump: u32,
    climb_desired: bool,
    mass: f32,
}

impl CharacterState {
    pub fn new(mass: f32) -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            up_axis: Vector3::y(),
            right_axis: Vector3::x(),
            forward_axis: Vector3::z(),
            contacts: ContactBuckets::default(),
            connection: ConnectionTracker::default(),
            submergence: SubmergenceTracker::default(),
            jump_phase: 0,
            steps_since_last_grounded: 0,
            steps_since_last_jump: 0,
            climb_desired: false,
            mass: mass.max(consts::EPSILON),
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn velocity(&self) -> Vector3<f32> {
        self.velocity
    }

    pub fn up_axis(&self) -> Vector3<f32> {
        self.up_axis
    }

    pub fn contact_normal(&self) -> Vector3<f32> {
        self.contacts.contact_normal
    }

    pub fn jump_phase(&self) -> u32 {
        self.jump_phase
    }

    pub fn submergence(&self) -> f32 {
        self.submergence.submergence()
    }

    /// Body currently supporting the character, if any.
    pub fn connected_body(&self) -> Option<BodyId> {
        self.connection.connected()
    }

    pub fn on_ground(&self) -> bool {
        self.contacts.ground_contact_count > 0
    }

    pub fn on_steep(&self) -> bool {
        self.contacts.steep_contact_count > 0
    }

    /// Climbing holds only once a couple of steps have passed since the
    /// last jump, so a wall-jump actually leaves the wall.
    pub fn climbing(&self) -> bool {
        self.contacts.climb_contact_count > 0 && self.steps_since_last_jump > 2
    }

    pub fn in_water(&self) -> bool {
        self.submergence.in_water()
    }

    pub fn swimming(&self) -> bool {
        self.submergence.swimming()
    }

    pub fn mode(&self) -> LocomotionMode {
        if self.climbing() {
            LocomotionMode::Climbing
        } else if self.swimming() {
            LocomotionMode::Swimming
        } else if self.on_ground() {
            LocomotionMode::Grounded
        } else {
            LocomotionMode::Airborne
        }
    }

    /// Advances the character by one fixed step and returns the corrected
    /// velocity to write back to the body.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        tuning: &Tuning,
        input: &StepInput,
        frame: &FrameContacts,
        gravity_field: &GravityField,
        world: &impl WorldProbe,
        position: Vector3<f32>,
        velocity: Vector3<f32>,
        dt: f32,
    ) -> Vector3<f32> {
        let dt = dt.max(0.0);
        self.position = position;
        self.velocity = velocity;

        self.contacts.clear();
        self.connection.clear_step();
        self.submergence.clear();

        let (gravity, up_axis) = gravity_field.gravity_and_up(position);
        self.up_axis = up_axis;
        self.right_axis = project_direction_on_plane(input.right, up_axis);
        self.forward_axis = project_direction_on_plane(input.forward, up_axis);

        // Submergence before classification: swimming suppresses both the
        // contact evaluation and the climb desire.
        if let Some(water) = frame.water {
            self.submergence
                .evaluate(position, up_axis, tuning, world);
            if self.submergence.swimming() {
                self.connection.offer(water.body);
            }
        }
        self.climb_desired = input.climb && !self.submergence.swimming();

        if !self.submergence.swimming() {
            for contact in &frame.points {
                self.contacts
                    .classify(contact, up_axis, self.climb_desired, tuning);
            }
        }
        self.connection.offer(self.contacts.candidate);

        self.update_state(tuning, world, dt);

        let mut movement = input.movement;
        if !self.submergence.swimming() {
            movement.y = 0.0;
        }
        let movement = clamp_magnitude(movement, 1.0);

        if self.in_water() {
            self.velocity *= 1.0 - tuning.water_drag * self.submergence.submergence() * dt;
        }

        self.adjust_velocity(tuning, movement, dt);

        if input.jump {
            self.jump(gravity, tuning);
        }

        let contact_normal = self.contacts.contact_normal;
        if self.climbing() {
            // Press into the surface so corners don't shake the grip loose.
            self.velocity -= contact_normal
                * (tuning.max_climb_acceleration * consts::CLIMB_GRIP_FACTOR * dt);
        } else if self.in_water() {
            self.velocity +=
                gravity * ((1.0 - tuning.buoyancy * self.submergence.submergence()) * dt);
        } else if self.on_ground() && self.velocity.norm_squared() < consts::REST_SPEED_SQ {
            // At rest on a slope: keep only the normal component of gravity
            // so the contact holds without creeping downhill.
            self.velocity += contact_normal * (gravity.dot(&contact_normal) * dt);
        } else if self.climb_desired && self.on_ground() {
            // Approaching a wall to climb: lean into it.
            self.velocity += (gravity
                - contact_normal * (tuning.max_climb_acceleration * consts::CLIMB_GRIP_FACTOR))
                * dt;
        } else {
            self.velocity += gravity * dt;
        }

        self.velocity
    }

    /// Support resolution for this step, in precedence order. Any support
    /// resets the airborne counter and, once clear of lift-off, the jump
    /// phase.
    fn update_state(&mut self, tuning: &Tuning, world: &impl WorldProbe, dt: f32) {
        self.steps_since_last_grounded = self.steps_since_last_grounded.saturating_add(1);
        self.steps_since_last_jump = self.steps_since_last_jump.saturating_add(1);

        let supported = self.check_climbing(tuning)
            || self.check_swimming()
            || self.on_ground()
            || self.snap_to_ground(tuning, world)
            || self.check_steep_contacts(tuning);
        if supported {
            self.steps_since_last_grounded = 0;
            if self.steps_since_last_jump > 1 {
                self.jump_phase = 0;
            }
            if self.contacts.ground_contact_count > 1 {
                let normalized = normalize_or_zero(self.contacts.contact_normal);
                self.contacts.contact_normal = if normalized == Vector3::zeros() {
                    self.up_axis
                } else {
                    normalized
                };
            }
        } else {
            self.contacts.contact_normal = self.up_axis;
        }

        self.connection.update(self.position, self.mass, world, dt);
    }

    /// Promotes climb contacts to the active support. Opposing crack
    /// normals that cancel fall back to the last single climb normal so
    /// the character can still push out of the crack.
    fn check_climbing(&mut self, tuning: &Tuning) -> bool {
        if !self.climbing() {
            return false;
        }
        if self.contacts.climb_contact_count > 1 {
            let norm_sq = self.contacts.climb_normal.norm_squared();
            if norm_sq < consts::EPSILON * consts::EPSILON {
                self.contacts.climb_normal = self.contacts.last_climb_normal;
            } else {
                self.contacts.climb_normal /= norm_sq.sqrt();
                let up_dot = self.up_axis.dot(&self.contacts.climb_normal);
                if up_dot >= tuning.crack_up_dot {
                    self.contacts.climb_normal = self.contacts.last_climb_normal;
                }
            }
        }
        self.contacts.ground_contact_count = 1;
        self.contacts.contact_normal = self.contacts.climb_normal;
        true
    }

    /// While swimming the contact plane is the up plane and ground contacts
    /// are irrelevant.
    fn check_swimming(&mut self) -> bool {
        if !self.submergence.swimming() {
            return false;
        }
        self.contacts.ground_contact_count = 0;
        self.contacts.contact_normal = self.up_axis;
        true
    }

    /// Re-acquires ground contact via raycast when the collision step lost
    /// it for a frame. Only fires when the character just left the ground,
    /// is past the lift-off window of a jump, and is slow enough to stick.
    fn snap_to_ground(&mut self, tuning: &Tuning, world: &impl WorldProbe) -> bool {
        if self.steps_since_last_grounded > 1 || self.steps_since_last_jump <= 2 {
            return false;
        }
        let speed = self.velocity.norm();
        if speed > tuning.max_snap_speed {
            return false;
        }
        let Some(hit) = world.cast_ray(
            self.position,
            -self.up_axis,
            tuning.probe_distance,
            ProbeLayer::Solid,
        ) else {
            return false;
        };
        let up_dot = self.up_axis.dot(&hit.normal);
        if up_dot < min_support_dot(hit.surface, tuning) {
            return false;
        }

        self.contacts.ground_contact_count = 1;
        self.contacts.contact_normal = hit.normal;
        // Rotate any outward velocity back into the surface plane without
        // losing speed, so the character hugs the slope instead of popping
        // off it.
        let dot = self.velocity.dot(&hit.normal);
        if dot > 0.0 {
            self.velocity = normalize_or_zero(self.velocity - hit.normal * dot) * speed;
        }
        self.connection.offer(hit.body);
        true
    }

    /// A V-shaped crack between two steep walls can act as ground: if the
    /// summed steep normal itself passes the ground angle test, promote it.
    fn check_steep_contacts(&mut self, tuning: &Tuning) -> bool {
        if self.contacts.steep_contact_count > 1 {
            let normalized = normalize_or_zero(self.contacts.steep_normal);
            if normalized != Vector3::zeros()
                && self.up_axis.dot(&normalized) >= tuning.min_ground_dot
            {
                self.contacts.steep_normal = normalized;
                self.contacts.ground_contact_count = 1;
                self.contacts.contact_normal = normalized;
                return true;
            }
        }
        false
    }

    /// Moves the relative velocity toward the desired input velocity along
    /// the mode's basis axes, at most `acceleration * dt` per step.
    fn adjust_velocity(&mut self, tuning: &Tuning, movement: Vector3<f32>, dt: f32) {
        let acceleration;
        let speed;
        let x_axis;
        let z_axis;
        if self.climbing() {
            acceleration = tuning.max_climb_acceleration;
            speed = tuning.max_climb_speed;
            // Lateral shimmy along the wall; vertical input climbs it.
            x_axis = self.contacts.contact_normal.cross(&self.up_axis);
            z_axis = self.up_axis;
        } else if self.in_water() {
            let swim_factor =
                (self.submergence.submergence() / tuning.swim_threshold).min(1.0);
            acceleration = lerp(
                if self.on_ground() {
                    tuning.max_acceleration
                } else {
                    tuning.max_air_acceleration
                },
                tuning.max_swim_acceleration,
                swim_factor,
            );
            speed = lerp(tuning.max_speed, tuning.max_swim_speed, swim_factor);
            x_axis = self.right_axis;
            z_axis = self.forward_axis;
        } else {
            acceleration = if self.on_ground() {
                tuning.max_acceleration
            } else {
                tuning.max_air_acceleration
            };
            // Slow down ahead of grabbing a climbable wall.
            speed = if self.on_ground() && self.climb_desired {
                tuning.max_climb_speed
            } else {
                tuning.max_speed
            };
            x_axis = self.right_axis;
            z_axis = self.forward_axis;
        }
        let x_axis = project_direction_on_plane(x_axis, self.contacts.contact_normal);
        let z_axis = project_direction_on_plane(z_axis, self.contacts.contact_normal);

        let relative_velocity = self.velocity - self.connection.velocity();
        let mut adjustment = Vector3::new(
            movement.x * speed - relative_velocity.dot(&x_axis),
            0.0,
            movement.z * speed - relative_velocity.dot(&z_axis),
        );
        if self.submergence.swimming() {
            adjustment.y = movement.y * speed - relative_velocity.dot(&self.up_axis);
        }
        let adjustment = clamp_magnitude(adjustment, acceleration * dt);

        self.velocity += x_axis * adjustment.x + z_axis * adjustment.z;
        if self.submergence.swimming() {
            self.velocity += self.up_axis * adjustment.y;
        }
    }

    /// Executes a jump request if any jump is currently available, else
    /// drops it silently.
    fn jump(&mut self, gravity: Vector3<f32>, tuning: &Tuning) {
        let jump_direction;
        if self.on_ground() {
            jump_direction = self.contacts.contact_normal;
            // Ground contact can outlive lift-off by a step; a grounded
            // jump is always the first of its flight.
            self.jump_phase = 0;
        } else if self.on_steep() {
            // Wall jumps always count as the first air jump.
            jump_direction = self.contacts.steep_normal;
            self.jump_phase = 0;
        } else if tuning.max_air_jumps > 0 && self.jump_phase <= tuning.max_air_jumps {
            // Walking off a ledge without jumping keeps phase 0; spend the
            // first air-jump credit for it.
            if self.jump_phase == 0 {
                self.jump_phase = 1;
            }
            jump_direction = self.contacts.contact_normal;
        } else {
            return;
        }

        self.steps_since_last_jump = 0;
        self.jump_phase += 1;
        let mut jump_speed = (2.0 * gravity.norm() * tuning.jump_height).sqrt();
        if self.in_water() {
            jump_speed *=
                (1.0 - self.submergence.submergence() / tuning.swim_threshold).max(0.0);
        }
        // Bias toward up so wall and slope jumps still gain height.
        let jump_direction = normalize_or_zero(jump_direction + self.up_axis);
        let aligned_speed = self.velocity.dot(&jump_direction);
        if aligned_speed > 0.0 {
            // Don't stack impulses when already moving along the jump.
            jump_speed = (jump_speed - aligned_speed).max(0.0);
        }
        self.velocity += jump_direction * jump_speed;
    }
}

impl Default for CharacterState {
    fn default() -> Self {
        Self::new(consts::CHARACTER_MASS)
    }
}
