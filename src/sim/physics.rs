//! Wrapper around a Rapier3D physics world that hosts locomotion-driven
//! characters alongside static and kinematic level geometry.
//!
//! Each fixed step runs the pipeline, gathers the narrow-phase contacts for
//! every character, feeds them through the locomotion core and writes the
//! corrected velocity back to the body. Bodies are addressed by caller-chosen
//! u64 ids; the maps below translate to and from Rapier handles.

use nalgebra::{UnitQuaternion, Vector3};
use rapier3d::prelude::*;
use std::collections::{HashMap, HashSet};

use super::constants::physics as consts;
use super::contacts::{ContactPoint, FrameContacts, WaterOverlap};
use super::controller::CharacterState;
use super::gravity::GravityField;
use super::types::{
    BodyFrame, BodyId, ProbeLayer, RayHit, StepInput, SurfaceCategory, WorldProbe,
};
use crate::config::Tuning;

// Collision groups: characters collide with level geometry but not with each
// other; water volumes are sensors that only characters notice.
const GROUP_STATIC: Group = Group::GROUP_1; // Walls, floors, platforms, props
const GROUP_CHARACTER: Group = Group::GROUP_2; // Controlled characters
const GROUP_WATER: Group = Group::GROUP_3; // Water volume sensors

/// Latched control intent for one character, refreshed by the input layer.
#[derive(Debug, Clone, Copy)]
struct CharacterInput {
    movement: Vector3<f32>,
    climb: bool,
    right: Vector3<f32>,
    forward: Vector3<f32>,
}

impl Default for CharacterInput {
    fn default() -> Self {
        Self {
            movement: Vector3::zeros(),
            climb: false,
            right: Vector3::x(),
            forward: Vector3::z(),
        }
    }
}

/// One simulated character: locomotion state plus its body and tuning.
pub struct CharacterSlot {
    pub state: CharacterState,
    pub tuning: Tuning,
    body_handle: RigidBodyHandle,
    collider_handle: ColliderHandle,
    input: CharacterInput,
    jump_requested: bool,
}

/// Rapier-backed world hosting characters, level parts and water volumes.
pub struct PhysicsWorld {
    pub gravity_field: GravityField,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    /// Maps caller id to Rapier rigid body handle
    id_to_body: HashMap<u64, RigidBodyHandle>,
    /// Maps Rapier rigid body handle to caller id (reverse lookup)
    body_to_id: HashMap<RigidBodyHandle, u64>,
    /// Maps collider handle to the caller id of its body
    collider_to_id: HashMap<ColliderHandle, u64>,
    /// Surface category per collider, decided once at creation
    surface_categories: HashMap<ColliderHandle, SurfaceCategory>,
    /// Colliders that are water volumes
    water_volumes: HashSet<ColliderHandle>,
    /// Locomotion characters keyed by caller id
    characters: HashMap<u64, CharacterSlot>,
}

impl PhysicsWorld {
    /// Creates a new physics world with plain downward gravity.
    pub fn new() -> Self {
        Self {
            gravity_field: GravityField::default(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            id_to_body: HashMap::new(),
            body_to_id: HashMap::new(),
            collider_to_id: HashMap::new(),
            surface_categories: HashMap::new(),
            water_volumes: HashSet::new(),
            characters: HashMap::new(),
        }
    }

    /// Adds a cuboid level part.
    /// - Anchored parts become kinematic (position-driven, movable platforms)
    /// - Non-anchored parts become dynamic props
    pub fn add_part(
        &mut self,
        id: u64,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        half_extents: Vector3<f32>,
        anchored: bool,
        surface: SurfaceCategory,
    ) -> RigidBodyHandle {
        let body = if anchored {
            RigidBodyBuilder::kinematic_position_based()
        } else {
            RigidBodyBuilder::dynamic()
        }
        .translation(position)
        .rotation(rotation.scaled_axis())
        .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .collision_groups(InteractionGroups::new(GROUP_STATIC, Group::ALL))
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.id_to_body.insert(id, handle);
        self.body_to_id.insert(handle, id);
        self.collider_to_id.insert(collider_handle, id);
        self.surface_categories.insert(collider_handle, surface);

        handle
    }

    /// Adds a water volume: a kinematic sensor box only characters notice.
    pub fn add_water_volume(
        &mut self,
        id: u64,
        position: Vector3<f32>,
        half_extents: Vector3<f32>,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(position)
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .sensor(true)
            .collision_groups(InteractionGroups::new(GROUP_WATER, GROUP_CHARACTER))
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.id_to_body.insert(id, handle);
        self.body_to_id.insert(handle, id);
        self.collider_to_id.insert(collider_handle, id);
        self.water_volumes.insert(collider_handle);

        handle
    }

    /// Removes a part (or water volume) from the physics world
    pub fn remove_part(&mut self, id: u64) -> bool {
        if let Some(handle) = self.id_to_body.remove(&id) {
            self.body_to_id.remove(&handle);
            if let Some(body) = self.rigid_body_set.get(handle) {
                for &ch in body.colliders() {
                    self.collider_to_id.remove(&ch);
                    self.surface_categories.remove(&ch);
                    self.water_volumes.remove(&ch);
                }
            }
            self.rigid_body_set.remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
            true
        } else {
            false
        }
    }

    /// Schedules the next pose of an anchored (kinematic) part
    pub fn set_kinematic_position(&mut self, handle: RigidBodyHandle, position: Vector3<f32>) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            if body.is_kinematic() {
                body.set_next_kinematic_translation(position);
            }
        }
    }

    /// Schedules the next rotation of an anchored (kinematic) part
    pub fn set_kinematic_rotation(
        &mut self,
        handle: RigidBodyHandle,
        rotation: UnitQuaternion<f32>,
    ) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            if body.is_kinematic() {
                body.set_next_kinematic_rotation(rotation);
            }
        }
    }

    /// Adds a locomotion-driven character.
    ///
    /// The body is dynamic with locked rotations and zero gravity scale:
    /// gravity is the controller's job, including non-uniform fields.
    pub fn add_character(
        &mut self,
        id: u64,
        position: Vector3<f32>,
        radius: f32,
        height: f32,
        tuning: Tuning,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(position)
            .lock_rotations()
            .gravity_scale(0.0)
            .ccd_enabled(true)
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        // Capsule: half-height is the cylinder part, total = 2*hh + 2*r.
        // Frictionless so the velocity controller is the only authority.
        let half_height = (height - 2.0 * radius).max(0.0) / 2.0;
        let collider = ColliderBuilder::capsule_y(half_height, radius)
            .mass(consts::CHARACTER_MASS)
            .friction(0.0)
            .collision_groups(InteractionGroups::new(
                GROUP_CHARACTER,
                GROUP_STATIC | GROUP_WATER,
            ))
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        self.characters.insert(
            id,
            CharacterSlot {
                state: CharacterState::new(consts::CHARACTER_MASS),
                tuning,
                body_handle,
                collider_handle,
                input: CharacterInput::default(),
                jump_requested: false,
            },
        );
        self.id_to_body.insert(id, body_handle);
        self.body_to_id.insert(body_handle, id);
        self.collider_to_id.insert(collider_handle, id);

        body_handle
    }

    /// Refreshes a character's control intent for the coming steps.
    pub fn set_character_input(
        &mut self,
        id: u64,
        movement: Vector3<f32>,
        climb: bool,
        right: Vector3<f32>,
        forward: Vector3<f32>,
    ) {
        if let Some(slot) = self.characters.get_mut(&id) {
            slot.input = CharacterInput {
                movement,
                climb,
                right,
                forward,
            };
        }
    }

    /// Latches a jump request; consumed by the next step.
    pub fn request_character_jump(&mut self, id: u64) {
        if let Some(slot) = self.characters.get_mut(&id) {
            slot.jump_requested = true;
        }
    }

    /// Read-only locomotion state for external queries (mode, velocity...)
    pub fn character(&self, id: u64) -> Option<&CharacterState> {
        self.characters.get(&id).map(|slot| &slot.state)
    }

    /// Gets the current position of a character
    pub fn get_character_position(&self, id: u64) -> Option<Vector3<f32>> {
        let slot = self.characters.get(&id)?;
        let body = self.rigid_body_set.get(slot.body_handle)?;
        Some(*body.translation())
    }

    /// Gets current linear velocity of a character body
    pub fn get_character_velocity(&self, id: u64) -> Option<Vector3<f32>> {
        let slot = self.characters.get(&id)?;
        let body = self.rigid_body_set.get(slot.body_handle)?;
        Some(*body.linvel())
    }

    /// Teleports a character, clearing its velocity
    pub fn set_character_position(&mut self, id: u64, position: Vector3<f32>) {
        if let Some(slot) = self.characters.get_mut(&id) {
            if let Some(body) = self.rigid_body_set.get_mut(slot.body_handle) {
                body.set_translation(position, true);
                body.set_linvel(Vector3::zeros(), true);
            }
            slot.jump_requested = false;
        }
    }

    /// Removes a character
    pub fn remove_character(&mut self, id: u64) -> bool {
        if let Some(slot) = self.characters.remove(&id) {
            self.id_to_body.remove(&id);
            self.body_to_id.remove(&slot.body_handle);
            self.collider_to_id.remove(&slot.collider_handle);
            self.rigid_body_set.remove(
                slot.body_handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
            true
        } else {
            false
        }
    }

    /// Checks if a caller id has a character controller
    pub fn has_character(&self, id: u64) -> bool {
        self.characters.contains_key(&id)
    }

    /// Caller id behind a rigid body handle (reverse lookup)
    pub fn body_id(&self, handle: RigidBodyHandle) -> Option<u64> {
        self.body_to_id.get(&handle).copied()
    }

    /// Steps the simulation forward by dt seconds: pipeline first, then one
    /// locomotion step per character against the fresh contact data.
    pub fn step(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.integration_parameters.dt = dt;

        self.apply_field_gravity(dt);

        self.physics_pipeline.step(
            &vector![0.0, 0.0, 0.0],
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        // The characters map is taken out so each slot can borrow the world
        // immutably for probes while being stepped.
        let mut characters = std::mem::take(&mut self.characters);
        for slot in characters.values_mut() {
            let frame = self.collect_contacts(slot.collider_handle);
            let Some(body) = self.rigid_body_set.get(slot.body_handle) else {
                continue;
            };
            let position = *body.translation();
            let velocity = *body.linvel();
            let input = StepInput {
                movement: slot.input.movement,
                jump: std::mem::take(&mut slot.jump_requested),
                climb: slot.input.climb,
                right: slot.input.right,
                forward: slot.input.forward,
            };
            let probe = CharacterProbe {
                world: self,
                exclude: slot.body_handle,
            };
            let new_velocity = slot.state.step(
                &slot.tuning,
                &input,
                &frame,
                &self.gravity_field,
                &probe,
                position,
                velocity,
                dt,
            );
            if let Some(body) = self.rigid_body_set.get_mut(slot.body_handle) {
                body.set_linvel(new_velocity, true);
            }
        }
        self.characters = characters;
    }

    /// Integrates the gravity field into every gravity-affected dynamic
    /// body. Characters opt out via their zero gravity scale.
    fn apply_field_gravity(&mut self, dt: f32) {
        let field = &self.gravity_field;
        for (_, body) in self.rigid_body_set.iter_mut() {
            if !body.is_dynamic() || body.is_sleeping() {
                continue;
            }
            let scale = body.gravity_scale();
            if scale == 0.0 {
                continue;
            }
            let gravity = field.gravity_at(*body.translation());
            let new_linvel = *body.linvel() + gravity * (scale * dt);
            body.set_linvel(new_linvel, false);
        }
    }

    /// Gathers this step's contact normals and water overlap for one
    /// character collider, normals oriented toward the character.
    fn collect_contacts(&self, collider: ColliderHandle) -> FrameContacts {
        let mut frame = FrameContacts::default();

        for pair in self.narrow_phase.contact_pairs_with(collider) {
            if !pair.has_any_active_contact {
                continue;
            }
            let first_is_character = pair.collider1 == collider;
            let other = if first_is_character {
                pair.collider2
            } else {
                pair.collider1
            };
            let surface = self
                .surface_categories
                .get(&other)
                .copied()
                .unwrap_or(SurfaceCategory::Other);
            let body = self.collider_to_id.get(&other).map(|id| BodyId(*id));
            for manifold in &pair.manifolds {
                // Rapier's manifold normal points from the first collider
                // toward the second; flip it to face the character.
                let normal = if first_is_character {
                    -manifold.data.normal
                } else {
                    manifold.data.normal
                };
                for point in &manifold.points {
                    if point.dist <= consts::CONTACT_SLOP {
                        frame.points.push(ContactPoint {
                            normal,
                            surface,
                            body,
                        });
                    }
                }
            }
        }

        for (c1, c2, intersecting) in self.narrow_phase.intersection_pairs_with(collider) {
            if !intersecting {
                continue;
            }
            let other = if c1 == collider { c2 } else { c1 };
            if self.water_volumes.contains(&other) {
                let body = self.collider_to_id.get(&other).map(|id| BodyId(*id));
                frame.water = Some(WaterOverlap { body });
                break;
            }
        }

        frame
    }

    fn body_frame(&self, body: BodyId) -> Option<BodyFrame> {
        let handle = *self.id_to_body.get(&body.0)?;
        let rb = self.rigid_body_set.get(handle)?;
        Some(BodyFrame {
            isometry: *rb.position(),
            mass: rb.mass(),
            dynamic: rb.is_dynamic(),
        })
    }

    fn cast_probe_ray(
        &self,
        origin: Vector3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        layer: ProbeLayer,
        exclude: RigidBodyHandle,
    ) -> Option<RayHit> {
        let ray = Ray::new(point![origin.x, origin.y, origin.z], direction);
        match layer {
            ProbeLayer::Solid => {
                let filter = QueryFilter::default()
                    .exclude_rigid_body(exclude)
                    .exclude_sensors()
                    .groups(InteractionGroups::new(GROUP_CHARACTER, GROUP_STATIC));
                let (handle, hit) = self.query_pipeline.cast_ray_and_get_normal(
                    &self.rigid_body_set,
                    &self.collider_set,
                    &ray,
                    max_distance,
                    true,
                    filter,
                )?;
                Some(RayHit {
                    distance: hit.time_of_impact,
                    normal: hit.normal,
                    surface: self
                        .surface_categories
                        .get(&handle)
                        .copied()
                        .unwrap_or(SurfaceCategory::Other),
                    body: self.collider_to_id.get(&handle).map(|id| BodyId(*id)),
                })
            }
            ProbeLayer::Water => {
                let filter = QueryFilter::default()
                    .exclude_rigid_body(exclude)
                    .groups(InteractionGroups::new(GROUP_CHARACTER, GROUP_WATER));

                // A probe origin already underwater sees no surface at all;
                // the tracker reads that as fully submerged.
                let origin_point = point![origin.x, origin.y, origin.z];
                let mut inside = false;
                self.query_pipeline.intersections_with_point(
                    &self.rigid_body_set,
                    &self.collider_set,
                    &origin_point,
                    filter,
                    |handle| {
                        if self.water_volumes.contains(&handle) {
                            inside = true;
                            false
                        } else {
                            true
                        }
                    },
                );
                if inside {
                    return None;
                }

                let (handle, hit) = self.query_pipeline.cast_ray_and_get_normal(
                    &self.rigid_body_set,
                    &self.collider_set,
                    &ray,
                    max_distance,
                    true,
                    filter,
                )?;
                Some(RayHit {
                    distance: hit.time_of_impact,
                    normal: hit.normal,
                    surface: SurfaceCategory::Other,
                    body: self.collider_to_id.get(&handle).map(|id| BodyId(*id)),
                })
            }
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-character view of the world for the locomotion core's queries,
/// excluding the character's own body from every ray.
struct CharacterProbe<'a> {
    world: &'a PhysicsWorld,
    exclude: RigidBodyHandle,
}

impl WorldProbe for CharacterProbe<'_> {
    fn cast_ray(
        &self,
        origin: Vector3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        layer: ProbeLayer,
    ) -> Option<RayHit> {
        self.world
            .cast_probe_ray(origin, direction, max_distance, layer, self.exclude)
    }

    fn body_frame(&self, body: BodyId) -> Option<BodyFrame> {
        self.world.body_frame(body)
    }
}
