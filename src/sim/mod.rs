//! Locomotion simulation core and its physics-world adapter.
//!
//! The modules under `sim` split the controller into its per-step stages:
//! gravity sampling, contact classification, connection (moving platform)
//! tracking, submergence, and the velocity/jump resolution in `controller`.
//! `physics` adapts all of it onto a rapier3d world; everything else is
//! engine-agnostic and uses nalgebra only, talking to the world through the
//! `types::WorldProbe` seam.

pub mod buoyancy;
pub mod connection;
pub mod constants;
pub mod contacts;
pub mod controller;
pub mod gravity;
pub mod math;
pub mod physics;
pub mod types;
