//! Locomotor character locomotion library
//!
//! This module exposes a physics-grounded locomotion controller: per-step
//! player/AI input plus rigid-body contact data in, a corrected velocity
//! vector out. Supports arbitrary gravity direction, slope/stair/climb
//! classification, ground snapping, water buoyancy and multi-phase jumping.

pub mod config;
pub mod sim;
