//! Contact classification: buckets one frame's collision normals into
//! ground / steep / climb categories using dot-product angle tests.

use nalgebra::Vector3;

use super::constants::physics as consts;
use super::types::{BodyId, SurfaceCategory};
use crate::config::Tuning;

/// One collision contact delivered by the physics layer.
#[derive(Debug, Clone, Copy)]
pub struct ContactPoint {
    /// Outward-facing surface normal, pointing toward the character.
    pub normal: Vector3<f32>,
    pub surface: SurfaceCategory,
    /// Body behind the surface, used as a connection candidate.
    pub body: Option<BodyId>,
}

/// Water volume overlapping the character this step.
#[derive(Debug, Clone, Copy)]
pub struct WaterOverlap {
    pub body: Option<BodyId>,
}

/// Everything the physics layer hands the controller for one fixed step.
#[derive(Debug, Default, Clone)]
pub struct FrameContacts {
    pub points: Vec<ContactPoint>,
    pub water: Option<WaterOverlap>,
}

/// Minimum up-dot for a contact of this surface category to count as
/// ground. Stairs get the looser threshold.
pub fn min_support_dot(surface: SurfaceCategory, tuning: &Tuning) -> f32 {
    match surface {
        SurfaceCategory::Stairs => tuning.min_stairs_dot,
        _ => tuning.min_ground_dot,
    }
}

/// Per-step accumulators for classified contact normals.
///
/// Normals are summed raw as contacts arrive; counts record how many went
/// into each bucket so the sums can be re-normalized during resolution.
/// `last_climb_normal` persists across steps: it is the escape hatch for
/// cracks where two opposing climb normals cancel to near-zero.
#[derive(Debug, Clone)]
pub struct ContactBuckets {
    pub contact_normal: Vector3<f32>,
    pub steep_normal: Vector3<f32>,
    pub climb_normal: Vector3<f32>,
    pub last_climb_normal: Vector3<f32>,
    pub ground_contact_count: u32,
    pub steep_contact_count: u32,
    pub climb_contact_count: u32,
    /// Body supporting the character this step, if any.
    pub candidate: Option<BodyId>,
}

impl Default for ContactBuckets {
    fn default() -> Self {
        Self {
            contact_normal: Vector3::zeros(),
            steep_normal: Vector3::zeros(),
            climb_normal: Vector3::zeros(),
            last_climb_normal: Vector3::y(),
            ground_contact_count: 0,
            steep_contact_count: 0,
            climb_contact_count: 0,
            candidate: None,
        }
    }
}

impl ContactBuckets {
    /// Zeroes the per-step accumulators. `last_climb_normal` survives.
    pub fn clear(&mut self) {
        self.contact_normal = Vector3::zeros();
        self.steep_normal = Vector3::zeros();
        self.climb_normal = Vector3::zeros();
        self.ground_contact_count = 0;
        self.steep_contact_count = 0;
        self.climb_contact_count = 0;
        self.candidate = None;
    }

    /// Buckets a single contact by the angle between its normal and the up
    /// axis. A steep contact only becomes the connection candidate when no
    /// ground contact claimed it first.
    pub fn classify(
        &mut self,
        contact: &ContactPoint,
        up_axis: Vector3<f32>,
        climb_desired: bool,
        tuning: &Tuning,
    ) {
        let up_dot = up_axis.dot(&contact.normal);
        let min_dot = min_support_dot(contact.surface, tuning);
        if up_dot >= min_dot {
            self.ground_contact_count += 1;
            self.contact_normal += contact.normal;
            self.candidate = contact.body.or(self.candidate);
        } else {
            if up_dot > consts::STEEP_UP_DOT_LIMIT {
                self.steep_contact_count += 1;
                self.steep_normal += contact.normal;
                if self.ground_contact_count == 0 {
                    self.candidate = contact.body.or(self.candidate);
                }
            }
            if climb_desired
                && up_dot >= tuning.min_climb_dot
                && contact.surface == SurfaceCategory::Climbable
            {
                self.climb_contact_count += 1;
                self.climb_normal += contact.normal;
                self.last_climb_normal = contact.normal;
                self.candidate = contact.body.or(self.candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> Tuning {
        Tuning::default()
    }

    #[test]
    fn test_flat_ground_contact_is_ground() {
        // Scenario: maxGroundAngle 25°, contact normal straight up.
        let mut buckets = ContactBuckets::default();
        let contact = ContactPoint {
            normal: Vector3::y(),
            surface: SurfaceCategory::Ground,
            body: Some(BodyId(1)),
        };
        buckets.classify(&contact, Vector3::y(), false, &tuning());
        assert_eq!(buckets.ground_contact_count, 1);
        assert_eq!(buckets.steep_contact_count, 0);
        assert_eq!(buckets.candidate, Some(BodyId(1)));
        assert!((buckets.contact_normal - Vector3::y()).norm() < 1e-6);
    }

    #[test]
    fn test_vertical_wall_is_steep() {
        // A wall normal perpendicular to up: up-dot 0 > -0.01.
        let mut buckets = ContactBuckets::default();
        let contact = ContactPoint {
            normal: Vector3::x(),
            surface: SurfaceCategory::Ground,
            body: None,
        };
        buckets.classify(&contact, Vector3::y(), false, &tuning());
        assert_eq!(buckets.ground_contact_count, 0);
        assert_eq!(buckets.steep_contact_count, 1);
        assert!((buckets.steep_normal - Vector3::x()).norm() < 1e-6);
    }

    #[test]
    fn test_overhang_is_neither_ground_nor_steep() {
        let mut buckets = ContactBuckets::default();
        let contact = ContactPoint {
            normal: -Vector3::y(),
            surface: SurfaceCategory::Ground,
            body: None,
        };
        buckets.classify(&contact, Vector3::y(), false, &tuning());
        assert_eq!(buckets.ground_contact_count, 0);
        assert_eq!(buckets.steep_contact_count, 0);
    }

    #[test]
    fn test_stairs_threshold_is_looser() {
        // A 40° slope: too steep for ground (25°) but fine for stairs (50°).
        let angle = 40.0_f32.to_radians();
        let normal = Vector3::new(angle.sin(), angle.cos(), 0.0);
        let t = tuning();

        let mut buckets = ContactBuckets::default();
        let as_ground = ContactPoint {
            normal,
            surface: SurfaceCategory::Ground,
            body: None,
        };
        buckets.classify(&as_ground, Vector3::y(), false, &t);
        assert_eq!(buckets.ground_contact_count, 0);
        assert_eq!(buckets.steep_contact_count, 1);

        let mut buckets = ContactBuckets::default();
        let as_stairs = ContactPoint {
            normal,
            surface: SurfaceCategory::Stairs,
            body: None,
        };
        buckets.classify(&as_stairs, Vector3::y(), false, &t);
        assert_eq!(buckets.ground_contact_count, 1);
    }

    #[test]
    fn test_climbable_wall_accumulates_climb_normal() {
        let mut buckets = ContactBuckets::default();
        let contact = ContactPoint {
            normal: Vector3::x(),
            surface: SurfaceCategory::Climbable,
            body: Some(BodyId(9)),
        };
        buckets.classify(&contact, Vector3::y(), true, &tuning());
        assert_eq!(buckets.climb_contact_count, 1);
        assert_eq!(buckets.steep_contact_count, 1);
        assert!((buckets.last_climb_normal - Vector3::x()).norm() < 1e-6);
        assert_eq!(buckets.candidate, Some(BodyId(9)));
    }

    #[test]
    fn test_climb_requires_desire_and_category() {
        let t = tuning();
        let wall = ContactPoint {
            normal: Vector3::x(),
            surface: SurfaceCategory::Climbable,
            body: None,
        };
        let mut buckets = ContactBuckets::default();
        buckets.classify(&wall, Vector3::y(), false, &t);
        assert_eq!(buckets.climb_contact_count, 0);

        let plain_wall = ContactPoint {
            normal: Vector3::x(),
            surface: SurfaceCategory::Ground,
            body: None,
        };
        let mut buckets = ContactBuckets::default();
        buckets.classify(&plain_wall, Vector3::y(), true, &t);
        assert_eq!(buckets.climb_contact_count, 0);
    }

    #[test]
    fn test_ground_contact_keeps_connection_over_steep() {
        let mut buckets = ContactBuckets::default();
        let ground = ContactPoint {
            normal: Vector3::y(),
            surface: SurfaceCategory::Ground,
            body: Some(BodyId(1)),
        };
        let wall = ContactPoint {
            normal: Vector3::x(),
            surface: SurfaceCategory::Ground,
            body: Some(BodyId(2)),
        };
        buckets.classify(&ground, Vector3::y(), false, &tuning());
        buckets.classify(&wall, Vector3::y(), false, &tuning());
        assert_eq!(buckets.candidate, Some(BodyId(1)));
    }

    #[test]
    fn test_clear_preserves_last_climb_normal() {
        let mut buckets = ContactBuckets::default();
        let contact = ContactPoint {
            normal: Vector3::x(),
            surface: SurfaceCategory::Climbable,
            body: None,
        };
        buckets.classify(&contact, Vector3::y(), true, &tuning());
        buckets.clear();
        assert_eq!(buckets.climb_contact_count, 0);
        assert!((buckets.last_climb_normal - Vector3::x()).norm() < 1e-6);
    }
}
