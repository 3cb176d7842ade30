//! Submergence measurement against water volumes.
//!
//! The vertical submersion fraction drives water drag, buoyancy and the
//! switch into swimming. It is recomputed only on steps where the physics
//! layer reports a water overlap; otherwise it decays to zero by absence.

use nalgebra::Vector3;

use super::types::{ProbeLayer, WorldProbe};
use crate::config::Tuning;

#[derive(Debug, Default, Clone, Copy)]
pub struct SubmergenceTracker {
    submergence: f32,
    swimming: bool,
}

impl SubmergenceTracker {
    /// Fraction in [0, 1]: 0 = dry, 1 = fully submerged.
    pub fn submergence(&self) -> f32 {
        self.submergence
    }

    pub fn in_water(&self) -> bool {
        self.submergence > 0.0
    }

    /// Deep enough that swim movement takes over from walking.
    pub fn swimming(&self) -> bool {
        self.swimming
    }

    /// Measures submergence by probing for the water surface from a point
    /// above the body. No surface within range means the probe origin is
    /// itself underwater, so the body counts as fully submerged.
    pub fn evaluate(
        &mut self,
        position: Vector3<f32>,
        up_axis: Vector3<f32>,
        tuning: &Tuning,
        world: &impl WorldProbe,
    ) {
        let origin = position + up_axis * tuning.submergence_offset;
        self.submergence = match world.cast_ray(
            origin,
            -up_axis,
            tuning.submergence_range + 1.0,
            ProbeLayer::Water,
        ) {
            Some(hit) => (1.0 - hit.distance / tuning.submergence_range).clamp(0.0, 1.0),
            None => 1.0,
        };
        self.swimming = self.submergence >= tuning.swim_threshold;
    }

    /// Start-of-step reset; stays zero unless a water overlap re-evaluates.
    pub fn clear(&mut self) {
        self.submergence = 0.0;
        self.swimming = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::{BodyFrame, BodyId, RayHit, SurfaceCategory};

    /// Probe returning a fixed distance to the water surface.
    struct WaterSurface {
        distance: Option<f32>,
    }

    impl WorldProbe for WaterSurface {
        fn cast_ray(
            &self,
            _origin: Vector3<f32>,
            _direction: Vector3<f32>,
            _max_distance: f32,
            layer: ProbeLayer,
        ) -> Option<RayHit> {
            assert_eq!(layer, ProbeLayer::Water);
            self.distance.map(|distance| RayHit {
                distance,
                normal: Vector3::y(),
                surface: SurfaceCategory::Other,
                body: Some(BodyId(42)),
            })
        }

        fn body_frame(&self, _body: BodyId) -> Option<BodyFrame> {
            None
        }
    }

    fn evaluate(distance: Option<f32>) -> SubmergenceTracker {
        let mut tracker = SubmergenceTracker::default();
        tracker.evaluate(
            Vector3::zeros(),
            Vector3::y(),
            &Tuning::default(),
            &WaterSurface { distance },
        );
        tracker
    }

    #[test]
    fn test_half_submerged() {
        // Default range 1.0: surface half a unit below the probe origin.
        let tracker = evaluate(Some(0.5));
        assert!((tracker.submergence() - 0.5).abs() < 1e-6);
        assert!(tracker.in_water());
        // Exactly at the default swim threshold.
        assert!(tracker.swimming());
    }

    #[test]
    fn test_missed_probe_means_fully_submerged() {
        let tracker = evaluate(None);
        assert_eq!(tracker.submergence(), 1.0);
        assert!(tracker.swimming());
    }

    #[test]
    fn test_submergence_clamped_to_unit_range() {
        // Surface far below: barely wet, never negative.
        let tracker = evaluate(Some(5.0));
        assert_eq!(tracker.submergence(), 0.0);
        assert!(!tracker.in_water());

        // Degenerate negative distance cannot push above 1.
        let tracker = evaluate(Some(-3.0));
        assert_eq!(tracker.submergence(), 1.0);
    }

    #[test]
    fn test_shallow_water_is_wet_but_not_swimming() {
        let tracker = evaluate(Some(0.8));
        assert!((tracker.submergence() - 0.2).abs() < 1e-5);
        assert!(tracker.in_water());
        assert!(!tracker.swimming());
    }

    #[test]
    fn test_clear_resets() {
        let mut tracker = evaluate(None);
        tracker.clear();
        assert_eq!(tracker.submergence(), 0.0);
        assert!(!tracker.swimming());
    }
}
