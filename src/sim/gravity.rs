//! Position-dependent gravity field.
//!
//! The field is a plain sum of source contributions; the derived up axis is
//! the negated normalized total with a stable fallback so a dead spot in the
//! field never produces NaNs downstream.

use nalgebra::Vector3;

use super::constants::physics as consts;

/// Spherical gravity well (or anti-well) with linear falloff bands.
///
/// Full strength applies between `inner_radius` and `outer_radius`; strength
/// fades linearly to zero across `[outer_radius, outer_falloff_radius]` and
/// `[inner_falloff_radius, inner_radius]`, and is zero outside those shells.
#[derive(Debug, Clone, Copy)]
pub struct GravitySphere {
    center: Vector3<f32>,
    gravity: f32,
    inner_falloff_radius: f32,
    inner_radius: f32,
    outer_radius: f32,
    outer_falloff_radius: f32,
    inner_falloff_factor: f32,
    outer_falloff_factor: f32,
}

impl GravitySphere {
    /// Builds a sphere source, sanitizing the radii into
    /// `inner_falloff <= inner <= outer <= outer_falloff`.
    pub fn new(
        center: Vector3<f32>,
        gravity: f32,
        inner_falloff_radius: f32,
        inner_radius: f32,
        outer_radius: f32,
        outer_falloff_radius: f32,
    ) -> Self {
        let inner_falloff_radius = inner_falloff_radius.max(0.0);
        let inner_radius = inner_radius.max(inner_falloff_radius);
        let outer_radius = outer_radius.max(inner_radius);
        let outer_falloff_radius = outer_falloff_radius.max(outer_radius);

        let inner_band = inner_radius - inner_falloff_radius;
        let outer_band = outer_falloff_radius - outer_radius;
        Self {
            center,
            gravity,
            inner_falloff_radius,
            inner_radius,
            outer_radius,
            outer_falloff_radius,
            inner_falloff_factor: if inner_band > consts::EPSILON {
                1.0 / inner_band
            } else {
                0.0
            },
            outer_falloff_factor: if outer_band > consts::EPSILON {
                1.0 / outer_band
            } else {
                0.0
            },
        }
    }

    /// Simple well: full strength out to `outer_radius`, fading to zero at
    /// `outer_falloff_radius`.
    pub fn attractor(
        center: Vector3<f32>,
        gravity: f32,
        outer_radius: f32,
        outer_falloff_radius: f32,
    ) -> Self {
        Self::new(center, gravity, 0.0, 0.0, outer_radius, outer_falloff_radius)
    }

    fn gravity_at(&self, position: Vector3<f32>) -> Vector3<f32> {
        let vector = self.center - position;
        let distance = vector.norm();
        if distance > self.outer_falloff_radius
            || distance < self.inner_falloff_radius
            || distance < consts::EPSILON
        {
            return Vector3::zeros();
        }
        let mut g = self.gravity / distance;
        if distance > self.outer_radius {
            g *= 1.0 - (distance - self.outer_radius) * self.outer_falloff_factor;
        } else if distance < self.inner_radius {
            g *= 1.0 - (self.inner_radius - distance) * self.inner_falloff_factor;
        }
        g * vector
    }
}

/// One contribution to the total gravity field.
#[derive(Debug, Clone, Copy)]
pub enum GravitySource {
    /// Constant acceleration everywhere.
    Uniform { gravity: Vector3<f32> },
    /// Spherical well with falloff.
    Sphere(GravitySphere),
}

impl GravitySource {
    fn gravity_at(&self, position: Vector3<f32>) -> Vector3<f32> {
        match self {
            GravitySource::Uniform { gravity } => *gravity,
            GravitySource::Sphere(sphere) => sphere.gravity_at(position),
        }
    }
}

/// Sum of gravity sources plus the derived up axis.
#[derive(Debug, Clone)]
pub struct GravityField {
    sources: Vec<GravitySource>,
    fallback_up: Vector3<f32>,
}

impl GravityField {
    pub fn new(sources: Vec<GravitySource>) -> Self {
        Self {
            sources,
            fallback_up: Vector3::y(),
        }
    }

    /// Plain downward gravity of the given magnitude along -Y.
    pub fn uniform(magnitude: f32) -> Self {
        Self::new(vec![GravitySource::Uniform {
            gravity: Vector3::new(0.0, -magnitude, 0.0),
        }])
    }

    pub fn push(&mut self, source: GravitySource) {
        self.sources.push(source);
    }

    /// Total gravity at a world position.
    pub fn gravity_at(&self, position: Vector3<f32>) -> Vector3<f32> {
        self.sources
            .iter()
            .fold(Vector3::zeros(), |acc, s| acc + s.gravity_at(position))
    }

    /// Total gravity and the derived up axis. A near-zero field falls back
    /// to world up rather than producing a NaN axis.
    pub fn gravity_and_up(&self, position: Vector3<f32>) -> (Vector3<f32>, Vector3<f32>) {
        let gravity = self.gravity_at(position);
        let norm_sq = gravity.norm_squared();
        let up = if norm_sq > consts::EPSILON * consts::EPSILON {
            -gravity / norm_sq.sqrt()
        } else {
            self.fallback_up
        };
        (gravity, up)
    }
}

impl Default for GravityField {
    fn default() -> Self {
        Self::uniform(consts::DEFAULT_GRAVITY)
    }
}
