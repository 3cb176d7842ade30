//! Small vector helpers shared across the locomotion core.

use nalgebra::Vector3;

use super::constants::physics as consts;

/// Projects `direction` onto the plane with the given `normal` and
/// normalizes the result. Returns zero when the projection degenerates
/// (direction parallel to the normal), which makes the axis inert.
pub fn project_direction_on_plane(
    direction: Vector3<f32>,
    normal: Vector3<f32>,
) -> Vector3<f32> {
    let projected = direction - normal * direction.dot(&normal);
    normalize_or_zero(projected)
}

/// Normalizes `v`, or returns zero for a near-zero input.
pub fn normalize_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    let norm_sq = v.norm_squared();
    if norm_sq > consts::EPSILON * consts::EPSILON {
        v / norm_sq.sqrt()
    } else {
        Vector3::zeros()
    }
}

/// Clamps `v` to at most `max_magnitude` without changing its direction.
pub fn clamp_magnitude(v: Vector3<f32>, max_magnitude: f32) -> Vector3<f32> {
    let norm_sq = v.norm_squared();
    if norm_sq > max_magnitude * max_magnitude {
        v * (max_magnitude / norm_sq.sqrt())
    } else {
        v
    }
}

/// Linear interpolation between `a` and `b` by `t` (not clamped).
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_removes_normal_component() {
        let n = Vector3::y();
        let v = Vector3::new(1.0, 3.0, 0.0);
        let p = project_direction_on_plane(v, n);
        assert!(p.dot(&n).abs() < 1e-6);
        assert!((p.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_projection_of_parallel_direction_is_zero() {
        let p = project_direction_on_plane(Vector3::y() * 2.0, Vector3::y());
        assert_eq!(p, Vector3::zeros());
    }

    #[test]
    fn test_clamp_magnitude() {
        let v = Vector3::new(3.0, 0.0, 4.0);
        let clamped = clamp_magnitude(v, 1.0);
        assert!((clamped.norm() - 1.0).abs() < 1e-6);
        // Short vectors pass through untouched.
        assert_eq!(clamp_magnitude(v, 10.0), v);
    }
}
