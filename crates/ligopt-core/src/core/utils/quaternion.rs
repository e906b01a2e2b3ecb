use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Left-composes `orientation` with the small rotation whose scaled axis is `rotation`.
///
/// The result is renormalized so repeated increments cannot drift off the unit sphere.
pub fn quaternion_increment(orientation: &mut UnitQuaternion<f64>, rotation: &Vector3<f64>) {
    let delta = UnitQuaternion::from_scaled_axis(*rotation);
    let composed = delta * *orientation;
    *orientation = UnitQuaternion::new_normalize(composed.into_inner());
}

/// Scalar-first `[w, x, y, z]` components.
#[inline]
pub fn to_components(q: &UnitQuaternion<f64>) -> [f64; 4] {
    [q.w, q.i, q.j, q.k]
}

/// Builds a unit quaternion from scalar-first components, normalizing them.
#[inline]
pub fn from_components(c: [f64; 4]) -> UnitQuaternion<f64> {
    UnitQuaternion::new_normalize(Quaternion::new(c[0], c[1], c[2], c[3]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Unit;
    use std::f64::consts::FRAC_PI_2;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn zero_rotation_leaves_orientation_unchanged() {
        let mut q = UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1);
        let before = q;
        quaternion_increment(&mut q, &Vector3::zeros());
        assert!(q.angle_to(&before) < TOLERANCE);
    }

    #[test]
    fn increment_composes_rotation_on_the_left() {
        let base = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        let mut q = base;
        quaternion_increment(&mut q, &Vector3::new(0.0, 0.0, FRAC_PI_2));
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2) * base;
        assert!(q.angle_to(&expected) < TOLERANCE);
    }

    #[test]
    fn repeated_increments_stay_unit_norm() {
        let mut q = UnitQuaternion::identity();
        let axis = Unit::new_normalize(Vector3::new(1.0, 2.0, -0.5));
        for _ in 0..1000 {
            quaternion_increment(&mut q, &(axis.into_inner() * 0.37));
        }
        assert!((q.quaternion().norm() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn components_are_scalar_first() {
        let q = UnitQuaternion::identity();
        assert_eq!(to_components(&q), [1.0, 0.0, 0.0, 0.0]);
        let back = from_components([2.0, 0.0, 0.0, 0.0]);
        assert_eq!(to_components(&back), [1.0, 0.0, 0.0, 0.0]);
    }
}
