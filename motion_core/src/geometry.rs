//! Angle wrapping, frame conversion and planar intersection helpers.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::math::Vec3;

/// Normalize an angle into `(-pi, pi]`.
#[inline]
pub fn wrap_to_pi(r: f64) -> f64 {
    let wrapped = r % TAU;
    if wrapped > PI {
        wrapped - TAU
    } else if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Express a field-frame vector in the frame of a robot with heading `theta`.
#[inline]
pub fn to_robot_frame(v: Vec3, theta: f64) -> Vec3 {
    v.rotate_z(-theta)
}

/// Express a robot-frame vector in the field frame given heading `theta`.
#[inline]
pub fn to_field_frame(v: Vec3, theta: f64) -> Vec3 {
    v.rotate_z(theta)
}

/// Distance from the origin to where a ray at `angle` crosses the line through
/// `(x1, 0)` and `(0, y2)`.
///
/// Returns `y2` when the ray is exactly vertical and 0 for a degenerate line
/// (either intercept is zero).
pub fn find_cross_point(x1: f64, y2: f64, angle: f64) -> f64 {
    if angle.abs() == FRAC_PI_2 {
        return y2;
    }
    if x1 == 0.0 || y2 == 0.0 {
        return 0.0;
    }
    let x = x1 * y2 / (x1 * angle.tan() + y2);
    let y = -x * y2 / x1 + y2;
    x.hypot(y)
}
