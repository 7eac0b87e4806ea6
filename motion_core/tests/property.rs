use motion_core::{BoundaryCfg, BoundaryLimits, ProfileCfg, Vec2, Vec3, VelocityProfile, avoid_boundary};
use motion_core::geometry::to_field_frame;
use motion_traits::FieldGeometry;
use proptest::prelude::*;
use rstest::rstest;

const DT: f64 = 1.0 / 60.0;

fn profile() -> VelocityProfile {
    VelocityProfile::new(DT, ProfileCfg::default())
}

proptest! {
    #[test]
    fn control_pos_is_non_negative_and_monotone_in_distance(
        previous in 0.0f64..6000.0,
        d_near in 0.0f64..5000.0,
        extra in 0.0f64..5000.0,
        stable in any::<bool>(),
    ) {
        let p = profile();
        let near = p.control_pos(previous, d_near, stable);
        let far = p.control_pos(previous, d_near + extra, stable);
        prop_assert!(near >= 0.0);
        prop_assert!(near <= far);
        prop_assert_eq!(p.control_pos(previous, 0.0, stable), 0.0);
    }

    #[test]
    fn control_vel_steps_are_bounded_by_acceleration(
        previous in -5000.0f64..5000.0,
        target in -5000.0f64..5000.0,
    ) {
        let p = profile();
        let next = p.control_vel(previous, target);
        let bound = ProfileCfg::default().max_acceleration.max(ProfileCfg::default().max_deceleration) * DT;
        prop_assert!((next - previous).abs() <= bound + 1e-9);
        // never overshoots the target
        prop_assert!((next - target).abs() <= (previous - target).abs() + 1e-9);
    }
}

#[test]
fn approach_converges_to_zero_monotonically() {
    // Feed the profile its own output while the distance shrinks to zero.
    let p = profile();
    let mut d = 2000.0;
    let mut speed = 0.0;
    let mut peaked = false;
    let mut last = 0.0;
    for _ in 0..2000 {
        speed = p.control_pos(speed, d, false);
        if peaked {
            assert!(speed <= last + 1e-9, "speed rose near target: {last} -> {speed}");
        } else if speed < last {
            peaked = true;
        }
        last = speed;
        d = (d - speed * DT).max(0.0);
        if d == 0.0 {
            break;
        }
    }
    assert!(d < 1.0, "d={d}");
    assert_eq!(p.control_pos(speed, 0.0, false), 0.0);
}

fn cross(a: Vec2, b: Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

#[rstest]
#[case::toward_x_max(Vec2::new(4000.0, 0.0), Vec2::new(6000.0, 3000.0))]
#[case::toward_y_min(Vec2::new(0.0, -2700.0), Vec2::new(-1500.0, -5000.0))]
#[case::toward_x_min(Vec2::new(-4300.0, 1000.0), Vec2::new(-4000.0, 500.0))]
fn single_axis_clamp_preserves_ratio(#[case] position: Vec2, #[case] v: Vec2) {
    let field = FieldGeometry::default();
    let out = avoid_boundary(
        Vec3::new(v.x, v.y, 0.0),
        0.0,
        position,
        &field,
        4000.0,
        &BoundaryCfg::default(),
    );
    assert!(out.x.abs() < v.x.abs() || out.y.abs() < v.y.abs(), "no clamp: {out:?}");
    assert!((out.x / out.y - v.x / v.y).abs() < 1e-9);
}

#[test]
fn x_max_example_clamps_to_stopping_speed() {
    let limits = BoundaryLimits::compute(
        Vec2::new(4000.0, 0.0),
        &FieldGeometry::default(),
        4000.0,
        400.0,
    );
    let vx_max = (2.0 * 4000.0 * 900.0_f64).sqrt();
    assert!((limits.vx_max - vx_max).abs() < 1e-9);
    let out = limits.clamp(Vec2::new(6000.0, 3000.0));
    assert!((out.x - vx_max).abs() < 1e-9);
    assert!((out.y - vx_max / 2.0).abs() < 1e-9);
}

#[test]
fn slow_commands_bypass_avoidance() {
    let cmd = Vec3::new(60.0, 70.0, 0.1);
    let out = avoid_boundary(
        cmd,
        0.7,
        Vec2::new(4890.0, 2990.0),
        &FieldGeometry::default(),
        4000.0,
        &BoundaryCfg::default(),
    );
    assert_eq!(out, cmd);
}

proptest! {
    #[test]
    fn avoidance_never_changes_direction(
        heading in -3.14f64..3.14,
        px in -4500.0f64..4500.0,
        py in -3000.0f64..3000.0,
        vx in -8000.0f64..8000.0,
        vy in -8000.0f64..8000.0,
        omega in -2.0f64..2.0,
    ) {
        let cmd = Vec3::new(vx, vy, omega);
        let field = FieldGeometry::default();
        let out = avoid_boundary(cmd, heading, Vec2::new(px, py), &field, 4000.0, &BoundaryCfg::default());
        let before = to_field_frame(cmd, heading).head();
        let after = to_field_frame(out, heading).head();
        let scale = before.norm() * after.norm();
        prop_assert!(cross(before, after).abs() <= 1e-9 * scale + 1e-9);
        prop_assert!(before.dot(after) >= -1e-9);
        prop_assert!(after.norm() <= before.norm() + 1e-6);
        prop_assert_eq!(out.z, omega);

        if before.norm() > 100.0 {
            let limits = BoundaryLimits::compute(Vec2::new(px, py), &field, 4000.0, 400.0);
            prop_assert!(after.x <= limits.vx_max + 1e-6 && after.x >= limits.vx_min - 1e-6);
            prop_assert!(after.y <= limits.vy_max + 1e-6 && after.y >= limits.vy_min - 1e-6);
        }
    }
}
