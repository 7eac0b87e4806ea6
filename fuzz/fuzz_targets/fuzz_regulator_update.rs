#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use motion_core::StateFeedbackRegulator;
use motion_traits::{FieldGeometry, KinematicSnapshot, Pose, Setpoint, Velocity, VelocityController};

#[derive(Debug, Arbitrary)]
struct Step {
    snapshot: [f64; 9],
    position_goal: bool,
    goal: [f64; 3],
}

#[derive(Debug, Arbitrary)]
struct Input {
    limit: f64,
    steps: Vec<Step>,
}

fuzz_target!(|input: Input| {
    let Ok(mut reg) = StateFeedbackRegulator::new(1.0 / 60.0) else {
        return;
    };
    reg.set_velocity_limit(input.limit);
    let field = FieldGeometry::default();
    for step in input.steps.iter().take(256) {
        let [x, y, theta, vx, vy, omega, ax, ay, alpha] = step.snapshot;
        let snap = KinematicSnapshot {
            x,
            y,
            theta,
            vx,
            vy,
            omega,
            ax,
            ay,
            alpha,
        };
        let [a, b, c] = step.goal;
        let setpoint = if step.position_goal {
            Setpoint::Position(Pose { x: a, y: b, theta: c })
        } else {
            Setpoint::Velocity(Velocity { vx: a, vy: b, omega: c })
        };
        let cmd = reg.update(&snap, &field, &setpoint);
        // Whatever the input, the committed command is finite and within the cap.
        assert!(cmd.is_finite(), "non-finite command {cmd:?}");
        assert!(cmd.planar_speed() <= reg.velocity_limit() * (1.0 + 1e-9) + 1e-9);
    }
});
