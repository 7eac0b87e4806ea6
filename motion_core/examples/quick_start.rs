//! Quick Start Example
//!
//! Drive a simulated robot two metres along +x with the reference tuning,
//! stepping the loop by hand instead of through `ClosedLoop`.
//!
//! Run with `cargo run -p motion_core --example quick_start`.

use motion_core::StateFeedbackRegulator;
use motion_sim::{SimConfig, SimulatedRobot};
use motion_traits::{FieldGeometry, Pose, Setpoint, VelocityController};

fn main() -> Result<(), eyre::Report> {
    let mut reg = StateFeedbackRegulator::builder()
        .with_rate_hz(60.0)
        .with_velocity_limit(2500.0)
        .build()?;
    let mut robot = SimulatedRobot::new(
        SimConfig::default(),
        Pose {
            x: -1000.0,
            y: 0.0,
            theta: 0.0,
        },
    );
    let field = FieldGeometry::default();
    let goal = Setpoint::Position(Pose {
        x: 1000.0,
        y: 0.0,
        theta: 0.0,
    });

    for cycle in 0..600 {
        let seen = robot.perceived_state();
        let cmd = reg.update(&seen, &field, &goal);
        robot.step(cmd)?;

        // ~4 Hz printout
        if cycle % 15 == 0 {
            let s = robot.true_state();
            println!(
                "cycle {cycle:>3}: x = {:7.1} mm, vx = {:7.1} mm/s, cmd = {:7.1} mm/s",
                s.x, s.vx, cmd.vx
            );
        }
        let s = robot.true_state();
        if (s.x - 1000.0).abs() < 5.0 && s.speed() < 10.0 {
            println!("arrived after {cycle} cycles");
            break;
        }
    }
    Ok(())
}
