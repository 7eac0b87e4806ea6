use std::sync::atomic::AtomicBool;

use motion_core::error::ControlError;
use motion_core::{ClosedLoop, RunOutcome, RunnerCfg, ScriptStep, StateFeedbackRegulator};
use motion_sim::{SimConfig, SimulatedRobot};
use motion_traits::{
    Drive, FieldGeometry, KinematicSnapshot, Perception, Pose, Setpoint, Velocity,
    VelocityController,
};
use rstest::rstest;

const DT: f64 = 1.0 / 60.0;

fn robot_at(x: f64, y: f64) -> SimulatedRobot {
    SimulatedRobot::new(SimConfig::default(), Pose { x, y, theta: 0.0 })
}

fn goal(x: f64, y: f64) -> Setpoint {
    Setpoint::Position(Pose { x, y, theta: 0.0 })
}

fn regulator() -> StateFeedbackRegulator {
    StateFeedbackRegulator::new(DT).unwrap()
}

#[test]
fn prediction_matches_the_plant_when_driving_straight() {
    let mut sim = robot_at(0.0, 0.0);
    let mut reg = regulator();
    let field = FieldGeometry::default();
    let target = goal(1500.0, 0.0);
    for cycle in 0..200 {
        let perceived = sim.perceive().unwrap();
        let cmd = reg.update(&perceived, &field, &target);
        let truth = sim.true_state();
        let est = reg.estimated_state();
        assert!(
            (est.position.x - truth.x).abs() < 1e-6,
            "cycle {cycle}: est {} true {}",
            est.position.x,
            truth.x
        );
        assert!((est.velocity.x - truth.vx).abs() < 1e-6);
        sim.command(cmd).unwrap();
    }
}

#[rstest]
#[case(1000.0)]
#[case(2500.0)]
fn position_approach_settles_on_target(#[case] distance: f64) {
    let start_x = -distance / 2.0;
    let sim = robot_at(start_x, 300.0).into_shared();
    let mut reg = regulator();
    let script = [ScriptStep::at(0, goal(start_x + distance, 300.0))];

    let report = ClosedLoop::new(&script)
        .run(&mut reg, &mut sim.clone(), &mut sim.clone())
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Settled);
    assert!(report.cycles < RunnerCfg::default().max_cycles);
    assert_eq!(report.records.len() as u64, report.cycles);
    let end = sim.true_state();
    assert!((end.x - (start_x + distance)).abs() < 20.0, "x={}", end.x);
    assert!((end.y - 300.0).abs() < 1e-6);
    assert!(reg.hold_count() == 0);
    // no overshoot on a straight approach
    assert!(
        report
            .records
            .iter()
            .all(|r| r.perceived.x <= start_x + distance + 1e-6)
    );
}

#[test]
fn velocity_setpoint_runs_out_the_budget() {
    let sim = robot_at(-3000.0, 0.0).into_shared();
    let mut reg = regulator();
    let script = [ScriptStep::at(
        0,
        Setpoint::Velocity(Velocity {
            vx: 500.0,
            vy: 0.0,
            omega: 0.0,
        }),
    )];
    let mut run = ClosedLoop::new(&script);
    run.cfg.max_cycles = 180;

    let report = run
        .run(&mut reg, &mut sim.clone(), &mut sim.clone())
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::BudgetExhausted);
    assert_eq!(report.cycles, 180);
    assert!((report.last_command.vx - 500.0).abs() < 1e-6);
    assert!((sim.true_state().vx - 500.0).abs() < 1.0);
    // the drive is stopped on exit
    assert_eq!(sim.last_command(), Velocity::ZERO);
}

#[test]
fn script_switches_setpoints_at_their_cycle() {
    let sim = robot_at(-2000.0, 0.0).into_shared();
    let mut reg = regulator();
    let cruise = Setpoint::Velocity(Velocity {
        vx: 600.0,
        vy: 0.0,
        omega: 0.0,
    });
    let script = [ScriptStep::at(0, cruise), ScriptStep::at(90, goal(0.0, 0.0))];

    let report = ClosedLoop::new(&script)
        .run(&mut reg, &mut sim.clone(), &mut sim.clone())
        .unwrap();

    assert_eq!(report.records[89].setpoint, cruise);
    assert_eq!(report.records[90].setpoint, goal(0.0, 0.0));
    assert_eq!(report.outcome, RunOutcome::Settled);
}

#[test]
fn raised_shutdown_flag_stops_before_the_first_cycle() {
    let sim = robot_at(0.0, 0.0).into_shared();
    let mut reg = regulator();
    let flag = AtomicBool::new(true);
    let script = [ScriptStep::at(0, goal(1000.0, 0.0))];
    let mut run = ClosedLoop::new(&script);
    run.shutdown = Some(&flag);

    let report = run
        .run(&mut reg, &mut sim.clone(), &mut sim.clone())
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::Shutdown);
    assert_eq!(report.cycles, 0);
    assert_eq!(sim.steps(), 0);
}

#[test]
fn empty_script_is_a_config_error() {
    let sim = robot_at(0.0, 0.0).into_shared();
    let err = ClosedLoop::new(&[])
        .run(&mut regulator(), &mut sim.clone(), &mut sim.clone())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ControlError>(),
        Some(ControlError::Config(_))
    ));
}

#[derive(Default)]
struct FlakyDrive {
    accepted: u32,
    fail_after: u32,
    stopped: bool,
}

impl Drive for FlakyDrive {
    fn command(&mut self, _cmd: Velocity) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.accepted >= self.fail_after {
            return Err("radio link lost".into());
        }
        self.accepted += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.stopped = true;
        Ok(())
    }
}

struct Blind;

impl Perception for Blind {
    fn perceive(&mut self) -> Result<KinematicSnapshot, Box<dyn std::error::Error + Send + Sync>> {
        Err("camera frame dropped".into())
    }
}

#[test]
fn drive_failure_stops_and_reports_typed_error() {
    let mut perception = robot_at(0.0, 0.0);
    let mut drive = FlakyDrive {
        fail_after: 5,
        ..FlakyDrive::default()
    };
    let script = [ScriptStep::at(0, goal(1000.0, 0.0))];
    let err = ClosedLoop::new(&script)
        .run(&mut regulator(), &mut perception, &mut drive)
        .unwrap_err();
    match err.downcast_ref::<ControlError>() {
        Some(ControlError::Drive(msg)) => assert!(msg.contains("radio link lost")),
        other => panic!("expected Drive error, got {other:?}"),
    }
    assert!(drive.stopped);
    assert_eq!(drive.accepted, 5);
}

#[test]
fn perception_failure_is_typed() {
    let mut drive = FlakyDrive {
        fail_after: u32::MAX,
        ..FlakyDrive::default()
    };
    let script = [ScriptStep::at(0, goal(1000.0, 0.0))];
    let err = ClosedLoop::new(&script)
        .run(&mut regulator(), &mut Blind, &mut drive)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ControlError>(),
        Some(ControlError::Perception(_))
    ));
    assert!(drive.stopped);
}

#[test]
fn runner_accepts_trait_objects() {
    let sim = robot_at(0.0, 0.0).into_shared();
    let mut controller: Box<dyn VelocityController> = Box::new(regulator());
    controller.set_velocity_limit(800.0);
    let mut perception: Box<dyn Perception> = Box::new(sim.clone());
    let mut drive: Box<dyn Drive> = Box::new(sim.clone());
    let script = [ScriptStep::at(0, goal(1000.0, 0.0))];
    let report = ClosedLoop::new(&script)
        .run(controller.as_mut(), perception.as_mut(), drive.as_mut())
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::Settled);
    assert!(
        report
            .records
            .iter()
            .all(|r| r.command.planar_speed() <= 800.0 + 1e-9)
    );
}
