//! Regulator assembly from config and closed-loop runs against the simulator.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use eyre::WrapErr;
use motion_core::conversions::field_geometry;
use motion_core::error::{AbortReason, ControlError, Result as CoreResult};
use motion_core::{
    ClosedLoop, RegulatorBuilder, RunOutcome, RunReport, RunnerCfg, ScriptStep,
    StateFeedbackRegulator,
};
use motion_sim::{SimConfig, SimHandle, SimulatedRobot};
use motion_traits::{Pose, Setpoint, Velocity, VelocityController};

use crate::cli::GoalArgs;

pub fn abort_reason_name(r: &AbortReason) -> &'static str {
    match r {
        AbortReason::Shutdown => "Shutdown",
        AbortReason::CycleBudget => "CycleBudget",
    }
}

pub fn outcome_name(o: RunOutcome) -> &'static str {
    match o {
        RunOutcome::Settled => "Settled",
        RunOutcome::BudgetExhausted => "BudgetExhausted",
        RunOutcome::Shutdown => "Shutdown",
    }
}

/// Regulator from file config, with an optional CLI speed-limit override.
pub fn build_regulator(
    cfg: &motion_config::Config,
    speed_limit: Option<f64>,
) -> CoreResult<StateFeedbackRegulator> {
    let mut reg = RegulatorBuilder::from_config(cfg).build()?;
    if let Some(limit) = speed_limit {
        reg.set_velocity_limit(limit);
        tracing::info!(
            requested = limit,
            active = reg.velocity_limit(),
            "speed limit override"
        );
    }
    Ok(reg)
}

pub fn build_sim(cfg: &motion_config::Config) -> SimHandle {
    let sim_cfg = SimConfig {
        dt_s: 1.0 / cfg.cycle.rate_hz,
        zeta: cfg.predictor.zeta,
        omega: cfg.predictor.omega,
        delay_cycles: cfg.sim.delay_cycles,
    };
    let start = Pose {
        x: cfg.sim.start_x,
        y: cfg.sim.start_y,
        theta: cfg.sim.start_theta,
    };
    SimulatedRobot::new(sim_cfg, start).into_shared()
}

/// Turn the goal flags into a setpoint script.
pub fn script_from_goal(goal: &GoalArgs) -> eyre::Result<Vec<ScriptStep>> {
    if let Some(path) = &goal.script {
        let rows = motion_config::load_setpoints_csv(path)?;
        return Ok(rows.iter().map(ScriptStep::from).collect());
    }
    let setpoint = if goal.vx.is_some() || goal.vy.is_some() || goal.omega.is_some() {
        Setpoint::Velocity(Velocity {
            vx: goal.vx.unwrap_or(0.0),
            vy: goal.vy.unwrap_or(0.0),
            omega: goal.omega.unwrap_or(0.0),
        })
    } else {
        Setpoint::Position(Pose {
            x: goal.x.unwrap_or(0.0),
            y: goal.y.unwrap_or(0.0),
            theta: goal.theta.unwrap_or(0.0),
        })
    };
    Ok(vec![ScriptStep::at(0, setpoint)])
}

fn ends_on_position(script: &[ScriptStep]) -> bool {
    matches!(
        script.last().map(|s| s.setpoint),
        Some(Setpoint::Position(_))
    )
}

pub struct RunArgs {
    pub cycles: Option<u64>,
    pub paced: bool,
    pub speed_limit: Option<f64>,
}

pub fn run_command(
    cfg: &motion_config::Config,
    goal: &GoalArgs,
    args: &RunArgs,
    json: bool,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let script = script_from_goal(goal)?;
    let mut reg = build_regulator(cfg, args.speed_limit)?;
    let sim = build_sim(cfg);

    let mut runner_cfg: RunnerCfg = (&cfg.runner).into();
    if let Some(n) = args.cycles {
        if n == 0 {
            eyre::bail!("--cycles must be >= 1");
        }
        runner_cfg.max_cycles = n;
    }

    let mut run = ClosedLoop::new(&script);
    run.field = field_geometry(&cfg.field);
    run.cfg = runner_cfg;
    run.shutdown = Some(shutdown.as_ref());
    if args.paced {
        run.pace = Some(Duration::from_secs_f64(reg.cycle()));
    }

    let started = Instant::now();
    let report = run
        .run(&mut reg, &mut sim.clone(), &mut sim.clone())
        .wrap_err("closed-loop run failed")?;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let abort = match report.outcome {
        RunOutcome::Settled => None,
        // Velocity tracking has no settle point; using up the budget is its normal end.
        RunOutcome::BudgetExhausted if !ends_on_position(&script) => None,
        RunOutcome::BudgetExhausted => Some(AbortReason::CycleBudget),
        RunOutcome::Shutdown => Some(AbortReason::Shutdown),
    };

    if json {
        emit_jsonl(&report, &sim, &reg, duration_ms, abort.as_ref());
    } else {
        print_summary(&report, &sim, &reg);
    }

    match abort {
        Some(reason) => Err(eyre::Report::new(ControlError::Abort(reason))),
        None => Ok(()),
    }
}

/// Short simulated approach: one metre along the robot's heading from the sim start.
pub fn self_check(cfg: &motion_config::Config, json: bool) -> eyre::Result<()> {
    let mut reg = build_regulator(cfg, None).wrap_err("regulator construction")?;
    let sim = build_sim(cfg);
    let start = sim.true_state();
    let goal = Setpoint::Position(Pose {
        x: start.x + 1000.0 * start.theta.cos(),
        y: start.y + 1000.0 * start.theta.sin(),
        theta: start.theta,
    });
    let script = [ScriptStep::at(0, goal)];
    let mut run = ClosedLoop::new(&script);
    run.field = field_geometry(&cfg.field);
    run.cfg = (&cfg.runner).into();

    let report = run.run(&mut reg, &mut sim.clone(), &mut sim.clone())?;
    if report.outcome != RunOutcome::Settled {
        return Err(eyre::Report::new(ControlError::Abort(AbortReason::CycleBudget)))
            .wrap_err("self-check approach did not settle");
    }
    if json {
        println!(
            "{}",
            serde_json::json!({
                "self_check": "ok",
                "cycles": report.cycles,
                "holds": reg.hold_count(),
            })
        );
    } else {
        println!("self-check ok (settled in {} cycles)", report.cycles);
    }
    Ok(())
}

fn print_summary(report: &RunReport, sim: &SimHandle, reg: &StateFeedbackRegulator) {
    let end = sim.true_state();
    let verb = match report.outcome {
        RunOutcome::Settled => "settled",
        RunOutcome::BudgetExhausted => "stopped at cycle budget",
        RunOutcome::Shutdown => "interrupted",
    };
    println!(
        "run {verb} after {} cycles: x={:.1} y={:.1} theta={:.3} (last command vx={:.1} vy={:.1} omega={:.3})",
        report.cycles,
        end.x,
        end.y,
        end.theta,
        report.last_command.vx,
        report.last_command.vy,
        report.last_command.omega,
    );
    if reg.hold_count() > 0 {
        println!("non-finite holds: {}", reg.hold_count());
    }
}

fn emit_jsonl(
    report: &RunReport,
    sim: &SimHandle,
    reg: &StateFeedbackRegulator,
    duration_ms: u64,
    abort: Option<&AbortReason>,
) {
    use serde_json::json;

    for r in &report.records {
        let (kind, a, b, c) = match r.setpoint {
            Setpoint::Position(p) => ("position", p.x, p.y, p.theta),
            Setpoint::Velocity(v) => ("velocity", v.vx, v.vy, v.omega),
        };
        println!(
            "{}",
            json!({
                "cycle": r.cycle,
                "setpoint": { "kind": kind, "a": a, "b": b, "c": c },
                "perceived": {
                    "x": r.perceived.x,
                    "y": r.perceived.y,
                    "theta": r.perceived.theta,
                    "vx": r.perceived.vx,
                    "vy": r.perceived.vy,
                    "omega": r.perceived.omega,
                },
                "command": { "vx": r.command.vx, "vy": r.command.vy, "omega": r.command.omega },
            })
        );
    }

    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let end = sim.true_state();
    println!(
        "{}",
        json!({
            "timestamp": ts,
            "outcome": outcome_name(report.outcome),
            "cycles": report.cycles,
            "duration_ms": duration_ms,
            "final": { "x": end.x, "y": end.y, "theta": end.theta },
            "velocity_limit": reg.velocity_limit(),
            "holds": reg.hold_count(),
            "abort_reason": abort.map(abort_reason_name),
        })
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_flags_take_priority_over_position_defaults() {
        let goal = GoalArgs {
            vy: Some(250.0),
            ..GoalArgs::default()
        };
        let script = script_from_goal(&goal).unwrap();
        assert_eq!(
            script[0].setpoint,
            Setpoint::Velocity(Velocity {
                vx: 0.0,
                vy: 250.0,
                omega: 0.0
            })
        );
        assert!(!ends_on_position(&script));
    }

    #[test]
    fn position_flags_default_missing_axes_to_zero() {
        let goal = GoalArgs {
            x: Some(800.0),
            ..GoalArgs::default()
        };
        let script = script_from_goal(&goal).unwrap();
        assert_eq!(
            script[0].setpoint,
            Setpoint::Position(Pose {
                x: 800.0,
                y: 0.0,
                theta: 0.0
            })
        );
        assert!(ends_on_position(&script));
    }

    #[test]
    fn speed_limit_override_is_clamped_to_ceiling() {
        let cfg = motion_config::Config::default();
        let reg = build_regulator(&cfg, Some(50_000.0)).unwrap();
        assert_eq!(reg.velocity_limit(), cfg.regulator.velocity_ceiling);
    }
}
