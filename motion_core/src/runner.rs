//! Closed-loop runner: one `perceive -> update -> command` step per cycle.
//!
//! The runner owns no clock. It counts cycles, and `pace` (if set) sleeps
//! between them for real-time playback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use motion_traits::{Drive, FieldGeometry, KinematicSnapshot, Perception, Setpoint, Velocity, VelocityController};

use crate::config::RunnerCfg;
use crate::error::{ControlError, Result};
use crate::hw_error::{map_drive_error, map_perception_error};

/// A setpoint that becomes active at `cycle` and holds until the next step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptStep {
    pub cycle: u64,
    pub setpoint: Setpoint,
}

impl ScriptStep {
    pub fn at(cycle: u64, setpoint: Setpoint) -> Self {
        Self { cycle, setpoint }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The final position setpoint was held within tolerance.
    Settled,
    /// `max_cycles` elapsed first.
    BudgetExhausted,
    /// The shutdown flag was raised.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleRecord {
    pub cycle: u64,
    pub perceived: KinematicSnapshot,
    pub setpoint: Setpoint,
    pub command: Velocity,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub cycles: u64,
    pub records: Vec<CycleRecord>,
    pub last_perceived: KinematicSnapshot,
    pub last_command: Velocity,
}

/// Settle detection against a position setpoint.
#[derive(Debug, Clone, Copy)]
struct SettleTracker {
    distance: f64,
    speed: f64,
    needed: u32,
    streak: u32,
}

impl SettleTracker {
    fn new(cfg: &RunnerCfg) -> Self {
        Self {
            distance: cfg.settle_distance,
            speed: cfg.settle_speed,
            needed: cfg.settle_cycles.max(1),
            streak: 0,
        }
    }

    /// Feed one perceived snapshot; true once the streak is long enough.
    fn observe(&mut self, perceived: &KinematicSnapshot, setpoint: &Setpoint, is_final: bool) -> bool {
        let within = match setpoint {
            Setpoint::Position(goal) if is_final => {
                (goal.x - perceived.x).hypot(goal.y - perceived.y) <= self.distance
                    && perceived.speed() <= self.speed
            }
            _ => false,
        };
        self.streak = if within { self.streak + 1 } else { 0 };
        self.streak >= self.needed
    }
}

/// Options for one closed-loop run.
pub struct ClosedLoop<'a> {
    pub field: FieldGeometry,
    pub cfg: RunnerCfg,
    pub script: &'a [ScriptStep],
    pub shutdown: Option<&'a AtomicBool>,
    pub pace: Option<Duration>,
}

impl<'a> ClosedLoop<'a> {
    pub fn new(script: &'a [ScriptStep]) -> Self {
        Self {
            field: FieldGeometry::default(),
            cfg: RunnerCfg::default(),
            script,
            shutdown: None,
            pace: None,
        }
    }

    /// Run until settled, out of budget, or shut down. The drive is stopped on
    /// every exit path.
    pub fn run<C, P, D>(&self, controller: &mut C, perception: &mut P, drive: &mut D) -> Result<RunReport>
    where
        C: VelocityController + ?Sized,
        P: Perception + ?Sized,
        D: Drive + ?Sized,
    {
        let Some(first) = self.script.first() else {
            return Err(eyre::Report::new(ControlError::Config(
                "setpoint script is empty".into(),
            )));
        };

        let mut active = 0usize;
        let mut setpoint = first.setpoint;
        let mut settle = SettleTracker::new(&self.cfg);
        let mut records = Vec::new();
        let mut last_perceived = KinematicSnapshot::default();
        let mut last_command = Velocity::ZERO;

        tracing::info!(
            max_cycles = self.cfg.max_cycles,
            steps = self.script.len(),
            "closed loop start"
        );

        let mut cycle = 0u64;
        let outcome = loop {
            if self
                .shutdown
                .is_some_and(|flag| flag.load(Ordering::Relaxed))
            {
                break RunOutcome::Shutdown;
            }
            if cycle >= self.cfg.max_cycles {
                break RunOutcome::BudgetExhausted;
            }

            while let Some(next) = self.script.get(active + 1)
                && next.cycle <= cycle
            {
                active += 1;
                setpoint = next.setpoint;
                tracing::debug!(cycle, ?setpoint, "setpoint switched");
            }
            let is_final = active + 1 == self.script.len();

            let perceived = match perception.perceive() {
                Ok(s) => s,
                Err(e) => {
                    let err = map_perception_error(&*e);
                    tracing::error!(cycle, error = %err, "perception failed");
                    let _ = drive.stop();
                    return Err(eyre::Report::new(err));
                }
            };

            let command = controller.update(&perceived, &self.field, &setpoint);
            if let Err(e) = drive.command(command) {
                let err = map_drive_error(&*e);
                tracing::warn!(cycle, error = %err, "drive rejected command");
                let _ = drive.stop();
                return Err(eyre::Report::new(err));
            }

            records.push(CycleRecord {
                cycle,
                perceived,
                setpoint,
                command,
            });
            last_perceived = perceived;
            last_command = command;
            cycle += 1;

            if settle.observe(&perceived, &setpoint, is_final) {
                break RunOutcome::Settled;
            }
            if let Some(pace) = self.pace {
                std::thread::sleep(pace);
            }
        };

        if let Err(e) = drive.stop() {
            tracing::warn!(error = %map_drive_error(&*e), "drive stop failed");
        }
        tracing::info!(?outcome, cycles = cycle, "closed loop end");

        Ok(RunReport {
            outcome,
            cycles: cycle,
            records,
            last_perceived,
            last_command,
        })
    }
}
