//! Simulated omnidirectional robot with a fixed perception delay.
//!
//! The plant integrates, per axis, the same driven second-order response the
//! controller's predictor assumes:
//!
//! ```text
//! a' = omega^2 * (u - v) - 2 * zeta * omega * a
//! ```
//!
//! with explicit Euler, where `u` is the committed robot-frame command rotated
//! into the field frame by the true heading. `perceive()` hands back the state
//! as it was `delay_cycles` commands ago.
pub mod error;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use motion_traits::{Drive, KinematicSnapshot, Perception, Pose, Velocity};

pub use crate::error::SimError;

/// Plant parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// Integration step in seconds; one step per committed command.
    pub dt_s: f64,
    pub zeta: f64,
    pub omega: f64,
    /// Commands between when a state is true and when it is perceived.
    pub delay_cycles: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt_s: 1.0 / 60.0,
            zeta: 1.0,
            omega: 49.17,
            delay_cycles: 7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    cfg: SimConfig,
    // field frame: [x, y, theta]
    position: [f64; 3],
    velocity: [f64; 3],
    acceleration: [f64; 3],
    history: VecDeque<KinematicSnapshot>,
    last_command: Velocity,
    steps: u64,
}

impl SimulatedRobot {
    pub fn new(cfg: SimConfig, start: Pose) -> Self {
        let rest = KinematicSnapshot::at_rest(start);
        let mut history = VecDeque::with_capacity(cfg.delay_cycles + 1);
        history.extend(std::iter::repeat_n(rest, cfg.delay_cycles + 1));
        Self {
            cfg,
            position: [start.x, start.y, start.theta],
            velocity: [0.0; 3],
            acceleration: [0.0; 3],
            history,
            last_command: Velocity::ZERO,
            steps: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.cfg
    }

    /// Undelayed state of the plant.
    pub fn true_state(&self) -> KinematicSnapshot {
        KinematicSnapshot {
            x: self.position[0],
            y: self.position[1],
            theta: self.position[2],
            vx: self.velocity[0],
            vy: self.velocity[1],
            omega: self.velocity[2],
            ax: self.acceleration[0],
            ay: self.acceleration[1],
            alpha: self.acceleration[2],
        }
    }

    /// Delayed state, as `perceive()` would return it.
    pub fn perceived_state(&self) -> KinematicSnapshot {
        // history always holds delay_cycles + 1 entries
        self.history
            .front()
            .copied()
            .unwrap_or_else(|| self.true_state())
    }

    pub fn last_command(&self) -> Velocity {
        self.last_command
    }

    /// Number of commands integrated so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advance the plant by one step under robot-frame command `cmd`.
    pub fn step(&mut self, cmd: Velocity) -> error::Result<()> {
        if !cmd.is_finite() {
            return Err(SimError::NonFiniteCommand {
                vx: cmd.vx,
                vy: cmd.vy,
                omega: cmd.omega,
            });
        }
        let (sin, cos) = self.position[2].sin_cos();
        let u = [
            cos * cmd.vx - sin * cmd.vy,
            sin * cmd.vx + cos * cmd.vy,
            cmd.omega,
        ];
        let dt = self.cfg.dt_s;
        let omega_sq = self.cfg.omega * self.cfg.omega;
        let damping = 2.0 * self.cfg.zeta * self.cfg.omega;
        for i in 0..3 {
            let (p, v, a) = (self.position[i], self.velocity[i], self.acceleration[i]);
            self.position[i] = p + dt * v;
            self.velocity[i] = v + dt * a;
            self.acceleration[i] = a + dt * (omega_sq * (u[i] - v) - damping * a);
        }

        self.last_command = cmd;
        self.steps += 1;
        self.history.push_back(self.true_state());
        while self.history.len() > self.cfg.delay_cycles + 1 {
            self.history.pop_front();
        }
        tracing::trace!(
            step = self.steps,
            x = self.position[0],
            y = self.position[1],
            theta = self.position[2],
            "sim step"
        );
        Ok(())
    }
}

/// Shared handle so one plant can serve as both the `Perception` and the
/// `Drive` side of a control loop.
#[derive(Debug, Clone)]
pub struct SimHandle(Rc<RefCell<SimulatedRobot>>);

impl SimulatedRobot {
    pub fn into_shared(self) -> SimHandle {
        SimHandle(Rc::new(RefCell::new(self)))
    }
}

impl SimHandle {
    pub fn true_state(&self) -> KinematicSnapshot {
        self.0.borrow().true_state()
    }

    pub fn steps(&self) -> u64 {
        self.0.borrow().steps()
    }

    pub fn last_command(&self) -> Velocity {
        self.0.borrow().last_command()
    }
}

impl Perception for SimHandle {
    fn perceive(&mut self) -> Result<KinematicSnapshot, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0.borrow().perceived_state())
    }
}

impl Drive for SimHandle {
    fn command(&mut self, cmd: Velocity) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.0.borrow_mut().step(cmd).map_err(Into::into)
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.0.borrow_mut().last_command = Velocity::ZERO;
        Ok(())
    }
}

impl Perception for SimulatedRobot {
    fn perceive(&mut self) -> Result<KinematicSnapshot, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.perceived_state())
    }
}

impl Drive for SimulatedRobot {
    fn command(&mut self, cmd: Velocity) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.step(cmd).map_err(Into::into)
    }

    /// Zero the held command. No time passes.
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.last_command = Velocity::ZERO;
        Ok(())
    }
}
