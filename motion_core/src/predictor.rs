//! Dead-time compensation for the perception pipeline.
//!
//! Snapshots arrive `DELAY_CYCLES` cycles after they were valid. The predictor
//! replays the commands issued since then through a driven second-order model
//! per axis,
//!
//! ```text
//! a' = -omega^2 * v - 2 * zeta * omega * a + omega^2 * u
//! ```
//!
//! using explicit Euler integration, and returns the estimated current state.

use motion_traits::KinematicSnapshot;

use crate::config::{DELAY_CYCLES, PredictorCfg};
use crate::math::{EstimatedState, Vec3};

#[derive(Debug, Clone)]
pub struct DelayPredictor {
    dt: f64,
    zeta: f64,
    omega: f64,
    // inputs[0] is the newest command, inputs[DELAY_CYCLES - 1] the oldest
    inputs: [Vec3; DELAY_CYCLES],
}

impl DelayPredictor {
    pub fn new(dt: f64, cfg: PredictorCfg) -> Self {
        Self {
            dt,
            zeta: cfg.zeta,
            omega: cfg.omega,
            inputs: [Vec3::ZERO; DELAY_CYCLES],
        }
    }

    pub fn zeta(&self) -> f64 {
        self.zeta
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }

    /// Buffered control inputs, newest first.
    pub fn inputs(&self) -> &[Vec3; DELAY_CYCLES] {
        &self.inputs
    }

    /// Zero the command history.
    pub fn reset(&mut self) {
        self.inputs = [Vec3::ZERO; DELAY_CYCLES];
    }

    /// Push `latest_input` into the history and advance `perceived` through every
    /// buffered input, oldest first.
    pub fn interpolate(
        &mut self,
        perceived: &KinematicSnapshot,
        latest_input: Vec3,
    ) -> EstimatedState {
        self.inputs.rotate_right(1);
        self.inputs[0] = latest_input;

        let omega_sq = self.omega * self.omega;
        let damping = 2.0 * self.zeta * self.omega;
        let mut state = EstimatedState::from(perceived);
        for u in self.inputs.iter().rev() {
            let EstimatedState {
                position: p,
                velocity: v,
                acceleration: a,
            } = state;
            state = EstimatedState {
                position: p + self.dt * v,
                velocity: v + self.dt * a,
                acceleration: a + self.dt * (omega_sq * (*u - v) - damping * a),
            };
        }
        state
    }
}
