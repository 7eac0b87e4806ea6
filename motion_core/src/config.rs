//! Configuration types for the motion controller.
//!
//! These are the runtime configuration structs used by `StateFeedbackRegulator`.
//! They are separate from the TOML-deserialized config in `motion_config`.

/// Number of control cycles between when a snapshot is valid and when it is delivered.
pub const DELAY_CYCLES: usize = 7;

/// Control cycle timing.
#[derive(Debug, Clone, Copy)]
pub struct CycleCfg {
    /// Control cycle length in seconds. Supplied, never measured from a clock.
    pub dt_s: f64,
}

impl CycleCfg {
    pub fn from_rate_hz(hz: f64) -> Self {
        Self { dt_s: 1.0 / hz }
    }
}

impl Default for CycleCfg {
    fn default() -> Self {
        Self { dt_s: 1.0 / 60.0 }
    }
}

/// Second-order reference model used by the delay predictor.
#[derive(Debug, Clone, Copy)]
pub struct PredictorCfg {
    /// Damping ratio.
    pub zeta: f64,
    /// Natural frequency (rad/s).
    pub omega: f64,
}

impl Default for PredictorCfg {
    fn default() -> Self {
        Self {
            zeta: 1.0,
            omega: 49.17,
        }
    }
}

/// State-feedback regulator design parameters and ceilings.
#[derive(Debug, Clone, Copy)]
pub struct RegulatorCfg {
    /// Desired closed-loop pole magnitude `k`; gains place a double pole at `-k`.
    pub pole: f64,
    /// Planar integral gain. Zero in the reference tuning but always computed.
    pub integral_gain: f64,
    /// Proportional gain on the wrapped heading error (position setpoints).
    pub heading_gain: f64,
    /// Absolute angular-rate ceiling (rad/s).
    pub max_angular_rate: f64,
    /// Absolute planar speed ceiling (mm/s). The active limit never exceeds it.
    pub velocity_ceiling: f64,
}

impl Default for RegulatorCfg {
    fn default() -> Self {
        Self {
            pole: 49.17,
            integral_gain: 0.0,
            heading_gain: 4.0,
            max_angular_rate: 2.0,
            velocity_ceiling: 10_000.0,
        }
    }
}

/// Velocity profile generator limits.
#[derive(Debug, Clone, Copy)]
pub struct ProfileCfg {
    /// Acceleration once the speed reaches `reach_speed` (mm/s²).
    /// Also the braking assumption for field-boundary avoidance.
    pub max_acceleration: f64,
    /// Acceleration available from rest (mm/s²).
    pub min_acceleration: f64,
    /// Deceleration used by the stopping-distance law (mm/s²).
    pub max_deceleration: f64,
    /// Speed at which the acceleration ramp reaches `max_acceleration` (mm/s).
    pub reach_speed: f64,
    /// Proportional convergence gain for the terminal approach (1/s).
    pub kp: f64,
    /// Within this distance of the target a settled controller outputs zero (mm).
    pub stable_distance: f64,
    /// Beyond this distance the settled latch is released (mm).
    pub release_distance: f64,
}

impl Default for ProfileCfg {
    fn default() -> Self {
        Self {
            max_acceleration: 4000.0,
            min_acceleration: 1000.0,
            max_deceleration: 3000.0,
            reach_speed: 1000.0,
            kp: 3.0,
            stable_distance: 10.0,
            release_distance: 50.0,
        }
    }
}

/// Field-boundary avoidance.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryCfg {
    /// Distance beyond the field lines the robot may travel before stopping (mm).
    pub margin: f64,
    /// Avoidance only engages above this field-frame planar speed (mm/s).
    pub trigger_speed: f64,
}

impl Default for BoundaryCfg {
    fn default() -> Self {
        Self {
            margin: 400.0,
            trigger_speed: 100.0,
        }
    }
}

/// Closed-loop runner settings.
#[derive(Debug, Clone, Copy)]
pub struct RunnerCfg {
    /// Hard cap on cycles per run.
    pub max_cycles: u64,
    /// Position setpoint counts as reached within this planar distance (mm).
    pub settle_distance: f64,
    /// ...and below this perceived planar speed (mm/s).
    pub settle_speed: f64,
    /// Consecutive settled cycles required before the run completes.
    pub settle_cycles: u32,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            max_cycles: 1_200,
            settle_distance: 20.0,
            settle_speed: 50.0,
            settle_cycles: 10,
        }
    }
}
