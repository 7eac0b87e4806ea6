//! `From` implementations bridging `motion_config` types to `motion_core` types.

use motion_traits::{FieldGeometry, Pose, Setpoint, Velocity};

use crate::config::{BoundaryCfg, CycleCfg, PredictorCfg, ProfileCfg, RegulatorCfg, RunnerCfg};
use crate::runner::ScriptStep;

// ── CycleCfg ─────────────────────────────────────────────────────────────────

impl From<&motion_config::CycleCfg> for CycleCfg {
    fn from(c: &motion_config::CycleCfg) -> Self {
        Self::from_rate_hz(c.rate_hz)
    }
}

// ── PredictorCfg ─────────────────────────────────────────────────────────────

impl From<&motion_config::PredictorCfg> for PredictorCfg {
    fn from(c: &motion_config::PredictorCfg) -> Self {
        Self {
            zeta: c.zeta,
            omega: c.omega,
        }
    }
}

// ── RegulatorCfg ─────────────────────────────────────────────────────────────

/// The optional initial `velocity_limit` is applied through the builder, not here.
impl From<&motion_config::RegulatorCfg> for RegulatorCfg {
    fn from(c: &motion_config::RegulatorCfg) -> Self {
        Self {
            pole: c.pole,
            integral_gain: c.integral_gain,
            heading_gain: c.heading_gain,
            max_angular_rate: c.max_angular_rate,
            velocity_ceiling: c.velocity_ceiling,
        }
    }
}

// ── ProfileCfg ───────────────────────────────────────────────────────────────

impl From<&motion_config::ProfileCfg> for ProfileCfg {
    fn from(c: &motion_config::ProfileCfg) -> Self {
        Self {
            max_acceleration: c.max_acceleration,
            min_acceleration: c.min_acceleration,
            max_deceleration: c.max_deceleration,
            reach_speed: c.reach_speed,
            kp: c.kp,
            stable_distance: c.stable_distance,
            release_distance: c.release_distance,
        }
    }
}

// ── BoundaryCfg ──────────────────────────────────────────────────────────────

impl From<&motion_config::BoundaryCfg> for BoundaryCfg {
    fn from(c: &motion_config::BoundaryCfg) -> Self {
        Self {
            margin: c.margin,
            trigger_speed: c.trigger_speed,
        }
    }
}

// ── RunnerCfg ────────────────────────────────────────────────────────────────

impl From<&motion_config::RunnerCfg> for RunnerCfg {
    fn from(c: &motion_config::RunnerCfg) -> Self {
        Self {
            max_cycles: c.max_cycles,
            settle_distance: c.settle_distance,
            settle_speed: c.settle_speed,
            settle_cycles: c.settle_cycles,
        }
    }
}

// ── Field and setpoints ──────────────────────────────────────────────────────

/// Field bounds live in the traits crate, so this is a free function rather
/// than a `From` impl (both types are foreign here).
pub fn field_geometry(c: &motion_config::FieldCfg) -> FieldGeometry {
    FieldGeometry {
        x_min: c.x_min,
        x_max: c.x_max,
        y_min: c.y_min,
        y_max: c.y_max,
    }
}

impl From<&motion_config::SetpointRow> for ScriptStep {
    fn from(row: &motion_config::SetpointRow) -> Self {
        let setpoint = match row.kind {
            motion_config::SetpointKind::Position => Setpoint::Position(Pose {
                x: row.a,
                y: row.b,
                theta: row.c,
            }),
            motion_config::SetpointKind::Velocity => Setpoint::Velocity(Velocity {
                vx: row.a,
                vy: row.b,
                omega: row.c,
            }),
        };
        Self {
            cycle: row.cycle,
            setpoint,
        }
    }
}

impl crate::builder::RegulatorBuilder {
    /// Seed every section from a validated file config.
    pub fn from_config(cfg: &motion_config::Config) -> Self {
        let mut builder = Self::default()
            .with_cycle((&cfg.cycle).into())
            .with_predictor((&cfg.predictor).into())
            .with_regulator((&cfg.regulator).into())
            .with_profile((&cfg.profile).into())
            .with_boundary((&cfg.boundary).into());
        if let Some(limit) = cfg.regulator.velocity_limit {
            builder = builder.with_velocity_limit(limit);
        }
        builder
    }
}
