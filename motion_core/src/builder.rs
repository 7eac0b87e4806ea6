//! Builder for `StateFeedbackRegulator`.
//!
//! Every section defaults to the reference tuning. `build()` is the single place
//! where configuration is validated, so a regulator can never hold NaN gains.

use crate::config::{BoundaryCfg, CycleCfg, PredictorCfg, ProfileCfg, RegulatorCfg};
use crate::error::{BuildError, Result};
use crate::regulator::StateFeedbackRegulator;

#[derive(Debug, Default, Clone)]
pub struct RegulatorBuilder {
    cycle: Option<CycleCfg>,
    predictor: Option<PredictorCfg>,
    regulator: Option<RegulatorCfg>,
    profile: Option<ProfileCfg>,
    boundary: Option<BoundaryCfg>,
    velocity_limit: Option<f64>,
}

impl RegulatorBuilder {
    pub fn with_cycle(mut self, cycle: CycleCfg) -> Self {
        self.cycle = Some(cycle);
        self
    }

    /// Shorthand for `with_cycle(CycleCfg::from_rate_hz(hz))`.
    pub fn with_rate_hz(self, hz: f64) -> Self {
        self.with_cycle(CycleCfg::from_rate_hz(hz))
    }

    pub fn with_predictor(mut self, predictor: PredictorCfg) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn with_regulator(mut self, regulator: RegulatorCfg) -> Self {
        self.regulator = Some(regulator);
        self
    }

    pub fn with_profile(mut self, profile: ProfileCfg) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryCfg) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Initial active speed limit; clamped to the ceiling like `set_velocity_limit`.
    pub fn with_velocity_limit(mut self, limit: f64) -> Self {
        self.velocity_limit = Some(limit);
        self
    }

    pub fn build(self) -> Result<StateFeedbackRegulator> {
        let cycle = self.cycle.unwrap_or_default();
        let predictor = self.predictor.unwrap_or_default();
        let regulator = self.regulator.unwrap_or_default();
        let profile = self.profile.unwrap_or_default();
        let boundary = self.boundary.unwrap_or_default();
        validate(&cycle, &predictor, &regulator, &profile, &boundary)?;

        let mut out =
            StateFeedbackRegulator::from_validated(cycle, predictor, regulator, profile, boundary);
        if let Some(limit) = self.velocity_limit {
            use motion_traits::VelocityController;
            out.set_velocity_limit(limit);
        }
        Ok(out)
    }
}

#[inline]
fn positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

#[inline]
fn non_negative(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

fn validate(
    cycle: &CycleCfg,
    predictor: &PredictorCfg,
    regulator: &RegulatorCfg,
    profile: &ProfileCfg,
    boundary: &BoundaryCfg,
) -> Result<()> {
    // ── Timing and model ─────────────────────────────────────────────────────
    if !positive(cycle.dt_s) {
        return Err(eyre::Report::new(BuildError::NonPositiveCycle));
    }
    if !positive(predictor.omega) {
        return Err(eyre::Report::new(BuildError::NonPositiveNaturalFrequency));
    }
    if !non_negative(predictor.zeta) {
        return Err(invalid("zeta must be finite and >= 0"));
    }

    // ── Regulator ────────────────────────────────────────────────────────────
    if !regulator.pole.is_finite() {
        return Err(invalid("pole must be finite"));
    }
    if !regulator.integral_gain.is_finite() {
        return Err(invalid("integral_gain must be finite"));
    }
    if !regulator.heading_gain.is_finite() {
        return Err(invalid("heading_gain must be finite"));
    }
    if !positive(regulator.max_angular_rate) {
        return Err(invalid("max_angular_rate must be > 0"));
    }
    if !positive(regulator.velocity_ceiling) {
        return Err(invalid("velocity_ceiling must be > 0"));
    }

    // ── Profile ──────────────────────────────────────────────────────────────
    if !positive(profile.max_acceleration) || !positive(profile.max_deceleration) {
        return Err(invalid("profile accelerations must be > 0"));
    }
    if !positive(profile.min_acceleration) || profile.min_acceleration > profile.max_acceleration
    {
        return Err(invalid(
            "min_acceleration must be > 0 and <= max_acceleration",
        ));
    }
    if !non_negative(profile.reach_speed) {
        return Err(invalid("reach_speed must be >= 0"));
    }
    if !positive(profile.kp) {
        return Err(invalid("profile kp must be > 0"));
    }
    if !non_negative(profile.stable_distance) || !non_negative(profile.release_distance) {
        return Err(invalid("stable/release distances must be >= 0"));
    }
    if profile.release_distance < profile.stable_distance {
        return Err(invalid("release_distance must be >= stable_distance"));
    }

    // ── Boundary ─────────────────────────────────────────────────────────────
    if !non_negative(boundary.margin) || !non_negative(boundary.trigger_speed) {
        return Err(invalid("boundary margin and trigger_speed must be >= 0"));
    }

    Ok(())
}
