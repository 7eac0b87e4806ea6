//! Scalar speed profiles: stop-at-distance and slew-limited velocity tracking.
//!
//! Both return a magnitude; the caller supplies the direction.

use crate::config::ProfileCfg;

#[derive(Debug, Clone)]
pub struct VelocityProfile {
    dt: f64,
    cfg: ProfileCfg,
}

impl VelocityProfile {
    pub fn new(dt: f64, cfg: ProfileCfg) -> Self {
        Self { dt, cfg }
    }

    pub fn cfg(&self) -> &ProfileCfg {
        &self.cfg
    }

    /// Maximum acceleration, also the braking assumption for boundary avoidance.
    pub fn max_acceleration(&self) -> f64 {
        self.cfg.max_acceleration
    }

    /// Acceleration available at `speed`: ramps linearly from `min_acceleration`
    /// at rest to `max_acceleration` at `reach_speed`.
    pub fn acceleration_at(&self, speed: f64) -> f64 {
        let ratio = if self.cfg.reach_speed > 0.0 {
            (speed.abs() / self.cfg.reach_speed).min(1.0)
        } else {
            1.0
        };
        self.cfg.min_acceleration + (self.cfg.max_acceleration - self.cfg.min_acceleration) * ratio
    }

    /// Speed toward a target `remaining_distance` away.
    ///
    /// The result is the smallest of the stopping-distance speed
    /// `sqrt(2 * max_deceleration * d)`, the proportional approach `kp * d`, and
    /// one acceleration step up from `previous_speed`. Zero at zero distance, and
    /// zero inside `stable_distance` once the caller has latched `stable`.
    pub fn control_pos(&self, previous_speed: f64, remaining_distance: f64, stable: bool) -> f64 {
        // also rejects NaN distances
        if !(remaining_distance > 0.0) {
            return 0.0;
        }
        if stable && remaining_distance <= self.cfg.stable_distance {
            return 0.0;
        }
        let stopping = (2.0 * self.cfg.max_deceleration * remaining_distance).sqrt();
        let proportional = self.cfg.kp * remaining_distance;
        let from = previous_speed.max(0.0);
        let ramp = from + self.acceleration_at(from) * self.dt;
        stopping.min(proportional).min(ramp).max(0.0)
    }

    /// Move `previous_speed` toward `target_speed`, limited per cycle by the
    /// acceleration ramp when the magnitude grows and by `max_deceleration` otherwise.
    pub fn control_vel(&self, previous_speed: f64, target_speed: f64) -> f64 {
        let delta = target_speed - previous_speed;
        let speeding_up =
            target_speed.abs() > previous_speed.abs() && target_speed * previous_speed >= 0.0;
        let step = if speeding_up {
            self.acceleration_at(previous_speed) * self.dt
        } else {
            self.cfg.max_deceleration * self.dt
        };
        previous_speed + delta.clamp(-step, step)
    }
}
