//! The per-cycle state-feedback regulator.
//!
//! Each `update` runs one atomic transition:
//!
//! 1. rotate the previous committed command into the field frame and feed it,
//!    together with the delayed snapshot, to the delay predictor;
//! 2. compute the discretized PID correction on the body-frame estimated velocity;
//! 3. shape a target velocity with the profile generator (position or velocity setpoint);
//! 4. assemble the command: scale, speed cap, non-finite hold, boundary avoidance;
//! 5. roll every delay line forward.
//!
//! The process error fed to the PID law is the estimated velocity itself, which
//! makes the feedback path an inner velocity loop around the profile planner.

use motion_traits::{FieldGeometry, KinematicSnapshot, Pose, Setpoint, Velocity, VelocityController};

use crate::config::{BoundaryCfg, CycleCfg, PredictorCfg, ProfileCfg, RegulatorCfg};
use crate::error::Result;
use crate::geometry::{to_field_frame, to_robot_frame, wrap_to_pi};
use crate::math::{EstimatedState, Vec2, Vec3};
use crate::predictor::DelayPredictor;
use crate::profile::VelocityProfile;

/// Proportional, integral and derivative gain vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegulatorGains {
    pub kp: Vec3,
    pub ki: Vec3,
    pub kd: Vec3,
}

impl RegulatorGains {
    /// Place a double closed-loop pole at `-pole` against the reference model
    /// `(zeta, omega)`:
    ///
    /// ```text
    /// (s + k)^2 = s^2 + (2 zeta omega - k2 omega^2) s + omega^2 - k1 omega^2
    /// k1 = 1 - k^2 / omega^2
    /// k2 = 2 (zeta omega - k) / omega^2
    /// ```
    ///
    /// Only the planar axes carry feedback; heading is driven open-loop.
    pub fn place(pole: f64, zeta: f64, omega: f64, integral_gain: f64) -> Self {
        let omega_sq = omega * omega;
        let k1 = 1.0 - pole * pole / omega_sq;
        let k2 = 2.0 * (zeta * omega - pole) / omega_sq;
        Self {
            kp: Vec3::new(k1, k1, 0.0),
            ki: Vec3::new(integral_gain, integral_gain, 0.0),
            kd: Vec3::new(k2, k2, 0.0),
        }
    }
}

/// Two-slot memory: `current` is being computed, `previous` is the last committed value.
#[derive(Debug, Clone, Copy, Default)]
struct DelayLine {
    slots: [Vec3; 2],
}

impl DelayLine {
    #[inline]
    fn current(&self) -> Vec3 {
        self.slots[0]
    }

    #[inline]
    fn previous(&self) -> Vec3 {
        self.slots[1]
    }

    #[inline]
    fn set(&mut self, v: Vec3) {
        self.slots[0] = v;
    }

    /// Discard this cycle's value.
    #[inline]
    fn revert(&mut self) {
        self.slots[0] = self.slots[1];
    }

    #[inline]
    fn commit(&mut self) {
        self.slots[1] = self.slots[0];
    }
}

/// Cap the planar magnitude of `cmd` at `limit`, preserving direction.
/// The angular component is untouched.
pub fn limit_planar_speed(cmd: Vec3, limit: f64) -> Vec3 {
    let planar = cmd.head();
    if planar.norm() > limit {
        cmd.with_head(planar.normalized() * limit)
    } else {
        cmd
    }
}

/// Per-axis signed speed bounds that still allow stopping before the boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryLimits {
    pub vx_min: f64,
    pub vx_max: f64,
    pub vy_min: f64,
    pub vy_max: f64,
}

impl BoundaryLimits {
    /// Bounds for a robot at field-frame `position` braking at `acceleration`,
    /// allowed to travel `margin` past the field lines.
    pub fn compute(position: Vec2, field: &FieldGeometry, acceleration: f64, margin: f64) -> Self {
        let reach = |distance: f64| (2.0 * acceleration * distance.max(0.0)).sqrt();
        Self {
            vx_max: reach(field.x_max + margin - position.x),
            vx_min: -reach(position.x - (field.x_min - margin)),
            vy_max: reach(field.y_max + margin - position.y),
            vy_min: -reach(position.y - (field.y_min - margin)),
        }
    }

    /// Clamp each axis, then shrink both axes by the tighter of the two cut ratios
    /// so the result keeps the direction of `v`.
    pub fn clamp(&self, v: Vec2) -> Vec2 {
        let cx = v.x.clamp(self.vx_min, self.vx_max);
        let cy = v.y.clamp(self.vy_min, self.vy_max);
        let rx = if v.x != 0.0 { cx / v.x } else { 1.0 };
        let ry = if v.y != 0.0 { cy / v.y } else { 1.0 };
        v * rx.min(ry)
    }
}

/// Rotate a robot-frame command into the field frame and, above the trigger speed,
/// restrict it to speeds the robot can still brake from before leaving the field.
pub fn avoid_boundary(
    cmd: Vec3,
    heading: f64,
    position: Vec2,
    field: &FieldGeometry,
    acceleration: f64,
    boundary: &BoundaryCfg,
) -> Vec3 {
    let field_cmd = to_field_frame(cmd, heading);
    if !(field_cmd.head().norm() > boundary.trigger_speed) {
        return cmd;
    }
    let limits = BoundaryLimits::compute(position, field, acceleration, boundary.margin);
    let clamped = limits.clamp(field_cmd.head());
    if clamped != field_cmd.head() {
        tracing::debug!(
            vx = field_cmd.x,
            vy = field_cmd.y,
            clamped_vx = clamped.x,
            clamped_vy = clamped.y,
            "boundary avoidance clamped command"
        );
    }
    to_robot_frame(field_cmd.with_head(clamped), heading)
}

/// Dead-time compensated state-feedback controller for one robot.
#[derive(Debug, Clone)]
pub struct StateFeedbackRegulator {
    dt: f64,
    cfg: RegulatorCfg,
    boundary: BoundaryCfg,
    predictor: DelayPredictor,
    profile: VelocityProfile,
    gains: RegulatorGains,
    // k^2 / omega^2: maps the analytic feedback back to command units
    output_scale: f64,
    velocity_limit: f64,

    up: DelayLine,
    ui: DelayLine,
    ud: DelayLine,
    u: DelayLine,
    e: DelayLine,

    estimated: EstimatedState,
    target: Vec3,
    stable: bool,
    hold_count: u64,
}

impl StateFeedbackRegulator {
    /// Regulator with the reference tuning for cycle length `dt_s`.
    pub fn new(dt_s: f64) -> Result<Self> {
        Self::builder().with_cycle(CycleCfg { dt_s }).build()
    }

    pub fn builder() -> crate::builder::RegulatorBuilder {
        crate::builder::RegulatorBuilder::default()
    }

    /// Assemble from configuration already checked by the builder.
    pub(crate) fn from_validated(
        cycle: CycleCfg,
        predictor: PredictorCfg,
        cfg: RegulatorCfg,
        profile: ProfileCfg,
        boundary: BoundaryCfg,
    ) -> Self {
        let dt = cycle.dt_s;
        let gains = RegulatorGains::place(cfg.pole, predictor.zeta, predictor.omega, cfg.integral_gain);
        let output_scale = cfg.pole * cfg.pole / (predictor.omega * predictor.omega);
        tracing::debug!(
            dt,
            k1 = gains.kp.x,
            k2 = gains.kd.x,
            ki = gains.ki.x,
            output_scale,
            "regulator gains placed"
        );
        Self {
            dt,
            cfg,
            boundary,
            predictor: DelayPredictor::new(dt, predictor),
            profile: VelocityProfile::new(dt, profile),
            gains,
            output_scale,
            velocity_limit: cfg.velocity_ceiling,
            up: DelayLine::default(),
            ui: DelayLine::default(),
            ud: DelayLine::default(),
            u: DelayLine::default(),
            e: DelayLine::default(),
            estimated: EstimatedState::default(),
            target: Vec3::ZERO,
            stable: false,
            hold_count: 0,
        }
    }

    pub fn cycle(&self) -> f64 {
        self.dt
    }

    pub fn gains(&self) -> &RegulatorGains {
        &self.gains
    }

    pub fn profile(&self) -> &VelocityProfile {
        &self.profile
    }

    pub fn predictor(&self) -> &DelayPredictor {
        &self.predictor
    }

    /// Current-time state estimate from the most recent update.
    pub fn estimated_state(&self) -> &EstimatedState {
        &self.estimated
    }

    /// Robot-frame target velocity from the most recent update, before feedback.
    pub fn last_target(&self) -> Velocity {
        self.target.into()
    }

    /// Most recently committed command.
    pub fn last_command(&self) -> Velocity {
        self.u.previous().into()
    }

    /// Whether the position approach is latched as settled.
    pub fn is_stable(&self) -> bool {
        self.stable
    }

    /// Number of cycles whose candidate was discarded for a non-finite value.
    pub fn hold_count(&self) -> u64 {
        self.hold_count
    }

    /// Return to the construction state: delay lines, command history, latch and
    /// hold counter cleared. The active speed limit is kept.
    pub fn reset(&mut self) {
        for line in [&mut self.up, &mut self.ui, &mut self.ud, &mut self.u, &mut self.e] {
            *line = DelayLine::default();
        }
        self.predictor.reset();
        self.estimated = EstimatedState::default();
        self.target = Vec3::ZERO;
        self.stable = false;
        self.hold_count = 0;
    }

    /// Drive toward a field-frame pose.
    pub fn update_position(
        &mut self,
        robot: &KinematicSnapshot,
        field: &FieldGeometry,
        setpoint: &Pose,
    ) -> Velocity {
        self.calculate_regulator(robot);

        let set = Vec3::new(setpoint.x, setpoint.y, setpoint.theta);
        let e_p = set - self.estimated.position;
        let delta_p = to_robot_frame(e_p, self.estimated.heading());
        let direction = delta_p.head().normalized();
        let distance = e_p.head().norm();
        self.latch_stable(distance);

        let pre_vel = direction.dot(self.u.previous().head());
        let speed = self.profile.control_pos(pre_vel, distance, self.stable);
        let planar = direction * speed;
        let omega = (self.cfg.heading_gain * wrap_to_pi(delta_p.z))
            .clamp(-self.cfg.max_angular_rate, self.cfg.max_angular_rate);

        self.calculate_output(field, Vec3::new(planar.x, planar.y, omega))
    }

    /// Track a field-frame velocity.
    pub fn update_velocity(
        &mut self,
        robot: &KinematicSnapshot,
        field: &FieldGeometry,
        setpoint: &Velocity,
    ) -> Velocity {
        self.calculate_regulator(robot);
        self.stable = false;

        let set = Vec3::from(*setpoint);
        let requested = to_robot_frame(set, self.estimated.heading());
        // A stop request has no direction of its own; brake along the last command.
        let direction = if requested.head().norm() == 0.0 {
            self.u.previous().head().normalized()
        } else {
            requested.head().normalized()
        };

        let pre_vel = direction.dot(self.u.previous().head());
        let speed = self.profile.control_vel(pre_vel, requested.head().norm());
        let planar = direction * speed;
        let omega = set
            .z
            .clamp(-self.cfg.max_angular_rate, self.cfg.max_angular_rate);

        self.calculate_output(field, Vec3::new(planar.x, planar.y, omega))
    }

    fn latch_stable(&mut self, distance: f64) {
        let cfg = self.profile.cfg();
        if distance <= cfg.stable_distance {
            self.stable = true;
        } else if !(distance <= cfg.release_distance) {
            self.stable = false;
        }
    }

    /// Predictor step and discretized PID correction into `u.current()`.
    fn calculate_regulator(&mut self, robot: &KinematicSnapshot) {
        // Previous command in the field frame, rotated by its own direction.
        let prev = self.u.previous();
        let direction = prev.y.atan2(prev.x);
        let pre_u = prev.rotate_z(direction);

        self.estimated = self.predictor.interpolate(robot, pre_u);

        let e0 = to_robot_frame(self.estimated.velocity, self.estimated.heading());
        self.e.set(e0);
        let e1 = self.e.previous();

        // Trapezoidal integral, backward-difference derivative.
        let up = self.gains.kp.component_mul(e0);
        let ui = (self.dt / 2.0) * self.gains.ki.component_mul(e0 + e1) + self.ui.previous();
        let ud = (1.0 / self.dt) * self.gains.kd.component_mul(e0 - e1);
        self.up.set(up);
        self.ui.set(ui);
        self.ud.set(ud);
        self.u.set(up + ui + ud);
    }

    /// Assemble, constrain and commit this cycle's command.
    fn calculate_output(&mut self, field: &FieldGeometry, target: Vec3) -> Velocity {
        self.target = target;
        let candidate = self.u.current() + self.output_scale * target;
        let mut cmd = limit_planar_speed(candidate, self.velocity_limit);

        if cmd.is_finite() {
            cmd = avoid_boundary(
                cmd,
                self.estimated.heading(),
                self.estimated.position.head(),
                field,
                self.profile.max_acceleration(),
                &self.boundary,
            );
        }

        if cmd.is_finite() {
            self.u.set(cmd);
        } else {
            self.hold_count += 1;
            tracing::warn!(
                vx = cmd.x,
                vy = cmd.y,
                omega = cmd.z,
                holds = self.hold_count,
                "non-finite command; holding previous"
            );
            self.u.revert();
        }
        // The PID terms and process error advance even on a hold; only a
        // non-finite term keeps its previous value.
        for line in [&mut self.up, &mut self.ui, &mut self.ud, &mut self.e] {
            if !line.current().is_finite() {
                line.revert();
            }
        }

        tracing::trace!(
            est_x = self.estimated.position.x,
            est_y = self.estimated.position.y,
            est_theta = self.estimated.position.z,
            target_vx = target.x,
            target_vy = target.y,
            target_omega = target.z,
            vx = self.u.current().x,
            vy = self.u.current().y,
            omega = self.u.current().z,
            "regulator cycle"
        );

        for line in [&mut self.up, &mut self.ui, &mut self.ud, &mut self.u, &mut self.e] {
            line.commit();
        }
        self.u.previous().into()
    }
}

impl VelocityController for StateFeedbackRegulator {
    /// Stores `min(limit, velocity_ceiling)`; negative or NaN limits become 0.
    fn set_velocity_limit(&mut self, limit: f64) {
        self.velocity_limit = limit.max(0.0).min(self.cfg.velocity_ceiling);
    }

    fn velocity_limit(&self) -> f64 {
        self.velocity_limit
    }

    fn update(
        &mut self,
        robot: &KinematicSnapshot,
        field: &FieldGeometry,
        setpoint: &Setpoint,
    ) -> Velocity {
        match setpoint {
            Setpoint::Position(pose) => self.update_position(robot, field, pose),
            Setpoint::Velocity(vel) => self.update_velocity(robot, field, vel),
        }
    }
}
