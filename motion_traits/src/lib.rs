//! Shared model types and the seams between the controller, perception and drive.
//!
//! Units follow the perception pipeline: millimetres, millimetres per second and
//! radians. Positions and snapshots are in field coordinates; committed commands
//! are in robot-body coordinates.

use std::error::Error;

/// Delayed kinematic observation of a robot, in field coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KinematicSnapshot {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub vx: f64,
    pub vy: f64,
    pub omega: f64,
    pub ax: f64,
    pub ay: f64,
    pub alpha: f64,
}

impl KinematicSnapshot {
    /// Snapshot of a robot at rest at `pose`.
    pub fn at_rest(pose: Pose) -> Self {
        Self {
            x: pose.x,
            y: pose.y,
            theta: pose.theta,
            ..Self::default()
        }
    }

    /// Planar speed magnitude.
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }
}

/// Playing-area boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldGeometry {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for FieldGeometry {
    /// Division B field: 9 m x 6 m, centred on the origin.
    fn default() -> Self {
        Self {
            x_min: -4500.0,
            x_max: 4500.0,
            y_min: -3000.0,
            y_max: 3000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

/// A three-component velocity: planar `(vx, vy)` and angular rate `omega`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
    pub omega: f64,
}

impl Velocity {
    pub const ZERO: Self = Self {
        vx: 0.0,
        vy: 0.0,
        omega: 0.0,
    };

    pub fn is_finite(&self) -> bool {
        self.vx.is_finite() && self.vy.is_finite() && self.omega.is_finite()
    }

    pub fn planar_speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }
}

/// Target supplied to a controller for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Setpoint {
    /// Reach and hold a field-frame pose.
    Position(Pose),
    /// Track a field-frame velocity.
    Velocity(Velocity),
}

/// A controller that accepts a planar speed limit and turns a setpoint into one
/// robot-frame velocity command per call.
pub trait VelocityController {
    /// Set the active planar speed cap. Implementations clamp to their hardware ceiling.
    fn set_velocity_limit(&mut self, limit: f64);

    /// Currently active planar speed cap.
    fn velocity_limit(&self) -> f64;

    fn update(
        &mut self,
        robot: &KinematicSnapshot,
        field: &FieldGeometry,
        setpoint: &Setpoint,
    ) -> Velocity;
}

/// Source of (delayed) kinematic observations.
pub trait Perception {
    fn perceive(&mut self) -> Result<KinematicSnapshot, Box<dyn Error + Send + Sync>>;
}

/// Sink for committed robot-frame commands.
pub trait Drive {
    fn command(&mut self, cmd: Velocity) -> Result<(), Box<dyn Error + Send + Sync>>;
    fn stop(&mut self) -> Result<(), Box<dyn Error + Send + Sync>>;
}
