//! Small fixed-dimension vector math for the controller.
//!
//! A `Vec3` carries `(x, y, z)` where `(x, y)` is planar and `z` is the angular
//! component (heading, angular rate or angular acceleration depending on use).

use core::ops::{Add, Mul, Sub};

use motion_traits::{KinematicSnapshot, Velocity};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Unit vector in the same direction. A zero vector is returned unchanged.
    #[inline]
    pub fn normalized(self) -> Self {
        let n = self.norm();
        if n > 0.0 { self * (1.0 / n) } else { self }
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar part `(x, y)`.
    #[inline]
    pub fn head(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Replace the planar part, keeping `z`.
    #[inline]
    pub fn with_head(self, v: Vec2) -> Self {
        Self::new(v.x, v.y, self.z)
    }

    /// Element-wise product.
    #[inline]
    pub fn component_mul(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Rotate about the z axis by `angle` radians; `z` is unchanged.
    #[inline]
    pub fn rotate_z(self, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c * self.x - s * self.y, s * self.x + c * self.y, self.z)
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline]
    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline]
    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;
    #[inline]
    fn mul(self, v: Vec3) -> Vec3 {
        v * self
    }
}

impl From<Velocity> for Vec3 {
    fn from(v: Velocity) -> Self {
        Self::new(v.vx, v.vy, v.omega)
    }
}

impl From<Vec3> for Velocity {
    fn from(v: Vec3) -> Self {
        Self {
            vx: v.x,
            vy: v.y,
            omega: v.z,
        }
    }
}

/// Position, velocity and acceleration columns of one kinematic state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EstimatedState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

impl EstimatedState {
    /// Heading component of the position column.
    #[inline]
    pub fn heading(&self) -> f64 {
        self.position.z
    }
}

impl From<&KinematicSnapshot> for EstimatedState {
    fn from(s: &KinematicSnapshot) -> Self {
        Self {
            position: Vec3::new(s.x, s.y, s.theta),
            velocity: Vec3::new(s.vx, s.vy, s.omega),
            acceleration: Vec3::new(s.ax, s.ay, s.alpha),
        }
    }
}
