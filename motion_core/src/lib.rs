#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::similar_names
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Dead-time compensated motion control for an omnidirectional robot (hardware-agnostic).
//!
//! Every control cycle the regulator receives a kinematic snapshot that is
//! `DELAY_CYCLES` cycles stale, predicts the current state from the commands it
//! issued since, and commits one robot-frame velocity command. Perception and
//! actuation go through the `motion_traits::Perception` and `motion_traits::Drive`
//! traits.
//!
//! ## Architecture
//!
//! - **Prediction**: second-order reference model replayed over a 7-slot command
//!   history (`predictor` module)
//! - **Profiles**: stop-at-distance and slew-limited velocity shaping (`profile` module)
//! - **Regulation**: pole-placed PID correction, output assembly, speed cap,
//!   non-finite hold and field-boundary avoidance (`regulator` module)
//! - **Configuration**: runtime config structs and a validating builder
//!   (`config`, `builder` modules)
//! - **Runner**: closed-loop driver with settle detection (`runner` module)
//!
//! ## Units
//!
//! Millimetres, millimetres per second and radians throughout. Field-frame
//! quantities use the perception pipeline's axes; commands are robot-frame.

pub mod builder;
pub mod config;
#[cfg(feature = "file-config")]
pub mod conversions;
pub mod error;
pub mod geometry;
pub mod hw_error;
pub mod math;
pub mod predictor;
pub mod profile;
pub mod regulator;
pub mod runner;

pub use crate::builder::RegulatorBuilder;
pub use crate::config::{
    BoundaryCfg, CycleCfg, DELAY_CYCLES, PredictorCfg, ProfileCfg, RegulatorCfg, RunnerCfg,
};
pub use crate::error::{AbortReason, BuildError, ControlError, Result};
pub use crate::geometry::{find_cross_point, wrap_to_pi};
pub use crate::math::{EstimatedState, Vec2, Vec3};
pub use crate::predictor::DelayPredictor;
pub use crate::profile::VelocityProfile;
pub use crate::regulator::{
    BoundaryLimits, RegulatorGains, StateFeedbackRegulator, avoid_boundary, limit_planar_speed,
};
pub use crate::runner::{ClosedLoop, CycleRecord, RunOutcome, RunReport, ScriptStep};
