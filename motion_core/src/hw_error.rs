//! Maps `Box<dyn Error>` from the `Perception`/`Drive` seams to typed `ControlError`.
//!
//! With the `sim-errors` feature, `motion_sim::SimError` is downcast for precise
//! mapping; anything else falls back to the message text.

use crate::error::ControlError;

/// Map a drive-side error to a typed `ControlError`.
pub fn map_drive_error(e: &(dyn std::error::Error + 'static)) -> ControlError {
    #[cfg(feature = "sim-errors")]
    {
        if let Some(sim) = e.downcast_ref::<motion_sim::SimError>() {
            return match sim {
                motion_sim::SimError::NonFiniteCommand { .. } => {
                    ControlError::DriveFault(sim.to_string())
                }
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("reject") {
        ControlError::DriveFault(s)
    } else {
        ControlError::Drive(s)
    }
}

/// Map a perception-side error to a typed `ControlError`.
pub fn map_perception_error(e: &(dyn std::error::Error + 'static)) -> ControlError {
    ControlError::Perception(e.to_string())
}
