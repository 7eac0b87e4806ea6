//! Human-readable error descriptions and structured JSON error formatting.

use crate::run::abort_reason_name;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use motion_core::error::{AbortReason, BuildError, ControlError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::NonPositiveCycle => {
                "What happened: The control cycle length is zero, negative or not a number.\nLikely causes: cycle.rate_hz is missing or out of range.\nHow to fix: Set [cycle] rate_hz to a positive value (60 is the reference rate).".to_string()
            }
            BuildError::NonPositiveNaturalFrequency => {
                "What happened: The predictor's natural frequency is not positive.\nLikely causes: predictor.omega is zero or negative.\nHow to fix: Set [predictor] omega > 0 (49.17 is the reference tuning).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<ControlError>() {
        return match ce {
            ControlError::Abort(AbortReason::CycleBudget) => "What happened: The run used its whole cycle budget without settling on the target.\nLikely causes: Target too far for the budget, a low speed limit, or a goal outside the reachable field.\nHow to fix: Raise --cycles or runner.max_cycles, or lift --speed-limit.".to_string(),
            ControlError::Abort(AbortReason::Shutdown) => "What happened: The run was interrupted.\nLikely causes: Ctrl-C or a termination signal.\nHow to fix: Start a new run.".to_string(),
            ControlError::DriveFault(msg) => format!(
                "What happened: The drive rejected a command ({msg}).\nLikely causes: A non-finite command reached the drive.\nHow to fix: Re-run with --log-level=debug and report the trace."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config or script loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("setpoint csv must have headers") {
        return "Invalid headers in setpoint script. Expected 'cycle,kind,a,b,c'.".to_string();
    }

    if lower.contains("setpoint") {
        let cause = err.root_cause();
        return format!(
            "What happened: The setpoint script could not be used ({cause}).\nHow to fix: Check the CSV rows: kind is position or velocity, values are finite, cycles are non-decreasing."
        );
    }

    if lower.contains("invalid configuration") || lower.contains("parse config") {
        let cause = err.root_cause();
        return format!(
            "What happened: Configuration is invalid ({cause}).\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Budget exhaustion exits with 3; every other error with 1. Argument errors
/// never reach here (clap exits with 2).
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use motion_core::error::{AbortReason, ControlError};
    if let Some(ControlError::Abort(AbortReason::CycleBudget)) = err.downcast_ref::<ControlError>()
    {
        return 3;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use motion_core::error::ControlError;
    use serde_json::json;

    if let Some(ControlError::Abort(reason)) = err.downcast_ref::<ControlError>() {
        return json!({ "reason": abort_reason_name(reason), "message": humanize(err) })
            .to_string();
    }

    // Generic error JSON
    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_core::error::{AbortReason, BuildError, ControlError};

    #[test]
    fn budget_abort_maps_to_exit_code_three() {
        let err = eyre::Report::new(ControlError::Abort(AbortReason::CycleBudget));
        assert_eq!(exit_code_for_error(&err), 3);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "CycleBudget");
    }

    #[test]
    fn build_errors_are_explained() {
        let err = eyre::Report::new(BuildError::NonPositiveNaturalFrequency);
        assert!(humanize(&err).contains("predictor"));
        assert_eq!(exit_code_for_error(&err), 1);
    }

    #[test]
    fn wrapped_abort_is_still_typed() {
        use eyre::WrapErr;
        let err: eyre::Result<()> =
            Err(eyre::Report::new(ControlError::Abort(AbortReason::CycleBudget)));
        let err = err.wrap_err("self-check approach did not settle").unwrap_err();
        assert_eq!(exit_code_for_error(&err), 3);
    }
}
