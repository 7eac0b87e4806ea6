#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and setpoint-script parsing for the motion controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//!   Every section is optional and defaults to the reference tuning.
//! - The setpoint script CSV loader enforces headers and ordering.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CycleCfg {
    /// Control rate in Hz; the cycle length is `1 / rate_hz`.
    pub rate_hz: f64,
}

impl Default for CycleCfg {
    fn default() -> Self {
        Self { rate_hz: 60.0 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PredictorCfg {
    /// Damping ratio of the reference model
    pub zeta: f64,
    /// Natural frequency of the reference model (rad/s)
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RegulatorCfg {
    /// Closed-loop pole magnitude
    pub pole: f64,
    pub integral_gain: f64,
    pub heading_gain: f64,
    /// rad/s
    pub max_angular_rate: f64,
    /// Absolute planar speed ceiling (mm/s)
    pub velocity_ceiling: f64,
    /// Optional initial active speed limit (mm/s); defaults to the ceiling
    pub velocity_limit: Option<f64>,
}

impl Default for RegulatorCfg {
    fn default() -> Self {
        Self {
            pole: 49.17,
            integral_gain: 0.0,
            heading_gain: 4.0,
            max_angular_rate: 2.0,
            velocity_ceiling: 10_000.0,
            velocity_limit: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProfileCfg {
    pub max_acceleration: f64,
    pub min_acceleration: f64,
    pub max_deceleration: f64,
    pub reach_speed: f64,
    pub kp: f64,
    pub stable_distance: f64,
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BoundaryCfg {
    /// mm past the field lines
    pub margin: f64,
    /// mm/s
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FieldCfg {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for FieldCfg {
    fn default() -> Self {
        Self {
            x_min: -4500.0,
            x_max: 4500.0,
            y_min: -3000.0,
            y_max: 3000.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimCfg {
    /// Perception latency of the simulated robot, in cycles
    pub delay_cycles: usize,
    pub start_x: f64,
    pub start_y: f64,
    pub start_theta: f64,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            delay_cycles: 7,
            start_x: 0.0,
            start_y: 0.0,
            start_theta: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    pub max_cycles: u64,
    /// mm
    pub settle_distance: f64,
    /// mm/s
    pub settle_speed: f64,
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

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub cycle: CycleCfg,
    pub predictor: PredictorCfg,
    pub regulator: RegulatorCfg,
    pub profile: ProfileCfg,
    pub boundary: BoundaryCfg,
    pub field: FieldCfg,
    pub sim: SimCfg,
    pub runner: RunnerCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

#[inline]
fn positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

#[inline]
fn non_negative(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Cycle
        if !positive(self.cycle.rate_hz) {
            eyre::bail!("cycle.rate_hz must be > 0");
        }
        if self.cycle.rate_hz > 10_000.0 {
            eyre::bail!("cycle.rate_hz is unreasonably large (>10kHz)");
        }

        // Predictor
        if !positive(self.predictor.omega) {
            eyre::bail!("predictor.omega must be > 0");
        }
        if !non_negative(self.predictor.zeta) {
            eyre::bail!("predictor.zeta must be >= 0");
        }

        // Regulator
        if !self.regulator.pole.is_finite() {
            eyre::bail!("regulator.pole must be finite");
        }
        if !self.regulator.integral_gain.is_finite() {
            eyre::bail!("regulator.integral_gain must be finite");
        }
        if !self.regulator.heading_gain.is_finite() {
            eyre::bail!("regulator.heading_gain must be finite");
        }
        if !positive(self.regulator.max_angular_rate) {
            eyre::bail!("regulator.max_angular_rate must be > 0");
        }
        if !positive(self.regulator.velocity_ceiling) {
            eyre::bail!("regulator.velocity_ceiling must be > 0");
        }
        if let Some(limit) = self.regulator.velocity_limit
            && !non_negative(limit)
        {
            eyre::bail!("regulator.velocity_limit must be >= 0");
        }

        // Profile
        if !positive(self.profile.max_acceleration) {
            eyre::bail!("profile.max_acceleration must be > 0");
        }
        if !positive(self.profile.max_deceleration) {
            eyre::bail!("profile.max_deceleration must be > 0");
        }
        if !positive(self.profile.min_acceleration)
            || self.profile.min_acceleration > self.profile.max_acceleration
        {
            eyre::bail!("profile.min_acceleration must be in (0, max_acceleration]");
        }
        if !non_negative(self.profile.reach_speed) {
            eyre::bail!("profile.reach_speed must be >= 0");
        }
        if !positive(self.profile.kp) {
            eyre::bail!("profile.kp must be > 0");
        }
        if !non_negative(self.profile.stable_distance) {
            eyre::bail!("profile.stable_distance must be >= 0");
        }
        if !(self.profile.release_distance >= self.profile.stable_distance)
            || !self.profile.release_distance.is_finite()
        {
            eyre::bail!("profile.release_distance must be >= profile.stable_distance");
        }

        // Boundary
        if !non_negative(self.boundary.margin) {
            eyre::bail!("boundary.margin must be >= 0");
        }
        if !non_negative(self.boundary.trigger_speed) {
            eyre::bail!("boundary.trigger_speed must be >= 0");
        }

        // Field
        let f = &self.field;
        if ![f.x_min, f.x_max, f.y_min, f.y_max]
            .iter()
            .all(|v| v.is_finite())
        {
            eyre::bail!("field bounds must be finite");
        }
        if f.x_min >= f.x_max || f.y_min >= f.y_max {
            eyre::bail!("field bounds must satisfy x_min < x_max and y_min < y_max");
        }

        // Sim
        if self.sim.delay_cycles > 1_000 {
            eyre::bail!("sim.delay_cycles is unreasonably large (>1000)");
        }

        // Runner
        if self.runner.max_cycles == 0 {
            eyre::bail!("runner.max_cycles must be >= 1");
        }
        if !non_negative(self.runner.settle_distance) {
            eyre::bail!("runner.settle_distance must be >= 0");
        }
        if !non_negative(self.runner.settle_speed) {
            eyre::bail!("runner.settle_speed must be >= 0");
        }

        Ok(())
    }
}

/// Which kind of setpoint a script row carries.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SetpointKind {
    Position,
    Velocity,
}

/// Setpoint script CSV schema.
///
/// Expected headers:
/// cycle,kind,a,b,c
///
/// `(a, b, c)` is `(x, y, theta)` for `position` rows and `(vx, vy, omega)` for
/// `velocity` rows. A row takes effect at `cycle` and holds until the next row.
///
/// Example:
/// cycle,kind,a,b,c
/// 0,position,1000.0,0.0,0.0
/// 240,velocity,0.0,500.0,0.0
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SetpointRow {
    pub cycle: u64,
    pub kind: SetpointKind,
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// Check that a script is non-empty, ordered by cycle and finite.
pub fn validate_setpoints(rows: &[SetpointRow]) -> eyre::Result<()> {
    if rows.is_empty() {
        eyre::bail!("setpoint script requires at least one row");
    }
    for (i, row) in rows.iter().enumerate() {
        if !(row.a.is_finite() && row.b.is_finite() && row.c.is_finite()) {
            eyre::bail!("setpoint row {} has non-finite values", i);
        }
        if i > 0 && row.cycle < rows[i - 1].cycle {
            eyre::bail!(
                "setpoint cycles must be non-decreasing (row {} has cycle {} after {})",
                i,
                row.cycle,
                rows[i - 1].cycle
            );
        }
    }
    Ok(())
}

pub fn load_setpoints_csv(path: &std::path::Path) -> eyre::Result<Vec<SetpointRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open setpoint CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["cycle", "kind", "a", "b", "c"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "setpoint CSV must have headers 'cycle,kind,a,b,c', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<SetpointRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    validate_setpoints(&rows)?;
    Ok(rows)
}
