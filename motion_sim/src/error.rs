use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("non-finite command: vx={vx} vy={vy} omega={omega}")]
    NonFiniteCommand { vx: f64, vy: f64, omega: f64 },
}

pub type Result<T> = std::result::Result<T, SimError>;
