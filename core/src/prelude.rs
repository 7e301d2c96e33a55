use crate::sight::measurement::Measurement;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Apparent altitude is dragged by Earth's rotation at no more than about
/// 0.0042 degrees per second; steeper observed rates are spurious.
pub const DEFAULT_SLOPE_GATE: SlopeGate = SlopeGate::Above(0.005);

/// Shared configuration for each reduction stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub sigma_multiplier: f64,
    pub slope_gate: SlopeGate,
    pub slope_tolerance_pct: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            sigma_multiplier: 1.0,
            slope_gate: DEFAULT_SLOPE_GATE,
            slope_tolerance_pct: 10.0,
        }
    }
}

/// Hard gate on the apparent altitude rate, in degrees per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SlopeGate {
    /// Rejects rates whose magnitude exceeds the limit.
    Above(f64),
    /// Rejects rates whose magnitude falls below the limit.
    Below(f64),
}

impl SlopeGate {
    pub fn rejects(&self, rate: f64) -> bool {
        match *self {
            SlopeGate::Above(limit) => rate.abs() > limit,
            SlopeGate::Below(limit) => rate.abs() < limit,
        }
    }
}

impl fmt::Display for SlopeGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SlopeGate::Above(limit) => write!(f, ">{}", limit),
            SlopeGate::Below(limit) => write!(f, "<{}", limit),
        }
    }
}

impl FromStr for SlopeGate {
    type Err = ReduceError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (build, rest): (fn(f64) -> SlopeGate, &str) =
            if let Some(rest) = text.strip_prefix('>') {
                (SlopeGate::Above, rest)
            } else if let Some(rest) = text.strip_prefix('<') {
                (SlopeGate::Below, rest)
            } else {
                return Err(ReduceError::InvalidInput(format!(
                    "slope gate `{text}` must start with '<' or '>'"
                )));
            };
        let limit: f64 = rest.parse().map_err(|_| {
            ReduceError::InvalidInput(format!("slope gate `{text}` has a non-numeric limit"))
        })?;
        Ok(build(limit))
    }
}

impl TryFrom<String> for SlopeGate {
    type Error = ReduceError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<SlopeGate> for String {
    fn from(gate: SlopeGate) -> Self {
        gate.to_string()
    }
}

/// Input payload for a reduction stage.
#[derive(Debug, Clone)]
pub struct StageInput {
    pub measurements: Vec<Measurement>,
}

/// Output produced by each stage. `measurements` holds the accepted subset
/// so stages can be chained.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub measurements: Vec<Measurement>,
    pub metadata: StageMetadata,
}

/// Per-measurement outcome, aligned with the stage's input order.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Verdict {
    pub accepted: bool,
    pub slope_to: Option<f64>,
    pub slope_from: Option<f64>,
    pub within_tolerance: Option<bool>,
}

impl Verdict {
    pub fn plain(accepted: bool) -> Self {
        Self {
            accepted,
            slope_to: None,
            slope_from: None,
            within_tolerance: None,
        }
    }
}

/// Metadata used for chaining stages and telemetry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageMetadata {
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub accepted_mean: Option<f64>,
    pub slope_mean: Option<f64>,
    pub slope_spread: Option<f64>,
    pub verdicts: Vec<Verdict>,
    pub notes: Vec<String>,
}

/// Common error type for parsing and stage execution.
#[derive(thiserror::Error, Debug)]
pub enum ReduceError {
    #[error("malformed measurement `{token}`: expected HH:MM:SS@DD°MM.M'")]
    Format { token: String },
    #[error("no measurements to evaluate")]
    InsufficientData,
    #[error("every measurement was rejected as an outlier")]
    EmptyAcceptedSet,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type ReduceResult<T> = Result<T, ReduceError>;

/// Trait describing the sequential sight-filtering stages.
pub trait ReductionStage {
    fn initialize(&mut self, config: &StageConfig) -> ReduceResult<()>;
    fn execute(&mut self, input: StageInput) -> ReduceResult<StageOutput>;
    fn cleanup(&mut self);
}
