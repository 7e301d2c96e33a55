//! Sight-averaging core for the sextant reduction toolkit.
//!
//! The modules split the classic averaging worksheet into strict token
//! parsing and chainable outlier-filtering stages with well-defined
//! failure modes.

pub mod filtering;
pub mod math;
pub mod prelude;
pub mod sight;
pub mod telemetry;

pub use prelude::{
    ReduceError, ReduceResult, ReductionStage, SlopeGate, StageConfig, StageInput, StageMetadata,
    StageOutput, Verdict,
};
pub use sight::Measurement;
