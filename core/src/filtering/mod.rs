pub mod deviation;
pub mod slope;

pub use deviation::DeviationStage;
pub use slope::SlopeStage;

use crate::prelude::{ReduceResult, ReductionStage, StageConfig, StageInput, StageOutput};
use crate::sight::measurement::Measurement;

/// Runs the deviation filter over a run of sights with the given threshold
/// multiplier and default settings for everything else.
pub fn evaluate(measurements: &[Measurement], sigma_multiplier: f64) -> ReduceResult<StageOutput> {
    let config = StageConfig {
        sigma_multiplier,
        ..Default::default()
    };
    let mut stage = DeviationStage::new();
    stage.initialize(&config)?;
    let output = stage.execute(StageInput {
        measurements: measurements.to_vec(),
    });
    stage.cleanup();
    output
}
