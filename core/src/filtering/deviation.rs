use crate::math::stats::StatsHelper;
use crate::prelude::{
    ReduceError, ReduceResult, ReductionStage, StageConfig, StageInput, StageMetadata, StageOutput,
    Verdict,
};
use crate::telemetry::log::LogManager;

/// Flags sights whose altitude strays from the run mean by more than the
/// configured multiple of the population standard deviation, and averages
/// the survivors.
pub struct DeviationStage {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl DeviationStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new(),
        }
    }
}

impl Default for DeviationStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ReductionStage for DeviationStage {
    fn initialize(&mut self, config: &StageConfig) -> ReduceResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> ReduceResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| ReduceError::Internal("stage not initialized".into()))?;

        if input.measurements.is_empty() {
            return Err(ReduceError::InsufficientData);
        }

        let angles: Vec<f64> = input.measurements.iter().map(|m| m.angle_deg).collect();
        let mean = StatsHelper::mean(&angles);
        let std_dev = StatsHelper::population_std_dev(&angles);
        let limit = config.sigma_multiplier * std_dev;

        // Ties at exactly the limit are kept.
        let verdicts: Vec<Verdict> = angles
            .iter()
            .map(|&angle| Verdict::plain((angle - mean).abs() <= limit))
            .collect();

        let accepted: Vec<_> = input
            .measurements
            .iter()
            .zip(&verdicts)
            .filter(|(_, verdict)| verdict.accepted)
            .map(|(m, _)| *m)
            .collect();
        if accepted.is_empty() {
            return Err(ReduceError::EmptyAcceptedSet);
        }

        let accepted_angles: Vec<f64> = accepted.iter().map(|m| m.angle_deg).collect();
        let accepted_mean = StatsHelper::mean(&accepted_angles);
        self.logger.record(&format!(
            "DeviationStage mean {:.4} sigma {:.4} kept {}/{}",
            mean,
            std_dev,
            accepted.len(),
            input.measurements.len()
        ));

        let metadata = StageMetadata {
            mean: Some(mean),
            std_dev: Some(std_dev),
            accepted_mean: Some(accepted_mean),
            verdicts,
            notes: vec![format!("deviation limit {:.4}", limit)],
            ..Default::default()
        };

        Ok(StageOutput {
            measurements: accepted,
            metadata,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
