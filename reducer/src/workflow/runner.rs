use crate::workflow::config::ReduceConfig;
use anyhow::Context;
use sightcore::filtering::{DeviationStage, SlopeStage};
use sightcore::prelude::{ReductionStage, StageInput, Verdict};
use sightcore::sight::Measurement;
use sightcore::telemetry::MetricsRecorder;

/// Everything the presentation layer needs about one reduction run.
#[derive(Debug)]
pub struct ReductionOutcome {
    /// The full run, time-sorted.
    pub measurements: Vec<Measurement>,
    /// One verdict per measurement, aligned with `measurements`.
    pub verdicts: Vec<Verdict>,
    /// Mean and spread of the set the deviation filter judged (the slope
    /// survivors when the prefilter is on, the whole run otherwise).
    pub mean: f64,
    pub std_dev: f64,
    pub accepted_mean: f64,
    pub slope_mean: Option<f64>,
    pub slope_spread: Option<f64>,
    pub notes: Vec<String>,
}

#[derive(Clone)]
pub struct Runner {
    config: ReduceConfig,
}

impl Runner {
    pub fn new(config: ReduceConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, mut measurements: Vec<Measurement>) -> anyhow::Result<ReductionOutcome> {
        measurements.sort_by_key(|m| m.time);
        let stage_config = self.config.to_stage_config();
        let metrics = MetricsRecorder::new();

        let mut verdicts = vec![Verdict::plain(true); measurements.len()];
        let mut notes = Vec::new();
        let mut slope_mean = None;
        let mut slope_spread = None;

        let (survivors, survivor_slots) = if self.config.slope_filter {
            let mut slope_stage = SlopeStage::new();
            slope_stage
                .initialize(&stage_config)
                .context("initializing slope stage")?;
            let output = slope_stage
                .execute(StageInput {
                    measurements: measurements.clone(),
                })
                .context("executing slope stage")?;
            slope_stage.cleanup();

            let mut slots = Vec::with_capacity(output.measurements.len());
            for (slot, verdict) in output.metadata.verdicts.iter().enumerate() {
                verdicts[slot] = *verdict;
                if verdict.accepted {
                    slots.push(slot);
                }
            }
            slope_mean = output.metadata.slope_mean;
            slope_spread = output.metadata.slope_spread;
            notes.extend(output.metadata.notes);
            (output.measurements, slots)
        } else {
            let slots = (0..measurements.len()).collect();
            (measurements.clone(), slots)
        };

        let mut deviation_stage = DeviationStage::new();
        deviation_stage
            .initialize(&stage_config)
            .context("initializing deviation stage")?;
        let output = deviation_stage
            .execute(StageInput {
                measurements: survivors,
            })
            .context("executing deviation stage")?;
        deviation_stage.cleanup();

        for (slot, verdict) in survivor_slots.iter().zip(&output.metadata.verdicts) {
            verdicts[*slot].accepted = verdict.accepted;
        }
        for verdict in &verdicts {
            if verdict.accepted {
                metrics.record_accepted();
            } else {
                metrics.record_rejected();
            }
        }
        let (accepted, rejected) = metrics.snapshot();
        log::info!("reduction complete: {} accepted, {} rejected", accepted, rejected);
        notes.extend(output.metadata.notes);

        Ok(ReductionOutcome {
            measurements,
            verdicts,
            mean: output.metadata.mean.unwrap_or_default(),
            std_dev: output.metadata.std_dev.unwrap_or_default(),
            accepted_mean: output.metadata.accepted_mean.unwrap_or_default(),
            slope_mean,
            slope_spread,
            notes,
        })
    }
}
