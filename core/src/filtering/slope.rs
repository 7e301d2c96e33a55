use crate::math::stats::StatsHelper;
use crate::prelude::{
    ReduceError, ReduceResult, ReductionStage, StageConfig, StageInput, StageMetadata, StageOutput,
    Verdict,
};
use crate::telemetry::log::LogManager;
use chrono::NaiveTime;

/// Prefilter on the apparent altitude rate between consecutive sights.
///
/// Each pairwise rate is judged against the run's rate statistics (a band of
/// two sample standard deviations around the mean rate) and against the hard
/// [`SlopeGate`](crate::prelude::SlopeGate). A sight is rejected only when
/// every rate touching it is bad; interior sights survive one noisy
/// neighbour. Input must be time-ascending.
pub struct SlopeStage {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl SlopeStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new(),
        }
    }
}

impl Default for SlopeStage {
    fn default() -> Self {
        Self::new()
    }
}

fn seconds_between(earlier: NaiveTime, later: NaiveTime) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 1000.0
}

impl ReductionStage for SlopeStage {
    fn initialize(&mut self, config: &StageConfig) -> ReduceResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> ReduceResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| ReduceError::Internal("stage not initialized".into()))?;

        let sights = &input.measurements;
        if sights.is_empty() {
            return Err(ReduceError::InsufficientData);
        }
        if sights.len() == 1 {
            // A lone sight has no rates to judge.
            let metadata = StageMetadata {
                accepted_mean: Some(sights[0].angle_deg),
                verdicts: vec![Verdict::plain(true)],
                notes: vec!["single sight, rate filter skipped".to_string()],
                ..Default::default()
            };
            return Ok(StageOutput {
                measurements: input.measurements,
                metadata,
            });
        }

        let mut pairwise = Vec::with_capacity(sights.len() - 1);
        for window in sights.windows(2) {
            let dt = seconds_between(window[0].time, window[1].time);
            if dt <= 0.0 {
                return Err(ReduceError::InvalidInput(format!(
                    "non-increasing timestamps at {}",
                    window[1].time.format("%H:%M:%S")
                )));
            }
            pairwise.push((window[1].angle_deg - window[0].angle_deg) / dt);
        }

        let mean_rate = StatsHelper::mean(&pairwise);
        let spread = StatsHelper::sample_std_dev(&pairwise);
        let band = 2.0 * spread;
        let tolerance_limit = mean_rate.abs() * config.slope_tolerance_pct / 100.0;

        let bad = |rate: f64| (rate - mean_rate).abs() > band || config.slope_gate.rejects(rate);
        let near = |rate: f64| (rate - mean_rate).abs() <= tolerance_limit;

        let mut verdicts = Vec::with_capacity(sights.len());
        for index in 0..sights.len() {
            let slope_to = (index + 1 < sights.len()).then(|| pairwise[index]);
            let slope_from = (index > 0).then(|| pairwise[index - 1]);

            let rejected = match (slope_to, slope_from) {
                (Some(to), Some(from)) => bad(to) && bad(from),
                (Some(to), None) => bad(to),
                (None, Some(from)) => bad(from),
                (None, None) => false,
            };
            let within_tolerance = slope_to.map_or(true, near) && slope_from.map_or(true, near);

            verdicts.push(Verdict {
                accepted: !rejected,
                slope_to,
                slope_from,
                within_tolerance: Some(within_tolerance),
            });
        }

        let accepted: Vec<_> = sights
            .iter()
            .zip(&verdicts)
            .filter(|(_, verdict)| verdict.accepted)
            .map(|(m, _)| *m)
            .collect();
        if accepted.is_empty() {
            return Err(ReduceError::EmptyAcceptedSet);
        }

        let accepted_angles: Vec<f64> = accepted.iter().map(|m| m.angle_deg).collect();
        self.logger.record(&format!(
            "SlopeStage rate mean {:+.4} spread {:.4} kept {}/{}",
            mean_rate,
            spread,
            accepted.len(),
            sights.len()
        ));

        let metadata = StageMetadata {
            accepted_mean: Some(StatsHelper::mean(&accepted_angles)),
            slope_mean: Some(mean_rate),
            slope_spread: Some(spread),
            verdicts,
            notes: vec![
                format!("rate band {:.4}", band),
                format!("gate {}", config.slope_gate),
            ],
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sight::measurement::Measurement;

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn run_stage(measurements: Vec<Measurement>, config: StageConfig) -> ReduceResult<StageOutput> {
        let mut stage = SlopeStage::new();
        stage.initialize(&config).unwrap();
        let output = stage.execute(StageInput { measurements });
        stage.cleanup();
        output
    }

    #[test]
    fn steady_rising_run_is_kept_whole() {
        let sights = vec![
            Measurement::new(at(12, 0, 0), 10.0),
            Measurement::new(at(12, 1, 0), 10.06),
            Measurement::new(at(12, 2, 0), 10.12),
        ];
        let output = run_stage(sights, StageConfig::default()).unwrap();
        assert_eq!(output.measurements.len(), 3);
        assert!((output.metadata.slope_mean.unwrap() - 0.001).abs() < 1e-9);
        assert!(output
            .metadata
            .verdicts
            .iter()
            .all(|v| v.within_tolerance == Some(true)));
    }

    #[test]
    fn gated_jump_rejects_the_trailing_sight() {
        // 1° in 60 s is 0.0167°/s, far beyond the default gate.
        let sights = vec![
            Measurement::new(at(12, 0, 0), 10.0),
            Measurement::new(at(12, 1, 0), 10.0),
            Measurement::new(at(12, 2, 0), 11.0),
        ];
        let output = run_stage(sights, StageConfig::default()).unwrap();
        let flags: Vec<bool> = output.metadata.verdicts.iter().map(|v| v.accepted).collect();
        // The interior sight touches one clean rate and survives.
        assert_eq!(flags, vec![true, true, false]);
        assert_eq!(output.measurements.len(), 2);
    }

    #[test]
    fn steep_pair_rejects_everything() {
        let sights = vec![
            Measurement::new(at(12, 0, 0), 10.0),
            Measurement::new(at(12, 1, 0), 11.0),
        ];
        let err = run_stage(sights, StageConfig::default()).unwrap_err();
        assert!(matches!(err, ReduceError::EmptyAcceptedSet));
    }

    #[test]
    fn tolerance_marks_only_rates_near_the_mean() {
        let sights = vec![
            Measurement::new(at(12, 0, 0), 10.0),
            Measurement::new(at(12, 1, 0), 10.06),
            Measurement::new(at(12, 2, 0), 10.12),
            Measurement::new(at(12, 3, 0), 10.24),
        ];
        let config = StageConfig {
            slope_tolerance_pct: 40.0,
            ..Default::default()
        };
        let output = run_stage(sights, config).unwrap();
        let marks: Vec<Option<bool>> = output
            .metadata
            .verdicts
            .iter()
            .map(|v| v.within_tolerance)
            .collect();
        assert_eq!(
            marks,
            vec![Some(true), Some(true), Some(false), Some(false)]
        );
        // The annotation never affects acceptance.
        assert_eq!(output.measurements.len(), 4);
    }

    #[test]
    fn single_sight_passes_through() {
        let sights = vec![Measurement::new(at(12, 0, 0), 10.0)];
        let output = run_stage(sights, StageConfig::default()).unwrap();
        assert_eq!(output.measurements.len(), 1);
        let verdict = &output.metadata.verdicts[0];
        assert!(verdict.accepted);
        assert_eq!(verdict.slope_to, None);
        assert_eq!(verdict.slope_from, None);
        assert_eq!(output.metadata.accepted_mean, Some(10.0));
    }

    #[test]
    fn duplicate_timestamps_are_invalid_input() {
        let sights = vec![
            Measurement::new(at(12, 0, 0), 10.0),
            Measurement::new(at(12, 0, 0), 10.1),
        ];
        let err = run_stage(sights, StageConfig::default()).unwrap_err();
        assert!(matches!(err, ReduceError::InvalidInput(_)));
    }

    #[test]
    fn empty_input_is_insufficient_data() {
        let err = run_stage(Vec::new(), StageConfig::default()).unwrap_err();
        assert!(matches!(err, ReduceError::InsufficientData));
    }
}
