use crate::workflow::runner::ReductionOutcome;
use serde::Serialize;

/// One line of the acceptance table.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub time: String,
    pub angle_deg: f64,
    pub arc: String,
    pub slope_to: Option<f64>,
    pub slope_from: Option<f64>,
    pub accepted: bool,
    pub within_tolerance: Option<bool>,
}

/// Serializable view of a finished reduction run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportModel {
    pub rows: Vec<ReportRow>,
    pub mean_deg: f64,
    pub std_dev_deg: f64,
    pub accepted_mean_deg: f64,
    pub slope_mean: Option<f64>,
    pub slope_spread: Option<f64>,
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub notes: Vec<String>,
}

impl ReportModel {
    pub fn from_outcome(outcome: &ReductionOutcome) -> Self {
        let rows: Vec<ReportRow> = outcome
            .measurements
            .iter()
            .zip(&outcome.verdicts)
            .map(|(sight, verdict)| ReportRow {
                time: sight.time.format("%H:%M:%S").to_string(),
                angle_deg: sight.angle_deg,
                arc: sight.arc_notation(),
                slope_to: verdict.slope_to,
                slope_from: verdict.slope_from,
                accepted: verdict.accepted,
                within_tolerance: verdict.within_tolerance,
            })
            .collect();
        let accepted_count = rows.iter().filter(|row| row.accepted).count();
        let rejected_count = rows.len() - accepted_count;

        Self {
            rows,
            mean_deg: outcome.mean,
            std_dev_deg: outcome.std_dev,
            accepted_mean_deg: outcome.accepted_mean,
            slope_mean: outcome.slope_mean,
            slope_spread: outcome.slope_spread,
            accepted_count,
            rejected_count,
            notes: outcome.notes.clone(),
        }
    }
}
