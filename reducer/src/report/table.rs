use crate::report::model::ReportModel;
use std::fmt::Write;

const ACCEPT_MARK: &str = "✔";
const REJECT_MARK: &str = "✘";

fn rate_cell(rate: Option<f64>) -> String {
    match rate {
        Some(value) => format!("{:+.4}", value),
        None => "-".to_string(),
    }
}

fn tolerance_cell(mark: Option<bool>) -> &'static str {
    match mark {
        Some(true) => ACCEPT_MARK,
        Some(false) => REJECT_MARK,
        None => "-",
    }
}

/// Renders the acceptance table and summary footer.
pub fn render(model: &ReportModel) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8}  {:>9}  {:>10}  {:>12}  {:>12}  {:^4}  {:^4}",
        "Time", "Degrees", "Arc", "Rate to", "Rate from", "Kept", "Tol"
    );
    for row in &model.rows {
        let _ = writeln!(
            out,
            "{:<8}  {:>9.4}  {:>10}  {:>12}  {:>12}  {:^4}  {:^4}",
            row.time,
            row.angle_deg,
            row.arc,
            rate_cell(row.slope_to),
            rate_cell(row.slope_from),
            if row.accepted { ACCEPT_MARK } else { REJECT_MARK },
            tolerance_cell(row.within_tolerance),
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Accepted mean: {:.4}° ({} of {} sights)",
        model.accepted_mean_deg,
        model.accepted_count,
        model.accepted_count + model.rejected_count
    );
    let _ = writeln!(
        out,
        "Run mean {:.4}°, sigma {:.4}°",
        model.mean_deg, model.std_dev_deg
    );
    if let (Some(mean), Some(spread)) = (model.slope_mean, model.slope_spread) {
        let _ = writeln!(out, "Mean rate {:+.4}°/s, spread {:.4}°/s", mean, spread);
    }
    for note in &model.notes {
        let _ = writeln!(out, "note: {}", note);
    }
    out
}
