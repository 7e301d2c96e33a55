use anyhow::ensure;
use chrono::{Duration, NaiveTime, Timelike};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sightcore::sight::Measurement;

/// Configuration for generating a synthetic sight run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub count: usize,
    pub start: NaiveTime,
    pub interval_s: u32,
    pub base_degrees: f64,
    pub drift_deg_per_s: f64,
    pub noise_arcmin: f64,
    pub outliers: usize,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 7,
            start: NaiveTime::from_hms_opt(12, 15, 0).expect("valid clock time"),
            interval_s: 60,
            base_degrees: 5.5,
            drift_deg_per_s: 0.0002,
            noise_arcmin: 0.3,
            outliers: 1,
            seed: 0,
        }
    }
}

/// Outliers are planted this far off the drift line, in arc-minutes.
const OUTLIER_OFFSET_ARCMIN: f64 = 5.0;

/// Builds a deterministic synthetic run: a slow drift with seeded jitter and
/// a few planted outliers, quantized to the 0.1-arc-minute precision of the
/// token format.
pub fn build_sight_run(config: &GeneratorConfig) -> anyhow::Result<Vec<Measurement>> {
    ensure!(config.count > 0, "sight run needs at least one measurement");
    let span = u64::from(config.interval_s) * (config.count as u64 - 1);
    ensure!(
        u64::from(config.start.num_seconds_from_midnight()) + span < 86_400,
        "sight run would wrap past midnight"
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let stride = config.count / (config.outliers + 1);
    let mut sights = Vec::with_capacity(config.count);

    for index in 0..config.count {
        let elapsed = index as f64 * f64::from(config.interval_s);
        let time = config.start + Duration::seconds(index as i64 * i64::from(config.interval_s));

        let mut angle = config.base_degrees + config.drift_deg_per_s * elapsed;
        if config.noise_arcmin > 0.0 {
            angle += rng.gen_range(-config.noise_arcmin..config.noise_arcmin) / 60.0;
        }
        if stride > 0 && index > 0 && index % stride == 0 && index / stride <= config.outliers {
            let sign = if (index / stride) % 2 == 0 { -1.0 } else { 1.0 };
            angle += sign * OUTLIER_OFFSET_ARCMIN / 60.0;
        }

        // Snap to the 0.1' precision a real token carries.
        angle = (angle * 600.0).round() / 600.0;
        sights.push(Measurement::new(time, angle));
    }

    Ok(sights)
}
