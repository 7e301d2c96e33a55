use anyhow::Context;
use serde::{Deserialize, Serialize};
use sightcore::prelude::{SlopeGate, StageConfig, DEFAULT_SLOPE_GATE};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReduceConfig {
    pub sigma_multiplier: f64,
    pub slope_filter: bool,
    pub slope_gate: SlopeGate,
    pub slope_tolerance_pct: f64,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            sigma_multiplier: 1.0,
            slope_filter: false,
            slope_gate: DEFAULT_SLOPE_GATE,
            slope_tolerance_pct: 10.0,
        }
    }
}

impl ReduceConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading reduction config {}", path_ref.display()))?;
        let config: ReduceConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing reduction config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        sigma_multiplier: f64,
        slope_filter: bool,
        slope_gate: SlopeGate,
        slope_tolerance_pct: f64,
    ) -> Self {
        Self {
            sigma_multiplier,
            slope_filter,
            slope_gate,
            slope_tolerance_pct,
        }
    }

    pub fn to_stage_config(&self) -> StageConfig {
        StageConfig {
            sigma_multiplier: self.sigma_multiplier,
            slope_gate: self.slope_gate,
            slope_tolerance_pct: self.slope_tolerance_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_stage_config() {
        let cfg = ReduceConfig::from_args(1.5, true, SlopeGate::Above(0.01), 25.0);
        let stage = cfg.to_stage_config();
        assert_eq!(stage.sigma_multiplier, 1.5);
        assert_eq!(stage.slope_gate, SlopeGate::Above(0.01));
        assert_eq!(stage.slope_tolerance_pct, 25.0);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"sigma_multiplier: 1.5\nslope_filter: true\nslope_gate: \"<0.001\"\nslope_tolerance_pct: 25.0\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = ReduceConfig::load(&path).unwrap();
        assert_eq!(cfg.sigma_multiplier, 1.5);
        assert!(cfg.slope_filter);
        assert_eq!(cfg.slope_gate, SlopeGate::Below(0.001));
    }

    #[test]
    fn config_load_fills_missing_fields_with_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"sigma_multiplier: 2.0\n").unwrap();
        let path = temp.into_temp_path();
        let cfg = ReduceConfig::load(&path).unwrap();
        assert_eq!(cfg.sigma_multiplier, 2.0);
        assert!(!cfg.slope_filter);
        assert_eq!(cfg.slope_gate, DEFAULT_SLOPE_GATE);
    }
}
