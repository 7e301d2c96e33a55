use anyhow::Context;
use clap::Parser;
use generator::synthetic::{build_sight_run, GeneratorConfig};
use report::model::ReportModel;
use report::table;
use sightcore::prelude::{ReduceError, SlopeGate, DEFAULT_SLOPE_GATE};
use sightcore::sight::parse::parse_run;
use std::path::PathBuf;
use workflow::config::ReduceConfig;
use workflow::runner::Runner;

mod generator;
mod report;
mod workflow;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Averages a run of sextant sights, discarding outliers"
)]
struct Args {
    /// Sights in HH:MM:SS@DD°MM.M' format
    #[arg(value_name = "SIGHT")]
    measurements: Vec<String>,
    /// Load reduction settings from YAML (overrides the other flags)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Deviation threshold as a multiple of the run standard deviation
    #[arg(long, default_value_t = 1.0)]
    sigma: f64,
    /// Prefilter sights by apparent altitude rate
    #[arg(long, default_value_t = false)]
    slope_filter: bool,
    /// Altitude-rate gate in degrees per second, e.g. '>0.005' or '<0.001'
    #[arg(long)]
    slope_gate: Option<SlopeGate>,
    /// Percent tolerance when marking rates near the mean rate
    #[arg(long, default_value_t = 10.0)]
    tolerance: f64,
    /// Reduce a generated demonstration run instead of CLI sights
    #[arg(long, default_value_t = false)]
    demo: bool,
    /// Seed for the demonstration run
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Emit the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = if let Some(path) = &args.config {
        ReduceConfig::load(path)?
    } else {
        ReduceConfig::from_args(
            args.sigma,
            args.slope_filter,
            args.slope_gate.unwrap_or(DEFAULT_SLOPE_GATE),
            args.tolerance,
        )
    };

    let measurements = if args.demo {
        let generator_config = GeneratorConfig {
            seed: args.seed,
            ..Default::default()
        };
        build_sight_run(&generator_config).context("generating demonstration run")?
    } else {
        if args.measurements.is_empty() {
            return Err(ReduceError::InsufficientData.into());
        }
        parse_run(&args.measurements)?
    };

    let runner = Runner::new(config);
    let outcome = runner.execute(measurements).context("reducing sight run")?;
    let model = ReportModel::from_outcome(&outcome);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&model)?);
    } else {
        print!("{}", table::render(&model));
    }
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ReduceError>() {
        Some(ReduceError::Format { .. }) => 2,
        Some(ReduceError::InsufficientData) => 3,
        Some(ReduceError::EmptyAcceptedSet) => 4,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_the_error_taxonomy() {
        let format = anyhow::Error::new(ReduceError::Format {
            token: "oops".into(),
        });
        assert_eq!(exit_code(&format), 2);
        assert_eq!(exit_code(&anyhow::Error::new(ReduceError::InsufficientData)), 3);
        assert_eq!(
            exit_code(&anyhow::Error::new(ReduceError::EmptyAcceptedSet).context("reducing")),
            4
        );
        assert_eq!(exit_code(&anyhow::anyhow!("disk on fire")), 1);
    }
}
