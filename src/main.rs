use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use lazy_static::lazy_static;
use rand::{rngs::StdRng, SeedableRng};

use v2x_prr_pir::config::{AnalysisConfig, Scenario};
use v2x_prr_pir::constants::{ACTIVE_LOGGER, DEFAULT_OUTPUT_DIR, LOGGER_PRINTLN, RUN_LOG_PATH};
use v2x_prr_pir::logger::Logger;
use v2x_prr_pir::report::{psr_checks, write_report};
use v2x_prr_pir::sweep::run_sweep;

lazy_static!(
    static ref RUN_LOG: Logger = Logger::new(RUN_LOG_PATH, ACTIVE_LOGGER, LOGGER_PRINTLN);
);

/// Analytical PRR and PIR of SPC6G and NR-V2X sidelink scheduling.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// JSON configuration; the built-in urban and highway presets are used without it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Evaluate a single scenario
    #[arg(short, long, value_enum)]
    scenario: Option<Scenario>,

    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Simulation trace compared against the scenario selected with --scenario
    #[arg(long)]
    sim_metrics: Option<PathBuf>,

    /// PRR a distance must reach to count towards the communication range
    #[arg(long)]
    prr_threshold: Option<f64>,

    /// Shadowing draws per distance for the PSR cross-check, 0 disables it
    #[arg(long, default_value_t = 0)]
    psr_trials: u32,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(scenario) = cli.scenario {
        config.retain_scenario(scenario)?;
    }
    if let Some(path) = &cli.sim_metrics {
        config
            .attach_simulation(path.clone())
            .context("--sim-metrics applies to a single scenario, select one with --scenario")?;
    }
    if let Some(threshold) = cli.prr_threshold {
        config.prr_threshold = threshold;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let timer = Instant::now();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    RUN_LOG.write(&format!(
        "Evaluating {} scenario(s) into {}",
        config.scenarios.len(),
        cli.output_dir.display()
    ));
    let outcome = run_sweep(&config, &RUN_LOG).context("evaluating analytical metrics")?;

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let checks = psr_checks(&config, cli.psr_trials, &mut rng)?;
    if let Some(worst) = checks.iter().max_by(|a, b| a.check.deviation().total_cmp(&b.check.deviation())) {
        RUN_LOG.write(&format!(
            "PSR cross-check: worst deviation {:.4} at {} m ({})",
            worst.check.deviation(),
            worst.check.distance,
            worst.scenario
        ));
    }

    write_report(&cli.output_dir, &config, &outcome, &checks, &RUN_LOG).context("writing report")?;
    RUN_LOG.write(&format!("Analysis ended in {:.3?}", timer.elapsed()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_without_arguments() {
        let config = load_config(&Cli::parse_from(["v2x_prr_pir"])).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn sim_metrics_follows_the_selected_scenario() {
        let cli = Cli::parse_from(["v2x_prr_pir", "-s", "highway", "--sim-metrics", "sim_highway.csv"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.scenarios.len(), 1);
        assert_eq!(config.scenarios[0].scenario, Scenario::Highway);
        assert_eq!(config.scenarios[0].simulation_metrics, Some(PathBuf::from("sim_highway.csv")));
    }

    #[test]
    fn sim_metrics_without_scenario_is_rejected() {
        let cli = Cli::parse_from(["v2x_prr_pir", "--sim-metrics", "sim_urban.csv"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn prr_threshold_override_is_validated() {
        let cli = Cli::parse_from(["v2x_prr_pir", "--prr-threshold", "0.9"]);
        assert_eq!(load_config(&cli).unwrap().prr_threshold, 0.9);
        let cli = Cli::parse_from(["v2x_prr_pir", "--prr-threshold", "1.5"]);
        assert!(load_config(&cli).is_err());
    }
}
