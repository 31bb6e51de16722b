use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::Serialize;

use crate::config::{AnalysisConfig, Scenario};
use crate::constants::{COMPARISON_CSV, METRICS_CSV, RANGE_CSV, SUMMARY_JSON};
use crate::error::AnalysisResult;
use crate::logger::Logger;
use crate::metrics::write_records;
use crate::radio::link::LinkBudget;
use crate::radio::shadowing::{check_psr, PsrCheck};
use crate::simulation::{communication_ranges, compare, load_sim_metrics};
use crate::sweep::{CaseSummary, SweepOutcome};

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioPsrCheck {
    pub scenario: Scenario,
    #[serde(flatten)]
    pub check: PsrCheck,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    prr_threshold: f64,
    rows: usize,
    cases: &'a [CaseSummary],
    psr_checks: &'a [ScenarioPsrCheck],
}

/// Cross-checks the closed-form PSR of each scenario against shadowing draws at
/// every configured distance sample.
pub fn psr_checks<R: Rng + ?Sized>(config: &AnalysisConfig, trials: u32, rng: &mut R) -> AnalysisResult<Vec<ScenarioPsrCheck>> {
    let mut checks = Vec::new();
    if trials == 0 {
        return Ok(checks);
    }
    for scenario in config.scenarios.iter() {
        let Some(case) = scenario.cases()?.into_iter().next() else {
            continue;
        };
        let budget = LinkBudget::new(
            scenario.tx_power_dbm,
            scenario.sensing_threshold_dbm,
            case.params.path_loss(),
        );
        let distances: Vec<f64> = case.params.distances().into_iter().map(f64::from).collect();
        checks.extend(
            check_psr(&budget, &distances, trials, rng)?
                .into_iter()
                .map(|check| ScenarioPsrCheck { scenario: scenario.scenario, check }),
        );
    }
    Ok(checks)
}

/// Writes every output table into `dir` and returns the written paths.
pub fn write_report(
    dir: &Path,
    config: &AnalysisConfig,
    outcome: &SweepOutcome,
    psr_checks: &[ScenarioPsrCheck],
    logger: &Logger,
) -> AnalysisResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let path = dir.join(METRICS_CSV);
    write_records(BufWriter::new(File::create(&path)?), &outcome.records)?;
    written.push(path);

    let path = dir.join(RANGE_CSV);
    let ranges = communication_ranges(&outcome.records, config.prr_threshold);
    write_records(BufWriter::new(File::create(&path)?), &ranges)?;
    written.push(path);

    let mut comparison = Vec::new();
    let mut has_simulation = false;
    for scenario in config.scenarios.iter() {
        if let Some(sim_path) = &scenario.simulation_metrics {
            let trace = load_sim_metrics(sim_path)?;
            logger.write(&format!(
                "Loaded {} simulated samples for {} from {} ({} rows of other schemes skipped)",
                trace.records.len(),
                scenario.scenario,
                sim_path.display(),
                trace.skipped
            ));
            comparison.extend(compare(scenario.scenario, &outcome.records, &trace.records));
            has_simulation = true;
        }
    }
    if has_simulation {
        let path = dir.join(COMPARISON_CSV);
        write_records(BufWriter::new(File::create(&path)?), &comparison)?;
        written.push(path);
    }

    let path = dir.join(SUMMARY_JSON);
    let summary = RunSummary {
        prr_threshold: config.prr_threshold,
        rows: outcome.records.len(),
        cases: &outcome.cases,
        psr_checks,
    };
    serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), &summary)?;
    written.push(path);

    for path in written.iter() {
        logger.write(&format!("Wrote {}", path.display()));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::config::ScenarioConfig;
    use crate::metrics::read_metrics;
    use crate::sweep::run_sweep;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("v2x_report_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn small_config() -> AnalysisConfig {
        let mut urban = ScenarioConfig::preset(Scenario::Urban);
        urban.max_distance_m = 100;
        urban.distance_step_m = 50;
        urban.betas = vec![0.1];
        urban.numerologies = vec![0];
        AnalysisConfig { scenarios: vec![urban], prr_threshold: 0.98 }
    }

    #[test]
    fn writes_tables_and_summary() {
        let dir = scratch_dir("tables");
        let config = small_config();
        let outcome = run_sweep(&config, &Logger::disabled()).unwrap();
        let written = write_report(&dir, &config, &outcome, &[], &Logger::disabled()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(!dir.join(COMPARISON_CSV).exists());

        let metrics = read_metrics(File::open(dir.join(METRICS_CSV)).unwrap()).unwrap();
        assert_eq!(metrics, outcome.records);

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join(SUMMARY_JSON)).unwrap()).unwrap();
        assert_eq!(summary["rows"], outcome.records.len());
        assert_eq!(summary["cases"].as_array().unwrap().len(), 2);
        assert_eq!(summary["cases"][0]["scenario"], "urban");

        let ranges = fs::read_to_string(dir.join(RANGE_CSV)).unwrap();
        assert_eq!(ranges.lines().next().unwrap(), "scenario,protocol_type,beta,MCS,range_m");
        assert_eq!(ranges.lines().count(), 1 + 2 * 2);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn writes_comparison_when_simulation_is_configured() {
        let dir = scratch_dir("comparison");
        fs::create_dir_all(&dir).unwrap();
        let sim_path = dir.join("sim_metrics_data_urban.csv");
        fs::write(
            &sim_path,
            "protocol_type,MCS,numerology,num_lanes,distance_bin,cumulative_PDR,cumulative_PIR\n\
             2,4,0,4,50,0.99,0.101\n\
             1,4,0,4,50,0.5,0.2\n",
        )
        .unwrap();
        let mut config = small_config();
        config.scenarios[0].simulation_metrics = Some(sim_path);

        let outcome = run_sweep(&config, &Logger::disabled()).unwrap();
        write_report(&dir, &config, &outcome, &[], &Logger::disabled()).unwrap();
        let comparison = fs::read_to_string(dir.join(COMPARISON_CSV)).unwrap();
        assert_eq!(comparison.lines().count(), 1 + outcome.records.len());
        let matched: Vec<&str> = comparison.lines().filter(|l| l.ends_with(",0.99,0.101")).collect();
        assert_eq!(matched.len(), 1);
        assert!(matched[0].starts_with("urban,SPC6G,4,0,0.1,50,"));
        assert!(!comparison.contains(",0.5,0.2"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_simulation_file_is_an_error() {
        let dir = scratch_dir("missing");
        let mut config = small_config();
        config.scenarios[0].simulation_metrics = Some(dir.join("absent.csv"));
        let outcome = run_sweep(&config, &Logger::disabled()).unwrap();
        assert!(write_report(&dir, &config, &outcome, &[], &Logger::disabled()).is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn psr_checks_cover_each_distance() {
        let config = small_config();
        let mut rng = StdRng::seed_from_u64(11);
        let checks = psr_checks(&config, 2_000, &mut rng).unwrap();
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|c| c.scenario == Scenario::Urban && c.check.deviation() < 0.05));
        assert!(psr_checks(&config, 0, &mut rng).unwrap().is_empty());
    }
}
