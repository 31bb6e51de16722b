use serde::Serialize;

use crate::analytical::calculate_analytical_results;
use crate::config::{AnalysisConfig, CaseKey};
use crate::error::AnalysisResult;
use crate::logger::Logger;
use crate::metrics::{records_from_results, MetricRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseSummary {
    #[serde(flatten)]
    pub key: CaseKey,
    pub resources: f64,
    pub resource_utilization: f64,
    pub sensed_neighbors: f64,
    pub sensing_threshold_dbm: f64,
    pub sensing_adjustments: u32,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepOutcome {
    pub records: Vec<MetricRecord>,
    pub cases: Vec<CaseSummary>,
}

/// Evaluates every case of every configured scenario in order.
pub fn run_sweep(config: &AnalysisConfig, logger: &Logger) -> AnalysisResult<SweepOutcome> {
    let mut outcome = SweepOutcome::default();
    for scenario in config.scenarios.iter() {
        let cases = scenario.cases()?;
        logger.write(&format!("Scenario {}: {} cases", scenario.scenario, cases.len()));
        for case in cases {
            let results = calculate_analytical_results(&case.params)?;
            let records = records_from_results(&case.key, &results);
            if results.sensing_adjustments > 0 {
                logger.write(&format!(
                    "{} MCS {} numerology {} beta {}: sensing threshold raised to {} dBm",
                    case.key.scenario,
                    case.key.mcs,
                    case.key.numerology,
                    case.key.beta,
                    results.sensing_threshold_dbm
                ));
            }
            outcome.cases.push(CaseSummary {
                key: case.key,
                resources: results.resources,
                resource_utilization: results.resource_utilization,
                sensed_neighbors: results.sensed_neighbors,
                sensing_threshold_dbm: results.sensing_threshold_dbm,
                sensing_adjustments: results.sensing_adjustments,
                rows: records.len(),
            });
            outcome.records.extend(records);
        }
    }
    logger.write(&format!("Evaluated {} rows over {} cases", outcome.records.len(), outcome.cases.len()));
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Scenario, ScenarioConfig};
    use crate::metrics::Protocol;

    fn small_config() -> AnalysisConfig {
        let mut urban = ScenarioConfig::preset(Scenario::Urban);
        urban.max_distance_m = 150;
        urban.distance_step_m = 50;
        urban.betas = vec![0.1];
        let mut highway = ScenarioConfig::preset(Scenario::Highway);
        highway.max_distance_m = 300;
        highway.distance_step_m = 100;
        highway.numerologies = vec![1];
        highway.mcs.truncate(1);
        AnalysisConfig { scenarios: vec![urban, highway], prr_threshold: 0.98 }
    }

    #[test]
    fn row_count_matches_sweep_length() {
        let config = small_config();
        let outcome = run_sweep(&config, &Logger::disabled()).unwrap();
        // urban: 2 MCS x 2 numerologies x 1 beta, highway: 1 x 1 x 2
        assert_eq!(outcome.cases.len(), 4 + 2);
        let urban_rows = 4 * 2 * 4;
        let highway_rows = 2 * 2 * 4;
        assert_eq!(outcome.records.len(), urban_rows + highway_rows);
        for summary in outcome.cases.iter() {
            assert_eq!(summary.rows, 2 * 4);
        }
    }

    #[test]
    fn all_rows_within_bounds() {
        let outcome = run_sweep(&small_config(), &Logger::disabled()).unwrap();
        for record in outcome.records.iter() {
            assert!((0.0..=1.0).contains(&record.prr), "{record:?}");
            assert!(record.pir >= 0.0, "{record:?}");
        }
        assert!(outcome.records.iter().any(|r| r.protocol_type == Protocol::Nrv2x));
    }

    #[test]
    fn sweep_is_deterministic() {
        let config = small_config();
        let first = run_sweep(&config, &Logger::disabled()).unwrap();
        let second = run_sweep(&config, &Logger::disabled()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_scenario_stops_the_sweep() {
        let mut config = small_config();
        config.scenarios[1].sensing_reserve = 0.0;
        assert!(run_sweep(&config, &Logger::disabled()).is_err());
    }
}
