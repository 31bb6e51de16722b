//! Simulation traces and their comparison with the analytical table.
//!
//! Traces carry protocols as integer codes and densities as a lane count, so rows are
//! normalised into [`SimRecord`] before they are matched against [`MetricRecord`]s.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Scenario;
use crate::constants::{BETA_TOLERANCE, LANE_DENSITY_DIVISOR};
use crate::error::{AnalysisError, AnalysisResult};
use crate::metrics::{MetricRecord, Protocol};

#[derive(Debug, Deserialize)]
struct RawSimRecord {
    protocol_type: u8,
    #[serde(rename = "MCS")]
    mcs: u8,
    numerology: u8,
    num_lanes: f64,
    distance_bin: f64,
    #[serde(rename = "cumulative_PDR")]
    prr: f64,
    #[serde(rename = "cumulative_PIR")]
    pir: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimRecord {
    pub protocol: Protocol,
    pub mcs: u8,
    pub numerology: u8,
    pub beta: f64,
    pub distance_bin: f64,
    pub prr: f64,
    pub pir: f64,
}

impl TryFrom<RawSimRecord> for SimRecord {
    type Error = AnalysisError;

    fn try_from(raw: RawSimRecord) -> Result<Self, Self::Error> {
        Ok(SimRecord {
            protocol: Protocol::from_code(raw.protocol_type)?,
            mcs: raw.mcs,
            numerology: raw.numerology,
            beta: raw.num_lanes / LANE_DENSITY_DIVISOR,
            distance_bin: raw.distance_bin,
            prr: raw.prr,
            pir: raw.pir,
        })
    }
}

/// Rows of one simulation trace. Rows of schemes other than SPC6G and NR-V2X are
/// dropped and only counted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimTrace {
    pub records: Vec<SimRecord>,
    pub skipped: usize,
}

pub fn read_sim_metrics<R: Read>(reader: R) -> AnalysisResult<SimTrace> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut trace = SimTrace::default();
    for result in rdr.deserialize::<RawSimRecord>() {
        match SimRecord::try_from(result?) {
            Ok(record) => trace.records.push(record),
            Err(AnalysisError::UnknownProtocol(_)) => trace.skipped += 1,
            Err(e) => return Err(e),
        }
    }
    Ok(trace)
}

pub fn load_sim_metrics<P: AsRef<Path>>(path: P) -> AnalysisResult<SimTrace> {
    read_sim_metrics(File::open(path)?)
}

pub fn beta_matches(a: f64, b: f64) -> bool {
    (a - b).abs() < BETA_TOLERANCE
}

/// Analytical row with the simulated sample at the same point, when there is one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub scenario: Scenario,
    pub protocol_type: Protocol,
    #[serde(rename = "MCS")]
    pub mcs: u8,
    pub numerology: u8,
    pub beta: f64,
    pub distance_bin: u32,
    pub prr_analytical: f64,
    pub pir_analytical: f64,
    pub prr_simulated: Option<f64>,
    pub pir_simulated: Option<f64>,
}

/// Pairs every analytical row of `scenario` with the simulated sample at the same
/// protocol, MCS, numerology, density and distance.
pub fn compare(scenario: Scenario, analytical: &[MetricRecord], simulated: &[SimRecord]) -> Vec<ComparisonRow> {
    analytical
        .iter()
        .filter(|r| r.scenario == scenario)
        .map(|r| {
            let sim = simulated.iter().find(|s| {
                s.protocol == r.protocol_type
                    && s.mcs == r.mcs
                    && s.numerology == r.numerology
                    && beta_matches(s.beta, r.beta)
                    && (s.distance_bin - r.distance_bin as f64).abs() < 0.5
            });
            ComparisonRow {
                scenario,
                protocol_type: r.protocol_type,
                mcs: r.mcs,
                numerology: r.numerology,
                beta: r.beta,
                distance_bin: r.distance_bin,
                prr_analytical: r.prr,
                pir_analytical: r.pir,
                prr_simulated: sim.map(|s| s.prr),
                pir_simulated: sim.map(|s| s.pir),
            }
        })
        .collect()
}

/// Largest distance whose PRR reaches `threshold`, or 0 when none does.
pub fn communication_range<I>(samples: I, threshold: f64) -> u32
where
    I: IntoIterator<Item = (u32, f64)>,
{
    samples
        .into_iter()
        .filter(|&(_, prr)| prr >= threshold)
        .map(|(distance, _)| distance)
        .max()
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeRecord {
    pub scenario: Scenario,
    pub protocol_type: Protocol,
    pub beta: f64,
    #[serde(rename = "MCS")]
    pub mcs: u8,
    pub range_m: u32,
}

/// Communication range per scenario, protocol, density and MCS. Numerologies are pooled.
pub fn communication_ranges(records: &[MetricRecord], threshold: f64) -> Vec<RangeRecord> {
    // beta is keyed by its bit pattern; densities come from the same config values
    let mut groups: BTreeMap<(Scenario, Protocol, u64, u8), Vec<(u32, f64)>> = BTreeMap::new();
    for r in records {
        groups
            .entry((r.scenario, r.protocol_type, r.beta.to_bits(), r.mcs))
            .or_default()
            .push((r.distance_bin, r.prr));
    }
    groups
        .into_iter()
        .map(|((scenario, protocol_type, beta, mcs), samples)| RangeRecord {
            scenario,
            protocol_type,
            beta: f64::from_bits(beta),
            mcs,
            range_m: communication_range(samples, threshold),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "\
protocol_type,MCS,numerology,num_lanes,distance_bin,cumulative_PDR,cumulative_PIR
2,4,0,4,0,0.999,0.1001
2,4,0,4,100,0.97,0.103
0,4,0,4,100,0.95,0.105
0,4,1,8,100,0.9,0.11
";

    fn record(protocol: Protocol, numerology: u8, beta: f64, distance_bin: u32, prr: f64) -> MetricRecord {
        MetricRecord {
            scenario: Scenario::Urban,
            protocol_type: protocol,
            mcs: 4,
            numerology,
            beta,
            distance_bin,
            prr,
            pir: 0.1 / prr,
        }
    }

    #[test]
    fn parses_trace_codes_and_lanes() {
        let trace = read_sim_metrics(TRACE.as_bytes()).unwrap();
        assert_eq!(trace.skipped, 0);
        let sims = trace.records;
        assert_eq!(sims.len(), 4);
        assert_eq!(sims[0].protocol, Protocol::Spc6g);
        assert_eq!(sims[2].protocol, Protocol::Nrv2x);
        assert_eq!(sims[0].beta, 0.1);
        assert_eq!(sims[3].beta, 0.2);
    }

    #[test]
    fn rows_of_other_schemes_are_skipped() {
        let text = format!("{TRACE}1,4,0,4,100,0.5,0.2\n3,4,0,4,0,1.0,0.1\n");
        let trace = read_sim_metrics(text.as_bytes()).unwrap();
        assert_eq!(trace.skipped, 2);
        assert_eq!(trace.records, read_sim_metrics(TRACE.as_bytes()).unwrap().records);
    }

    #[test]
    fn malformed_rows_are_still_errors() {
        let text = format!("{TRACE}two,4,0,4,100,0.5,0.2\n");
        assert!(matches!(read_sim_metrics(text.as_bytes()), Err(AnalysisError::Csv(_))));
    }

    #[test]
    fn beta_tolerance() {
        assert!(beta_matches(0.1, 0.1005));
        assert!(!beta_matches(0.1, 0.102));
    }

    #[test]
    fn comparison_fills_matching_samples_only() {
        let sims = read_sim_metrics(TRACE.as_bytes()).unwrap().records;
        let analytical = vec![
            record(Protocol::Spc6g, 0, 0.1, 100, 0.98),
            record(Protocol::Nrv2x, 0, 0.1, 100, 0.96),
            record(Protocol::Nrv2x, 0, 0.1, 200, 0.9),
            MetricRecord { scenario: Scenario::Highway, ..record(Protocol::Nrv2x, 0, 0.1, 100, 0.5) },
        ];
        let rows = compare(Scenario::Urban, &analytical, &sims);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].prr_simulated, Some(0.97));
        assert_eq!(rows[1].pir_simulated, Some(0.105));
        assert_eq!(rows[2].prr_simulated, None);

        let mut buf = Vec::new();
        crate::metrics::write_records(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.lines().last().unwrap().ends_with(",,"));
    }

    #[test]
    fn range_is_farthest_distance_meeting_threshold() {
        let samples = vec![(0, 1.0), (100, 0.99), (200, 0.97), (300, 0.985)];
        assert_eq!(communication_range(samples.clone(), 0.98), 300);
        assert_eq!(communication_range(samples, 0.999), 0);
        assert_eq!(communication_range(Vec::new(), 0.5), 0);
    }

    #[test]
    fn ranges_pool_numerologies() {
        let records = vec![
            record(Protocol::Spc6g, 0, 0.1, 100, 0.99),
            record(Protocol::Spc6g, 1, 0.1, 200, 0.985),
            record(Protocol::Spc6g, 0, 0.2, 100, 0.9),
            record(Protocol::Nrv2x, 0, 0.1, 100, 0.99),
        ];
        let ranges = communication_ranges(&records, 0.98);
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0].protocol_type, Protocol::Spc6g);
        assert_eq!(ranges[0].beta, 0.1);
        assert_eq!(ranges[0].range_m, 200);
        assert_eq!(ranges[1].range_m, 0);
        assert_eq!(ranges[2].protocol_type, Protocol::Nrv2x);
        assert_eq!(ranges[2].range_m, 100);
    }
}
