use std::fmt;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::analytical::AnalyticalResults;
use crate::config::{CaseKey, Scenario};
use crate::error::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "SPC6G")]
    Spc6g,
    #[serde(rename = "NRV2X")]
    Nrv2x,
}

impl Protocol {
    pub const ALL: [Protocol; 2] = [Protocol::Spc6g, Protocol::Nrv2x];

    /// Decodes the integer protocol column of simulation traces.
    pub fn from_code(code: u8) -> AnalysisResult<Self> {
        match code {
            0 => Ok(Protocol::Nrv2x),
            2 => Ok(Protocol::Spc6g),
            other => Err(AnalysisError::UnknownProtocol(other)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Spc6g => "SPC6G",
            Protocol::Nrv2x => "NRV2X",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the analytical metric table. Column names follow the plotting tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub scenario: Scenario,
    pub protocol_type: Protocol,
    #[serde(rename = "MCS")]
    pub mcs: u8,
    pub numerology: u8,
    pub beta: f64,
    pub distance_bin: u32,
    #[serde(rename = "cumulative_PDR")]
    pub prr: f64,
    #[serde(rename = "cumulative_PIR")]
    pub pir: f64,
}

/// Flattens the curves of one case into rows, SPC6G first.
pub fn records_from_results(key: &CaseKey, results: &AnalyticalResults) -> Vec<MetricRecord> {
    Protocol::ALL
        .iter()
        .flat_map(move |&protocol| {
            let curve = results.curve(protocol);
            results
                .distances
                .iter()
                .zip(curve.prr.iter().zip(&curve.pir))
                .map(move |(&distance_bin, (&prr, &pir))| MetricRecord {
                    scenario: key.scenario,
                    protocol_type: protocol,
                    mcs: key.mcs,
                    numerology: key.numerology,
                    beta: key.beta,
                    distance_bin,
                    prr,
                    pir,
                })
        })
        .collect()
}

pub fn write_records<W: Write, T: Serialize>(writer: W, records: &[T]) -> AnalysisResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_metrics<R: Read>(reader: R) -> AnalysisResult<Vec<MetricRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        records.push(result?);
    }
    Ok(records)
}
