use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analytical::{slot_duration, AnalyticalParams};
use crate::constants::DEFAULT_PRR_THRESHOLD;
use crate::error::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Urban,
    Highway,
}

impl Scenario {
    pub const ALL: [Scenario; 2] = [Scenario::Urban, Scenario::Highway];

    pub fn get_path_loss_exponent(&self) -> f64 {
        match self {
            Scenario::Urban => 2.75,
            Scenario::Highway => 2.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Urban => "urban",
            Scenario::Highway => "highway",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Link requirements of one modulation and coding scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McsProfile {
    pub index: u8,
    pub sinr_threshold_db: f64,
    /// Subchannels one packet occupies at this MCS.
    pub subchannels: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub scenario: Scenario,
    pub tx_power_dbm: f64,
    pub carrier_frequency_ghz: f64,
    pub path_loss_exponent: f64,
    pub sensing_threshold_dbm: f64,
    pub noise_power_dbm: f64,
    pub pool_subchannels: u32,
    pub rri_s: f64,
    pub sensing_reserve: f64,
    pub reselection_counter_min: f64,
    pub reselection_counter_max: f64,
    #[serde(default)]
    pub reservation_keep_probability: Option<f64>,
    pub max_distance_m: u32,
    pub distance_step_m: u32,
    pub betas: Vec<f64>,
    pub numerologies: Vec<u8>,
    pub mcs: Vec<McsProfile>,
    /// Simulation trace to compare against, if any.
    #[serde(default)]
    pub simulation_metrics: Option<PathBuf>,
}

/// Identifies one evaluated case inside a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CaseKey {
    pub scenario: Scenario,
    pub mcs: u8,
    pub numerology: u8,
    pub beta: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub key: CaseKey,
    pub params: AnalyticalParams,
}

fn default_mcs_profiles() -> Vec<McsProfile> {
    vec![
        McsProfile { index: 4, sinr_threshold_db: 4.0, subchannels: 2 },
        McsProfile { index: 11, sinr_threshold_db: 10.0, subchannels: 1 },
    ]
}

impl ScenarioConfig {
    pub fn preset(scenario: Scenario) -> Self {
        let (max_distance_m, distance_step_m, betas) = match scenario {
            Scenario::Urban => (300, 25, vec![0.1, 0.2]),
            Scenario::Highway => (1000, 50, vec![0.05, 0.1]),
        };
        ScenarioConfig {
            scenario,
            tx_power_dbm: 23.0,
            carrier_frequency_ghz: 5.9,
            path_loss_exponent: scenario.get_path_loss_exponent(),
            sensing_threshold_dbm: -100.0,
            noise_power_dbm: -98.0,
            pool_subchannels: 10,
            rri_s: 0.1,
            sensing_reserve: 0.2,
            reselection_counter_min: 5.0,
            reselection_counter_max: 15.0,
            reservation_keep_probability: None,
            max_distance_m,
            distance_step_m,
            betas,
            numerologies: vec![0, 1],
            mcs: default_mcs_profiles(),
            simulation_metrics: None,
        }
    }

    /// Expands the sweep lists into cases, ordered by MCS, then numerology, then density.
    pub fn cases(&self) -> AnalysisResult<Vec<Case>> {
        if self.betas.is_empty() || self.numerologies.is_empty() || self.mcs.is_empty() {
            return Err(AnalysisError::invalid(
                "scenario",
                format!("{} needs at least one beta, numerology and MCS", self.scenario),
            ));
        }
        let mut cases = Vec::with_capacity(self.mcs.len() * self.numerologies.len() * self.betas.len());
        for mcs in self.mcs.iter() {
            for &numerology in self.numerologies.iter() {
                let slot_s = slot_duration(numerology)?;
                for &beta in self.betas.iter() {
                    let params = AnalyticalParams {
                        channels: mcs.subchannels,
                        sinr_threshold_db: mcs.sinr_threshold_db,
                        beta,
                        tx_power_dbm: self.tx_power_dbm,
                        carrier_frequency_ghz: self.carrier_frequency_ghz,
                        path_loss_exponent: self.path_loss_exponent,
                        sensing_threshold_dbm: self.sensing_threshold_dbm,
                        noise_power_dbm: self.noise_power_dbm,
                        pool_subchannels: self.pool_subchannels,
                        slot_s,
                        sensing_reserve: self.sensing_reserve,
                        rc1: self.reselection_counter_min,
                        rc2: self.reselection_counter_max,
                        rri_s: self.rri_s,
                        reservation_keep_probability: self.reservation_keep_probability,
                        max_distance_m: self.max_distance_m,
                        distance_step_m: self.distance_step_m,
                    };
                    params.validate()?;
                    cases.push(Case {
                        key: CaseKey { scenario: self.scenario, mcs: mcs.index, numerology, beta },
                        params,
                    });
                }
            }
        }
        Ok(cases)
    }
}

fn default_prr_threshold() -> f64 {
    DEFAULT_PRR_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub scenarios: Vec<ScenarioConfig>,
    /// PRR a distance must reach to count towards the communication range.
    #[serde(default = "default_prr_threshold")]
    pub prr_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            scenarios: Scenario::ALL.iter().map(|&s| ScenarioConfig::preset(s)).collect(),
            prr_threshold: DEFAULT_PRR_THRESHOLD,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json(content: &str) -> AnalysisResult<Self> {
        let config: AnalysisConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> AnalysisResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if self.scenarios.is_empty() {
            return Err(AnalysisError::invalid("scenarios", "no scenario configured"));
        }
        if !(0.0..=1.0).contains(&self.prr_threshold) {
            return Err(AnalysisError::invalid(
                "prr_threshold",
                format!("{} is not a probability", self.prr_threshold),
            ));
        }
        for scenario in self.scenarios.iter() {
            scenario.cases()?;
        }
        Ok(())
    }

    /// Keeps only the configs of `scenario`.
    pub fn retain_scenario(&mut self, scenario: Scenario) -> AnalysisResult<()> {
        self.scenarios.retain(|s| s.scenario == scenario);
        if self.scenarios.is_empty() {
            return Err(AnalysisError::invalid("scenario", format!("{scenario} is not configured")));
        }
        Ok(())
    }

    /// Compares the only configured scenario against the trace at `path`. Traces carry
    /// no scenario column, so a config with several scenarios is rejected.
    pub fn attach_simulation(&mut self, path: PathBuf) -> AnalysisResult<()> {
        match self.scenarios.as_mut_slice() {
            [scenario] => {
                scenario.simulation_metrics = Some(path);
                Ok(())
            }
            scenarios => Err(AnalysisError::invalid(
                "simulation_metrics",
                format!("a trace needs exactly one scenario, {} are configured", scenarios.len()),
            )),
        }
    }
}
