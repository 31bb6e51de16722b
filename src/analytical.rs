use serde::Serialize;

use crate::constants::{MAX_NUMEROLOGY, SENSING_STEP_DB};
use crate::error::{AnalysisError, AnalysisResult};
use crate::formulas::{
    collision_probability, db_to_linear, interference_distance, overlap, pir, prr,
    reselection_factor, resource_utilization, success_probability, utility,
};
use crate::metrics::Protocol;
use crate::radio::link::LinkBudget;
use crate::radio::neighbors::NeighborModel;
use crate::radio::path_loss::PathLossModel;

const MAX_SENSING_ADJUSTMENTS: u32 = 100;

/// One fully specified evaluation point: a scenario at a fixed MCS, numerology and density.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticalParams {
    /// Subchannels occupied by one packet.
    pub channels: u32,
    pub sinr_threshold_db: f64,
    /// Vehicle density in vehicles per metre.
    pub beta: f64,
    pub tx_power_dbm: f64,
    pub carrier_frequency_ghz: f64,
    pub path_loss_exponent: f64,
    pub sensing_threshold_dbm: f64,
    pub noise_power_dbm: f64,
    /// Subchannels in the resource pool.
    pub pool_subchannels: u32,
    pub slot_s: f64,
    /// Fraction of the pool kept free by raising the sensing threshold.
    pub sensing_reserve: f64,
    pub rc1: f64,
    pub rc2: f64,
    pub rri_s: f64,
    /// Overrides the `RU / R` estimate of how often an interferer keeps its reservation.
    pub reservation_keep_probability: Option<f64>,
    pub max_distance_m: u32,
    pub distance_step_m: u32,
}

impl AnalyticalParams {
    pub fn validate(&self) -> AnalysisResult<()> {
        if !(self.beta > 0.0 && self.beta <= 1.0) {
            return Err(AnalysisError::invalid("beta", format!("{} is not in (0, 1]", self.beta)));
        }
        if !(self.sensing_reserve > 0.0 && self.sensing_reserve < 1.0) {
            return Err(AnalysisError::invalid(
                "sensing_reserve",
                format!("{} is not in (0, 1)", self.sensing_reserve),
            ));
        }
        if !(self.rc1 > 0.0 && self.rc2 > 0.0) {
            return Err(AnalysisError::invalid("rc1/rc2", "reselection counters must be positive"));
        }
        for (name, value) in [
            ("rri_s", self.rri_s),
            ("slot_s", self.slot_s),
            ("carrier_frequency_ghz", self.carrier_frequency_ghz),
            ("path_loss_exponent", self.path_loss_exponent),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(AnalysisError::invalid(name, format!("{value} must be positive")));
            }
        }
        if self.distance_step_m == 0 {
            return Err(AnalysisError::invalid("distance_step_m", "step must be positive"));
        }
        if self.sweep_end().is_none() {
            return Err(AnalysisError::invalid(
                "max_distance_m",
                format!("{} plus a {} m step overflows", self.max_distance_m, self.distance_step_m),
            ));
        }
        if self.channels == 0 || self.channels as f64 >= self.resources() {
            return Err(AnalysisError::invalid(
                "channels",
                format!("{} subchannels do not fit a pool of {} resources", self.channels, self.resources()),
            ));
        }
        if let Some(keep) = self.reservation_keep_probability {
            if !(0.0..=1.0).contains(&keep) {
                return Err(AnalysisError::invalid(
                    "reservation_keep_probability",
                    format!("{keep} is not a probability"),
                ));
            }
        }
        Ok(())
    }

    /// Resources `R` in one reservation interval.
    pub fn resources(&self) -> f64 {
        self.pool_subchannels as f64 * (self.rri_s / self.slot_s)
    }

    /// Distance samples `0, step, ...` strictly below `max_distance + step`.
    pub fn distances(&self) -> Vec<u32> {
        let end = self.sweep_end().unwrap_or(u32::MAX);
        (0..end).step_by(self.distance_step_m.max(1) as usize).collect()
    }

    fn sweep_end(&self) -> Option<u32> {
        self.max_distance_m.checked_add(self.distance_step_m)
    }

    pub fn path_loss(&self) -> PathLossModel {
        PathLossModel::from_carrier(self.carrier_frequency_ghz, self.path_loss_exponent)
    }
}

/// Slot duration of an NR numerology.
pub fn slot_duration(numerology: u8) -> AnalysisResult<f64> {
    if numerology > MAX_NUMEROLOGY {
        return Err(AnalysisError::invalid("numerology", format!("{numerology} exceeds {MAX_NUMEROLOGY}")));
    }
    Ok(crate::constants::NR_SUBFRAME_S / f64::from(1u32 << numerology))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProtocolCurve {
    pub prr: Vec<f64>,
    pub pir: Vec<f64>,
}

impl ProtocolCurve {
    fn push(&mut self, outage: f64, rri: f64) {
        self.prr.push(prr(outage));
        self.pir.push(pir(outage, rri));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticalResults {
    pub distances: Vec<u32>,
    pub spc6g: ProtocolCurve,
    pub nrv2x: ProtocolCurve,
    /// Threshold after the RU ceiling was enforced.
    pub sensing_threshold_dbm: f64,
    pub sensing_adjustments: u32,
    pub resources: f64,
    pub resource_utilization: f64,
    pub sensed_neighbors: f64,
}

impl AnalyticalResults {
    pub fn curve(&self, protocol: Protocol) -> &ProtocolCurve {
        match protocol {
            Protocol::Spc6g => &self.spc6g,
            Protocol::Nrv2x => &self.nrv2x,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SensingState {
    budget: LinkBudget,
    sensed: f64,
    utilized: f64,
    adjustments: u32,
}

/// Raises the sensing threshold in 3 dB steps until resource utilization drops to
/// `(1 - s) R` or below.
fn adapt_sensing_threshold(params: &AnalyticalParams, resources: f64) -> AnalysisResult<SensingState> {
    let occupancy = params.channels as f64 / resources;
    let ceiling = (1.0 - params.sensing_reserve) * resources;
    let mut budget = LinkBudget::new(params.tx_power_dbm, params.sensing_threshold_dbm, params.path_loss());
    let mut sensed = budget.sensed_neighbors(params.beta);
    let mut utilized = resource_utilization(resources, sensed, occupancy);
    let mut adjustments = 0;

    while utilized > ceiling {
        if adjustments == MAX_SENSING_ADJUSTMENTS {
            return Err(AnalysisError::Degenerate(format!(
                "resource utilization {utilized:.2} stays above {ceiling:.2} after {adjustments} threshold raises"
            )));
        }
        budget = budget.with_sensing_threshold(budget.sensing_threshold_dbm + SENSING_STEP_DB);
        sensed = budget.sensed_neighbors(params.beta);
        utilized = resource_utilization(resources, sensed, occupancy);
        adjustments += 1;
    }

    if sensed <= 0.0 {
        return Err(AnalysisError::Degenerate(format!(
            "no neighbour is sensed at {} dBm",
            budget.sensing_threshold_dbm
        )));
    }
    Ok(SensingState { budget, sensed, utilized, adjustments })
}

/// Evaluates PRR and PIR of SPC6G and NR-V2X over the distance sweep of `params`.
pub fn calculate_analytical_results(params: &AnalyticalParams) -> AnalysisResult<AnalyticalResults> {
    params.validate()?;

    let path_loss = params.path_loss();
    let tx_power = db_to_linear(params.tx_power_dbm);
    let gain = path_loss.reference_gain_linear();
    let noise = db_to_linear(params.noise_power_dbm);
    let sinr_threshold = db_to_linear(params.sinr_threshold_db);

    let resources = params.resources();
    let channels = params.channels as f64;
    let sensing = adapt_sensing_threshold(params, resources)?;
    let free = resources - sensing.utilized;
    let keep = params
        .reservation_keep_probability
        .unwrap_or(sensing.utilized / resources);

    let mut neighbors = NeighborModel::new(sensing.budget, params.beta);
    let step = (1.0 / params.beta) as usize;
    let distances = params.distances();
    let mut spc6g = ProtocolCurve::default();
    let mut nrv2x = ProtocolCurve::default();

    for &d_ij in distances.iter() {
        let d_ij = d_ij as f64;
        let d_int = interference_distance(
            tx_power,
            gain,
            sinr_threshold,
            d_ij + 1.0,
            params.path_loss_exponent,
            noise,
        );
        let Some(d_int) = d_int else {
            spc6g.push(1.0, params.rri_s);
            nrv2x.push(1.0, params.rri_s);
            continue;
        };
        let lo = (d_ij - d_int) as i64;
        let hi = (d_ij + d_int) as i64;

        let mut success_spc6g = 1.0;
        let mut success_nrv2x = 1.0;
        for position in (lo..hi).step_by(step) {
            let d_ik = position.unsigned_abs();
            let psr = neighbors.packet_success_rate(d_ik);
            let common = neighbors.common(d_ik);
            let u = utility(resources, sensing.utilized, common, sensing.sensed);
            let o = overlap(resources, sensing.utilized, u);
            let mu = reselection_factor(params.rc1, params.rc2, psr);
            let p = collision_probability(mu, o, channels, free);
            success_spc6g *= success_probability(p, keep);
            success_nrv2x *= 1.0 - p;
        }

        spc6g.push(1.0 - success_spc6g, params.rri_s);
        nrv2x.push(1.0 - success_nrv2x, params.rri_s);
    }

    Ok(AnalyticalResults {
        distances,
        spc6g,
        nrv2x,
        sensing_threshold_dbm: sensing.budget.sensing_threshold_dbm,
        sensing_adjustments: sensing.adjustments,
        resources,
        resource_utilization: sensing.utilized,
        sensed_neighbors: sensing.sensed,
    })
}
