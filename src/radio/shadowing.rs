use rand::distributions::Distribution;
use rand::Rng;
use serde::Serialize;
use statrs::distribution::Normal;

use crate::error::{AnalysisError, AnalysisResult};

use super::link::LinkBudget;

/// Zero-mean Gaussian shadowing in dB.
#[derive(Clone, Copy, Debug)]
pub struct Shadowing {
    normal: Normal,
}

impl Shadowing {
    pub fn new(std_dev_db: f64) -> AnalysisResult<Self> {
        let normal = Normal::new(0.0, std_dev_db)
            .map_err(|e| AnalysisError::invalid("shadowing_std_dev_db", format!("{std_dev_db}: {e}")))?;
        Ok(Shadowing { normal })
    }
}

impl Distribution<f64> for Shadowing {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.normal.sample(rng)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PsrCheck {
    pub distance: f64,
    pub analytical: f64,
    pub empirical: f64,
    pub trials: u32,
}

impl PsrCheck {
    pub fn deviation(&self) -> f64 {
        (self.analytical - self.empirical).abs()
    }
}

/// Fraction of `trials` shadowing draws for which a packet over `distance` clears
/// the sensing threshold.
pub fn estimate_psr<R: Rng + ?Sized>(
    budget: &LinkBudget,
    distance: f64,
    trials: u32,
    rng: &mut R,
) -> AnalysisResult<f64> {
    let shadowing = Shadowing::new(budget.shadowing_std_dev_db)?;
    if trials == 0 {
        return Ok(0.0);
    }
    let margin = budget.margin_db(distance);
    let received = (0..trials).filter(|_| shadowing.sample(rng) < margin).count();
    Ok(received as f64 / trials as f64)
}

pub fn check_psr<R: Rng + ?Sized>(
    budget: &LinkBudget,
    distances: &[f64],
    trials: u32,
    rng: &mut R,
) -> AnalysisResult<Vec<PsrCheck>> {
    distances
        .iter()
        .map(|&distance| {
            Ok(PsrCheck {
                distance,
                analytical: budget.packet_success_rate(distance),
                empirical: estimate_psr(budget, distance, trials, rng)?,
                trials,
            })
        })
        .collect()
}
