use std::f64::consts::SQRT_2;

use statrs::function::erf::erf;

use crate::constants::{SENSING_WINDOW_M, SHADOWING_STD_DEV_DB};

use super::path_loss::PathLossModel;

/// Power budget of a single broadcast link under log-normal shadowing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkBudget {
    pub tx_power_dbm: f64,
    pub sensing_threshold_dbm: f64,
    pub shadowing_std_dev_db: f64,
    pub path_loss: PathLossModel,
}

impl LinkBudget {
    pub fn new(tx_power_dbm: f64, sensing_threshold_dbm: f64, path_loss: PathLossModel) -> Self {
        LinkBudget {
            tx_power_dbm,
            sensing_threshold_dbm,
            shadowing_std_dev_db: SHADOWING_STD_DEV_DB,
            path_loss,
        }
    }

    pub fn with_sensing_threshold(&self, sensing_threshold_dbm: f64) -> Self {
        LinkBudget { sensing_threshold_dbm, ..*self }
    }

    /// Mean margin above the sensing threshold. The path loss is taken at `|d| + 1`
    /// so a co-located receiver sits at the 1 m reference distance.
    pub fn margin_db(&self, distance: f64) -> f64 {
        self.tx_power_dbm - self.path_loss.get_path_loss(distance.abs() + 1.0) - self.sensing_threshold_dbm
    }

    /// Probability that a packet sent over `distance` is received above the sensing threshold.
    pub fn packet_success_rate(&self, distance: f64) -> f64 {
        0.5 * (1.0 + erf(self.margin_db(distance) / (self.shadowing_std_dev_db * SQRT_2)))
    }

    /// Expected number of vehicles sensed within the window at density `beta`.
    pub fn sensed_neighbors(&self, beta: f64) -> f64 {
        let sum: f64 = (-SENSING_WINDOW_M..SENSING_WINDOW_M)
            .map(|d| self.packet_success_rate(d as f64))
            .sum();
        beta * sum
    }
}

/// Correlation between the sensing outcomes of two vehicles `distance` apart.
pub fn correlation(distance: f64) -> f64 {
    (-distance).exp()
}
