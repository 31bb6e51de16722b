/*
Path loss: L = -K_0 + 10 n log10(d)
L:   path loss in decibels (dB)
K_0: reference gain at 1 m, -(32.4 + 20 log10(fc)) with fc in GHz
d:   distance between the transmitter and receiver in metres
n:   path loss exponent
*/

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathLossModel {
    pub reference_gain_db: f64,
    pub exponent: f64,
}

impl PathLossModel {
    pub fn from_carrier(carrier_frequency_ghz: f64, exponent: f64) -> Self {
        PathLossModel {
            reference_gain_db: -(32.4 + 20.0 * carrier_frequency_ghz.log10()),
            exponent,
        }
    }

    pub fn reference_gain_linear(&self) -> f64 {
        crate::formulas::db_to_linear(self.reference_gain_db)
    }

    pub fn get_path_loss(&self, distance: f64) -> f64 {
        -self.reference_gain_db + 10.0 * self.exponent * distance.log10()
    }
}
