//! Closed-form terms of the sidelink reception model.
//!
//! Every function here is pure. Distances are in metres, powers in linear units
//! unless the name says `_db`.

pub fn db_to_linear(value_db: f64) -> f64 {
    10f64.powf(value_db / 10.0)
}

/// Distance beyond which a single interferer no longer breaks a link of length `d_ij`.
///
/// `gain` is the path gain constant `K_0`, `sinr_threshold` is linear. Returns `None`
/// when the link misses the SINR threshold on noise alone, i.e. no interferer
/// distance can save it.
pub fn interference_distance(
    tx_power: f64,
    gain: f64,
    sinr_threshold: f64,
    d_ij: f64,
    exponent: f64,
    noise: f64,
) -> Option<f64> {
    let numerator = tx_power * gain;
    let denominator = numerator / (sinr_threshold * d_ij.powf(exponent)) - noise;
    if denominator <= 0.0 {
        return None;
    }
    Some((numerator / denominator).powf(1.0 / exponent))
}

/// Resources occupied in a pool of `resources` when `sensed` neighbours each pick
/// a resource with probability `occupancy`.
pub fn resource_utilization(resources: f64, sensed: f64, occupancy: f64) -> f64 {
    resources * (1.0 - (1.0 - occupancy).powf(sensed))
}

/// Resources shared between the candidate sets of two vehicles with `common` common
/// neighbours out of `sensed`.
pub fn utility(resources: f64, utilized: f64, common: f64, sensed: f64) -> f64 {
    let shared = common / sensed;
    (utilized.powi(2) / resources) * (1.0 - shared) + utilized * shared
}

/// Resources free for both vehicles.
pub fn overlap(resources: f64, utilized: f64, utility: f64) -> f64 {
    resources - 2.0 * utilized + utility
}

/// Share of reservations still live given reselection counters drawn in `[rc1, rc2]`.
pub fn reselection_factor(rc1: f64, rc2: f64, psr: f64) -> f64 {
    1.0 - (1.0 - 2.0 / (rc1 + rc2)) * psr
}

/// Probability that an interferer picks the same resource, clamped to `[0, 1]`.
pub fn collision_probability(reselection: f64, overlap: f64, channels: f64, free: f64) -> f64 {
    (reselection * overlap * (channels / free).powi(2)).clamp(0.0, 1.0)
}

/// SPC6G per-interferer success: no collision, or a collision on a resource the
/// interferer gives up with probability `1 - keep`.
pub fn success_probability(collision: f64, keep: f64) -> f64 {
    (1.0 - collision) + collision * (1.0 - keep)
}

pub fn prr(outage: f64) -> f64 {
    1.0 - outage
}

/// Mean time between successful receptions. Infinite once every packet is lost.
pub fn pir(outage: f64, rri: f64) -> f64 {
    if outage >= 1.0 {
        return f64::INFINITY;
    }
    rri / (1.0 - outage)
}
