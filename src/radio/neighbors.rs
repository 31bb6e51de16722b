use std::collections::HashMap;

use crate::constants::SENSING_WINDOW_M;

use super::link::{correlation, LinkBudget};

/// Packet success rates on the 1 m grid, indexed by absolute distance.
#[derive(Debug)]
pub struct PsrTable {
    budget: LinkBudget,
    values: Vec<f64>,
}

impl PsrTable {
    pub fn new(budget: LinkBudget) -> Self {
        let mut table = PsrTable { budget, values: Vec::new() };
        table.extend_to(2 * SENSING_WINDOW_M as usize);
        table
    }

    fn extend_to(&mut self, distance: usize) {
        for d in self.values.len()..=distance {
            self.values.push(self.budget.packet_success_rate(d as f64));
        }
    }

    pub fn get(&mut self, distance: u64) -> f64 {
        let index = distance as usize;
        if index >= self.values.len() {
            self.extend_to(index);
        }
        self.values[index]
    }
}

/// Neighbour counts for one density, memoised per vehicle distance.
#[derive(Debug)]
pub struct NeighborModel {
    beta: f64,
    table: PsrTable,
    common: HashMap<u64, f64>,
}

impl NeighborModel {
    pub fn new(budget: LinkBudget, beta: f64) -> Self {
        NeighborModel {
            beta,
            table: PsrTable::new(budget),
            common: HashMap::new(),
        }
    }

    pub fn packet_success_rate(&mut self, distance: u64) -> f64 {
        self.table.get(distance)
    }

    /// Expected number of vehicles sensed by both ends of a pair `d_ik` apart.
    pub fn common(&mut self, d_ik: u64) -> f64 {
        if let Some(&count) = self.common.get(&d_ik) {
            return count;
        }
        let rho = correlation(d_ik as f64);
        let offset = d_ik as i64;
        let mut sum = 0.0;
        for d in -SENSING_WINDOW_M..SENSING_WINDOW_M {
            let psr_i = self.table.get(d.unsigned_abs());
            let psr_k = self.table.get((d - offset).unsigned_abs());
            sum += rho * psr_i.min(psr_k) + (1.0 - rho) * psr_i * psr_k;
        }
        let count = self.beta * sum;
        self.common.insert(d_ik, count);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::path_loss::PathLossModel;

    fn budget() -> LinkBudget {
        LinkBudget::new(23.0, -100.0, PathLossModel::from_carrier(5.9, 2.75))
    }

    #[test]
    fn table_matches_direct_evaluation() {
        let b = budget();
        let mut table = PsrTable::new(b);
        for d in [0u64, 1, 250, 3999, 4000, 6500] {
            assert_eq!(table.get(d), b.packet_success_rate(d as f64));
        }
    }

    #[test]
    fn common_neighbors_bounded_by_sensed() {
        let mut model = NeighborModel::new(budget(), 0.1);
        let sensed = budget().sensed_neighbors(0.1);
        // a vehicle shares every sensed neighbour with itself
        assert!((model.common(0) - sensed).abs() < 1e-9 * sensed);
        let mut previous = sensed;
        for d in [10u64, 200, 800, 1500] {
            let c = model.common(d);
            assert!(c > 0.0 && c <= sensed);
            assert!(c <= previous + 1e-9);
            previous = c;
        }
    }

    #[test]
    fn common_neighbors_are_memoised() {
        let mut model = NeighborModel::new(budget(), 0.2);
        let first = model.common(120);
        assert_eq!(model.common.len(), 1);
        assert_eq!(model.common(120), first);
        assert_eq!(model.common.len(), 1);
    }
}
