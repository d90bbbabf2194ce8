//! Mass-balance validator: per node, per year, inbound minus outbound flow
//! minus stock change, summed over all other dimensions. The Environment
//! node is the system boundary; its residual closes the balance and is
//! defined as the negation of all other nodes' residuals.

use std::fmt;

use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayD, Axis};
use strum::IntoEnumIterator;

use crate::error::ModelError;
use crate::graph::{FlowNetwork, Process};

/// One tonne per process, aggregated over regions and scenarios, summed
/// over years.
pub const BALANCE_TOLERANCE: f64 = 1.0;

/// Per-node residual magnitudes of a balanced model.
#[derive(Debug, Clone)]
pub struct BalanceReport {
    residuals: Vec<(Process, f64)>,
}

impl BalanceReport {
    pub fn residuals(&self) -> &[(Process, f64)] {
        &self.residuals
    }

    pub fn max_residual(&self) -> f64 {
        self.residuals.iter().map(|(_, r)| *r).fold(0.0, f64::max)
    }

    pub fn is_plausible(&self) -> bool {
        self.residuals.iter().all(|(_, r)| *r <= BALANCE_TOLERANCE)
    }
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let per_node = self
            .residuals
            .iter()
            .map(|(p, r)| format!("{}: {:.6}", p.label(), r))
            .join(", ");
        write!(f, "Balance: {per_node}")
    }
}

/// Signed residual per (year, process).
pub fn mass_balance(net: &FlowNetwork) -> Array2<f64> {
    let n_years = net.space().years.len();
    let processes: Vec<Process> = Process::iter().collect();
    let index_of = |p: Process| {
        processes
            .iter()
            .position(|&q| q == p)
            .expect("every process is enumerated")
    };
    let mut balance = Array2::zeros((n_years, processes.len()));

    for flow in net.edges() {
        // A self-loop (reuse) enters and leaves the same node.
        if flow.from == flow.to {
            continue;
        }
        let per_year = sum_all_but_time(flow.values());
        let mut outbound = balance.column_mut(index_of(flow.from));
        outbound -= &per_year;
        let mut inbound = balance.column_mut(index_of(flow.to));
        inbound += &per_year;
    }
    for stock in net.stocks() {
        let per_year = sum_all_but_time(stock.change());
        let mut column = balance.column_mut(index_of(stock.process));
        column -= &per_year;
    }

    // Boundary closure: everything the environment supplies ends up in a
    // stock or returns to it, so its residual is the negation of the rest.
    let env = index_of(Process::Environment);
    for t in 0..n_years {
        let others: f64 = balance
            .row(t)
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != env)
            .map(|(_, v)| *v)
            .sum();
        balance[[t, env]] = -others;
    }
    balance
}

/// Check the computed model and produce the per-node report. Fatal when any
/// node's absolute residual, summed over years, exceeds the tolerance.
pub fn check_mass_balance(net: &FlowNetwork) -> Result<BalanceReport, ModelError> {
    let balance = mass_balance(net);
    let residuals = Process::iter()
        .enumerate()
        .map(|(i, p)| (p, balance.column(i).iter().map(|v| v.abs()).sum()))
        .collect();
    let report = BalanceReport { residuals };
    if report.is_plausible() {
        Ok(report)
    } else {
        Err(ModelError::MassBalance { report: report.to_string() })
    }
}

fn sum_all_but_time(values: &ArrayD<f64>) -> Array1<f64> {
    Array1::from_iter(values.axis_iter(Axis(0)).map(|slice| slice.sum()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    #[test]
    fn test_sum_all_but_time() {
        let mut values = ArrayD::zeros(vec![2, 2, 3]);
        values[[0, 1, 2]] = 4.0;
        values[[0, 0, 0]] = 1.0;
        values[[1, 1, 1]] = 7.0;
        let sums = sum_all_but_time(&values);
        assert_eq!(sums[0], 5.0);
        assert_eq!(sums[1], 7.0);
    }

    #[test]
    fn test_report_display_and_tolerance() {
        let report = BalanceReport {
            residuals: vec![(Process::Primary, 0.25), (Process::Use, 1.5)],
        };
        assert!(!report.is_plausible());
        assert_eq!(report.max_residual(), 1.5);
        let text = report.to_string();
        assert!(text.contains("Primary production: 0.25"));
        assert!(text.contains("Use phase: 1.5"));
    }
}
