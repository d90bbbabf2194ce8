use std::collections::BTreeMap;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::index::{Dim, IndexSpace};
use crate::graph::flow::Flow;
use crate::graph::params::ParameterSet;
use crate::graph::process::Process;
use crate::graph::stock::Stock;

use crate::graph::process::Process as P;
use crate::index::Dim::{Good, Region, Scenario, Time, Waste};

/// The statically enumerated edge set with its dimension signatures.
///
/// Flows are Time-major with Scenario last. The reuse self-loop is declared
/// separately because it only exists when reuse adjustment is enabled.
const EDGES: &[(Process, Process, &[Dim])] = &[
    // production routes
    (P::Environment, P::Primary, &[Time, Region, Scenario]), // virgin/ore input
    (P::Recycling, P::Primary, &[Time, Region, Scenario]),   // scrap blended into the primary route
    (P::Primary, P::Forming, &[Time, Region, Scenario]),
    (P::Recycling, P::Forming, &[Time, Region, Scenario]), // secondary (scrap-fed) route
    // forming / fabrication chain
    (P::Environment, P::Forming, &[Time, Region, Scenario]), // raw-material imports
    (P::Forming, P::Environment, &[Time, Region, Scenario]), // raw-material exports
    (P::Forming, P::Fabrication, &[Time, Region, Scenario]),
    (P::Forming, P::Recycling, &[Time, Region, Waste, Scenario]), // forming scrap
    (P::Fabrication, P::Use, &[Time, Region, Good, Scenario]),
    (P::Fabrication, P::Recycling, &[Time, Region, Waste, Scenario]), // fabrication scrap
    // use phase and its boundary exchanges
    (P::Environment, P::Use, &[Time, Region, Good, Scenario]), // indirect imports
    (P::Use, P::Environment, &[Time, Region, Good, Scenario]), // indirect exports
    (P::Use, P::Recycling, &[Time, Region, Good, Waste, Scenario]), // collectible end-of-life
    (P::Use, P::Dissipation, &[Time, Region, Good, Waste, Scenario]),
    // scrap trade and closure
    (P::Environment, P::Recycling, &[Time, Region, Waste, Scenario]), // scrap imports
    (P::Recycling, P::Environment, &[Time, Region, Waste, Scenario]), // scrap exports
    (P::Recycling, P::Waste, &[Time, Region, Scenario]),
];

const REUSE_EDGE: (Process, Process, &[Dim]) =
    (P::Use, P::Use, &[Time, Region, Good, Scenario]);

const STOCKS: &[(Process, &[Dim])] = &[
    (P::Use, &[Time, Region, Good, Scenario]),
    (P::Waste, &[Time, Region, Scenario]),
    (P::Dissipation, &[Time, Region, Good, Scenario]),
];

/// One computed model: process graph, populated edges, stocks, and the
/// parameter table for a single (region mode, scenario set) combination.
/// Immutable for consumers once validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowNetwork {
    space: IndexSpace,
    params: ParameterSet,
    edges: BTreeMap<(Process, Process), Flow>,
    stocks: BTreeMap<Process, Stock>,
}

impl FlowNetwork {
    /// Build the empty network: every declared edge zero-filled, every stock
    /// zero-filled. `with_reuse` declares the use->use self-loop; without it
    /// the edge is absent from the flow set entirely.
    pub fn new(space: IndexSpace, params: ParameterSet, with_reuse: bool) -> Self {
        let mut edges = BTreeMap::new();
        for &(from, to, dims) in EDGES {
            edges.insert((from, to), Flow::zeros(from, to, dims, &space));
        }
        if with_reuse {
            let (from, to, dims) = REUSE_EDGE;
            edges.insert((from, to), Flow::zeros(from, to, dims, &space));
        }
        let mut stocks = BTreeMap::new();
        for &(process, dims) in STOCKS {
            stocks.insert(process, Stock::zeros(process, dims, &space));
        }
        Self { space, params, edges, stocks }
    }

    pub fn space(&self) -> &IndexSpace {
        &self.space
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn edge(&self, from: Process, to: Process) -> Option<&Flow> {
        self.edges.get(&(from, to))
    }

    pub fn edges(&self) -> impl Iterator<Item = &Flow> {
        self.edges.values()
    }

    pub fn stock(&self, process: Process) -> Option<&Stock> {
        self.stocks.get(&process)
    }

    pub fn stocks(&self) -> impl Iterator<Item = &Stock> {
        self.stocks.values()
    }

    pub(crate) fn stock_mut(&mut self, process: Process) -> Result<&mut Stock, ModelError> {
        self.stocks.get_mut(&process).ok_or_else(|| ModelError::Inconsistent {
            failures: vec![format!("no stock declared at {process}")],
        })
    }

    /// Write a computed edge value; the edge must be declared and not yet
    /// written.
    pub(crate) fn write_edge(
        &mut self,
        from: Process,
        to: Process,
        values: ArrayD<f64>,
    ) -> Result<(), ModelError> {
        let flow = self.edges.get_mut(&(from, to)).ok_or_else(|| ModelError::Inconsistent {
            failures: vec![format!("edge {from} -> {to} is not declared")],
        })?;
        flow.write(values)
    }

    /// Structural self-check of the declared dimensions, edge shapes, stock
    /// shapes, and the parameter table. Fatal when any check fails.
    pub fn consistency_check(&self) -> Result<(), ModelError> {
        let mut failures = self.space.check();
        for flow in self.edges.values() {
            let expected = self.space.shape_of(flow.dims());
            if flow.values().shape() != expected.as_slice() {
                failures.push(format!(
                    "edge {} -> {}: shape {:?} does not match declared dims {:?}",
                    flow.from,
                    flow.to,
                    flow.values().shape(),
                    flow.dims()
                ));
            }
            if flow.dims().first() != Some(&Dim::Time) {
                failures.push(format!(
                    "edge {} -> {}: first dimension must be Time",
                    flow.from, flow.to
                ));
            }
        }
        for stock in self.stocks.values() {
            let expected = self.space.shape_of(stock.dims());
            if stock.change().shape() != expected.as_slice() {
                failures.push(format!(
                    "stock at {}: shape {:?} does not match declared dims {:?}",
                    stock.process,
                    stock.change().shape(),
                    stock.dims()
                ));
            }
        }
        failures.extend(self.params.check(&self.space));
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ModelError::Inconsistent { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{RegionMode, WasteCategories};
    use ndarray::{arr1, arr2, ArrayD};

    fn space() -> IndexSpace {
        IndexSpace {
            years: vec![2000, 2001],
            region_mode: RegionMode::Aggregated,
            regions: vec!["EUR".to_string()],
            goods: vec!["Construction".to_string()],
            waste: WasteCategories::new(
                vec!["Eol".to_string(), "Form".to_string(), "Fabr".to_string(), "Dis".to_string()],
                "Dis",
                "Form",
                "Fabr",
            )
            .unwrap(),
            scenarios: vec!["SSP2".to_string()],
            element: "Fe".to_string(),
        }
    }

    fn params() -> ParameterSet {
        ParameterSet::new(
            arr1(&[0.9]).into_dyn(),
            arr2(&[[0.8, 0.0, 0.0, 0.2]]).into_dyn(),
            arr1(&[1.0, 1.0, 1.0, 0.0]).into_dyn(),
        )
    }

    #[test]
    fn test_edge_set_without_reuse() {
        let net = FlowNetwork::new(space(), params(), false);
        assert_eq!(net.edges().count(), 17);
        assert!(net.edge(Process::Use, Process::Use).is_none());
        assert!(net.edge(Process::Primary, Process::Forming).is_some());
    }

    #[test]
    fn test_reuse_edge_declared_on_demand() {
        let net = FlowNetwork::new(space(), params(), true);
        assert_eq!(net.edges().count(), 18);
        assert!(net.edge(Process::Use, Process::Use).is_some());
    }

    #[test]
    fn test_consistency_check_passes_on_fresh_network() {
        let net = FlowNetwork::new(space(), params(), false);
        net.consistency_check().unwrap();
    }

    #[test]
    fn test_consistency_check_reports_bad_parameters() {
        let bad = ParameterSet::new(
            arr1(&[0.0]).into_dyn(),
            arr2(&[[0.8, 0.0, 0.0, 0.2]]).into_dyn(),
            arr1(&[1.0, 1.0, 1.0, 0.0]).into_dyn(),
        );
        let net = FlowNetwork::new(space(), bad, false);
        let err = net.consistency_check().unwrap_err();
        assert!(err.to_string().contains("Fabrication_Yield"));
    }

    #[test]
    fn test_write_undeclared_edge_rejected() {
        let mut net = FlowNetwork::new(space(), params(), false);
        let err = net
            .write_edge(Process::Waste, Process::Primary, ArrayD::zeros(vec![2, 1, 1]))
            .unwrap_err();
        assert!(err.to_string().contains("not declared"));
    }

    #[test]
    fn test_stocks_declared() {
        let net = FlowNetwork::new(space(), params(), false);
        assert_eq!(net.stocks().count(), 3);
        assert_eq!(net.stock(Process::Use).unwrap().dims().len(), 4);
    }
}
