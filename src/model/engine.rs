//! The flow derivation engine: turns stock-model inflow/outflow into every
//! edge of the process graph, in the fixed step order. Each step operates on
//! whole tensors; no step mixes values across Region or Scenario except the
//! explicit demand and production sums.

use ndarray::{Array3, Array4, Array5, Axis, s};
use tracing::debug;

use crate::error::ModelError;
use crate::graph::{FlowNetwork, Process};
use crate::index::Dim;
use crate::tensor;
use crate::trade::TradeSuite;

/// Scalar production-stage rates, fixed per run.
#[derive(Debug, Clone, Copy)]
pub struct ProductionRates {
    /// Forming yield, in (0, 1].
    pub forming_yield: f64,
    /// Scrap fraction the primary route tolerates in its blend, in [0, 1).
    pub primary_scrap_tolerance: f64,
}

/// Exogenous inputs of one derivation run.
#[derive(Debug, Clone)]
pub struct FlowInputs {
    /// Use-phase inflow (t, r, g, s), from the stock model.
    pub inflows: Array4<f64>,
    /// Use-phase outflow (t, r, g, s), from the stock model.
    pub outflows: Array4<f64>,
    /// Reuse factor-minus-one timeline (t, g, s); `None` disables reuse.
    pub reuse_timeline: Option<Array3<f64>>,
    /// Ceiling on the scrap share of production (t, r, s).
    pub max_scrap_share: Array3<f64>,
}

/// Derive and assign every edge of the network. Returns the (possibly
/// reuse-adjusted) inflow and outflow for the stock closure.
pub fn compute_flows(
    net: &mut FlowNetwork,
    rates: &ProductionRates,
    inputs: FlowInputs,
    trade: &TradeSuite,
) -> Result<(Array4<f64>, Array4<f64>), ModelError> {
    let waste_cats = net.space().waste.clone();
    let fabrication_yield = net.params().fabrication_yield().to_owned();
    let use_eol_distribution = net.params().use_eol_distribution().to_owned();
    let recycle_rate = net.params().eol_recycle_rate().to_owned();

    let FlowInputs { mut inflows, mut outflows, reuse_timeline, max_scrap_share } = inputs;
    let flow_shape = net.space().shape_of(&[Dim::Time, Dim::Region, Dim::Good, Dim::Scenario]);
    for (name, tensor) in [("inflow", &inflows), ("outflow", &outflows)] {
        if tensor.shape() != flow_shape.as_slice() {
            return Err(ModelError::Shape {
                name: format!("stock model {name}"),
                expected: flow_shape.clone(),
                actual: tensor.shape().to_vec(),
            });
        }
    }

    // Reuse adjustment: directly reused material re-enters use without
    // leaving the node, so it is removed from both inflow and outflow
    // before anything else sees them.
    let reuse = reuse_timeline.map(|factor| {
        let reuse = tensor::scale_by_timeline(&outflows, &factor);
        inflows -= &reuse;
        outflows -= &reuse;
        reuse
    });
    debug!(reuse = reuse.is_some(), "reuse adjustment applied");

    // Indirect trade correction: demand satisfied by material embodied in
    // traded finished goods does not reach domestic fabrication.
    let total_demand = tensor::sum_goods(&inflows);
    let (indirect_imports, indirect_exports) =
        trade.indirect.estimate(&total_demand, &inflows, &outflows)?;
    ensure_non_negative("indirect imports", indirect_imports.iter())?;
    ensure_non_negative("indirect exports", indirect_exports.iter())?;
    let direct_inflows = &inflows - &indirect_imports + &indirect_exports;
    let direct_demand = tensor::sum_goods(&direct_inflows);

    // Fabrication yield inversion.
    let inverse_yield = fabrication_yield.mapv(|y| 1.0 / y);
    let fabrication = tensor::sum_goods(&tensor::scale_goods(&direct_inflows, inverse_yield.view()));
    let fabrication_scrap = &fabrication - &direct_demand;
    debug!(total = fabrication.sum(), "fabrication throughput derived");

    // Forming and direct trade balancing. Forming feeds fabrication
    // one-to-one; production covers forming input plus net exports.
    let (imports, exports) = trade.direct.estimate(&total_demand)?;
    ensure_non_negative("imports", imports.iter())?;
    ensure_non_negative("exports", exports.iter())?;
    let forming_fabrication = fabrication;
    let forming_input = forming_fabrication.mapv(|v| v / rates.forming_yield);
    let forming_scrap = &forming_input - &forming_fabrication;
    let production = &forming_input + &exports - &imports;

    // End-of-life distribution, partitioned at the named boundary.
    let outflows_by_waste = tensor::spread_over_waste(&outflows, use_eol_distribution.view());
    let boundary = waste_cats.dissipated_from();
    let mut use_eol_flow = Array5::zeros(outflows_by_waste.dim());
    let mut use_env_flow = Array5::zeros(outflows_by_waste.dim());
    use_eol_flow
        .slice_mut(s![.., .., .., ..boundary, ..])
        .assign(&outflows_by_waste.slice(s![.., .., .., ..boundary, ..]));
    use_env_flow
        .slice_mut(s![.., .., .., boundary.., ..])
        .assign(&outflows_by_waste.slice(s![.., .., .., boundary.., ..]));
    let eol_scrap = use_eol_flow.sum_axis(Axis(2));

    // Scrap pool assembly: end-of-life scrap plus the two production-stage
    // scraps at their reserved category slots, then scrap trade.
    let mut available_scrap = eol_scrap;
    available_scrap
        .index_axis_mut(Axis(2), waste_cats.forming_slot())
        .assign(&forming_scrap);
    available_scrap
        .index_axis_mut(Axis(2), waste_cats.fabrication_slot())
        .assign(&fabrication_scrap);
    let (scrap_imports, scrap_exports) = trade.scrap.estimate(&production, &available_scrap)?;
    ensure_non_negative("scrap imports", scrap_imports.iter())?;
    ensure_non_negative("scrap exports", scrap_exports.iter())?;
    let total_scrap = &available_scrap + &scrap_imports - &scrap_exports;

    // Capacity-constrained split between the two production routes.
    let max_scrap_in_production = &production * &max_scrap_share;
    let recyclable_scrap =
        tensor::sum_waste(&tensor::scale_waste(&total_scrap, recycle_rate.view()));
    let scrap_in_production = tensor::minimum(&recyclable_scrap, &max_scrap_in_production);
    let scrap_share = tensor::guarded_share(&scrap_in_production, &production);

    let tolerance = rates.primary_scrap_tolerance;
    let secondary_share =
        tensor::floor_at(&scrap_share.mapv(|s| (s - tolerance) / (1.0 - tolerance)), 0.0);
    let secondary_production = &production * &secondary_share;
    let primary_production = &production - &secondary_production;
    let primary_scrap_bound = primary_production.mapv(|p| p * tolerance);
    let scrap_in_primary = tensor::minimum(&primary_scrap_bound, &scrap_in_production);
    let virgin_input = &primary_production - &scrap_in_primary;
    let scrap_consumed = &scrap_in_primary + &secondary_production;
    // Closing waste term: scrap that enters no production route.
    let waste_flow = tensor::sum_waste(&total_scrap) - &scrap_consumed;
    debug!(
        secondary = secondary_production.sum(),
        primary = primary_production.sum(),
        discarded = waste_flow.sum(),
        "production split derived"
    );

    // Flow assignment: every derived quantity lands on exactly one edge.
    let mut forming_to_recycling = Array4::zeros(total_scrap.dim());
    forming_to_recycling
        .index_axis_mut(Axis(2), waste_cats.forming_slot())
        .assign(&forming_scrap);
    let mut fabrication_to_recycling = Array4::zeros(total_scrap.dim());
    fabrication_to_recycling
        .index_axis_mut(Axis(2), waste_cats.fabrication_slot())
        .assign(&fabrication_scrap);

    net.write_edge(Process::Environment, Process::Primary, virgin_input.into_dyn())?;
    net.write_edge(Process::Recycling, Process::Primary, scrap_in_primary.into_dyn())?;
    net.write_edge(Process::Primary, Process::Forming, primary_production.into_dyn())?;
    net.write_edge(Process::Recycling, Process::Forming, secondary_production.into_dyn())?;
    net.write_edge(Process::Environment, Process::Forming, imports.into_dyn())?;
    net.write_edge(Process::Forming, Process::Environment, exports.into_dyn())?;
    net.write_edge(Process::Forming, Process::Fabrication, forming_fabrication.into_dyn())?;
    net.write_edge(Process::Forming, Process::Recycling, forming_to_recycling.into_dyn())?;
    net.write_edge(Process::Fabrication, Process::Use, direct_inflows.into_dyn())?;
    net.write_edge(
        Process::Fabrication,
        Process::Recycling,
        fabrication_to_recycling.into_dyn(),
    )?;
    net.write_edge(Process::Environment, Process::Use, indirect_imports.into_dyn())?;
    net.write_edge(Process::Use, Process::Environment, indirect_exports.into_dyn())?;
    if let Some(reuse) = reuse {
        net.write_edge(Process::Use, Process::Use, reuse.into_dyn())?;
    }
    net.write_edge(Process::Use, Process::Recycling, use_eol_flow.into_dyn())?;
    net.write_edge(Process::Use, Process::Dissipation, use_env_flow.into_dyn())?;
    net.write_edge(Process::Environment, Process::Recycling, scrap_imports.into_dyn())?;
    net.write_edge(Process::Recycling, Process::Environment, scrap_exports.into_dyn())?;
    net.write_edge(Process::Recycling, Process::Waste, waste_flow.into_dyn())?;

    Ok((inflows, outflows))
}

fn ensure_non_negative<'a>(
    name: &str,
    mut values: impl Iterator<Item = &'a f64>,
) -> Result<(), ModelError> {
    if values.any(|&v| v < 0.0) {
        return Err(ModelError::TradeData(format!("{name} contain negative values")));
    }
    Ok(())
}
