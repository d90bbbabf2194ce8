//! Stock closure: the in-use stock is copied from the stock model; the
//! waste and dissipation stocks are integrated forward from their inflow
//! edges.

use ndarray::{Array4, Axis};

use crate::error::ModelError;
use crate::graph::{FlowNetwork, Process};

/// Propagate the stocks once every edge has been written.
pub fn compute_stocks(
    net: &mut FlowNetwork,
    stock_level: &Array4<f64>,
    inflows: &Array4<f64>,
    outflows: &Array4<f64>,
) -> Result<(), ModelError> {
    let change = inflows - outflows;
    net.stock_mut(Process::Use)?
        .set(stock_level.clone().into_dyn(), change.into_dyn())?;

    let waste_inflow = edge_values(net, Process::Recycling, Process::Waste)?;
    net.stock_mut(Process::Waste)?.set_change_and_integrate(waste_inflow)?;

    // Use->Dissipation carries (t, r, g, w, s); the stock tracks (t, r, g, s).
    let dissipation_inflow = edge_values(net, Process::Use, Process::Dissipation)?.sum_axis(Axis(3));
    net.stock_mut(Process::Dissipation)?
        .set_change_and_integrate(dissipation_inflow)?;
    Ok(())
}

fn edge_values(
    net: &FlowNetwork,
    from: Process,
    to: Process,
) -> Result<ndarray::ArrayD<f64>, ModelError> {
    let flow = net.edge(from, to).ok_or_else(|| ModelError::Inconsistent {
        failures: vec![format!("edge {from} -> {to} is not declared")],
    })?;
    if !flow.is_written() {
        return Err(ModelError::Inconsistent {
            failures: vec![format!("edge {from} -> {to} read before being written")],
        });
    }
    Ok(flow.values().clone())
}
