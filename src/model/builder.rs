//! Top-level model construction: configuration in, validated network out,
//! with the region-mode-keyed cache in front.

use ndarray::{s, Array3};
use tracing::info;

use crate::cache;
use crate::config::Config;
use crate::dsm::StockModel;
use crate::error::ModelError;
use crate::graph::FlowNetwork;
use crate::model::balance::{check_mass_balance, BalanceReport};
use crate::model::engine::{compute_flows, FlowInputs, ProductionRates};
use crate::model::reuse::reuse_timeline;
use crate::model::stocks::compute_stocks;
use crate::trade::TradeSuite;

/// Build a fresh model: construct and self-check the graph, run the flow
/// derivation and stock closure, then validate the mass balance. Returns
/// the model together with its balance report; a model that fails any check
/// is not returned at all.
pub fn create_model(
    cfg: &Config,
    stock_model: &dyn StockModel,
    trade: &TradeSuite,
    scrap_share_override: Option<&Array3<f64>>,
) -> Result<(FlowNetwork, BalanceReport), ModelError> {
    cfg.validate()?;
    let space = cfg.index_space()?;
    let params = cfg.parameter_set()?;
    let mut net = FlowNetwork::new(space, params, cfg.reuse.enabled);
    net.consistency_check()?;

    let data = stock_model.load(net.space())?;
    let inputs = FlowInputs {
        inflows: data.inflow.clone(),
        outflows: data.outflow.clone(),
        reuse_timeline: reuse_timeline(cfg, net.space()),
        max_scrap_share: max_scrap_share(cfg, &net, scrap_share_override)?,
    };
    let rates = ProductionRates {
        forming_yield: cfg.production.forming_yield,
        primary_scrap_tolerance: cfg.production.primary_scrap_tolerance,
    };
    let (inflows, outflows) = compute_flows(&mut net, &rates, inputs, trade)?;
    compute_stocks(&mut net, &data.stock, &inflows, &outflows)?;

    let report = check_mass_balance(&net)?;
    info!(max_residual = report.max_residual(), "model computed and balanced");
    Ok((net, report))
}

/// Load the cached model for the configured region mode, or rebuild it.
/// Returns the report only when the model was actually rebuilt.
pub fn load_model(
    cfg: &Config,
    stock_model: &dyn StockModel,
    trade: &TradeSuite,
    scrap_share_override: Option<&Array3<f64>>,
    recalculate: bool,
) -> Result<(FlowNetwork, Option<BalanceReport>), ModelError> {
    let path = cache::model_path(&cfg.data.cache_dir, cfg.regions.mode);
    if path.exists() && !recalculate {
        return Ok((cache::load(&path)?, None));
    }
    let (net, report) = create_model(cfg, stock_model, trade, scrap_share_override)?;
    cache::save(&path, &net)?;
    Ok((net, Some(report)))
}

/// Ceiling on the scrap share of production: the base value everywhere,
/// overridden by the exogenous scenario-specific share from the configured
/// start year onward.
fn max_scrap_share(
    cfg: &Config,
    net: &FlowNetwork,
    scrap_share_override: Option<&Array3<f64>>,
) -> Result<Array3<f64>, ModelError> {
    let space = net.space();
    let shape = (space.years.len(), space.regions.len(), space.scenarios.len());
    let mut ceiling = Array3::from_elem(shape, cfg.production.max_scrap_share);
    if let Some(share) = scrap_share_override {
        if share.dim() != shape {
            return Err(ModelError::Shape {
                name: "scrap share override".to_string(),
                expected: vec![shape.0, shape.1, shape.2],
                actual: share.shape().to_vec(),
            });
        }
        let start = space
            .year_index(cfg.production.econ_start_year)
            .ok_or_else(|| {
                ModelError::InvalidConfig(format!(
                    "econ_start_year {} lies outside the modeled years",
                    cfg.production.econ_start_year
                ))
            })?;
        ceiling
            .slice_mut(s![start.., .., ..])
            .assign(&share.slice(s![start.., .., ..]));
    }
    Ok(ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::minimal;
    use crate::dsm::{InMemoryStockModel, StockData};
    use crate::graph::ParameterSet;
    use ndarray::Array4;

    fn stock_model(n_years: usize) -> InMemoryStockModel {
        let mut inflow = Array4::zeros((n_years, 1, 1, 1));
        let mut outflow = Array4::zeros((n_years, 1, 1, 1));
        let mut stock = Array4::zeros((n_years, 1, 1, 1));
        let mut level = 0.0;
        for t in 0..n_years {
            inflow[[t, 0, 0, 0]] = 100.0;
            outflow[[t, 0, 0, 0]] = 60.0;
            level += 40.0;
            stock[[t, 0, 0, 0]] = level;
        }
        InMemoryStockModel(StockData { stock, inflow, outflow })
    }

    #[test]
    fn test_create_model_balances() {
        let cfg = minimal();
        let (net, report) =
            create_model(&cfg, &stock_model(3), &TradeSuite::no_trade(), None).unwrap();
        assert!(report.is_plausible());
        assert!(net.edges().all(|f| f.is_written()));
    }

    #[test]
    fn test_override_applies_from_start_year() {
        let cfg = minimal();
        let space = cfg.index_space().unwrap();
        let params: ParameterSet = cfg.parameter_set().unwrap();
        let net = FlowNetwork::new(space, params, false);
        let share = Array3::from_elem((3, 1, 1), 0.25);
        let ceiling = max_scrap_share(&cfg, &net, Some(&share)).unwrap();
        // econ_start_year is 2001, index 1
        assert_eq!(ceiling[[0, 0, 0]], 0.6);
        assert_eq!(ceiling[[1, 0, 0]], 0.25);
        assert_eq!(ceiling[[2, 0, 0]], 0.25);
    }

    #[test]
    fn test_override_shape_checked() {
        let cfg = minimal();
        let space = cfg.index_space().unwrap();
        let params = cfg.parameter_set().unwrap();
        let net = FlowNetwork::new(space, params, false);
        let share = Array3::from_elem((2, 1, 1), 0.25);
        assert!(max_scrap_share(&cfg, &net, Some(&share)).is_err());
    }

    #[test]
    fn test_load_model_uses_cache() {
        let mut cfg = minimal();
        cfg.data.cache_dir = std::env::temp_dir().join("steel-mfa-builder-test");
        std::fs::remove_dir_all(&cfg.data.cache_dir).ok();

        let trade = TradeSuite::no_trade();
        let (_, report) = load_model(&cfg, &stock_model(3), &trade, None, true).unwrap();
        assert!(report.is_some(), "fresh build must produce a report");

        let (cached, report) = load_model(&cfg, &stock_model(3), &trade, None, false).unwrap();
        assert!(report.is_none(), "cache hit skips recomputation");
        cached.consistency_check().unwrap();
        std::fs::remove_dir_all(&cfg.data.cache_dir).ok();
    }

    #[test]
    fn test_invalid_config_aborts_before_computation() {
        let mut cfg = minimal();
        cfg.production.forming_yield = -0.5;
        let err = create_model(&cfg, &stock_model(3), &TradeSuite::no_trade(), None).unwrap_err();
        assert!(err.to_string().contains("forming_yield"));
    }
}
