use std::path::Path;

use anyhow::Result;
use steel_mfa::config::Config;
use steel_mfa::dsm::FileStockModel;
use steel_mfa::model::load_model;
use steel_mfa::telemetry::init_tracing;
use steel_mfa::trade::TradeSuite;
use tracing::info;

/// Rebuild the aggregated-regions model and print the balance report.
///
/// A settings document (TOML or YAML) passed as the final argument
/// overrides the default configuration.
fn main() -> Result<()> {
    init_tracing();

    let override_path = std::env::args().last().filter(|arg| {
        arg.ends_with(".toml") || arg.ends_with(".yml") || arg.ends_with(".yaml")
    });
    let cfg = Config::load_with_override(override_path.as_deref().map(Path::new))?;
    cfg.validate()?;

    let stock_model = FileStockModel::new(&cfg.data.stock_snapshot);
    let (model, report) = load_model(&cfg, &stock_model, &TradeSuite::no_trade(), None, true)?;

    match report {
        Some(report) => println!("Success - model computed and checked.\n{report}"),
        None => println!("Success - model loaded from cache."),
    }
    info!(
        edges = model.edges().count(),
        years = model.space().years.len(),
        regions = model.space().regions.len(),
        "model ready"
    );
    Ok(())
}
