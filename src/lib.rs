//! Multi-region steel material-flow model.
//!
//! Given exogenous in-use stock trajectories and a set of technology/yield
//! parameters, the crate derives every flow and stock of a fixed process
//! graph (primary production, forming, fabrication, use phase, recycling,
//! dissipation, waste, and the environment boundary), balancing trade,
//! pooling scrap across the scrap-generating stages, splitting production
//! between the ore-based and scrap-based routes under a capacity ceiling,
//! and closing the network with a waste term. A computed model is validated
//! against per-node mass conservation before it is returned.

pub mod cache;
pub mod config;
pub mod dsm;
pub mod error;
pub mod graph;
pub mod index;
pub mod model;
pub mod telemetry;
pub mod tensor;
pub mod trade;

pub use config::Config;
pub use dsm::{FileStockModel, InMemoryStockModel, StockData, StockModel};
pub use error::ModelError;
pub use graph::{Flow, FlowNetwork, Parameter, ParameterSet, Process, Stock};
pub use index::{Dim, IndexSpace, RegionMode, WasteCategories};
pub use model::{
    check_mass_balance, create_model, load_model, mass_balance, BalanceReport, FlowInputs,
    ProductionRates, BALANCE_TOLERANCE,
};
pub use trade::{DirectTrade, IndirectTrade, NoTrade, ScrapTrade, TradeSuite};
