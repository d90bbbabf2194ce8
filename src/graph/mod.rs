//! Explicit typed process graph: a fixed enumeration of nodes, a statically
//! declared edge set with checked dimension signatures, stocks, and the
//! immutable parameter table.

pub mod flow;
pub mod network;
pub mod params;
pub mod process;
pub mod stock;

pub use flow::Flow;
pub use network::FlowNetwork;
pub use params::{Parameter, ParameterSet};
pub use process::Process;
pub use stock::Stock;
