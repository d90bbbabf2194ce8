//! Model construction: the ordered flow derivation, stock closure, and the
//! mass-balance check, orchestrated by the builder.

pub mod balance;
pub mod builder;
pub mod engine;
pub mod reuse;
pub mod stocks;

pub use balance::{check_mass_balance, mass_balance, BalanceReport, BALANCE_TOLERANCE};
pub use builder::{create_model, load_model};
pub use engine::{compute_flows, FlowInputs, ProductionRates};
