//! Trade collaborators. The engine does not estimate trade volumes; it
//! receives (imports, exports) tensors from these interfaces, scaled by a
//! demand or production proxy. All returned tensors must be non-negative
//! and shaped like the scaler (direct), the use-phase flows (indirect), or
//! the scrap pool (scrap).

use ndarray::{Array3, Array4};

use crate::error::ModelError;

/// Raw-material trade at the forming boundary, scaled by total demand.
pub trait DirectTrade {
    fn estimate(&self, scaler: &Array3<f64>) -> Result<(Array3<f64>, Array3<f64>), ModelError>;
}

/// Material embodied in traded finished goods, scaled by total demand.
pub trait IndirectTrade {
    fn estimate(
        &self,
        scaler: &Array3<f64>,
        inflows: &Array4<f64>,
        outflows: &Array4<f64>,
    ) -> Result<(Array4<f64>, Array4<f64>), ModelError>;
}

/// Scrap trade, scaled by production and informed by the current
/// per-category scrap availability.
pub trait ScrapTrade {
    fn estimate(
        &self,
        production: &Array3<f64>,
        available_scrap: &Array4<f64>,
    ) -> Result<(Array4<f64>, Array4<f64>), ModelError>;
}

/// The three estimators the derivation consumes, bundled.
#[derive(Clone, Copy)]
pub struct TradeSuite<'a> {
    pub direct: &'a dyn DirectTrade,
    pub indirect: &'a dyn IndirectTrade,
    pub scrap: &'a dyn ScrapTrade,
}

impl TradeSuite<'static> {
    /// Identity trade: imports and exports are zero everywhere. Used by the
    /// command surface when no trade dataset is wired in, and by tests.
    pub fn no_trade() -> Self {
        static NO_TRADE: NoTrade = NoTrade;
        Self { direct: &NO_TRADE, indirect: &NO_TRADE, scrap: &NO_TRADE }
    }
}

/// Zero-trade estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrade;

impl DirectTrade for NoTrade {
    fn estimate(&self, scaler: &Array3<f64>) -> Result<(Array3<f64>, Array3<f64>), ModelError> {
        Ok((Array3::zeros(scaler.dim()), Array3::zeros(scaler.dim())))
    }
}

impl IndirectTrade for NoTrade {
    fn estimate(
        &self,
        _scaler: &Array3<f64>,
        inflows: &Array4<f64>,
        _outflows: &Array4<f64>,
    ) -> Result<(Array4<f64>, Array4<f64>), ModelError> {
        Ok((Array4::zeros(inflows.dim()), Array4::zeros(inflows.dim())))
    }
}

impl ScrapTrade for NoTrade {
    fn estimate(
        &self,
        _production: &Array3<f64>,
        available_scrap: &Array4<f64>,
    ) -> Result<(Array4<f64>, Array4<f64>), ModelError> {
        Ok((
            Array4::zeros(available_scrap.dim()),
            Array4::zeros(available_scrap.dim()),
        ))
    }
}
