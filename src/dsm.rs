//! Stock-model collaborator interface. The dynamic stock model itself is
//! external; this module defines the tensors it must deliver and a
//! file-backed source for the command surface.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use ndarray::Array4;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ModelError;
use crate::index::{Dim, IndexSpace};

/// In-use stock trajectories per (Time, Region, Good, Scenario).
///
/// Contract: all three tensors are non-negative, and the stock level change
/// equals inflow - outflow for every cell. The engine assumes this and does
/// not re-derive it; `validate` enforces it at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockData {
    pub stock: Array4<f64>,
    pub inflow: Array4<f64>,
    pub outflow: Array4<f64>,
}

impl StockData {
    pub fn validate(&self, space: &IndexSpace) -> Result<(), ModelError> {
        let expected = space.shape_of(&[Dim::Time, Dim::Region, Dim::Good, Dim::Scenario]);
        for (name, tensor) in [
            ("stock", &self.stock),
            ("inflow", &self.inflow),
            ("outflow", &self.outflow),
        ] {
            if tensor.shape() != expected.as_slice() {
                return Err(ModelError::Shape {
                    name: format!("stock model {name}"),
                    expected,
                    actual: tensor.shape().to_vec(),
                });
            }
            if tensor.iter().any(|&v| v < 0.0) {
                return Err(ModelError::StockData(format!("{name} contains negative values")));
            }
        }
        // level change must equal inflow - outflow, cell by cell
        let n_years = self.stock.dim().0;
        for t in 0..n_years {
            let level = self.stock.index_axis(ndarray::Axis(0), t);
            let net = &self.inflow.index_axis(ndarray::Axis(0), t).to_owned()
                - &self.outflow.index_axis(ndarray::Axis(0), t);
            let change = if t == 0 {
                level.to_owned()
            } else {
                &level - &self.stock.index_axis(ndarray::Axis(0), t - 1)
            };
            let residual = (&change - &net).iter().map(|v| v.abs()).fold(0.0, f64::max);
            if residual > 1e-6 {
                return Err(ModelError::StockData(format!(
                    "stock change deviates from inflow - outflow by {residual} in year index {t}"
                )));
            }
        }
        Ok(())
    }
}

/// Source of stock-model output. Loaded lazily: a cached model rebuild is
/// the only consumer.
pub trait StockModel {
    fn load(&self, space: &IndexSpace) -> Result<StockData, ModelError>;
}

/// Stock data persisted as a bincode snapshot on disk.
#[derive(Debug, Clone)]
pub struct FileStockModel {
    path: PathBuf,
}

impl FileStockModel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write a snapshot, for dataset preparation and tests.
    pub fn store(path: &Path, data: &StockData) -> Result<(), ModelError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(File::create(path)?);
        bincode::serialize_into(file, data)?;
        Ok(())
    }
}

impl StockModel for FileStockModel {
    fn load(&self, space: &IndexSpace) -> Result<StockData, ModelError> {
        info!(path = %self.path.display(), "loading stock model snapshot");
        let file = BufReader::new(File::open(&self.path)?);
        let data: StockData = bincode::deserialize_from(file)?;
        data.validate(space)?;
        Ok(data)
    }
}

/// Fixed in-memory stock data, for tests and embedding.
#[derive(Debug, Clone)]
pub struct InMemoryStockModel(pub StockData);

impl StockModel for InMemoryStockModel {
    fn load(&self, space: &IndexSpace) -> Result<StockData, ModelError> {
        self.0.validate(space)?;
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{RegionMode, WasteCategories};

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

    fn consistent_data() -> StockData {
        let mut stock = Array4::zeros((2, 1, 1, 1));
        let mut inflow = Array4::zeros((2, 1, 1, 1));
        let mut outflow = Array4::zeros((2, 1, 1, 1));
        inflow[[0, 0, 0, 0]] = 10.0;
        outflow[[0, 0, 0, 0]] = 4.0;
        stock[[0, 0, 0, 0]] = 6.0;
        inflow[[1, 0, 0, 0]] = 12.0;
        outflow[[1, 0, 0, 0]] = 5.0;
        stock[[1, 0, 0, 0]] = 13.0;
        StockData { stock, inflow, outflow }
    }

    #[test]
    fn test_consistent_data_validates() {
        consistent_data().validate(&space()).unwrap();
    }

    #[test]
    fn test_negative_inflow_rejected() {
        let mut data = consistent_data();
        data.inflow[[0, 0, 0, 0]] = -1.0;
        assert!(data.validate(&space()).is_err());
    }

    #[test]
    fn test_inconsistent_stock_change_rejected() {
        let mut data = consistent_data();
        data.stock[[1, 0, 0, 0]] = 20.0;
        assert!(data.validate(&space()).is_err());
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let data = StockData {
            stock: Array4::zeros((2, 2, 1, 1)),
            inflow: Array4::zeros((2, 2, 1, 1)),
            outflow: Array4::zeros((2, 2, 1, 1)),
        };
        assert!(data.validate(&space()).is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = std::env::temp_dir().join("steel-mfa-dsm-test");
        let path = dir.join("stock.bin");
        FileStockModel::store(&path, &consistent_data()).unwrap();
        let loaded = FileStockModel::new(&path).load(&space()).unwrap();
        assert_eq!(loaded.inflow[[1, 0, 0, 0]], 12.0);
        std::fs::remove_dir_all(dir).ok();
    }
}
