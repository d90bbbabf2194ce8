use ndarray::{ArrayD, Axis};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::index::{Dim, IndexSpace};
use crate::graph::process::Process;

/// Material stock attached to a single process: a level tensor and a change
/// tensor over the same dimension subset, Time-major. The level integrates
/// the change over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub process: Process,
    dims: Vec<Dim>,
    level: ArrayD<f64>,
    change: ArrayD<f64>,
}

impl Stock {
    pub fn zeros(process: Process, dims: &[Dim], space: &IndexSpace) -> Self {
        let shape = space.shape_of(dims);
        Self {
            process,
            dims: dims.to_vec(),
            level: ArrayD::zeros(shape.clone()),
            change: ArrayD::zeros(shape),
        }
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    pub fn level(&self) -> &ArrayD<f64> {
        &self.level
    }

    pub fn change(&self) -> &ArrayD<f64> {
        &self.change
    }

    /// Set both tensors directly (in-use stock, which the stock model
    /// supplies fully resolved).
    pub fn set(&mut self, level: ArrayD<f64>, change: ArrayD<f64>) -> Result<(), ModelError> {
        self.check_shape("level", &level)?;
        self.check_shape("change", &change)?;
        self.level = level;
        self.change = change;
        Ok(())
    }

    /// Set the change tensor and integrate the level forward in time:
    /// level[t] = level[t-1] + change[t], with no carry-in before the first
    /// year.
    pub fn set_change_and_integrate(&mut self, change: ArrayD<f64>) -> Result<(), ModelError> {
        self.check_shape("change", &change)?;
        let mut level = change.clone();
        level.accumulate_axis_inplace(Axis(0), |&prev, cur| *cur += prev);
        self.level = level;
        self.change = change;
        Ok(())
    }

    fn check_shape(&self, what: &str, values: &ArrayD<f64>) -> Result<(), ModelError> {
        if values.shape() != self.change.shape() {
            return Err(ModelError::Shape {
                name: format!("{} stock {what}", self.process),
                expected: self.change.shape().to_vec(),
                actual: values.shape().to_vec(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{RegionMode, WasteCategories};
    use ndarray::ArrayD;

    fn space() -> IndexSpace {
        IndexSpace {
            years: vec![2000, 2001, 2002],
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

    #[test]
    fn test_integration_is_cumulative_sum() {
        let mut stock = Stock::zeros(Process::Waste, &[Dim::Time, Dim::Region, Dim::Scenario], &space());
        let mut change = ArrayD::zeros(vec![3, 1, 1]);
        change[[0, 0, 0]] = 2.0;
        change[[1, 0, 0]] = 3.0;
        change[[2, 0, 0]] = 5.0;
        stock.set_change_and_integrate(change).unwrap();
        assert_eq!(stock.level()[[0, 0, 0]], 2.0);
        assert_eq!(stock.level()[[1, 0, 0]], 5.0);
        assert_eq!(stock.level()[[2, 0, 0]], 10.0);
    }

    #[test]
    fn test_shape_checked() {
        let mut stock = Stock::zeros(Process::Waste, &[Dim::Time, Dim::Region, Dim::Scenario], &space());
        assert!(stock.set_change_and_integrate(ArrayD::zeros(vec![3, 2, 1])).is_err());
    }
}
