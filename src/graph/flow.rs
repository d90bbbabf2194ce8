use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::index::{Dim, IndexSpace};
use crate::graph::process::Process;

/// A directed flow edge carrying a dense tensor over its declared dimension
/// subset. Created zero-filled at graph setup, written exactly once per
/// computation, read thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub from: Process,
    pub to: Process,
    dims: Vec<Dim>,
    values: ArrayD<f64>,
    written: bool,
}

impl Flow {
    pub fn zeros(from: Process, to: Process, dims: &[Dim], space: &IndexSpace) -> Self {
        let shape = space.shape_of(dims);
        Self {
            from,
            to,
            dims: dims.to_vec(),
            values: ArrayD::zeros(shape),
            written: false,
        }
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    pub fn is_written(&self) -> bool {
        self.written
    }

    /// One-shot assignment of the computed edge value. The shape must match
    /// the declared signature and the edge must not have been written before.
    pub fn write(&mut self, values: ArrayD<f64>) -> Result<(), ModelError> {
        if values.shape() != self.values.shape() {
            return Err(ModelError::Shape {
                name: format!("{} -> {}", self.from, self.to),
                expected: self.values.shape().to_vec(),
                actual: values.shape().to_vec(),
            });
        }
        if self.written {
            return Err(ModelError::Inconsistent {
                failures: vec![format!("edge {} -> {} written twice", self.from, self.to)],
            });
        }
        self.values = values;
        self.written = true;
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
            years: vec![2000, 2001],
            region_mode: RegionMode::Aggregated,
            regions: vec!["EUR".to_string(), "CHA".to_string()],
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
    fn test_zero_initialized_with_declared_shape() {
        let flow = Flow::zeros(
            Process::Primary,
            Process::Forming,
            &[Dim::Time, Dim::Region, Dim::Scenario],
            &space(),
        );
        assert_eq!(flow.values().shape(), &[2, 2, 1]);
        assert!(!flow.is_written());
        assert!(flow.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_write_rejects_wrong_shape() {
        let mut flow = Flow::zeros(
            Process::Primary,
            Process::Forming,
            &[Dim::Time, Dim::Region, Dim::Scenario],
            &space(),
        );
        let bad = ArrayD::zeros(vec![2, 1, 1]);
        assert!(flow.write(bad).is_err());
    }

    #[test]
    fn test_write_exactly_once() {
        let mut flow = Flow::zeros(
            Process::Primary,
            Process::Forming,
            &[Dim::Time, Dim::Region, Dim::Scenario],
            &space(),
        );
        let values = ArrayD::from_elem(vec![2, 2, 1], 1.5);
        flow.write(values.clone()).unwrap();
        assert!(flow.is_written());
        assert!(flow.write(values).is_err());
    }
}
