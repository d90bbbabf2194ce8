use ndarray::{ArrayD, ArrayView1, ArrayView2, Axis, Ix1, Ix2};
use serde::{Deserialize, Serialize};

use crate::index::{Dim, IndexSpace};
use crate::graph::process::Process;

/// An immutable named coefficient tensor with a declared owning process and
/// dimension subset. Loaded once, never mutated during a computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub owner: Process,
    pub dims: Vec<Dim>,
    pub values: ArrayD<f64>,
}

impl Parameter {
    fn new(name: &str, owner: Process, dims: &[Dim], values: ArrayD<f64>) -> Self {
        Self { name: name.to_string(), owner, dims: dims.to_vec(), values }
    }
}

/// The parameter store: fabrication yield, use->end-of-life distribution,
/// end-of-life->recyclable fraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSet {
    fabrication_yield: Parameter,
    use_eol_distribution: Parameter,
    eol_recycle_rate: Parameter,
}

impl ParameterSet {
    pub fn new(
        fabrication_yield: ArrayD<f64>,
        use_eol_distribution: ArrayD<f64>,
        eol_recycle_rate: ArrayD<f64>,
    ) -> Self {
        Self {
            fabrication_yield: Parameter::new(
                "Fabrication_Yield",
                Process::Fabrication,
                &[Dim::Good],
                fabrication_yield,
            ),
            use_eol_distribution: Parameter::new(
                "Use-EOL_Distribution",
                Process::Use,
                &[Dim::Good, Dim::Waste],
                use_eol_distribution,
            ),
            eol_recycle_rate: Parameter::new(
                "EOL-Recycle_Distribution",
                Process::Recycling,
                &[Dim::Waste],
                eol_recycle_rate,
            ),
        }
    }

    /// Fraction of fabricated material that ends up as usable product, per
    /// good. Strictly positive; enforced before model construction.
    pub fn fabrication_yield(&self) -> ArrayView1<f64> {
        self.fabrication_yield
            .values
            .view()
            .into_dimensionality::<Ix1>()
            .expect("Fabrication_Yield is declared one-dimensional")
    }

    /// Distribution of use-phase outflow over waste categories; rows (per
    /// good) sum to one.
    pub fn use_eol_distribution(&self) -> ArrayView2<f64> {
        self.use_eol_distribution
            .values
            .view()
            .into_dimensionality::<Ix2>()
            .expect("Use-EOL_Distribution is declared two-dimensional")
    }

    /// Recyclable fraction per waste category, in [0, 1].
    pub fn eol_recycle_rate(&self) -> ArrayView1<f64> {
        self.eol_recycle_rate
            .values
            .view()
            .into_dimensionality::<Ix1>()
            .expect("EOL-Recycle_Distribution is declared one-dimensional")
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        [
            &self.fabrication_yield,
            &self.use_eol_distribution,
            &self.eol_recycle_rate,
        ]
        .into_iter()
    }

    /// Structural and domain checks against the index space. Returns the
    /// list of failures, empty when the table is well-formed.
    pub fn check(&self, space: &IndexSpace) -> Vec<String> {
        let mut failures = Vec::new();
        for param in self.iter() {
            let expected = space.shape_of(&param.dims);
            if param.values.shape() != expected.as_slice() {
                failures.push(format!(
                    "parameter {}: expected shape {:?}, got {:?}",
                    param.name,
                    expected,
                    param.values.shape()
                ));
            }
        }
        if !failures.is_empty() {
            return failures;
        }

        if self.fabrication_yield().iter().any(|&y| y <= 0.0 || y > 1.0) {
            failures.push("parameter Fabrication_Yield: values must lie in (0, 1]".to_string());
        }
        if self.eol_recycle_rate().iter().any(|&r| !(0.0..=1.0).contains(&r)) {
            failures.push("parameter EOL-Recycle_Distribution: values must lie in [0, 1]".to_string());
        }
        let dist = self.use_eol_distribution();
        for (g, row) in dist.axis_iter(Axis(0)).enumerate() {
            let sum: f64 = row.sum();
            if (sum - 1.0).abs() > 1e-9 {
                failures.push(format!(
                    "parameter Use-EOL_Distribution: row for good '{}' sums to {sum}, expected 1",
                    space.goods[g]
                ));
            }
            if row.iter().any(|&v| v < 0.0) {
                failures.push(format!(
                    "parameter Use-EOL_Distribution: negative share for good '{}'",
                    space.goods[g]
                ));
            }
        }
        // The reserved scrap slots are fed by forming and fabrication, not by
        // end-of-life outflow; any end-of-life mass routed there would be
        // overwritten during scrap pooling.
        for slot in [space.waste.forming_slot(), space.waste.fabrication_slot()] {
            if dist.index_axis(Axis(1), slot).iter().any(|&v| v != 0.0) {
                failures.push(format!(
                    "parameter Use-EOL_Distribution: reserved scrap slot '{}' must receive no end-of-life share",
                    space.waste.names()[slot]
                ));
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{RegionMode, WasteCategories};
    use ndarray::{arr1, arr2};

    fn space() -> IndexSpace {
        IndexSpace {
            years: vec![2000],
            region_mode: RegionMode::Aggregated,
            regions: vec!["EUR".to_string()],
            goods: vec!["Construction".to_string(), "Machinery".to_string()],
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

    fn valid_params() -> ParameterSet {
        ParameterSet::new(
            arr1(&[0.9, 0.85]).into_dyn(),
            arr2(&[[0.8, 0.0, 0.0, 0.2], [0.6, 0.0, 0.0, 0.4]]).into_dyn(),
            arr1(&[1.0, 1.0, 1.0, 0.0]).into_dyn(),
        )
    }

    #[test]
    fn test_valid_table_passes() {
        assert!(valid_params().check(&space()).is_empty());
    }

    #[test]
    fn test_zero_yield_rejected() {
        let params = ParameterSet::new(
            arr1(&[0.9, 0.0]).into_dyn(),
            arr2(&[[0.8, 0.0, 0.0, 0.2], [0.6, 0.0, 0.0, 0.4]]).into_dyn(),
            arr1(&[1.0, 1.0, 1.0, 0.0]).into_dyn(),
        );
        assert!(!params.check(&space()).is_empty());
    }

    #[test]
    fn test_distribution_rows_must_sum_to_one() {
        let params = ParameterSet::new(
            arr1(&[0.9, 0.85]).into_dyn(),
            arr2(&[[0.8, 0.0, 0.0, 0.1], [0.6, 0.0, 0.0, 0.4]]).into_dyn(),
            arr1(&[1.0, 1.0, 1.0, 0.0]).into_dyn(),
        );
        assert!(!params.check(&space()).is_empty());
    }

    #[test]
    fn test_reserved_slots_must_stay_empty() {
        let params = ParameterSet::new(
            arr1(&[0.9, 0.85]).into_dyn(),
            arr2(&[[0.7, 0.1, 0.0, 0.2], [0.6, 0.0, 0.0, 0.4]]).into_dyn(),
            arr1(&[1.0, 1.0, 1.0, 0.0]).into_dyn(),
        );
        assert!(!params.check(&space()).is_empty());
    }

    #[test]
    fn test_wrong_shape_reported() {
        let params = ParameterSet::new(
            arr1(&[0.9]).into_dyn(),
            arr2(&[[0.8, 0.0, 0.0, 0.2], [0.6, 0.0, 0.0, 0.4]]).into_dyn(),
            arr1(&[1.0, 1.0, 1.0, 0.0]).into_dyn(),
        );
        let failures = params.check(&space());
        assert!(failures.iter().any(|f| f.contains("Fabrication_Yield")));
    }
}
