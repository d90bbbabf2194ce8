//! Index space: the orthogonal dimensions every flow and stock tensor is
//! defined over. Constructed once from the configuration and held immutable
//! for the lifetime of a computed model.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::ModelError;

/// Region resolution of a model run. The two modes are mutually exclusive;
/// the cache key is derived from this.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RegionMode {
    Countries,
    Aggregated,
}

/// A tensor axis. Dimension order is a fixed convention per tensor role:
/// flows are Time-major with Scenario last, stocks follow the same order,
/// parameters carry only their declared category axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Dim {
    Time,
    Region,
    Good,
    Waste,
    Scenario,
}

/// Waste/scrap categories with the named collectible/dissipated boundary.
///
/// Invariant (asserted at construction): categories are declared in
/// collectible-first, dissipated-last order; the boundary category opens the
/// dissipated suffix; the reserved forming- and fabrication-scrap slots sit
/// in the collectible prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteCategories {
    names: Vec<String>,
    dissipated_from: usize,
    forming_slot: usize,
    fabrication_slot: usize,
}

impl WasteCategories {
    pub fn new(
        names: Vec<String>,
        dissipated_boundary: &str,
        forming_slot: &str,
        fabrication_slot: &str,
    ) -> Result<Self, ModelError> {
        let position = |cat: &str| {
            names
                .iter()
                .position(|n| n == cat)
                .ok_or_else(|| ModelError::InvalidConfig(format!("unknown waste category '{cat}'")))
        };
        let dissipated_from = position(dissipated_boundary)?;
        let forming_slot = position(forming_slot)?;
        let fabrication_slot = position(fabrication_slot)?;
        if forming_slot >= dissipated_from || fabrication_slot >= dissipated_from {
            return Err(ModelError::InvalidConfig(format!(
                "scrap slots must lie in the collectible prefix (before '{dissipated_boundary}')"
            )));
        }
        if forming_slot == fabrication_slot {
            return Err(ModelError::InvalidConfig(
                "forming and fabrication scrap need distinct waste categories".to_string(),
            ));
        }
        Ok(Self { names, dissipated_from, forming_slot, fabrication_slot })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// First index of the dissipated suffix.
    pub fn dissipated_from(&self) -> usize {
        self.dissipated_from
    }

    /// Index range of the collectible prefix.
    pub fn collectible(&self) -> std::ops::Range<usize> {
        0..self.dissipated_from
    }

    /// Index range of the dissipated suffix.
    pub fn dissipated(&self) -> std::ops::Range<usize> {
        self.dissipated_from..self.names.len()
    }

    /// Reserved slot that receives forming scrap.
    pub fn forming_slot(&self) -> usize {
        self.forming_slot
    }

    /// Reserved slot that receives fabrication scrap.
    pub fn fabrication_slot(&self) -> usize {
        self.fabrication_slot
    }
}

/// The full index space of one model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpace {
    pub years: Vec<i32>,
    pub region_mode: RegionMode,
    pub regions: Vec<String>,
    pub goods: Vec<String>,
    pub waste: WasteCategories,
    pub scenarios: Vec<String>,
    /// Singleton element classification; the model tracks one material.
    pub element: String,
}

impl IndexSpace {
    pub fn dim_len(&self, dim: Dim) -> usize {
        match dim {
            Dim::Time => self.years.len(),
            Dim::Region => self.regions.len(),
            Dim::Good => self.goods.len(),
            Dim::Waste => self.waste.len(),
            Dim::Scenario => self.scenarios.len(),
        }
    }

    /// Shape of a tensor over the given dimension signature.
    pub fn shape_of(&self, dims: &[Dim]) -> Vec<usize> {
        dims.iter().map(|&d| self.dim_len(d)).collect()
    }

    /// Position of a calendar year on the Time axis.
    pub fn year_index(&self, year: i32) -> Option<usize> {
        self.years.iter().position(|&y| y == year)
    }

    /// Basic sanity of the declared dimensions.
    pub fn check(&self) -> Vec<String> {
        let mut failures = Vec::new();
        if self.years.is_empty() {
            failures.push("Time dimension is empty".to_string());
        }
        if self.years.windows(2).any(|w| w[1] != w[0] + 1) {
            failures.push("Time dimension must be consecutive years".to_string());
        }
        if self.regions.is_empty() {
            failures.push("Region dimension is empty".to_string());
        }
        if self.goods.is_empty() {
            failures.push("Good dimension is empty".to_string());
        }
        if self.waste.is_empty() {
            failures.push("Waste dimension is empty".to_string());
        }
        if self.scenarios.is_empty() {
            failures.push("Scenario dimension is empty".to_string());
        }
        failures
    }
}
