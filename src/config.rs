use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml, Yaml},
    Figment,
};
use ndarray::{Array1, Array2};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ModelError;
use crate::graph::ParameterSet;
use crate::index::{IndexSpace, RegionMode, WasteCategories};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub regions: RegionsConfig,
    pub scenarios: Vec<String>,
    pub goods: Vec<String>,
    pub waste: WasteConfig,
    pub production: ProductionConfig,
    pub reuse: ReuseConfig,
    pub parameters: ParametersConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub start_year: i32,
    pub end_year: i32,
    pub element: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionsConfig {
    pub mode: RegionMode,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WasteConfig {
    /// Declared collectible-first, dissipated-last.
    pub categories: Vec<String>,
    /// First category of the dissipated suffix.
    pub dissipated_boundary: String,
    /// Reserved collectible slot receiving forming scrap.
    pub forming_scrap: String,
    /// Reserved collectible slot receiving fabrication scrap.
    pub fabrication_scrap: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductionConfig {
    pub forming_yield: f64,
    /// Base ceiling on the scrap share of production.
    pub max_scrap_share: f64,
    /// Scrap fraction tolerated in the primary-route blend.
    pub primary_scrap_tolerance: f64,
    /// Year from which an exogenous scrap-share override applies.
    pub econ_start_year: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReuseConfig {
    pub enabled: bool,
    /// Reuse factor equals one at this year.
    pub base_year: i32,
    /// End-year reuse factor per scenario (outer) and good (inner).
    pub end_factors: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParametersConfig {
    /// Per good, in (0, 1].
    pub fabrication_yield: Vec<f64>,
    /// Per good (outer) over waste categories (inner); rows sum to one.
    pub use_eol_distribution: Vec<Vec<f64>>,
    /// Per waste category, in [0, 1].
    pub eol_recycle_rate: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory holding cached computed models.
    pub cache_dir: PathBuf,
    /// Stock-model snapshot consumed on rebuild.
    pub stock_snapshot: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_with_override(None)
    }

    /// Defaults, then an optional override document (TOML or YAML), then
    /// environment variables.
    pub fn load_with_override(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Toml::file("config/default.toml"));
        if let Some(path) = path {
            let is_yaml = path
                .extension()
                .is_some_and(|ext| ext == "yml" || ext == "yaml");
            figment = if is_yaml {
                figment.merge(Yaml::file(path))
            } else {
                figment.merge(Toml::file(path))
            };
        }
        let figment = figment.merge(Env::prefixed("STEEL_MFA__").split("__"));
        Ok(figment.extract()?)
    }

    /// Construct the index space, asserting the waste-category ordering.
    pub fn index_space(&self) -> Result<IndexSpace, ModelError> {
        if self.model.start_year > self.model.end_year {
            return Err(ModelError::InvalidConfig(format!(
                "start_year {} is after end_year {}",
                self.model.start_year, self.model.end_year
            )));
        }
        let waste = WasteCategories::new(
            self.waste.categories.clone(),
            &self.waste.dissipated_boundary,
            &self.waste.forming_scrap,
            &self.waste.fabrication_scrap,
        )?;
        Ok(IndexSpace {
            years: (self.model.start_year..=self.model.end_year).collect(),
            region_mode: self.regions.mode,
            regions: self.regions.names.clone(),
            goods: self.goods.clone(),
            waste,
            scenarios: self.scenarios.clone(),
            element: self.model.element.clone(),
        })
    }

    /// Build the immutable parameter table from the configured tensors.
    pub fn parameter_set(&self) -> Result<ParameterSet, ModelError> {
        let goods = self.goods.len();
        let waste = self.waste.categories.len();
        let mut distribution = Vec::with_capacity(goods * waste);
        for row in &self.parameters.use_eol_distribution {
            if row.len() != waste {
                return Err(ModelError::InvalidConfig(format!(
                    "use_eol_distribution rows must have {waste} entries, found {}",
                    row.len()
                )));
            }
            distribution.extend_from_slice(row);
        }
        let distribution = Array2::from_shape_vec((goods, waste), distribution)
            .map_err(|e| ModelError::InvalidConfig(e.to_string()))?;
        Ok(ParameterSet::new(
            Array1::from(self.parameters.fabrication_yield.clone()).into_dyn(),
            distribution.into_dyn(),
            Array1::from(self.parameters.eol_recycle_rate.clone()).into_dyn(),
        ))
    }

    /// Precondition checks on every configured rate and tensor. Bad
    /// configuration is rejected here instead of surfacing later as a
    /// mass-balance failure.
    pub fn validate(&self) -> Result<(), ModelError> {
        let space = self.index_space()?;
        let mut failures = space.check();

        let production = &self.production;
        if !(production.forming_yield > 0.0 && production.forming_yield <= 1.0) {
            failures.push(format!(
                "forming_yield must lie in (0, 1], got {}",
                production.forming_yield
            ));
        }
        if !(0.0..=1.0).contains(&production.max_scrap_share) {
            failures.push(format!(
                "max_scrap_share must lie in [0, 1], got {}",
                production.max_scrap_share
            ));
        }
        if !(0.0..1.0).contains(&production.primary_scrap_tolerance) {
            failures.push(format!(
                "primary_scrap_tolerance must lie in [0, 1), got {}",
                production.primary_scrap_tolerance
            ));
        }
        if space.year_index(production.econ_start_year).is_none() {
            failures.push(format!(
                "econ_start_year {} lies outside the modeled years",
                production.econ_start_year
            ));
        }

        if self.reuse.enabled {
            if space.year_index(self.reuse.base_year).is_none() {
                failures.push(format!(
                    "reuse base_year {} lies outside the modeled years",
                    self.reuse.base_year
                ));
            }
            if self.reuse.end_factors.len() != space.scenarios.len() {
                failures.push(format!(
                    "reuse end_factors must have one row per scenario ({}), found {}",
                    space.scenarios.len(),
                    self.reuse.end_factors.len()
                ));
            }
            for (s, row) in self.reuse.end_factors.iter().enumerate() {
                if row.len() != space.goods.len() {
                    failures.push(format!(
                        "reuse end_factors row {s} must have one entry per good ({})",
                        space.goods.len()
                    ));
                }
                if row.iter().any(|&f| f < 1.0) {
                    failures.push(format!(
                        "reuse end_factors row {s} contains a factor below 1 (negative reuse)"
                    ));
                }
            }
        }

        if self.parameters.fabrication_yield.len() != space.goods.len() {
            failures.push(format!(
                "fabrication_yield needs one entry per good ({}), found {}",
                space.goods.len(),
                self.parameters.fabrication_yield.len()
            ));
        }
        if self.parameters.use_eol_distribution.len() != space.goods.len() {
            failures.push(format!(
                "use_eol_distribution needs one row per good ({}), found {}",
                space.goods.len(),
                self.parameters.use_eol_distribution.len()
            ));
        }
        match self.parameter_set() {
            Ok(params) => failures.extend(params.check(&space)),
            Err(err) => failures.push(err.to_string()),
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ModelError::InvalidConfig(failures.join("; ")))
        }
    }
}
