//! Reuse-fraction timeline: zero at the base year, growing linearly to the
//! configured end-year factor minus one. Uniform across regions.

use ndarray::Array3;

use crate::config::Config;
use crate::index::IndexSpace;

/// Factor-minus-one timeline (t, g, s), or `None` when reuse is disabled.
pub fn reuse_timeline(cfg: &Config, space: &IndexSpace) -> Option<Array3<f64>> {
    if !cfg.reuse.enabled {
        return None;
    }
    let base_year = cfg.reuse.base_year;
    let end_year = *space.years.last()?;
    let span = (end_year - base_year) as f64;
    let mut timeline = Array3::zeros((
        space.years.len(),
        space.goods.len(),
        space.scenarios.len(),
    ));
    if span <= 0.0 {
        return Some(timeline);
    }
    for (t, &year) in space.years.iter().enumerate() {
        if year <= base_year {
            continue;
        }
        let progress = (year - base_year) as f64 / span;
        for (s, factors) in cfg.reuse.end_factors.iter().enumerate() {
            for (g, &factor) in factors.iter().enumerate() {
                timeline[[t, g, s]] = progress * (factor - 1.0);
            }
        }
    }
    Some(timeline)
}
