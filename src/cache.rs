//! On-disk cache for computed models, one snapshot per region mode.
//! Concurrent writers are not guarded; callers serialize rebuild requests.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ModelError;
use crate::graph::FlowNetwork;
use crate::index::RegionMode;

/// Cache file for a region mode, e.g. `main_model_aggregated.bin`.
pub fn model_path(cache_dir: &Path, mode: RegionMode) -> PathBuf {
    cache_dir.join(format!("main_model_{mode}.bin"))
}

pub fn save(path: &Path, model: &FlowNetwork) -> Result<(), ModelError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = BufWriter::new(File::create(path)?);
    bincode::serialize_into(file, model)?;
    info!(path = %path.display(), "computed model cached");
    Ok(())
}

pub fn load(path: &Path) -> Result<FlowNetwork, ModelError> {
    let file = BufReader::new(File::open(path)?);
    let model: FlowNetwork = bincode::deserialize_from(file)?;
    info!(path = %path.display(), "computed model loaded from cache");
    Ok(model)
}
