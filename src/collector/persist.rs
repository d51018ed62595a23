//! Load sample persistence.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::load_balancer::registry::LoadSamples;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write load samples: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode load samples: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Write `{"<worker id>": [load, ...]}` to `path`, creating parent directories.
///
/// The file is written next to its final location and renamed into place.
pub fn flush_load_samples(samples: &LoadSamples, path: &Path) -> Result<(), PersistError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let body = serde_json::to_vec(samples)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
