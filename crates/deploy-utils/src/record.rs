/// Persists deployment records so an operator can see what a run produced.
use std::{
    fs::{create_dir_all, File},
    path::Path,
};

use eyre::{Result, WrapErr};
use serde::Serialize;
use tracing::info;

/// Writes a deployment record as pretty JSON, creating parent directories as
/// needed. An existing file is overwritten.
pub fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    let f = File::create(path).wrap_err_with(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(f, record)?;
    info!(path = %path.display(), "wrote deployment record");
    Ok(())
}
