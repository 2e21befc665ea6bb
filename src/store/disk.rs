use crate::core::currency::RateMap;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Writes `rates` as pretty JSON, replacing `path` in one rename.
pub fn write_rates<P: AsRef<Path>>(path: P, rates: &RateMap) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let json = serde_json::to_string_pretty(rates).context("Failed to serialize rates")?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(json.as_bytes())
        .and_then(|_| tmp.flush())
        .with_context(|| format!("Failed to write rates for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write rates file: {}", path.display()))?;

    debug!("Wrote {} rates to {}", rates.len(), path.display());
    Ok(())
}

pub fn read_rates<P: AsRef<Path>>(path: P) -> Result<RateMap> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rates file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse rates file: {}", path.display()))
}
