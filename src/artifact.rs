//! Persistence of fitted models and scalers as MessagePack blobs.
//!
//! Artifacts carry no version or schema: a loaded model is only meaningful
//! with the scaler it was trained alongside and inputs in
//! [`crate::record::Feature::ALL`] order.

use anyhow::{Context, Result};
use rmp_serde::{decode::from_read, encode::write_named};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Serializes `value` to `path`, creating parent directories as needed.
pub fn save<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("failed to create artifact {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_named(&mut writer, value)
        .with_context(|| format!("failed to serialize artifact {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Reads back an artifact written by [`save`].
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("failed to open artifact {}", path.display()))?;
    let reader = BufReader::new(file);
    from_read(reader).with_context(|| format!("failed to deserialize artifact {}", path.display()))
}
