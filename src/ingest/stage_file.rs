use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use serde::Serialize;
use serde::de::DeserializeOwned;
use anyhow::{Result, Context};
use tracing::info;

/// Persists a stage's output so the next stage can pick it up in a later run.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)
        .with_context(|| format!("Failed to write {:?}", path))?;
    writer.flush().with_context(|| format!("Failed to write {:?}", path))?;
    info!("Saved stage output to {:?}", path);
    Ok(())
}

/// Reads a previous stage's output; `None` when that stage has not run yet.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to open {:?}", path)),
    };
    let value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{:?} is not a valid stage file", path))?;
    Ok(Some(value))
}
