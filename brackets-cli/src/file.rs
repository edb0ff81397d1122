use std::fs;
use std::path::Path;

use brackets_core::Bracket;

use crate::Error;

/// Reads a bracket from the JSON file at `path`. The bracket is validated while reading.
pub fn load(path: &Path) -> Result<Bracket, Error> {
    let buf = fs::read(path).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;

    let bracket = serde_json::from_slice(&buf).map_err(|source| Error::Json {
        path: path.to_owned(),
        source,
    })?;

    log::debug!("Loaded bracket from {}", path.display());

    Ok(bracket)
}

pub fn save(path: &Path, bracket: &Bracket) -> Result<(), Error> {
    let buf = serde_json::to_vec_pretty(bracket).map_err(|source| Error::Json {
        path: path.to_owned(),
        source,
    })?;

    fs::write(path, buf).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;

    log::debug!("Saved bracket to {}", path.display());

    Ok(())
}
