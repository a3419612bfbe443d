use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to load api key (open {}: {source})", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Please enter your osu! api key in {}!", .path.display())]
    Empty { path: PathBuf },
}

/// Read the osu! API key from `path`, dropping every line break.
///
/// Called before each check, so fixing the file takes effect without a restart.
pub fn load_api_key(path: &Path) -> Result<String, CredentialError> {
    let raw = fs::read_to_string(path).map_err(|source| CredentialError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let key: String = raw.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    if key.is_empty() {
        return Err(CredentialError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(key)
}
