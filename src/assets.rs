//! Decorative assets shown by the form.
//!
//! A missing asset never blocks a prediction; it only produces a notice.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of looking up the logo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetStatus {
    Available { path: PathBuf, bytes: u64 },
    Missing { path: PathBuf, notice: String },
}

impl AssetStatus {
    /// Informational message for the user, if any
    pub fn notice(&self) -> Option<&str> {
        match self {
            AssetStatus::Available { .. } => None,
            AssetStatus::Missing { notice, .. } => Some(notice),
        }
    }
}

/// Check that the logo exists and is a readable, non-empty file
pub fn check_logo<P: AsRef<Path>>(path: P) -> AssetStatus {
    let path = path.as_ref().to_path_buf();

    match fs::metadata(&path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => {
            debug!(path = %path.display(), bytes = meta.len(), "Logo found");
            AssetStatus::Available {
                bytes: meta.len(),
                path,
            }
        }
        Ok(_) => {
            info!(path = %path.display(), "Logo is not a usable file");
            AssetStatus::Missing {
                notice: format!("Logo '{}' is empty or not a file", path.display()),
                path,
            }
        }
        Err(e) => {
            info!(path = %path.display(), error = %e, "Logo not found");
            AssetStatus::Missing {
                notice: format!("Logo not found at '{}'", path.display()),
                path,
            }
        }
    }
}
