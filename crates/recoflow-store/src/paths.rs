//! Path resolution for pipeline artifacts

use std::path::{Path, PathBuf};

/// Overrides the data directory
pub const ENV_DATA_DIR: &str = "RECOFLOW_DATA_DIR";

#[derive(Debug, Clone)]
pub struct Paths {
    pub data_dir: PathBuf,
}

impl Paths {
    /// `RECOFLOW_DATA_DIR`, else the platform data directory
    pub fn new() -> std::io::Result<Self> {
        if let Some(dir) = std::env::var_os(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            return Ok(Self::at(PathBuf::from(dir)));
        }
        let base = dirs::data_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "data directory not found")
        })?;
        Ok(Self::at(base.join("recoflow")))
    }

    pub fn at(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn vocabulary_file(&self) -> PathBuf {
        self.data_dir.join("vocabulary.json")
    }

    pub fn sessions_db(&self) -> PathBuf {
        self.data_dir.join("sessions.db")
    }
}
