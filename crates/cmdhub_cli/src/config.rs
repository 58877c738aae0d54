//! Runtime configuration for the CLI.
//!
//! Precedence: command-line flags, then `CMDHUB_*` environment variables
//! (both handled by clap), then platform defaults.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Holds the snapshot slot, `session.json` and the seed image.
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn resolve(
        data_dir: Option<PathBuf>,
        log_dir: Option<PathBuf>,
        log_level: Option<String>,
    ) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => absolutize(&dir)?,
            None => default_data_dir()?,
        };
        let log_dir = match log_dir {
            Some(dir) => absolutize(&dir)?,
            None => data_dir.join(LOG_DIR_NAME),
        };
        let log_level =
            log_level.unwrap_or_else(|| cmdhub_core::default_log_level().to_string());

        Ok(Self {
            data_dir,
            log_dir,
            log_level,
        })
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("dev", "cmdhub", "cmdhub")
        .context("Could not determine data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Could not read current directory")?;
    Ok(cwd.join(path))
}
