//! Persisted view state (`session.json`).

use anyhow::{Context, Result};
use cmdhub_core::ViewContext;
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

pub const SESSION_FILE_NAME: &str = "session.json";

pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILE_NAME)
}

/// Last saved view; missing or unreadable files fall back to the default.
pub fn load(data_dir: &Path) -> ViewContext {
    let path = session_path(data_dir);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(_) => return ViewContext::default(),
    };
    match serde_json::from_str(&text) {
        Ok(context) => context,
        Err(err) => {
            warn!(
                "event=session_load module=cli status=error error_code=session_parse_failed error={}",
                err
            );
            ViewContext::default()
        }
    }
}

pub fn save(data_dir: &Path, context: &ViewContext) -> Result<()> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
    let path = session_path(data_dir);
    let text = serde_json::to_string_pretty(context)?;
    fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))
}
