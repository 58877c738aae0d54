//! Seed image management.
//!
//! `def.db` in the data directory is the image `db reset` restores from. A
//! dated export can be promoted to become the new seed.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const SEED_FILE_NAME: &str = "def.db";
const EXPORT_PREFIX: &str = "command-hub-";
const EXPORT_SUFFIX: &str = ".db";

#[derive(Debug)]
pub struct Promotion {
    pub source: PathBuf,
    pub target: PathBuf,
    /// Whether an older seed was removed.
    pub replaced: bool,
    /// Exports that matched; only the newest is promoted.
    pub candidates: usize,
}

pub fn seed_path(dir: &Path) -> PathBuf {
    dir.join(SEED_FILE_NAME)
}

/// Renames the newest `command-hub-*.db` in `dir` to `def.db`.
pub fn promote_newest_export(dir: &Path) -> Result<Promotion> {
    let mut exports = Vec::new();
    let listing =
        fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;
    for item in listing {
        let item = item?;
        let name = item.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !is_export_name(name) || !item.file_type()?.is_file() {
            continue;
        }
        let modified = item.metadata()?.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        exports.push((modified, item.path()));
    }

    let candidates = exports.len();
    let Some((_, source)) = exports.into_iter().max_by_key(|(modified, _)| *modified) else {
        bail!(
            "No {EXPORT_PREFIX}*{EXPORT_SUFFIX} export found in {}",
            dir.display()
        );
    };

    let target = seed_path(dir);
    let replaced = target.exists();
    if replaced {
        fs::remove_file(&target)
            .with_context(|| format!("Failed to remove {}", target.display()))?;
    }
    fs::rename(&source, &target).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            source.display(),
            target.display()
        )
    })?;

    Ok(Promotion {
        source,
        target,
        replaced,
        candidates,
    })
}

fn is_export_name(name: &str) -> bool {
    name.len() > EXPORT_PREFIX.len() + EXPORT_SUFFIX.len()
        && name.starts_with(EXPORT_PREFIX)
        && name.ends_with(EXPORT_SUFFIX)
}
