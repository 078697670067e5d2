//! Archive packaging for the distribution tree.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::privilege::Elevator;

use super::{opt_dir, DistTree};

/// Directory whose contents end up at the archive root.
///
/// Full mode archives the whole staging root; opt-dir-only mode archives
/// just the distribution namespace, for in-place upgrades.
pub fn archive_source(tree: &DistTree, opt_dir_only: bool) -> PathBuf {
    if opt_dir_only {
        tree.host(&opt_dir())
    } else {
        tree.root().to_path_buf()
    }
}

/// Compress the tree into the output archive and hand the staging
/// directory back to the invoking user.
///
/// Ownership restoration runs even when archiving failed, so a root-owned
/// temporary directory is never leaked; the two failures are reported
/// independently.
pub fn create_archive(
    tree: &DistTree,
    output: &Path,
    opt_dir_only: bool,
    elevator: &dyn Elevator,
) -> Result<()> {
    let source = archive_source(tree, opt_dir_only);
    println!("Creating archive from {}...", source.display());

    let archived = elevator.archive(&source, output);
    let restored = elevator.restore_owner(tree.root());

    if let Err(err) = &restored {
        log::error!("failed to restore staging ownership: {:#}", err);
    }
    archived.context("Failed to create the output archive")?;
    restored.context("Failed to restore staging directory ownership")?;

    if let Ok(metadata) = fs::metadata(output) {
        let size_mb = metadata.len() as f64 / 1024.0 / 1024.0;
        println!("  Archive size: {:.2} MB", size_mb);
    }

    Ok(())
}
