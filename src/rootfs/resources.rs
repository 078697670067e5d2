//! Static resources merge.
//!
//! Copies the workspace's resources directory verbatim into the
//! distribution namespace. Staged files are never overwritten; a collision
//! means a resource shadows a binary or a license entry, which is a logic
//! error worth stopping for.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::{opt_dir, DistTree};

pub fn merge_resources(tree: &DistTree, resources: &Path) -> Result<()> {
    if !resources.is_dir() {
        bail!(
            "Resources directory not found: {}. Set LEVIPACK_RESOURCES to override.",
            resources.display()
        );
    }

    println!("Merging static resources from {}...", resources.display());
    let dest_root = tree.host(&opt_dir());
    let mut copied = 0usize;

    for entry in WalkDir::new(resources) {
        let entry = entry.context("Failed to walk the resources directory")?;
        let relative = entry
            .path()
            .strip_prefix(resources)
            .context("Resource entry outside the resources directory")?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let dest = dest_root.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)
                .with_context(|| format!("Failed to create resource directory '{}'", relative.display()))?;
        } else {
            if dest.exists() {
                bail!(
                    "Resource '{}' collides with an already staged file",
                    relative.display()
                );
            }
            fs::copy(entry.path(), &dest)
                .with_context(|| format!("Failed to copy resource '{}'", relative.display()))?;
            copied += 1;
        }
    }

    println!("  Copied {} resource files", copied);
    Ok(())
}
