//! Directory skeleton for the distribution tree.

use anyhow::{bail, Context, Result};
use std::fs;
use std::io;

use crate::common::ContainerPath;

use super::{alias_dir, bin_dir, ld_dir, lib_dir, lib_licenses_dir, DistTree};

/// Mountpoint placeholders the launcher binds onto at runtime.
pub const MOUNTPOINTS: &[&str] = &["proc", "mnt", "run", "sys", "dev", "tmp", "etc"];

/// Create the directory skeleton under the staging root.
///
/// The distribution namespace is created idempotently. Mountpoint creation
/// is also a no-op for an existing directory, but a conflicting
/// non-directory entry is a hard error: the tree starts from an empty
/// temporary root, so any collision indicates a logic error upstream.
pub fn create_skeleton(tree: &DistTree, with_mountpoints: bool) -> Result<()> {
    println!("Creating directory skeleton...");

    if with_mountpoints {
        for name in MOUNTPOINTS {
            let host = tree.host(&ContainerPath::new(name));
            match fs::create_dir(&host) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    if !host.is_dir() {
                        bail!(
                            "Mountpoint placeholder '{}' collides with a non-directory entry at {}",
                            name,
                            host.display()
                        );
                    }
                }
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to create mountpoint '{}'", name));
                }
            }
        }
    }

    for dir in [bin_dir(), alias_dir(), lib_dir(), ld_dir(), lib_licenses_dir()] {
        fs::create_dir_all(tree.host(&dir))
            .with_context(|| format!("Failed to create '{}' in the staging tree", dir))?;
    }

    Ok(())
}
