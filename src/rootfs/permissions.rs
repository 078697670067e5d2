//! Ownership and permission normalization.

use anyhow::{Context, Result};

use crate::privilege::Elevator;

use super::{bin_dir, DistTree, SET_ID_BINARY};

/// Fix ownership and modes across the finished tree.
///
/// The recursive chown clears set-id bits as a platform side effect, so the
/// privileged binary's bits are applied after it, never before.
pub fn normalize(tree: &DistTree, elevator: &dyn Elevator) -> Result<()> {
    println!("Normalizing ownership and permissions...");

    elevator
        .chmod("755", tree.root())
        .context("Failed to set the mode of the staging root")?;
    elevator
        .chown_recursive("root:root", tree.root())
        .context("Failed to assign root ownership to the tree")?;

    let privileged = tree.host(&bin_dir().join(SET_ID_BINARY));
    elevator
        .add_set_id_bits(&privileged)
        .with_context(|| format!("Failed to set the set-id bits on '{}'", SET_ID_BINARY))?;

    Ok(())
}
