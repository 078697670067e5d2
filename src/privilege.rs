//! Privileged filesystem operations.
//!
//! The permission normalizer and archive packager need root-only operations
//! (recursive chown to root, set-id bits, tar over a root-owned tree). They
//! go through the `Elevator` trait so tests can substitute a double and
//! simulate success or failure without real elevated rights.

use anyhow::Result;
use nix::unistd::{Gid, Uid};
use std::path::Path;

use crate::process::Cmd;

/// Privileged operations the pipeline depends on. Any failure is fatal;
/// there is no retry policy for privilege errors.
pub trait Elevator {
    /// Set the mode of a single path.
    fn chmod(&self, mode: &str, path: &Path) -> Result<()>;

    /// Recursively change ownership of a tree.
    fn chown_recursive(&self, owner: &str, path: &Path) -> Result<()>;

    /// Apply the set-uid and set-gid bits to a binary.
    fn add_set_id_bits(&self, path: &Path) -> Result<()>;

    /// Compress `src_dir` (including all top-level entries) into a tar.gz
    /// archive at `output`. Runs privileged because the tree is root-owned
    /// by the time it is archived.
    fn archive(&self, src_dir: &Path, output: &Path) -> Result<()>;

    /// Return ownership of a tree to the invoking user so normal cleanup
    /// can delete it.
    fn restore_owner(&self, path: &Path) -> Result<()>;
}

/// Real implementation shelling out through the configured privilege
/// command (sudo by default).
pub struct SudoElevator {
    sudo: String,
}

impl SudoElevator {
    pub fn new(sudo_command: &str) -> Self {
        Self {
            sudo: sudo_command.to_string(),
        }
    }
}

impl Elevator for SudoElevator {
    fn chmod(&self, mode: &str, path: &Path) -> Result<()> {
        Cmd::new(&self.sudo)
            .arg("chmod")
            .arg(mode)
            .arg_path(path)
            .error_msg(format!("Failed to set mode {} on '{}'", mode, path.display()))
            .run()?;
        Ok(())
    }

    fn chown_recursive(&self, owner: &str, path: &Path) -> Result<()> {
        Cmd::new(&self.sudo)
            .arg("chown")
            .arg("-R")
            .arg(owner)
            .arg_path(path)
            .error_msg(format!(
                "Failed to change ownership of '{}' to {}",
                path.display(),
                owner
            ))
            .run()?;
        Ok(())
    }

    fn add_set_id_bits(&self, path: &Path) -> Result<()> {
        Cmd::new(&self.sudo)
            .arg("chmod")
            .arg("u+s,g+s")
            .arg_path(path)
            .error_msg(format!("Failed to set the set-id bits on '{}'", path.display()))
            .run()?;
        Ok(())
    }

    fn archive(&self, src_dir: &Path, output: &Path) -> Result<()> {
        Cmd::new(&self.sudo)
            .arg("tar")
            .arg("czf")
            .arg_path(output)
            .arg("-C")
            .arg_path(src_dir)
            .arg(".")
            .error_msg(format!("Failed to archive '{}'", src_dir.display()))
            .run()?;
        Ok(())
    }

    fn restore_owner(&self, path: &Path) -> Result<()> {
        let owner = format!("{}:{}", Uid::current(), Gid::current());
        self.chown_recursive(&owner, path)
    }
}
