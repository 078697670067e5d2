//! Binary relocation engine.
//!
//! Copies each binary into the tree and rewrites its interpreter and rpath
//! so it runs against the bundled loader and libraries instead of whatever
//! versions the target host happens to carry. Foreign-platform binaries are
//! copied verbatim.

use anyhow::{bail, Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::process::Cmd;

use super::elf::{self, Dependencies};
use super::{bin_dir, ld_dir, lib_dir, BinaryDescriptor, DistTree};

/// Install one binary into the tree.
///
/// Returns the dependency set for relocated binaries so the caller can feed
/// it to the license aggregator; verbatim binaries have none.
pub fn install_binary(tree: &DistTree, descriptor: &BinaryDescriptor) -> Result<Option<Dependencies>> {
    println!("Packing binary '{}'...", descriptor.name);

    if !descriptor.source.exists() {
        bail!(
            "Binary '{}' not found at {}. Build the workspace first.",
            descriptor.name,
            descriptor.source.display()
        );
    }

    let dest = tree.host(&bin_dir().join(descriptor.name));
    fs::copy(&descriptor.source, &dest).with_context(|| {
        format!(
            "Failed to copy '{}' into the staging tree",
            descriptor.source.display()
        )
    })?;
    make_executable(&dest)?;

    if !descriptor.relocate {
        println!("  Copied verbatim (foreign platform)");
        return Ok(None);
    }

    let deps = elf::list_dependencies(&descriptor.source)
        .with_context(|| format!("Failed to resolve the dependencies of '{}'", descriptor.name))?;

    // Bundle the loader and every shared library under their base names.
    // Two libraries sharing a base name overwrite each other (last write
    // wins); that matches the launcher's flat lib directory.
    let loader_name = deps
        .loader
        .file_name()
        .with_context(|| format!("Loader path has no file name: {}", deps.loader.display()))?;
    bundle_file(&deps.loader, &tree.host(&ld_dir()))?;
    for library in &deps.libraries {
        bundle_file(library, &tree.host(&lib_dir()))?;
    }
    println!("  Bundled loader + {} shared libraries", deps.libraries.len());

    // Patch the staged copy, never the upstream build output. Both rewrites
    // must land; a binary with only one of the two is unusable.
    let bundled_loader = ld_dir().join(loader_name);
    Cmd::new("patchelf")
        .arg("--set-interpreter")
        .arg_path(bundled_loader.as_path())
        .arg_path(&dest)
        .error_msg(format!("Failed to set the interpreter of '{}'", descriptor.name))
        .run()?;
    Cmd::new("patchelf")
        .arg("--set-rpath")
        .arg_path(lib_dir().as_path())
        .arg_path(&dest)
        .error_msg(format!("Failed to set the rpath of '{}'", descriptor.name))
        .run()?;
    println!("  Relocated to {}", super::opt_dir());

    Ok(Some(deps))
}

/// Copy a dependency into a shared tree directory by base name.
fn bundle_file(source: &Path, dest_dir: &Path) -> Result<()> {
    let name = source
        .file_name()
        .with_context(|| format!("Dependency path has no file name: {}", source.display()))?;
    fs::copy(source, dest_dir.join(name))
        .with_context(|| format!("Failed to bundle '{}'", source.display()))?;
    Ok(())
}

/// Make a file executable (chmod 755).
pub fn make_executable(path: &Path) -> Result<()> {
    let mut perms = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
        .with_context(|| format!("Failed to set permissions: {}", path.display()))?;
    Ok(())
}
