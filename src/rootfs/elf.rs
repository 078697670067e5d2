//! Typed dependency listing for ELF binaries.
//!
//! The relocation engine only ever sees the parsed result: the dynamic
//! loader plus the ordered list of resolved shared libraries. The ldd
//! invocation and its text format stay contained here.

use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::process::Cmd;

/// Dependency set of a single binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependencies {
    /// The dynamic loader (e.g. /lib64/ld-linux-x86-64.so.2).
    pub loader: PathBuf,
    /// Resolved shared libraries, in listing order.
    pub libraries: Vec<PathBuf>,
}

impl Dependencies {
    /// Loader plus every library, for callers that treat them uniformly.
    pub fn all_paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.loader.as_path()).chain(self.libraries.iter().map(PathBuf::as_path))
    }
}

/// Invoke the dependency lister once for `binary`.
pub fn list_dependencies(binary: &Path) -> Result<Dependencies> {
    let result = Cmd::new("ldd")
        .arg_path(binary)
        .error_msg(format!(
            "Failed to list the dependencies of '{}'",
            binary.display()
        ))
        .run()?;

    parse_ldd_output(&result.stdout)
        .with_context(|| format!("Unexpected dependency listing for '{}'", binary.display()))
}

/// Parse ldd output into a typed dependency set.
///
/// Library lines look like `libc.so.6 => /lib/... (0x...)`; the loader line
/// is a bare absolute path. The vdso is virtual and skipped. An unresolved
/// library or a missing loader line is an error: the former would ship a
/// broken binary, the latter indicates a statically-linked or malformed one.
pub fn parse_ldd_output(output: &str) -> Result<Dependencies> {
    let mut loader = None;
    let mut libraries = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.contains("linux-vdso") || line.contains("linux-gate") {
            continue;
        }
        if line.contains("not found") {
            bail!("Unresolved shared library in dependency listing: '{}'", line);
        }

        if let Some(path_part) = line.split("=>").nth(1) {
            if let Some(path) = path_part.split_whitespace().next() {
                if path.starts_with('/') {
                    libraries.push(PathBuf::from(path));
                }
            }
        } else if line.starts_with('/') {
            if let Some(path) = line.split_whitespace().next() {
                loader = Some(PathBuf::from(path));
            }
        }
    }

    let loader = loader.ok_or_else(|| {
        anyhow!("No dynamic loader line in the dependency listing; is the binary statically linked?")
    })?;

    Ok(Dependencies { loader, libraries })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_format() {
        let output = r#"
            linux-vdso.so.1 (0x00007ffee9bfe000)
            libc.so.6 => /lib64/libc.so.6 (0x00007f1234000000)
            /lib64/ld-linux-x86-64.so.2 (0x00007f1234500000)
        "#;

        let deps = parse_ldd_output(output).expect("parse should succeed");
        assert_eq!(deps.loader, PathBuf::from("/lib64/ld-linux-x86-64.so.2"));
        assert_eq!(deps.libraries, vec![PathBuf::from("/lib64/libc.so.6")]);
    }

    #[test]
    fn test_parse_skips_vdso() {
        let output = r#"
            linux-vdso.so.1 (0x00007ffee9bfe000)
            /lib64/ld-linux-x86-64.so.2 (0x00007f1234500000)
        "#;

        let deps = parse_ldd_output(output).expect("parse should succeed");
        assert!(deps.libraries.is_empty());
    }

    #[test]
    fn test_parse_not_found_is_error() {
        let output = r#"
            libfoo.so.1 => not found
            /lib64/ld-linux-x86-64.so.2 (0x00007f1234500000)
        "#;

        let err = parse_ldd_output(output).unwrap_err();
        assert!(err.to_string().contains("libfoo.so.1"));
    }

    #[test]
    fn test_parse_missing_loader_is_error() {
        let output = "    libc.so.6 => /lib64/libc.so.6 (0x00007f1234000000)";
        assert!(parse_ldd_output(output).is_err());
    }

    #[test]
    fn test_parse_statically_linked_is_error() {
        let output = "    not a dynamic executable";
        assert!(parse_ldd_output(output).is_err());
    }

    #[test]
    fn test_parse_preserves_library_order() {
        let output = r#"
            libz.so.1 => /lib/x86_64-linux-gnu/libz.so.1 (0x0)
            libc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x0)
            /lib64/ld-linux-x86-64.so.2 (0x0)
        "#;

        let deps = parse_ldd_output(output).unwrap();
        assert_eq!(
            deps.libraries,
            vec![
                PathBuf::from("/lib/x86_64-linux-gnu/libz.so.1"),
                PathBuf::from("/lib/x86_64-linux-gnu/libc.so.6"),
            ]
        );
    }

    #[test]
    fn test_all_paths_starts_with_loader() {
        let deps = Dependencies {
            loader: PathBuf::from("/lib64/ld-linux-x86-64.so.2"),
            libraries: vec![PathBuf::from("/lib64/libc.so.6")],
        };
        let all: Vec<_> = deps.all_paths().collect();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], Path::new("/lib64/ld-linux-x86-64.so.2"));
    }
}
