//! Container-side path algebra.
//!
//! Files inside the finished image are addressed by their absolute path as
//! it will exist at runtime (e.g. `/opt/levipod/bin/levipod`), independent of
//! where the tree is staged on the build host. `ContainerPath` keeps the two
//! worlds apart: joins happen on the container side, and a single `to_host`
//! translation maps onto the staging root. Pure path algebra, no I/O.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

/// An absolute path as it will appear inside the final root filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerPath(PathBuf);

impl ContainerPath {
    /// Create a container path. A relative input is rooted at `/`, so the
    /// invariant that every container path is absolute always holds.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.is_absolute() {
            Self(path.to_path_buf())
        } else {
            Self(Path::new("/").join(path))
        }
    }

    /// Append a relative segment.
    pub fn join(&self, segment: impl AsRef<Path>) -> Self {
        debug_assert!(
            segment.as_ref().is_relative(),
            "container path segments must be relative"
        );
        Self(self.0.join(segment))
    }

    /// The location of this path inside the staging directory.
    ///
    /// Strips the leading `/` and joins onto the staging root, so
    /// `p.join(s).to_host(r) == p.to_host(r).join(s)`.
    pub fn to_host(&self, staging_root: &Path) -> PathBuf {
        match self.0.strip_prefix("/") {
            Ok(relative) => staging_root.join(relative),
            Err(_) => staging_root.join(&self.0),
        }
    }

    /// The container-side path itself.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Final component of the path, if any.
    pub fn file_name(&self) -> Option<&OsStr> {
        self.0.file_name()
    }
}

impl fmt::Display for ContainerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_rooted() {
        assert_eq!(ContainerPath::new("opt/levipod").as_path(), Path::new("/opt/levipod"));
        assert_eq!(ContainerPath::new("/opt/levipod").as_path(), Path::new("/opt/levipod"));
    }

    #[test]
    fn test_to_host_strips_root() {
        let p = ContainerPath::new("/opt/levipod/bin");
        assert_eq!(
            p.to_host(Path::new("/tmp/staging")),
            PathBuf::from("/tmp/staging/opt/levipod/bin")
        );
    }

    #[test]
    fn test_join_commutes_with_to_host() {
        let staging = Path::new("/tmp/staging");
        let cases = ["/", "/opt", "/opt/levipod/misc/licenses"];
        for case in cases {
            let p = ContainerPath::new(case);
            assert_eq!(
                p.join("x").to_host(staging),
                p.to_host(staging).join("x"),
                "commutation failed for {}",
                case
            );
        }
    }

    #[test]
    fn test_join_is_associative() {
        let p = ContainerPath::new("/opt");
        assert_eq!(p.join("a").join("b"), p.join("a/b"));
    }

    #[test]
    fn test_file_name() {
        let p = ContainerPath::new("/opt/levipod/lib/libfoo.so.1");
        assert_eq!(p.file_name(), Some(OsStr::new("libfoo.so.1")));
    }
}
