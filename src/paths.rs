//! Lexical path helpers.
//!
//! Walk paths and exclude entries are compared in one shared form: absolute
//! against the invocation's working directory, with `.` and `..` folded away
//! without touching the filesystem.

use std::path::{Component, Path, PathBuf};

/// Makes `path` absolute against `cwd` and normalizes it lexically.
///
/// Symlinks are not resolved, so `a/link/..` becomes `a`.
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    // Joining an absolute path replaces cwd entirely.
    normalize(&cwd.join(path))
}

/// Folds `.` and `..` components without consulting the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_joined_to_cwd() {
        assert_eq!(
            absolutize(Path::new("a/b"), Path::new("/tmp/x")),
            PathBuf::from("/tmp/x/a/b")
        );
    }

    #[test]
    fn test_absolute_path_used_as_is() {
        assert_eq!(
            absolutize(Path::new("/srv/a"), Path::new("/tmp/x")),
            PathBuf::from("/srv/a")
        );
    }

    #[test]
    fn test_dot_components_removed() {
        assert_eq!(
            absolutize(Path::new("./a/./b/"), Path::new("/tmp/x")),
            PathBuf::from("/tmp/x/a/b")
        );
        assert_eq!(
            absolutize(Path::new("."), Path::new("/tmp/x")),
            PathBuf::from("/tmp/x")
        );
    }

    #[test]
    fn test_parent_components_folded() {
        assert_eq!(
            absolutize(Path::new("a/../b"), Path::new("/tmp/x")),
            PathBuf::from("/tmp/x/b")
        );
        assert_eq!(normalize(Path::new("/../..")), PathBuf::from("/"));
    }
}
