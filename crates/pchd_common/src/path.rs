//! Lexical path normalisation.
//!
//! Normalisation never touches the filesystem: symlinks are not resolved and
//! missing files normalise the same as existing ones. Use
//! `std::fs::canonicalize` where file identity matters.

use std::path::{Component, Path, PathBuf};

/// Normalises a path by dropping `.` components and folding `..` into the
/// preceding component.
///
/// A `..` that would climb above the root of an absolute path is dropped; in
/// a relative path it is kept, since there is nothing to fold it into.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => result.push(component),
            },
            _ => result.push(component),
        }
    }
    result
}

/// Joins a relative `path` onto `base` and normalises the result.
///
/// Absolute paths are normalised as-is.
pub fn normalize_with_base(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_cur_dir() {
        assert_eq!(normalize_path(Path::new("/a/./b/./c.h")), PathBuf::from("/a/b/c.h"));
    }

    #[test]
    fn folds_parent_dir() {
        assert_eq!(normalize_path(Path::new("/a/b/../c.h")), PathBuf::from("/a/c.h"));
        assert_eq!(normalize_path(Path::new("/a/b/c/../../d.h")), PathBuf::from("/a/d.h"));
    }

    #[test]
    fn parent_above_root_is_dropped() {
        assert_eq!(normalize_path(Path::new("/../a.h")), PathBuf::from("/a.h"));
    }

    #[test]
    fn leading_parent_in_relative_path_is_kept() {
        assert_eq!(normalize_path(Path::new("../data/x.h")), PathBuf::from("../data/x.h"));
        assert_eq!(normalize_path(Path::new("a/../../x.h")), PathBuf::from("../x.h"));
    }

    #[test]
    fn with_base_joins_relative() {
        assert_eq!(
            normalize_with_base(Path::new("/work/src"), Path::new("../include/a.h")),
            PathBuf::from("/work/include/a.h")
        );
        assert_eq!(
            normalize_with_base(Path::new("/work"), Path::new("/abs/./b.h")),
            PathBuf::from("/abs/b.h")
        );
    }
}
