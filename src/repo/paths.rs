use std::path::{Component, Path, PathBuf};

use crate::error::{AppError, Result};

/// Resolve user input against the current directory.
///
/// Empty input means the current directory. Absolute input is returned as
/// given; relative input is joined onto `current` and normalized.
pub fn to_absolute(input: &str, current: &Path) -> PathBuf {
    let input = input.trim();
    if input.is_empty() {
        return current.to_path_buf();
    }
    let path = Path::new(input);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    normalize(&current.join(path))
}

/// Lexically normalize a path: drop `.` and fold `..` into its parent.
///
/// Does not touch the filesystem, so it works for paths that are not
/// materialized yet. `..` above the filesystem root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// Segments of `absolute` relative to `root`.
///
/// Containment is checked component-wise, so `/cache/repo2` is not treated
/// as being inside `/cache/repo`.
pub fn to_tree_segments(absolute: &Path, root: &Path) -> Result<Vec<String>> {
    let path = normalize(absolute);
    let root = normalize(root);
    let relative = path
        .strip_prefix(&root)
        .map_err(|_| AppError::OutOfBounds(path.display().to_string()))?;
    Ok(relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().to_string()),
            _ => None,
        })
        .collect())
}

/// Local path for tree segments below `root`.
pub fn to_local<S: AsRef<str>>(root: &Path, segments: &[S]) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in segments {
        path.push(segment.as_ref());
    }
    path
}
