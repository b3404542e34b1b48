// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher and the pipelines.

use std::path::Path;

/// Typed decomposition of a forward-slash path string.
///
/// Used instead of ad hoc extension stripping wherever a pipeline needs the
/// base name of an input (output directory naming, animation-pattern
/// matching).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParts {
    /// Directory portion, without trailing slash. Empty for bare file names.
    pub dir: String,
    /// File name with the extension stripped.
    pub stem: String,
    /// Extension after the last dot, if any.
    pub ext: Option<String>,
}

/// Decompose a forward-slash path string into directory, stem and extension.
///
/// - Trailing slashes are ignored (`"art/hero/"` decomposes like `"art/hero"`).
/// - Only the last dot starts the extension (`"a.b.aseprite"` → stem `"a.b"`).
/// - A leading dot with no other dot is not an extension (`".gitignore"`).
pub fn decompose(path: &str) -> PathParts {
    let trimmed = path.trim_end_matches('/');

    let (dir, file) = match trimmed.rfind('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
        None => ("", trimmed),
    };

    let (stem, ext) = match file.rfind('.') {
        Some(0) | None => (file, None),
        Some(idx) => (&file[..idx], Some(file[idx + 1..].to_string())),
    };

    PathParts {
        dir: dir.to_string(),
        stem: stem.to_string(),
        ext,
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// This is intentionally robust:
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
/// - Only if both attempts fail do we give up.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    // Fast path: event path already starts with our root.
    if let Ok(rel) = path.strip_prefix(root) {
        let s = rel.to_string_lossy().replace('\\', "/");
        return Some(s);
    }

    // More robust path: canonicalize both, then try again. This helps on
    // platforms (notably macOS) where different absolute prefixes may be used
    // for the same underlying directory (e.g. symlinks, /private/var/...).
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            let s = rel.to_string_lossy().replace('\\', "/");
            return Some(s);
        }
    }

    None
}
