//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects.

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// The forward-slash relative key of `path` under `base`.
///
/// Keys have to match the URLs the packed application requests, which are
/// always `/`-separated regardless of the build platform. Returns `None`
/// when `path` is not under `base` or a component is not valid UTF-8.
pub fn relative_key(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let mut key = String::new();
    for comp in relative.components() {
        let Component::Normal(part) = comp else {
            return None;
        };
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(part.to_str()?);
    }
    (!key.is_empty()).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_relative_key() {
        let base = Path::new("/project/build");
        assert_eq!(
            relative_key(Path::new("/project/build/assets/a.png"), base).unwrap(),
            "assets/a.png"
        );
        assert_eq!(relative_key(Path::new("/elsewhere/a.png"), base), None);
        assert_eq!(relative_key(base, base), None);
    }
}
