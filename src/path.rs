//! Path resolution module
//!
//! Maps an untrusted request path onto the media root. The result is always
//! a canonical path inside the root; anything else fails closed.

use percent_encoding::percent_decode_str;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Path resolution failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    /// Path escapes the root, or could not be resolved safely
    Forbidden,
    /// Path stays inside the root but nothing exists there
    NotFound,
}

/// Canonical media root directory, fixed at startup
#[derive(Debug, Clone)]
pub struct MediaRoot {
    canonical: PathBuf,
}

/// Absolute path proven to lie inside a [`MediaRoot`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
    is_root: bool,
}

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Whether this is the media root itself
    pub const fn is_root(&self) -> bool {
        self.is_root
    }

    /// File extension, when it is valid UTF-8
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }
}

impl MediaRoot {
    /// Canonicalize `dir` and verify it is a directory
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        let canonical = dir.as_ref().canonicalize()?;
        if !canonical.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("media root is not a directory: {}", canonical.display()),
            ));
        }
        Ok(Self { canonical })
    }

    pub fn as_path(&self) -> &Path {
        &self.canonical
    }

    /// Resolve a raw (percent-encoded) request path against the root
    ///
    /// Steps:
    /// 1. Percent-decode; invalid UTF-8 or NUL bytes are rejected
    /// 2. Join component by component; `..` above the root is rejected
    /// 3. Canonicalize, resolving symlinks
    /// 4. Require the canonical root as a component-wise prefix
    pub fn resolve(&self, request_path: &str) -> Result<ResolvedPath, PathError> {
        let decoded = percent_decode_str(request_path)
            .decode_utf8()
            .map_err(|_| PathError::Forbidden)?;
        if decoded.contains('\0') {
            return Err(PathError::Forbidden);
        }

        let mut joined = self.canonical.clone();
        let mut depth = 0usize;
        for component in Path::new(decoded.as_ref()).components() {
            match component {
                Component::Normal(part) => {
                    joined.push(part);
                    depth += 1;
                }
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(PathError::Forbidden);
                    }
                    joined.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::CurDir => {}
                Component::Prefix(_) => return Err(PathError::Forbidden),
            }
        }

        match joined.canonicalize() {
            Ok(canonical) => {
                // Path::starts_with compares whole components
                if !canonical.starts_with(&self.canonical) {
                    return Err(PathError::Forbidden);
                }
                let is_root = canonical == self.canonical;
                Ok(ResolvedPath {
                    path: canonical,
                    is_root,
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(self.classify_missing(&joined)),
            Err(_) => Err(PathError::Forbidden),
        }
    }

    /// A missing target may still sit behind a symlinked directory that
    /// leaves the root; check the nearest existing ancestor.
    fn classify_missing(&self, missing: &Path) -> PathError {
        let mut ancestor = missing.to_path_buf();
        while ancestor.pop() {
            if ancestor == self.canonical {
                return PathError::NotFound;
            }
            match ancestor.canonicalize() {
                Ok(canonical) if canonical.starts_with(&self.canonical) => {
                    return PathError::NotFound
                }
                Ok(_) => return PathError::Forbidden,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(_) => return PathError::Forbidden,
            }
        }
        PathError::Forbidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("subdir/deeper")).unwrap();
        std::fs::write(dir.path().join("test.mkv"), b"fake mkv").unwrap();
        std::fs::write(dir.path().join("subdir/sub.mkv"), b"sub").unwrap();
        std::fs::write(dir.path().join("subdir/deeper/clip.mp4"), b"clip").unwrap();
        dir
    }

    #[test]
    fn test_plain_file() {
        let dir = make_root();
        let root = MediaRoot::new(dir.path()).unwrap();
        let resolved = root.resolve("/test.mkv").unwrap();
        assert_eq!(
            resolved.as_path(),
            dir.path().canonicalize().unwrap().join("test.mkv")
        );
        assert!(!resolved.is_root());
        assert_eq!(resolved.extension(), Some("mkv"));
    }

    #[test]
    fn test_nested_file() {
        let dir = make_root();
        let root = MediaRoot::new(dir.path()).unwrap();
        let resolved = root.resolve("/subdir/deeper/clip.mp4").unwrap();
        assert!(resolved.as_path().ends_with("subdir/deeper/clip.mp4"));
    }

    #[test]
    fn test_root_itself() {
        let dir = make_root();
        let root = MediaRoot::new(dir.path()).unwrap();
        assert!(root.resolve("/").unwrap().is_root());
        assert!(root.resolve("").unwrap().is_root());
        assert!(root.resolve("/subdir/..").unwrap().is_root());
    }

    #[test]
    fn test_inner_dotdot_stays_inside() {
        let dir = make_root();
        let root = MediaRoot::new(dir.path()).unwrap();
        let resolved = root.resolve("/subdir/deeper/../sub.mkv").unwrap();
        assert!(resolved.as_path().ends_with("subdir/sub.mkv"));
    }

    #[test]
    fn test_traversal_forbidden() {
        let dir = make_root();
        let root = MediaRoot::new(dir.path()).unwrap();
        for attempt in [
            "/../../../etc/passwd",
            "/../",
            "/subdir/../../etc/passwd",
            "/%2e%2e/%2e%2e/etc/passwd",
            "/%2e%2e%2f%2e%2e%2fetc%2fpasswd",
        ] {
            assert_eq!(
                root.resolve(attempt),
                Err(PathError::Forbidden),
                "attempt {attempt}"
            );
        }
    }

    #[test]
    fn test_sibling_prefix_not_confused() {
        let parent = tempfile::tempdir().unwrap();
        let videos = parent.path().join("videos");
        let private = parent.path().join("videos-private");
        std::fs::create_dir_all(&videos).unwrap();
        std::fs::create_dir_all(&private).unwrap();
        std::fs::write(private.join("secret.mp4"), b"secret").unwrap();

        let root = MediaRoot::new(&videos).unwrap();
        assert_eq!(
            root.resolve("/../videos-private/secret.mp4"),
            Err(PathError::Forbidden)
        );

        // Raw string prefix would accept ".../videos-private" under ".../videos"
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(&private, videos.join("peek")).unwrap();
            assert_eq!(
                root.resolve("/peek/secret.mp4"),
                Err(PathError::Forbidden)
            );
        }
    }

    #[test]
    fn test_missing_file_not_found() {
        let dir = make_root();
        let root = MediaRoot::new(dir.path()).unwrap();
        assert_eq!(root.resolve("/nonexistent.mkv"), Err(PathError::NotFound));
        assert_eq!(
            root.resolve("/subdir/missing/also.mkv"),
            Err(PathError::NotFound)
        );
        // Backslashes are ordinary filename bytes on unix
        #[cfg(unix)]
        assert_eq!(
            root.resolve("/..\\..\\windows\\system32"),
            Err(PathError::NotFound)
        );
    }

    #[test]
    fn test_null_byte_and_bad_encoding() {
        let dir = make_root();
        let root = MediaRoot::new(dir.path()).unwrap();
        assert_eq!(root.resolve("/test.mkv%00"), Err(PathError::Forbidden));
        assert_eq!(root.resolve("/%C3%28"), Err(PathError::Forbidden));
    }

    #[test]
    fn test_percent_encoded_name() {
        let dir = make_root();
        std::fs::write(dir.path().join("my movie.mp4"), b"m").unwrap();
        let root = MediaRoot::new(dir.path()).unwrap();
        let resolved = root.resolve("/my%20movie.mp4").unwrap();
        assert!(resolved.as_path().ends_with("my movie.mp4"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_forbidden() {
        let dir = make_root();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), b"secret").unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            dir.path().join("link.mkv"),
        )
        .unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("evil")).unwrap();

        let root = MediaRoot::new(dir.path()).unwrap();
        assert_eq!(root.resolve("/link.mkv"), Err(PathError::Forbidden));
        assert_eq!(root.resolve("/evil/secret.txt"), Err(PathError::Forbidden));
        assert_eq!(root.resolve("/evil/missing.txt"), Err(PathError::Forbidden));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_root_allowed() {
        let dir = make_root();
        std::os::unix::fs::symlink(
            dir.path().join("subdir/sub.mkv"),
            dir.path().join("alias.mkv"),
        )
        .unwrap();
        let root = MediaRoot::new(dir.path()).unwrap();
        let resolved = root.resolve("/alias.mkv").unwrap();
        assert!(resolved.as_path().ends_with("subdir/sub.mkv"));
    }

    #[test]
    fn test_root_must_be_directory() {
        let dir = make_root();
        assert!(MediaRoot::new(dir.path().join("test.mkv")).is_err());
        assert!(MediaRoot::new(dir.path().join("does-not-exist")).is_err());
    }
}
