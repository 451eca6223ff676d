use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Page served for a request naming a directory.
const INDEX_FILE: &str = "index.html";

/// Content type by lowercase file extension.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html; charset=UTF-8"),
    ("htm", "text/html; charset=UTF-8"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("csv", "text/csv"),
    ("txt", "text/plain; charset=UTF-8"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
];

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Read-only view of the static directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

fn not_found(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, what.to_string())
}

impl StaticFiles {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File system path for a URL path below the static prefix.
    ///
    /// Only plain names and `.` are accepted; `..`, roots and drive prefixes
    /// yield `None`, so the result can never leave the root.
    fn resolve(&self, url_path: &str) -> Option<PathBuf> {
        let relative = Path::new(url_path.trim_start_matches('/'));
        relative
            .components()
            .try_fold(self.root.clone(), |mut path, component| match component {
                Component::Normal(name) => {
                    path.push(name);
                    Some(path)
                }
                Component::CurDir => Some(path),
                _ => None,
            })
    }

    #[must_use]
    pub fn content_type(path: &Path) -> &'static str {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return FALLBACK_CONTENT_TYPE;
        };
        CONTENT_TYPES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map_or(FALLBACK_CONTENT_TYPE, |(_, ct)| *ct)
    }

    /// Bytes and content type of the file at `url_path`.
    ///
    /// A directory is answered with its `index.html`. Paths escaping the
    /// root and missing files are `NotFound`.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let mut path = self.resolve(url_path).ok_or_else(|| not_found("path leaves the static root"))?;
        if path.is_dir() {
            path.push(INDEX_FILE);
        }
        if !path.is_file() {
            return Err(not_found("no such file"));
        }
        Ok((fs::read(&path)?, Self::content_type(&path)))
    }
}
