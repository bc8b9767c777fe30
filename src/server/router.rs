//! Request routing
//!
//! Maps a request path to a file under the server root, to a redirect rule,
//! or to "not found". The table is built once at startup and only read
//! afterwards, so connections share it through an `Arc` without locking.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::ServerConfig;
use crate::http::mime::content_type_for;
use crate::http::response::Response;

/// Outcome of routing a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Serve the file at this (canonical) path
    Serve(PathBuf),
    /// Answer 301 with this `Location`
    Redirect(String),
    NotFound,
}

#[derive(Debug, Clone)]
pub struct Router {
    root: PathBuf,
    index: String,
    redirects: BTreeMap<String, String>,
}

impl Router {
    /// Builds a router over `root`, which must exist.
    pub fn new(
        root: impl AsRef<Path>,
        index: impl Into<String>,
        redirects: BTreeMap<String, String>,
    ) -> anyhow::Result<Self> {
        let root = root.as_ref();
        let root = std::fs::canonicalize(root)
            .with_context(|| format!("file root {} is not accessible", root.display()))?;

        Ok(Self {
            root,
            index: index.into(),
            redirects,
        })
    }

    pub fn from_config(cfg: &ServerConfig) -> anyhow::Result<Self> {
        Self::new(&cfg.root, cfg.index.clone(), cfg.redirects.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `path` against the redirect table and the file root.
    ///
    /// Only paths of the form `/seg/seg/...` with non-empty segments can
    /// reach a file; `/` stands for the index file. Everything that does not
    /// end on a regular file inside the root is `NotFound`.
    pub async fn lookup(&self, path: &str) -> Route {
        if let Some(target) = self.redirects.get(path) {
            return Route::Redirect(target.clone());
        }

        let candidate = if path == "/" {
            self.root.join(&self.index)
        } else {
            match file_segments(path) {
                Some(segments) => segments
                    .into_iter()
                    .fold(self.root.clone(), |acc, seg| acc.join(seg)),
                None => return Route::NotFound,
            }
        };

        let real = match tokio::fs::canonicalize(&candidate).await {
            Ok(real) => real,
            Err(_) => return Route::NotFound,
        };

        // Symlinks must not lead out of the root.
        if !real.starts_with(&self.root) {
            tracing::warn!(path = %path, "Path resolves outside the file root");
            return Route::NotFound;
        }

        match tokio::fs::metadata(&real).await {
            Ok(meta) if meta.is_file() => Route::Serve(real),
            _ => Route::NotFound,
        }
    }

    /// Routes `path` and builds the full response for it.
    pub async fn respond(&self, path: &str) -> Response {
        match self.lookup(path).await {
            Route::Serve(file) => match tokio::fs::read(&file).await {
                Ok(bytes) => {
                    tracing::debug!(path = %path, bytes = bytes.len(), "Serving file");
                    Response::ok(bytes, content_type_for(&file))
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Failed to read file");
                    Response::not_found()
                }
            },
            Route::Redirect(location) => {
                tracing::debug!(path = %path, location = %location, "Redirecting");
                Response::moved_permanently(&location)
            }
            Route::NotFound => {
                tracing::debug!(path = %path, "No route");
                Response::not_found()
            }
        }
    }
}

/// Splits an absolute request path into file-system segments, or `None` if
/// the path cannot name a file: missing leading slash, empty segments
/// (`//`, trailing `/`), dot segments, backslashes or NUL bytes.
fn file_segments(path: &str) -> Option<Vec<&str>> {
    let rest = path.strip_prefix('/')?;

    rest.split('/')
        .map(|seg| {
            let valid = !seg.is_empty()
                && seg != "."
                && seg != ".."
                && !seg.contains(['\\', '\0']);
            valid.then_some(seg)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_of_valid_paths() {
        assert_eq!(file_segments("/index.html"), Some(vec!["index.html"]));
        assert_eq!(file_segments("/a/b/ref.html"), Some(vec!["a", "b", "ref.html"]));
    }

    #[test]
    fn segments_reject_malformed_paths() {
        for path in ["", "Roee", "index.html", "//", "/a/b/", "/index.html/", "/a//b", "/../x", "/./x", "/a\\b"] {
            assert_eq!(file_segments(path), None, "path {path:?}");
        }
    }
}
