//! Writing retrieved bodies to disk.

use std::path::{Path, PathBuf};

use crate::client::error::ClientError;

/// File name used when the path ends in `/`.
pub const DEFAULT_FILE_NAME: &str = "index.html";

/// The output file name for `path`: everything after its last `/`.
///
/// ```
/// # use ferry::client::persist::output_filename;
/// assert_eq!(output_filename("/a/b/ref.html"), Some("ref.html"));
/// assert_eq!(output_filename("/"), Some("index.html"));
/// assert_eq!(output_filename("/a/.."), None);
/// ```
pub fn output_filename(path: &str) -> Option<&str> {
    let name = match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    };

    let name = if name.is_empty() { DEFAULT_FILE_NAME } else { name };

    if name == "." || name == ".." || name.contains(['\\', '\0']) {
        return None;
    }

    Some(name)
}

/// Writes `body` into `dir` under the name derived from `path`, replacing
/// any existing file. Bytes are written unchanged.
pub async fn persist_body(dir: &Path, path: &str, body: &[u8]) -> Result<PathBuf, ClientError> {
    let name = output_filename(path).ok_or_else(|| ClientError::InvalidFileName(path.to_string()))?;
    let target = dir.join(name);

    tokio::fs::write(&target, body)
        .await
        .map_err(|source| ClientError::Persist {
            path: target.clone(),
            source,
        })?;

    tracing::debug!(path = %path, file = %target.display(), bytes = body.len(), "Saved body");

    Ok(target)
}
