//! Mapping from static paths to files inside the output tree.

use std::path::PathBuf;

use crate::{application::renderer::RenderError, domain::paths::StaticPath};

const INDEX_FILE: &str = "index.html";

/// Relative file that holds the rendered content of `path`.
///
/// Directory-style paths (`/`, `/blog/`) map to their `index.html`; any other
/// path maps to the file of the same name. Query strings and fragments are not
/// part of the output location.
pub fn output_file_for(path: &StaticPath) -> Result<PathBuf, RenderError> {
    let location = path.location();

    let mut relative = PathBuf::new();
    for segment in location.split('/').filter(|segment| !segment.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(invalid(path, "relative segments are not allowed"));
        }
        if segment.contains('\\') || segment.contains('\0') {
            return Err(invalid(path, "segment contains a reserved character"));
        }
        relative.push(segment);
    }

    if location.is_empty() || location.ends_with('/') {
        relative.push(INDEX_FILE);
    }

    Ok(relative)
}

fn invalid(path: &StaticPath, reason: &'static str) -> RenderError {
    RenderError::InvalidPath {
        path: path.clone(),
        reason,
    }
}
