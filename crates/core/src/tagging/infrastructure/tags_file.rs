use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::tagging::domain::face_tag::FaceTag;

#[derive(Error, Debug)]
pub enum TagsFileError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid tags JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Writes tags as an indented JSON array, non-ASCII kept verbatim.
pub fn write(path: &Path, tags: &[FaceTag]) -> Result<(), TagsFileError> {
    let json = serde_json::to_string_pretty(tags).map_err(|e| TagsFileError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    let io_err = |source| TagsFileError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, json).map_err(io_err)
}
