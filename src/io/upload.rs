use crate::{
    error::{Result, ServiceError},
    types::UploadedFile,
};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Client supplied names are reduced to their final component.
pub fn safe_file_name(raw: &str) -> String {
    Path::new(raw.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "upload".to_string())
}

/// Writes `file` into `dir` as `<prefix><name>` and returns the path.
pub fn persist_upload(dir: &Path, file: &UploadedFile, prefix: &str) -> Result<PathBuf> {
    let name = format!("{prefix}{}", safe_file_name(&file.filename));
    let path = dir.join(&name);
    fs::write(&path, &file.bytes).map_err(|source| ServiceError::Upload {
        filename: name,
        source,
    })?;
    Ok(path)
}
