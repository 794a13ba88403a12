use crate::error::{Result, ServiceError};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};
use walkdir::WalkDir;

/// Finds `filename` in a job's output directory, flat first, then nested.
///
/// Mastering results live directly in `output_dir`; separation results are
/// nested under `<model>/<input_stem>/`. Both are served from here.
pub fn locate(output_dir: &Path, filename: &str) -> Result<PathBuf> {
    if !is_plain_file_name(filename) {
        return Err(ServiceError::NotFound);
    }

    let direct = output_dir.join(filename);
    if direct.is_file() {
        return Ok(direct);
    }

    WalkDir::new(output_dir)
        .min_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| e.file_type().is_file() && e.file_name() == filename)
        .map(|e| e.into_path())
        .ok_or(ServiceError::NotFound)
}

/// Files in `dir` with extension `ext`, sorted by name.
pub fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_only() {
        assert!(is_plain_file_name("vocals.wav"));
        assert!(!is_plain_file_name("../vocals.wav"));
        assert!(!is_plain_file_name("a/vocals.wav"));
        assert!(!is_plain_file_name("/vocals.wav"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
    }
}
