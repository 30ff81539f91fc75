use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{EtlError, Result};

/// derives a table name from a file path: the file name without extension, trimmed and lower-cased.
pub fn table_name_from_path(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .ok_or_else(|| {
            EtlError::UnsupportedFormat(format!("{}: cannot derive a table name", path.display()))
        })
}

/// lists the regular files directly inside `directory`, sorted by path.
pub fn iter_file_paths(directory: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
