//! Flat discovery of the drop folder: one descriptor per regular file.

use crate::models::FileDescriptor;
use anyhow::Context;
use std::path::Path;
use walkdir::WalkDir;

/// Lists the input folder (one level, subdirectories ignored) and builds a
/// descriptor for every regular file, in listing order. Any failure here is
/// fatal to the run: an unreadable drop folder means there is nothing
/// trustworthy to process.
pub fn discover(input: &Path) -> anyhow::Result<Vec<FileDescriptor>> {
    let mut descriptors = Vec::new();
    for entry in WalkDir::new(input).min_depth(1).max_depth(1) {
        let entry =
            entry.with_context(|| format!("listing input folder {}", input.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        descriptors.push(FileDescriptor::from_path(entry.path())?);
    }
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn discovers_regular_files_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("contrat.pdf"), b"a").unwrap();
        fs::write(dir.path().join("notes.txt"), b"b").unwrap();
        fs::create_dir(dir.path().join("archives")).unwrap();
        fs::write(dir.path().join("archives").join("vieux.pdf"), b"c").unwrap();

        let found = discover(dir.path()).unwrap();
        let mut names: Vec<&str> = found.iter().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["contrat.pdf", "notes.txt"]);
    }

    #[test]
    fn missing_folder_is_fatal() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("absent");
        assert!(discover(&gone).is_err());
    }

    #[test]
    fn empty_folder_discovers_nothing() {
        let dir = tempdir().unwrap();
        assert!(discover(dir.path()).unwrap().is_empty());
    }
}
