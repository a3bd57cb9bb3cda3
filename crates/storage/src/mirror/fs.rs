#![forbid(unsafe_code)]

use super::QUARANTINE_DIR;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The filesystem primitives the coordinator relies on.
///
/// Kept narrow so tests can wrap [`DiskFs`] and inject failures at a chosen
/// call.
pub trait ProductFs {
    fn exists(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Moves a file or directory. Parents of `to` must already exist.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Every file under `root`, recursively, skipping quarantine
    /// directories. Sorted for deterministic planning.
    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>>;

    /// Names of the immediate children of `dir`. A missing directory is empty.
    fn list_dir_names(&self, dir: &Path) -> io::Result<Vec<String>>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DiskFs;

impl ProductFs for DiskFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        std::fs::write(path, bytes)
    }

    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != QUARANTINE_DIR);
        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() {
                out.push(entry.into_path());
            }
        }
        out.sort();
        Ok(out)
    }

    fn list_dir_names(&self, dir: &Path) -> io::Result<Vec<String>> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry?;
            out.push(entry.file_name().to_string_lossy().into_owned());
        }
        out.sort();
        Ok(out)
    }
}
