//! Scratch files and readback helpers.
//!
//! Everything here lives in temporary locations that are removed on drop.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::Value;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// A temporary file that is deleted when dropped.
pub struct TempFilePath {
    _temp_file: NamedTempFile,
    path: PathBuf,
}

impl TempFilePath {
    /// Create an empty temporary file.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_file = NamedTempFile::new()?;
        let path = temp_file.path().to_path_buf();
        Ok(Self {
            _temp_file: temp_file,
            path,
        })
    }

    /// Create an empty temporary file whose name ends in `.{extension}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created.
    pub fn with_extension(extension: &str) -> std::io::Result<Self> {
        let temp_file = tempfile::Builder::new()
            .suffix(&format!(".{extension}"))
            .tempfile()?;
        let path = temp_file.path().to_path_buf();
        Ok(Self {
            _temp_file: temp_file,
            path,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A temporary directory that is deleted, with its content, when dropped.
pub struct TempDirPath {
    _temp_dir: TempDir,
    path: PathBuf,
}

impl TempDirPath {
    /// Create a new temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self {
            _temp_dir: temp_dir,
            path,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of `filename` inside this directory. The file is not created.
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }
}

/// Write `contents` to `dir/name`, creating `dir` if needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
///
/// # Example
///
/// ```
/// use datastrand::testing::{TempDirPath, write_temp_file};
///
/// # fn main() -> anyhow::Result<()> {
/// let dir = TempDirPath::new()?;
/// let path = write_temp_file(dir.path(), "rows.csv", "a,b\n1,2\n")?;
/// assert!(path.exists());
/// # Ok(())
/// # }
/// ```
pub fn write_temp_file(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    create_dir_all(dir).with_context(|| format!("mkdir -p {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Write `contents` gzip-compressed to `dir/name`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or the stream cannot be finished.
pub fn write_gzip_file(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    create_dir_all(dir).with_context(|| format!("mkdir -p {}", dir.display()))?;
    let path = dir.join(name);
    let f = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    let mut enc = GzEncoder::new(f, Compression::default());
    enc.write_all(contents.as_bytes())
        .with_context(|| format!("compress into {}", path.display()))?;
    enc.finish()
        .with_context(|| format!("finish gzip stream {}", path.display()))?;
    Ok(path)
}

/// Write `values` as a compact JSON array file, bypassing the crate's writers.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_json_array_file(dir: &Path, name: &str, values: &[Value]) -> Result<PathBuf> {
    let text = serde_json::to_string(values).context("serialize JSON array")?;
    write_temp_file(dir, name, &text)
}

/// Read a file that must hold one top-level JSON array.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON array.
pub fn read_json_array_file(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse JSON array in {}", path.display()))
}
