//! Transparent decompression of input files.
//!
//! Every file-based reader in the crate opens its input through [`open_source`],
//! so a `data.csv.gz` or a gzip stream saved without an extension is read exactly
//! like its plain counterpart.
//!
//! ## Detection
//! File extensions are checked first (`.gz`, `.gzip`), falling back to the gzip
//! magic bytes only when the extension says nothing. Output files are never
//! compressed: the writers in this crate always produce plain JSON.
//!
//! Detection is compiled in with the `gzip-sources` feature (on by default);
//! without it every source is read as-is.

use crate::error::{IoContext, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

#[cfg(feature = "gzip-sources")]
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[cfg(feature = "gzip-sources")]
const GZIP_EXTENSIONS: [&str; 2] = [".gz", ".gzip"];

/// How a source stream is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Plain,
    Gzip,
}

/// Open `path` for buffered reading, decompressing it if it is gzip-encoded.
///
/// # Errors
/// Returns [`crate::Error::Io`] if the file cannot be opened or its first bytes
/// cannot be read.
pub fn open_source(path: impl AsRef<Path>, buffer_size: usize) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let f = File::open(path).io_context(|| format!("open {}", path.display()))?;
    auto_detect_reader(f, path, buffer_size)
        .io_context(|| format!("setup decompression for {}", path.display()))
}

/// Wrap `reader` with a gzip decoder when the path hint or the leading bytes say so.
///
/// The returned reader is always buffered with `buffer_size` bytes.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
    buffer_size: usize,
) -> std::io::Result<Box<dyn BufRead>> {
    let mut buffered = BufReader::with_capacity(buffer_size.max(1), reader);
    match detect_encoding(&mut buffered, path_hint)? {
        SourceEncoding::Plain => Ok(Box::new(buffered)),
        SourceEncoding::Gzip => Ok(Box::new(BufReader::with_capacity(
            buffer_size.max(1),
            flate2::bufread::MultiGzDecoder::new(buffered),
        ))),
    }
}

/// Decide how the stream behind `reader` is encoded without consuming any of it.
#[cfg(feature = "gzip-sources")]
pub fn detect_encoding<R: BufRead>(
    reader: &mut R,
    path_hint: impl AsRef<Path>,
) -> std::io::Result<SourceEncoding> {
    if has_gzip_extension(&path_hint) {
        return Ok(SourceEncoding::Gzip);
    }
    let head = reader.fill_buf()?;
    if head.starts_with(&GZIP_MAGIC) {
        Ok(SourceEncoding::Gzip)
    } else {
        Ok(SourceEncoding::Plain)
    }
}

#[cfg(not(feature = "gzip-sources"))]
pub fn detect_encoding<R: BufRead>(
    _reader: &mut R,
    _path_hint: impl AsRef<Path>,
) -> std::io::Result<SourceEncoding> {
    Ok(SourceEncoding::Plain)
}

/// Case-insensitive check for a gzip file extension.
#[cfg(feature = "gzip-sources")]
pub(crate) fn has_gzip_extension(path: impl AsRef<Path>) -> bool {
    let name = path.as_ref().to_string_lossy().to_lowercase();
    GZIP_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Strip a trailing gzip extension so format checks see the inner file name.
pub(crate) fn inner_file_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    #[cfg(feature = "gzip-sources")]
    for ext in GZIP_EXTENSIONS {
        if let Some(stripped) = name.strip_suffix(ext) {
            return stripped.to_string();
        }
    }
    name
}
