//! Data-file loading for the CLI.
//!
//! The check wants the whole record sequence resident before workers
//! start, so the file is memory-mapped rather than streamed. Empty files
//! cannot be mapped on all platforms and are represented as an empty
//! byte view instead.

use std::fs::File;
use std::io;
use std::path::Path;

use memmap2::Mmap;

/// A data file held resident for the duration of a check.
#[derive(Debug)]
pub struct InputFile {
    map: Option<Mmap>,
}

impl InputFile {
    /// Opens and maps `path`.
    ///
    /// The mapping assumes the file is not truncated while the check
    /// runs; the CLI opens the file read-only and makes no further
    /// filesystem calls.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Self { map: None });
        }
        // SAFETY: the mapping is read-only and lives no longer than the
        // process; concurrent external truncation is outside the CLI's
        // contract (documented above).
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self { map: Some(map) })
    }

    /// The mapped bytes (empty slice for an empty file).
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }
}
