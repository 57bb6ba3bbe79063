//! Persistence Codec Module
//!
//! Reads and writes the whole entry table as one JSON document, optionally gzipped.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::cache::CacheEntry;
use crate::error::Result;

/// The persisted shape: request key to entry.
pub type EntryTable = HashMap<String, CacheEntry>;

// == Persistence Codec ==
/// Symmetric encoder/decoder for the cache file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceCodec {
    compression: bool,
}

impl PersistenceCodec {
    pub fn new(compression: bool) -> Self {
        Self { compression }
    }

    // == Encode ==
    /// Serializes the table to bytes, gzip-wrapped when compression is on.
    pub fn encode(&self, entries: &EntryTable) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(entries)?;
        if !self.compression {
            return Ok(json);
        }

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }

    // == Decode ==
    /// Parses bytes produced by [`encode`](Self::encode) with the same setting.
    pub fn decode(&self, bytes: &[u8]) -> Result<EntryTable> {
        if !self.compression {
            return Ok(serde_json::from_slice(bytes)?);
        }

        let mut json = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut json)?;
        Ok(serde_json::from_slice(&json)?)
    }

    // == Load ==
    /// Reads the table from `path`.
    ///
    /// A missing file is the first-run state and yields an empty table.
    pub fn load(&self, path: &Path) -> Result<EntryTable> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(EntryTable::new()),
            Err(e) => return Err(e.into()),
        };
        self.decode(&bytes)
    }

    // == Save ==
    /// Replaces the file at `path` with the encoded table.
    ///
    /// Bytes go to a sibling temporary file first and are renamed into place,
    /// so readers see either the previous table or the new one.
    pub fn save(&self, path: &Path, entries: &EntryTable) -> Result<()> {
        let bytes = self.encode(entries)?;
        let tmp = temp_path(path);

        if let Err(e) = write_synced(&tmp, &bytes) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("cache"));
    name.push(".tmp");
    path.with_file_name(name)
}
