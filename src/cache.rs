//! On-disk snapshots of a built search index.
//!
//! A snapshot is a small postcard-encoded header followed by the postcard-encoded
//! [`BuiltIndex`]. The header carries magic bytes, a format version, the payload
//! length, and an xxh3 checksum of the payload. Loading distinguishes a missing
//! snapshot ([`CacheError::Miss`]) from an unreadable or inconsistent one
//! ([`CacheError::Corrupt`]); both mean "rebuild".

use crate::error::CacheError;
use crate::search::BuiltIndex;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

/// Identifies mdsearch snapshot files.
const MAGIC: [u8; 8] = *b"MDSEARCH";

/// Bumped whenever the serialized layout of [`BuiltIndex`] changes.
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotHeader {
    magic: [u8; 8],
    version: u32,
    payload_len: u64,
    checksum: u64,
}

/// Writes a complete snapshot of `index` to `sink`.
pub fn save<W: Write>(index: &BuiltIndex, mut sink: W) -> Result<(), CacheError> {
    let payload = postcard::to_allocvec(index).map_err(io::Error::other)?;
    let header = SnapshotHeader {
        magic: MAGIC,
        version: FORMAT_VERSION,
        payload_len: payload.len() as u64,
        checksum: xxh3_64(&payload),
    };
    let header = postcard::to_allocvec(&header).map_err(io::Error::other)?;

    sink.write_all(&header)?;
    sink.write_all(&payload)?;
    sink.flush()?;
    Ok(())
}

/// Reads a snapshot from `source`.
///
/// Any read, decode, checksum, or consistency failure is reported as
/// [`CacheError::Corrupt`].
pub fn load<R: Read>(mut source: R) -> Result<BuiltIndex, CacheError> {
    let mut bytes = Vec::new();
    source
        .read_to_end(&mut bytes)
        .map_err(|e| CacheError::corrupt(format!("read failed: {}", e)))?;
    decode(&bytes)
}

fn decode(bytes: &[u8]) -> Result<BuiltIndex, CacheError> {
    if bytes.is_empty() {
        return Err(CacheError::corrupt("snapshot is empty"));
    }

    let (header, payload) = postcard::take_from_bytes::<SnapshotHeader>(bytes)
        .map_err(|e| CacheError::corrupt(format!("unreadable header: {}", e)))?;

    if header.magic != MAGIC {
        return Err(CacheError::corrupt("not an mdsearch snapshot"));
    }
    if header.version != FORMAT_VERSION {
        return Err(CacheError::corrupt(format!(
            "unsupported format version {} (expected {})",
            header.version, FORMAT_VERSION
        )));
    }
    if header.payload_len != payload.len() as u64 {
        return Err(CacheError::corrupt(format!(
            "payload is {} bytes, header says {}",
            payload.len(),
            header.payload_len
        )));
    }
    if xxh3_64(payload) != header.checksum {
        return Err(CacheError::corrupt("payload checksum mismatch"));
    }

    let index: BuiltIndex = postcard::from_bytes(payload)
        .map_err(|e| CacheError::corrupt(format!("undecodable payload: {}", e)))?;
    index.check_consistency().map_err(CacheError::corrupt)?;
    Ok(index)
}

/// Atomically writes a snapshot to `path`, creating parent directories as needed.
///
/// The snapshot is written to a sibling temp file and renamed over `path`, so a
/// concurrent reader sees either the old snapshot or the new one, never a partial file.
pub fn save_to_path(index: &BuiltIndex, path: &Path) -> Result<(), CacheError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path);
    let result = File::create(&tmp_path)
        .map_err(CacheError::from)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            save(index, &mut writer)?;
            writer
                .into_inner()
                .map_err(io::IntoInnerError::into_error)?
                .sync_all()?;
            Ok(())
        })
        .and_then(|()| fs::rename(&tmp_path, path).map_err(CacheError::from));

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    } else {
        tracing::debug!("Cached search index to {}", path.display());
    }
    result
}

/// Loads a snapshot from `path`; a nonexistent file is [`CacheError::Miss`].
pub fn load_from_path(path: &Path) -> Result<BuiltIndex, CacheError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CacheError::Miss {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(CacheError::corrupt(format!(
                "cannot open {}: {}",
                path.display(),
                e
            )));
        }
    };
    load(BufReader::new(file))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
