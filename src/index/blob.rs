//! On-disk framing for index persistence blobs.
//!
//! Layout: `[bincode payload][magic "VSQ1" 4B][CRC32 4B BE]`. Writes go
//! through a temp file and an atomic rename. The CRC covers the payload
//! only, so truncation and bit flips are both caught on load.

use crate::error::{Result, VectorDbError};
use std::fs;
use std::path::Path;

/// Magic bytes appended before the CRC32 footer.
const BLOB_MAGIC: &[u8; 4] = b"VSQ1";

/// Frames `payload` with the magic + CRC footer and writes it atomically.
pub(crate) fn write(path: &Path, payload: &[u8]) -> Result<()> {
    let crc = crc32fast::hash(payload);
    let mut out = Vec::with_capacity(payload.len() + 8);
    out.extend_from_slice(payload);
    out.extend_from_slice(BLOB_MAGIC);
    out.extend_from_slice(&crc.to_be_bytes());

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &out)?;
    fs::rename(&tmp, path)?;

    tracing::info!(
        "saved index blob {:?} ({} bytes, CRC32={:#010x})",
        path,
        payload.len(),
        crc
    );
    Ok(())
}

/// Reads a framed blob and returns the verified payload.
pub(crate) fn read(path: &Path) -> Result<Vec<u8>> {
    let raw = fs::read(path)?;
    if raw.len() < 8 || &raw[raw.len() - 8..raw.len() - 4] != BLOB_MAGIC {
        return Err(VectorDbError::corrupted(format!(
            "index blob {path:?} is missing its footer"
        )));
    }

    let payload = &raw[..raw.len() - 8];
    let stored_crc = u32::from_be_bytes([
        raw[raw.len() - 4],
        raw[raw.len() - 3],
        raw[raw.len() - 2],
        raw[raw.len() - 1],
    ]);
    let computed_crc = crc32fast::hash(payload);
    if computed_crc != stored_crc {
        return Err(VectorDbError::corrupted(format!(
            "index blob {path:?} CRC32 mismatch: expected {stored_crc:#010x}, got {computed_crc:#010x}"
        )));
    }

    tracing::debug!("index blob {:?} CRC32 verified: {:#010x}", path, stored_crc);
    Ok(payload.to_vec())
}
