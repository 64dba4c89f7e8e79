//! Vector records and their byte codec.
//!
//! A [`VectorRecord`] is the unit of storage: a caller-supplied string id,
//! the float components, and optional string-to-string metadata. Records
//! serialize to a self-describing little-endian layout:
//!
//! ```text
//! u32 id_len | id bytes | u32 dim | f32 values[dim] | [u32 meta_len | meta bytes]
//! ```
//!
//! The metadata region encodes the map as `key=value` pairs separated by `;`,
//! with `\` escaping literal `;`, `=`, and `\`. The region is omitted for
//! records without metadata, and decoding tolerates its absence.

use crate::error::{Result, VectorDbError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A real-valued vector with a unique id and optional metadata.
///
/// Records are plain owned values; stores and indexes clone them at their
/// boundaries so no component holds an aliased view into another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique identifier within a store or index.
    pub id: String,
    /// Vector components. The dimension is always `values.len()`.
    pub values: Vec<f32>,
    /// String key/value metadata used by query filters. Possibly empty.
    pub metadata: BTreeMap<String, String>,
}

impl VectorRecord {
    /// Creates a record with no metadata.
    pub fn new(id: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            values,
            metadata: BTreeMap::new(),
        }
    }

    /// Creates a record carrying metadata.
    pub fn with_metadata(
        id: impl Into<String>,
        values: Vec<f32>,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: id.into(),
            values,
            metadata,
        }
    }

    /// Creates a zero vector of the given dimension with an empty id.
    pub fn zero(dimension: usize) -> Self {
        Self::new("", vec![0.0; dimension])
    }

    /// Creates a record with components drawn uniformly from `[0, 1)`.
    pub fn random(id: impl Into<String>, dimension: usize) -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let values = (0..dimension).map(|_| rng.gen::<f32>()).collect();
        Self::new(id, values)
    }

    /// Number of dimensions.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Scales the vector to unit length. Zero vectors are left unchanged.
    pub fn normalize(&mut self) {
        let magnitude: f64 = self.values.iter().map(|&v| (v as f64) * (v as f64)).sum();
        let magnitude = magnitude.sqrt();
        if magnitude > 0.0 {
            for v in &mut self.values {
                *v = ((*v as f64) / magnitude) as f32;
            }
        }
    }

    /// Serializes the record to its byte layout.
    pub fn encode(&self) -> Vec<u8> {
        let id_bytes = self.id.as_bytes();
        let meta = encode_metadata(&self.metadata);
        let mut buf =
            Vec::with_capacity(8 + id_bytes.len() + 4 * self.values.len() + 4 + meta.len());

        buf.extend_from_slice(&(id_bytes.len() as u32).to_le_bytes());
        buf.extend_from_slice(id_bytes);
        buf.extend_from_slice(&(self.values.len() as u32).to_le_bytes());
        for &v in &self.values {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        if !meta.is_empty() {
            buf.extend_from_slice(&(meta.len() as u32).to_le_bytes());
            buf.extend_from_slice(meta.as_bytes());
        }
        buf
    }

    /// Deserializes a record from its byte layout.
    ///
    /// Fails when the buffer is shorter than any declared region, the id is
    /// not valid UTF-8, or any component is non-finite.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < 8 {
            return Err(VectorDbError::corrupted("buffer too small to decode vector"));
        }

        let id_len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        if id_len + 8 > buf.len() {
            return Err(VectorDbError::corrupted(
                "buffer too small to decode vector id",
            ));
        }
        let id = std::str::from_utf8(&buf[4..4 + id_len])
            .map_err(|_| VectorDbError::corrupted("vector id is not valid UTF-8"))?
            .to_string();

        let dim_off = 4 + id_len;
        let dim = u32::from_le_bytes([
            buf[dim_off],
            buf[dim_off + 1],
            buf[dim_off + 2],
            buf[dim_off + 3],
        ]) as usize;

        let values_off = dim_off + 4;
        let values_end = values_off + dim * 4;
        if values_end > buf.len() {
            return Err(VectorDbError::corrupted(format!(
                "buffer too small to decode vector values, expected {values_end} bytes"
            )));
        }

        let mut values = Vec::with_capacity(dim);
        for i in 0..dim {
            let off = values_off + i * 4;
            let v = f32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]);
            if !v.is_finite() {
                return Err(VectorDbError::corrupted(format!(
                    "non-finite component at index {i}"
                )));
            }
            values.push(v);
        }

        // Metadata region is optional: records written without one decode
        // to an empty map.
        let metadata = if values_end + 4 <= buf.len() {
            let meta_len = u32::from_le_bytes([
                buf[values_end],
                buf[values_end + 1],
                buf[values_end + 2],
                buf[values_end + 3],
            ]) as usize;
            let meta_end = values_end + 4 + meta_len;
            if meta_end > buf.len() {
                return Err(VectorDbError::corrupted(
                    "buffer too small to decode metadata",
                ));
            }
            let text = std::str::from_utf8(&buf[values_end + 4..meta_end])
                .map_err(|_| VectorDbError::corrupted("metadata is not valid UTF-8"))?;
            decode_metadata(text)
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            id,
            values,
            metadata,
        })
    }
}

/// Renders the metadata map as `key=value` pairs joined by `;`,
/// escaping literal `;`, `=`, and `\` with a backslash.
fn encode_metadata(metadata: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (i, (key, value)) in metadata.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        push_escaped(&mut out, key);
        out.push('=');
        push_escaped(&mut out, value);
    }
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        if c == ';' || c == '=' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Recovers the metadata map from its string encoding.
///
/// A backslash takes the following character literally. Pairs without an
/// unescaped `=` are treated as keys with an empty value.
fn decode_metadata(text: &str) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    if text.is_empty() {
        return metadata;
    }

    let mut key = String::new();
    let mut value = String::new();
    let mut in_value = false;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    if in_value {
                        value.push(escaped);
                    } else {
                        key.push(escaped);
                    }
                }
            }
            '=' if !in_value => in_value = true,
            ';' => {
                metadata.insert(std::mem::take(&mut key), std::mem::take(&mut value));
                in_value = false;
            }
            _ => {
                if in_value {
                    value.push(c);
                } else {
                    key.push(c);
                }
            }
        }
    }
    metadata.insert(key, value);
    metadata
}
