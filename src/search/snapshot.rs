//! On-disk snapshot of one vector collection
//!
//! Two artifacts per collection, both keyed by collection name:
//! - `<name>.index`: `SLVX` magic, u32 version, u32 dimension, u64 count,
//!   u32 CRC32 of the id list, then `count * dimension` little-endian f32 values
//! - `<name>_ids.json`: `{"index_crc": <CRC32 of the f32 body>, "ids": [...]}`
//!
//! Each artifact is written to a sibling `.tmp` file, synced, and renamed
//! over the target. The cross checksums reject a pair left behind by a crash
//! between the two renames, even when both sides hold the same number of
//! entries.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use serde::Deserialize;

use crate::core::paths::{ids_file, index_file};

const MAGIC: &[u8; 4] = b"SLVX";
const FORMAT_VERSION: u32 = 2;
const HEADER_LEN: usize = 4 + 4 + 4 + 8 + 4;

/// Parsed `<name>_ids.json`
#[derive(Debug, Deserialize)]
struct IdsFile {
    index_crc: u32,
    ids: Vec<String>,
}

/// Decoded `<name>.index`
struct IndexFile {
    dimension: usize,
    ids_crc: u32,
    body_crc: u32,
    vectors: Vec<f32>,
}

/// Owned copy of a collection's contents
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub dimension: usize,
    /// Row-major, `ids.len() * dimension` values
    pub vectors: Vec<f32>,
    pub ids: Vec<String>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Write both artifacts
pub fn write(dir: &Path, name: &str, snapshot: &Snapshot) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    let body = vector_bytes(&snapshot.vectors);
    let ids_crc = crc32fast::hash(&serde_json::to_vec(&snapshot.ids)?);

    write_atomic(&ids_file(dir, name), &encode_ids(&snapshot.ids, &body)?)?;
    write_atomic(
        &index_file(dir, name),
        &encode_index(snapshot, ids_crc, &body),
    )?;

    Ok(())
}

/// Read both artifacts
///
/// Returns `Ok(None)` when either artifact is absent and `Err` with
/// `InvalidData` when they are present but unusable.
pub fn read(dir: &Path, name: &str, dimension: usize) -> io::Result<Option<Snapshot>> {
    let index_path = index_file(dir, name);
    let ids_path = ids_file(dir, name);

    if !index_path.exists() || !ids_path.exists() {
        return Ok(None);
    }

    let index = decode_index(&fs::read(&index_path)?)?;
    let IdsFile { index_crc, ids } = serde_json::from_slice(&fs::read(&ids_path)?)?;

    if index.dimension != dimension {
        return Err(invalid(format!(
            "snapshot dimension {} does not match configured {}",
            index.dimension, dimension
        )));
    }

    let ids_crc = crc32fast::hash(&serde_json::to_vec(&ids)?);
    if index_crc != index.body_crc || index.ids_crc != ids_crc {
        return Err(invalid("index and id list come from different writes"));
    }

    let vectors = index.vectors;
    let count = vectors.len() / dimension;
    if count != ids.len() {
        return Err(invalid(format!(
            "snapshot holds {} vectors but {} ids",
            count,
            ids.len()
        )));
    }

    Ok(Some(Snapshot {
        dimension,
        vectors,
        ids,
    }))
}

fn vector_bytes(vectors: &[f32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(vectors.len() * 4);
    for &val in vectors {
        buf.extend_from_slice(&val.to_le_bytes());
    }
    buf
}

fn encode_ids(ids: &[String], body: &[u8]) -> io::Result<Vec<u8>> {
    let file = serde_json::json!({
        "index_crc": crc32fast::hash(body),
        "ids": ids,
    });
    Ok(serde_json::to_vec(&file)?)
}

fn encode_index(snapshot: &Snapshot, ids_crc: u32, body: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + body.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&(snapshot.dimension as u32).to_le_bytes());
    buf.extend_from_slice(&(snapshot.len() as u64).to_le_bytes());
    buf.extend_from_slice(&ids_crc.to_le_bytes());
    buf.extend_from_slice(body);
    buf
}

fn decode_index(bytes: &[u8]) -> io::Result<IndexFile> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
        return Err(invalid("not a vector index file"));
    }

    let version = u32::from_le_bytes(le_array(&bytes[4..8]));
    if version != FORMAT_VERSION {
        return Err(invalid(format!("unsupported index version {}", version)));
    }

    let dimension = u32::from_le_bytes(le_array(&bytes[8..12])) as usize;
    let count = u64::from_le_bytes(le_array(&bytes[12..20])) as usize;
    let ids_crc = u32::from_le_bytes(le_array(&bytes[20..24]));
    if dimension == 0 {
        return Err(invalid("index dimension is zero"));
    }

    let body = &bytes[HEADER_LEN..];
    let expected = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| invalid("index header overflows"))?;
    if body.len() != expected {
        return Err(invalid(format!(
            "index body is {} bytes, header promises {}",
            body.len(),
            expected
        )));
    }

    let vectors = body
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(le_array(chunk)))
        .collect();

    Ok(IndexFile {
        dimension,
        ids_crc,
        body_crc: crc32fast::hash(body),
        vectors,
    })
}

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp_name = target.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    {
        let mut file = File::create(tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(tmp, target)?;

    // Persist the rename itself where the platform allows opening directories
    if let Some(parent) = target.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot {
            dimension: 2,
            vectors: vec![0.1, 0.2, -1.5, 3.25],
            ids: vec!["17".into(), "4".into()],
        }
    }

    #[test]
    fn test_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read(dir.path(), "scripture", 2).unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dua", &sample()).unwrap();

        let loaded = read(dir.path(), "dua", 2).unwrap().unwrap();
        assert_eq!(loaded, sample());
        assert!(!dir.path().join("dua.index.tmp").exists());
    }

    #[test]
    fn test_truncated_index_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dua", &sample()).unwrap();

        let path = index_file(dir.path(), "dua");
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        let err = read(dir.path(), "dua", 2).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_count_mismatch_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dua", &sample()).unwrap();
        fs::write(ids_file(dir.path(), "dua"), br#"{"index_crc":0,"ids":["17"]}"#).unwrap();

        assert!(read(dir.path(), "dua", 2).is_err());
    }

    fn one_dim(ids: &[&str], vectors: Vec<f32>) -> Snapshot {
        Snapshot {
            dimension: 1,
            vectors,
            ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_crash_between_renames_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "scripture", &one_dim(&["1", "2"], vec![0.0, 9.0])).unwrap();

        // A same-sized replacement whose ids landed but whose index did not
        let next = one_dim(&["3", "4"], vec![5.0, 1.0]);
        let ids = encode_ids(&next.ids, &vector_bytes(&next.vectors)).unwrap();
        write_atomic(&ids_file(dir.path(), "scripture"), &ids).unwrap();

        let err = read(dir.path(), "scripture", 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_same_ids_with_foreign_index_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "scripture", &one_dim(&["1", "2"], vec![0.0, 9.0])).unwrap();

        let other = tempfile::tempdir().unwrap();
        write(other.path(), "scripture", &one_dim(&["1", "2"], vec![4.0, 4.0])).unwrap();
        fs::copy(
            index_file(other.path(), "scripture"),
            index_file(dir.path(), "scripture"),
        )
        .unwrap();

        assert!(read(dir.path(), "scripture", 1).is_err());
    }

    #[test]
    fn test_replacement_of_equal_size_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "scripture", &one_dim(&["1", "2"], vec![0.0, 9.0])).unwrap();
        let next = one_dim(&["3", "4"], vec![5.0, 1.0]);
        write(dir.path(), "scripture", &next).unwrap();

        assert_eq!(read(dir.path(), "scripture", 1).unwrap().unwrap(), next);
    }

    #[test]
    fn test_dimension_mismatch_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dua", &sample()).unwrap();
        assert!(read(dir.path(), "dua", 4).is_err());
    }
}
