//! Exact (flat) vector index with squared Euclidean distance.
//!
//! Records live in one append-only arena of `(vector, metadata)` pairs
//! behind a `std::sync::RwLock`, so a record's position is its identifier
//! and vectors can never drift out of alignment with their metadata.
//! Search is a brute-force scan over every record.

use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use sha2::{Digest, Sha256};
use tracing::debug;

use super::{VectorIndex, METADATA_FILE, VECTORS_FILE};
use crate::embedding::{blob_to_vec, squared_l2, vec_to_blob};
use crate::error::{RagError, Result};
use crate::models::{Metadata, QueryResult};

const MAGIC: &[u8; 8] = b"PRAGVEC\0";
const FORMAT_VERSION: u32 = 2;
const DIGEST_LEN: usize = 32;
/// magic + version + dim + count + SHA-256 of the metadata artifact
const HEADER_LEN: usize = 8 + 4 + 8 + 8 + DIGEST_LEN;

#[derive(Debug, Clone)]
struct Record {
    vector: Vec<f32>,
    metadata: Metadata,
}

/// In-memory exact nearest-neighbor index.
#[derive(Debug)]
pub struct FlatIndex {
    dim: usize,
    records: RwLock<Vec<Record>>,
}

impl FlatIndex {
    /// Create an empty index for vectors of length `dim`.
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(RagError::InvalidDimension(dim));
        }
        Ok(Self {
            dim,
            records: RwLock::new(Vec::new()),
        })
    }

    /// Snapshot of the stored metadata, in insertion order.
    pub fn metadata(&self) -> Vec<Metadata> {
        self.read().iter().map(|r| r.metadata.clone()).collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Record>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_dim(&self, actual: usize) -> Result<()> {
        if actual != self.dim {
            return Err(RagError::DimensionMismatch {
                expected: self.dim,
                actual,
            });
        }
        Ok(())
    }
}

impl VectorIndex for FlatIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.read().len()
    }

    fn add(&self, vectors: Vec<Vec<f32>>, metadata: Vec<Metadata>) -> Result<()> {
        if vectors.len() != metadata.len() {
            return Err(RagError::DimensionMismatch {
                expected: vectors.len(),
                actual: metadata.len(),
            });
        }
        for v in &vectors {
            self.check_dim(v.len())?;
        }
        if let Some(key) = metadata.iter().find_map(Metadata::reserved_extra_key) {
            return Err(RagError::ReservedMetadataKey(key.to_string()));
        }

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.reserve(vectors.len());
        records.extend(
            vectors
                .into_iter()
                .zip(metadata)
                .map(|(vector, metadata)| Record { vector, metadata }),
        );
        debug!(total = records.len(), "appended records to flat index");
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryResult>> {
        self.check_dim(query.len())?;

        let records = self.read();
        if k == 0 || records.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, usize)> = records
            .iter()
            .enumerate()
            .map(|(pos, r)| (squared_l2(query, &r.vector), pos))
            .collect();

        // Distance ascending, then earliest insertion first.
        let by_rank = |a: &(f32, usize), b: &(f32, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
        if k < scored.len() {
            scored.select_nth_unstable_by(k, by_rank);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_rank);

        scored
            .into_iter()
            .map(|(distance, pos)| {
                let record = records.get(pos).ok_or_else(|| {
                    RagError::CorruptStore(format!(
                        "search hit at position {} has no stored record ({} records)",
                        pos,
                        records.len()
                    ))
                })?;
                Ok(QueryResult {
                    distance,
                    metadata: record.metadata.clone(),
                })
            })
            .collect()
    }

    fn persist(&self, dir: &Path) -> Result<()> {
        // Held for the whole write so no append lands between the two files.
        let records = self.read();

        let vec_path = dir.join(VECTORS_FILE);
        let meta_path = dir.join(METADATA_FILE);

        let metadata: Vec<&Metadata> = records.iter().map(|r| &r.metadata).collect();
        let json = serde_json::to_vec_pretty(&metadata).map_err(|e| RagError::Io {
            path: meta_path.clone(),
            source: std::io::Error::other(e),
        })?;

        let mut blob = Vec::with_capacity(HEADER_LEN + records.len() * self.dim * 4);
        blob.extend_from_slice(MAGIC);
        blob.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        blob.extend_from_slice(&(self.dim as u64).to_le_bytes());
        blob.extend_from_slice(&(records.len() as u64).to_le_bytes());
        blob.extend_from_slice(&Sha256::digest(&json));
        for r in records.iter() {
            blob.extend_from_slice(&vec_to_blob(&r.vector));
        }

        fs::create_dir_all(dir).map_err(|source| RagError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let vec_tmp = dir.join(format!("{}.tmp", VECTORS_FILE));
        let meta_tmp = dir.join(format!("{}.tmp", METADATA_FILE));

        // Both temp files are complete before either artifact is replaced.
        // A half-swapped pair is caught on restore by the metadata digest.
        let written = write_file(&vec_tmp, &blob)
            .and_then(|_| write_file(&meta_tmp, &json))
            .and_then(|_| rename_file(&vec_tmp, &vec_path))
            .and_then(|_| rename_file(&meta_tmp, &meta_path));
        if let Err(e) = written {
            for tmp in [&vec_tmp, &meta_tmp] {
                if let Err(cleanup) = fs::remove_file(tmp) {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        debug!(path = %tmp.display(), error = %cleanup, "temp file left behind");
                    }
                }
            }
            return Err(e);
        }

        debug!(
            dir = %dir.display(),
            records = records.len(),
            dim = self.dim,
            "persisted flat index"
        );
        Ok(())
    }

    fn restore(dir: &Path) -> Result<Self> {
        let vec_path = dir.join(VECTORS_FILE);
        let meta_path = dir.join(METADATA_FILE);

        let blob = fs::read(&vec_path).map_err(|e| RagError::corrupt(&vec_path, e))?;
        let decoded = decode_vectors(&blob).map_err(|r| RagError::corrupt(&vec_path, r))?;

        let json = fs::read(&meta_path).map_err(|e| RagError::corrupt(&meta_path, e))?;
        let metadata: Vec<Metadata> =
            serde_json::from_slice(&json).map_err(|e| RagError::corrupt(&meta_path, e))?;

        if decoded.vectors.len() != metadata.len() {
            return Err(RagError::corrupt(
                dir,
                format!(
                    "{} vectors but {} metadata records",
                    decoded.vectors.len(),
                    metadata.len()
                ),
            ));
        }
        if Sha256::digest(&json).as_slice() != &decoded.metadata_digest[..] {
            return Err(RagError::corrupt(
                &meta_path,
                format!("does not belong to {}", VECTORS_FILE),
            ));
        }

        let dim = decoded.dim;
        let records = decoded
            .vectors
            .into_iter()
            .zip(metadata)
            .map(|(vector, metadata)| Record { vector, metadata })
            .collect::<Vec<_>>();
        debug!(dir = %dir.display(), records = records.len(), dim, "restored flat index");

        Ok(Self {
            dim,
            records: RwLock::new(records),
        })
    }
}

struct DecodedVectors {
    dim: usize,
    metadata_digest: [u8; DIGEST_LEN],
    vectors: Vec<Vec<f32>>,
}

fn decode_vectors(blob: &[u8]) -> std::result::Result<DecodedVectors, String> {
    if blob.len() < HEADER_LEN {
        return Err(format!("truncated header ({} bytes)", blob.len()));
    }
    if &blob[..8] != MAGIC {
        return Err("not a vector artifact (bad magic)".to_string());
    }
    let version = u32::from_le_bytes([blob[8], blob[9], blob[10], blob[11]]);
    if version != FORMAT_VERSION {
        return Err(format!("unsupported format version {}", version));
    }
    let dim = read_u64(&blob[12..20]) as usize;
    let count = read_u64(&blob[20..28]) as usize;
    if dim == 0 {
        return Err("dimension is zero".to_string());
    }

    let row = dim
        .checked_mul(4)
        .ok_or_else(|| format!("dimension {} overflows a row", dim))?;
    let expected = row
        .checked_mul(count)
        .ok_or_else(|| format!("header overflow (dim={}, count={})", dim, count))?;

    let mut metadata_digest = [0u8; DIGEST_LEN];
    metadata_digest.copy_from_slice(&blob[28..HEADER_LEN]);

    let body = &blob[HEADER_LEN..];
    if body.len() != expected {
        return Err(format!(
            "expected {} bytes of vector data for {} x {}, found {}",
            expected,
            count,
            dim,
            body.len()
        ));
    }

    let vectors = body.chunks_exact(row).map(blob_to_vec).collect();
    Ok(DecodedVectors {
        dim,
        metadata_digest,
        vectors,
    })
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|source| RagError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn rename_file(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|source| RagError::Io {
        path: to.to_path_buf(),
        source,
    })
}
