//! On-disk index layout
//!
//! An index named `news` in directory `dir` is three files:
//!
//! - `news.manifest.json`: format version, shape, metric, model id and the
//!   SHA-256 of the two data files
//! - `news.vectors.bin`: bincode-encoded flat `Vec<f32>`
//! - `news.chunks.json`: chunk text and metadata in insertion order
//!
//! Data files go through a temp file and a rename. The manifest is removed
//! before and written after them, so an interrupted save never leaves a
//! loadable index.

use crate::vector::VectorIndex;
use defraud_config::DistanceMetric;
use defraud_core::{Chunk, DefraudError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const FORMAT_VERSION: u32 = 1;

/// Whether to check persisted files against their manifest checksums.
///
/// Has no `Default`; every load names its choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustPolicy {
    /// Reject files whose checksums do not match the manifest
    Verify,
    /// Accept the files as they are
    TrustUnverified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub index_name: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub count: usize,
    pub embedding_model: String,
    pub vectors_sha256: String,
    pub chunks_sha256: String,
}

/// File locations of one named index
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub dir: PathBuf,
    pub index_name: String,
}

impl IndexPaths {
    pub fn new(dir: impl Into<PathBuf>, index_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            index_name: index_name.into(),
        }
    }

    pub fn manifest(&self) -> PathBuf {
        self.file("manifest.json")
    }

    pub fn vectors(&self) -> PathBuf {
        self.file("vectors.bin")
    }

    pub fn chunks(&self) -> PathBuf {
        self.file("chunks.json")
    }

    pub fn exists(&self) -> bool {
        self.manifest().exists()
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.index_name, suffix))
    }
}

impl VectorIndex {
    /// Persist the index under `paths`, replacing any previous index there.
    pub fn save(&self, paths: &IndexPaths) -> Result<Manifest> {
        fs::create_dir_all(&paths.dir)?;

        match fs::remove_file(paths.manifest()) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        let vector_bytes = bincode::serialize(&self.vectors)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let chunk_bytes = serde_json::to_vec(&self.chunks)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        write_atomic(&paths.vectors(), &vector_bytes)?;
        write_atomic(&paths.chunks(), &chunk_bytes)?;

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            index_name: paths.index_name.clone(),
            dimension: self.dimension,
            metric: self.metric,
            count: self.len(),
            embedding_model: self.model_id.clone(),
            vectors_sha256: sha256_hex(&vector_bytes),
            chunks_sha256: sha256_hex(&chunk_bytes),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        write_atomic(&paths.manifest(), &manifest_bytes)?;

        info!(
            "saved index '{}' ({} chunks) to {}",
            paths.index_name,
            manifest.count,
            paths.dir.display()
        );
        Ok(manifest)
    }

    /// Load a persisted index. `trust` decides whether checksums are enforced.
    pub fn load(paths: &IndexPaths, trust: TrustPolicy) -> Result<Self> {
        let manifest = read_manifest(paths)?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(DefraudError::index_not_found(
                paths.manifest(),
                format!(
                    "unsupported format version {} (expected {})",
                    manifest.format_version, FORMAT_VERSION
                ),
            ));
        }

        let vector_bytes = read_file(&paths.vectors())?;
        let chunk_bytes = read_file(&paths.chunks())?;

        match trust {
            TrustPolicy::Verify => {
                verify(&paths.vectors(), &vector_bytes, &manifest.vectors_sha256)?;
                verify(&paths.chunks(), &chunk_bytes, &manifest.chunks_sha256)?;
            }
            TrustPolicy::TrustUnverified => {
                warn!(
                    "loading index '{}' from {} without checksum verification",
                    paths.index_name,
                    paths.dir.display()
                );
            }
        }

        let vectors: Vec<f32> = bincode::deserialize(&vector_bytes).map_err(|e| {
            DefraudError::index_not_found(paths.vectors(), format!("undecodable vectors: {e}"))
        })?;
        let chunks: Vec<Chunk> = serde_json::from_slice(&chunk_bytes).map_err(|e| {
            DefraudError::index_not_found(paths.chunks(), format!("undecodable chunks: {e}"))
        })?;

        if manifest.dimension == 0 || manifest.count == 0 {
            return Err(DefraudError::index_not_found(
                paths.manifest(),
                "manifest describes an empty index",
            ));
        }
        let expected = manifest
            .count
            .checked_mul(manifest.dimension)
            .ok_or_else(|| DefraudError::index_not_found(paths.manifest(), "shape overflows"))?;
        if vectors.len() != expected {
            return Err(DefraudError::DimensionMismatch {
                expected,
                actual: vectors.len(),
            });
        }
        if chunks.len() != manifest.count {
            return Err(DefraudError::index_not_found(
                paths.chunks(),
                format!("{} chunks, manifest says {}", chunks.len(), manifest.count),
            ));
        }

        info!(
            "loaded index '{}': {} chunks, dimension {}, {}",
            manifest.index_name, manifest.count, manifest.dimension, manifest.metric
        );

        Ok(VectorIndex::from_parts(
            manifest.metric,
            manifest.dimension,
            manifest.embedding_model,
            chunks,
            vectors,
        ))
    }
}

/// Read and parse only the manifest.
pub fn read_manifest(paths: &IndexPaths) -> Result<Manifest> {
    let bytes = read_file(&paths.manifest())?;
    serde_json::from_slice(&bytes).map_err(|e| {
        DefraudError::index_not_found(paths.manifest(), format!("unreadable manifest: {e}"))
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DefraudError::index_not_found(path, "file does not exist"),
        _ => DefraudError::index_not_found(path, e.to_string()),
    })
}

fn verify(path: &Path, bytes: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(bytes);
    if actual != expected {
        return Err(DefraudError::index_not_found(
            path,
            format!("checksum mismatch (manifest {expected}, file {actual})"),
        ));
    }
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DefraudError::Io(e)
    })
}
