use crate::error::{EmbeddingError, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const STORE_MAGIC: &[u8; 4] = b"EV01";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Append-only key-value store of `ticket_id → vector`, one binary file per
/// id under a sharded directory tree.
///
/// Writes are insert-if-absent: an existing record always wins and a
/// duplicate insert is a no-op. Racing writers for the same id each produce a
/// complete record via a unique temp file + rename, so exactly one whole
/// value survives.
#[derive(Clone, Debug)]
pub struct EmbeddingStore {
    base_dir: PathBuf,
}

impl EmbeddingStore {
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    #[must_use]
    pub fn vector_path(&self, ticket_id: &str) -> PathBuf {
        let key = id_digest(ticket_id);
        let (shard_a, shard_b) = (key[0..2].to_string(), key[2..4].to_string());
        self.base_dir
            .join(shard_a)
            .join(shard_b)
            .join(format!("{}.bin", safe_component(ticket_id)))
    }

    /// Stored vector for `ticket_id`, or `None` when absent or unreadable.
    pub async fn get(&self, ticket_id: &str) -> Option<Vec<f32>> {
        let path = self.vector_path(ticket_id);
        let bytes = tokio::fs::read(&path).await.ok()?;
        decode_vector(&bytes)
    }

    /// Insert `vector` for `ticket_id` unless a record already exists.
    pub async fn insert_if_absent(&self, ticket_id: &str, vector: &[f32]) -> Result<()> {
        let path = self.vector_path(ticket_id);
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = encode_vector(vector);
        let tmp = unique_tmp_path(&path);
        tokio::fs::write(&tmp, &bytes).await?;
        if tokio::fs::rename(&tmp, &path).await.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
            if !path.exists() {
                return Err(EmbeddingError::Store(format!(
                    "failed to commit vector for {ticket_id}"
                )));
            }
        }
        Ok(())
    }
}

fn unique_tmp_path(path: &Path) -> PathBuf {
    let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_extension(format!("bin.{}-{seq}.tmp", std::process::id()))
}

fn id_digest(ticket_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ticket_id.as_bytes());
    let digest = hasher.finalize();
    format!("{:02x}{:02x}{:02x}{:02x}", digest[0], digest[1], digest[2], digest[3])
}

fn safe_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        "_".to_string()
    } else {
        out
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + vector.len() * 4);
    out.extend_from_slice(STORE_MAGIC);
    #[allow(clippy::cast_possible_truncation)]
    let dim = vector.len() as u32;
    out.extend_from_slice(&dim.to_le_bytes());
    for v in vector {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn decode_vector(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() < 8 || &bytes[0..4] != STORE_MAGIC {
        return None;
    }
    let dim = u32::from_le_bytes(bytes[4..8].try_into().ok()?) as usize;
    let expected_len = 8usize.saturating_add(dim.saturating_mul(4));
    if bytes.len() != expected_len {
        return None;
    }
    let mut vector = Vec::with_capacity(dim);
    for i in 0..dim {
        let start = 8 + i * 4;
        let end = start + 4;
        vector.push(f32::from_le_bytes(bytes[start..end].try_into().ok()?));
    }
    Some(vector)
}
