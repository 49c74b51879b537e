//! Pack manifest: versioned metadata describing a pack's contents.
//!
//! The manifest is always stored in plaintext so a pack can be inspected
//! without its password. It carries a SHA-256 digest over its own canonical
//! JSON form (computed with the `digest` field removed).

use crate::crypto::EncryptionMetadata;
use chrono::{DateTime, Utc};
use ragpack_core::{PackError, PackResult};
use ragpack_llm::LlmDescriptor;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Major schema version. Loaders reject any other major version.
pub const FORMAT_VERSION: u32 = 1;

/// Minor schema revision. Newer revisions of a known major are accepted.
pub const FORMAT_REVISION: u32 = 0;

/// Hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Embedding provider identity that produced an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbeddingDescriptor {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
}

impl EmbeddingDescriptor {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            dimensions,
        }
    }

    /// Vectors from `other` can be searched against an index built by `self`.
    ///
    /// Only the model and dimensionality matter; the same model served by
    /// another host produces interchangeable vectors.
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.model == other.model && self.dimensions == other.dimensions
    }

    pub fn label(&self) -> String {
        format!("{}:{} ({}d)", self.provider, self.model, self.dimensions)
    }
}

/// Chunking parameters the documents were split with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkParams {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// One document entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub id: String,
    pub filename: String,
    pub chunk_count: usize,
    /// SHA-256 of the encoded chunk-text record.
    pub digest: String,
    /// SHA-256 of the encoded raw-bytes record, when raw bytes were kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_digest: Option<String>,
}

/// The index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub engine: String,
    pub vector_count: usize,
    /// SHA-256 of the encoded index segment.
    pub digest: String,
    pub embedding: EmbeddingDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub format_revision: u32,
    pub pack_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub embedding: EmbeddingDescriptor,
    pub llm: LlmDescriptor,
    pub chunking: ChunkParams,
    pub documents: Vec<DocumentEntry>,
    pub index: IndexEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionMetadata>,
    #[serde(default)]
    pub digest: String,
}

/// Digest over the manifest JSON with the `digest` field removed.
///
/// Keys are hashed in sorted order and fields unknown to this build are
/// included, so manifests from newer revisions still verify.
fn canonical_digest(mut value: serde_json::Value) -> PackResult<String> {
    match value.as_object_mut() {
        Some(object) => {
            object.remove("digest");
        }
        None => {
            return Err(PackError::CorruptArtifact(
                "manifest is not a JSON object".to_string(),
            ))
        }
    }
    Ok(sha256_hex(&serde_json::to_vec(&value)?))
}

/// Only the version fields, read before the full schema.
#[derive(Deserialize)]
struct VersionHeader {
    format_version: u32,
    #[serde(default)]
    format_revision: u32,
}

impl Manifest {
    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }

    pub fn document(&self, id: &str) -> Option<&DocumentEntry> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn total_chunks(&self) -> usize {
        self.documents.iter().map(|d| d.chunk_count).sum()
    }

    /// Serialize to pretty JSON with the self-digest filled in.
    pub fn to_bytes(&self) -> PackResult<Vec<u8>> {
        let mut signed = self.clone();
        signed.digest = canonical_digest(serde_json::to_value(self)?)?;
        Ok(serde_json::to_vec_pretty(&signed)?)
    }

    /// Parse and verify a manifest.
    ///
    /// # Errors
    /// `Schema` for an unknown major version; `CorruptArtifact` for malformed
    /// JSON or a self-digest mismatch.
    pub fn parse(bytes: &[u8]) -> PackResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| PackError::CorruptArtifact(format!("manifest is not valid JSON: {}", e)))?;
        let header = VersionHeader::deserialize(&value)
            .map_err(|e| PackError::CorruptArtifact(format!("manifest has no version: {}", e)))?;

        if header.format_version != FORMAT_VERSION {
            return Err(PackError::Schema(format!(
                "unsupported pack format version {} (this build reads version {})",
                header.format_version, FORMAT_VERSION
            )));
        }
        if header.format_revision > FORMAT_REVISION {
            tracing::debug!(
                "Manifest revision {}.{} is newer than {}.{}; reading known fields",
                header.format_version,
                header.format_revision,
                FORMAT_VERSION,
                FORMAT_REVISION
            );
        }

        let expected = canonical_digest(value.clone())?;

        let manifest: Manifest = serde_json::from_value(value)
            .map_err(|e| PackError::CorruptArtifact(format!("malformed manifest: {}", e)))?;

        if manifest.digest != expected {
            return Err(PackError::CorruptArtifact(
                "manifest digest mismatch".to_string(),
            ));
        }

        Ok(manifest)
    }
}

#[cfg(test)]
pub(crate) fn sample_manifest() -> Manifest {
    let embedding = EmbeddingDescriptor::new("trigram", "trigram-v1", 64);
    Manifest {
        format_version: FORMAT_VERSION,
        format_revision: FORMAT_REVISION,
        pack_id: Uuid::new_v4(),
        name: "sample".to_string(),
        created_at: Utc::now(),
        embedding: embedding.clone(),
        llm: LlmDescriptor::new("extractive", "extractive-v1"),
        chunking: ChunkParams {
            chunk_size: 512,
            chunk_overlap: 64,
        },
        documents: vec![DocumentEntry {
            id: "A".to_string(),
            filename: "a.txt".to_string(),
            chunk_count: 2,
            digest: sha256_hex(b"a"),
            raw_digest: None,
        }],
        index: IndexEntry {
            engine: "flat".to_string(),
            vector_count: 2,
            digest: sha256_hex(b"index"),
            embedding,
        },
        encryption: None,
        digest: String::new(),
    }
}
