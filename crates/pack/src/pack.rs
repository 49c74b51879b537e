//! Pack lifecycle: build, save, load, query, ask and rebuild.
//!
//! Index state (the loaded index, its encoded segment, the manifest index
//! entry, the bound embedding provider and the resolution status) is held in
//! one `Arc` behind a `std::sync::RwLock`. Readers clone the `Arc` and search
//! without holding the lock; `rebuild` prepares a replacement off to the side
//! and swaps it in. Writers (`rebuild`, `save`) are serialized by an async
//! mutex.

use crate::chunker::chunk_text;
use crate::codec::{self, Artifact};
use crate::container::{document_path, raw_path, Container, INDEX_PATH, MANIFEST_PATH};
use crate::crypto::{EncryptionMetadata, Envelope};
use crate::embeddings::{EmbeddingConfig, EmbeddingHandle};
use crate::manifest::{
    sha256_hex, DocumentEntry, EmbeddingDescriptor, IndexEntry, Manifest, FORMAT_REVISION,
    FORMAT_VERSION,
};
use crate::rag::{self, RagAnswer};
use crate::resolver::{resolve, ResolutionStatus};
use crate::types::{
    AskOptions, BuildOptions, DocumentContent, DocumentRecord, LoadOptions, RankedChunk,
    RebuildReport, SaveOptions, SourceDocument,
};
use crate::vectorstore::{engine_for, IndexedVector, VectorIndex};
use chrono::Utc;
use ragpack_core::{AppConfig, PackError, PackResult, ProviderSpec};
use ragpack_llm::{LlmConfig, LlmHandle};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use uuid::Uuid;

/// Longest accepted document identifier.
const MAX_DOCUMENT_ID_LEN: usize = 128;

/// Hex characters kept from the content hash when deriving an identifier.
const DERIVED_ID_LEN: usize = 16;

struct IndexState {
    index: Box<dyn VectorIndex>,
    /// Codec-encoded index segment as stored under `index/main`
    segment: Vec<u8>,
    entry: IndexEntry,
    embedding: EmbeddingHandle,
    status: ResolutionStatus,
}

/// A portable document pack held in memory.
pub struct Pack {
    /// Manifest as built or loaded; index and embedding fields are
    /// superseded by the current index state.
    manifest: Manifest,
    documents: Vec<DocumentRecord>,
    positions: HashMap<String, usize>,
    raw: BTreeMap<String, Vec<u8>>,
    llm: LlmHandle,
    state: RwLock<Arc<IndexState>>,
    writer: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for Pack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.snapshot();
        f.debug_struct("Pack")
            .field("name", &self.manifest.name)
            .field("pack_id", &self.manifest.pack_id)
            .field("documents", &self.documents.len())
            .field("embedding", &state.entry.embedding.label())
            .field("llm", &self.llm.descriptor().label())
            .field("status", &state.status.label())
            .finish()
    }
}

impl Pack {
    /// Chunk, embed and index `documents`.
    ///
    /// # Errors
    /// `InvalidInput` for an empty document list, invalid or duplicate
    /// identifiers, documents without text, or bad chunk settings. Provider
    /// failures carry the provider identity.
    pub async fn build(
        documents: Vec<SourceDocument>,
        embedding: EmbeddingHandle,
        llm: LlmHandle,
        options: BuildOptions,
    ) -> PackResult<Self> {
        let start = Instant::now();

        if documents.is_empty() {
            return Err(PackError::InvalidInput(
                "a pack needs at least one document".to_string(),
            ));
        }
        options.chunking.validate()?;
        embedding.config().validate()?;
        engine_for(&options.engine)?;

        tracing::info!(
            "Building pack '{}' from {} documents with {}",
            options.name,
            documents.len(),
            embedding.identity()
        );

        let mut records = Vec::with_capacity(documents.len());
        let mut raw = BTreeMap::new();
        let mut seen = HashSet::new();

        for document in documents {
            let chunks = match document.content {
                DocumentContent::Text(ref text) => chunk_text(text, &options.chunking)?,
                DocumentContent::Chunks(ref chunks) => chunks
                    .iter()
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect(),
            };
            if chunks.is_empty() {
                return Err(PackError::InvalidInput(format!(
                    "document '{}' has no text",
                    document.filename
                )));
            }

            let id = match document.id {
                Some(id) => {
                    validate_document_id(&id)?;
                    if !seen.insert(id.clone()) {
                        return Err(PackError::InvalidInput(format!(
                            "duplicate document id '{}'",
                            id
                        )));
                    }
                    id
                }
                None => {
                    let id = unique_derived_id(
                        derive_document_id(&document.filename, &chunks),
                        &seen,
                    );
                    seen.insert(id.clone());
                    id
                }
            };

            tracing::debug!(
                "Document '{}' ({}) -> {} chunks",
                id,
                document.filename,
                chunks.len()
            );

            if let Some(bytes) = document.raw {
                raw.insert(id.clone(), bytes);
            }
            records.push(DocumentRecord {
                id,
                filename: document.filename,
                chunks,
            });
        }

        let state = index_documents(&records, &embedding, &options.engine).await?;

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            format_revision: FORMAT_REVISION,
            pack_id: Uuid::new_v4(),
            name: options.name,
            created_at: Utc::now(),
            embedding: state.entry.embedding.clone(),
            llm: llm.descriptor(),
            chunking: options.chunking.params(),
            documents: document_entries(&records, &raw),
            index: state.entry.clone(),
            encryption: None,
            digest: String::new(),
        };

        tracing::info!(
            "Built pack '{}': {} documents, {} vectors in {:.2}s",
            manifest.name,
            records.len(),
            state.entry.vector_count,
            start.elapsed().as_secs_f64()
        );

        Ok(Self::assemble(manifest, records, raw, llm, state))
    }

    /// Save to `path`, encrypted when `password` is given.
    pub async fn save(&self, path: &Path, password: Option<&str>) -> PackResult<()> {
        let options = SaveOptions {
            password: password.map(str::to_string),
            ..Default::default()
        };
        self.save_with(path, &options).await
    }

    /// Save to `path` atomically.
    ///
    /// The manifest is stored in plaintext. Every other entry is sealed with
    /// its logical path as associated data when a password is set. On any
    /// failure the file at `path` is left as it was. Key derivation, sealing
    /// and the fsynced commit run on the blocking pool.
    pub async fn save_with(&self, path: &Path, options: &SaveOptions) -> PackResult<()> {
        let _writer = self.writer.lock().await;
        let state = self.snapshot();

        let manifest = self.manifest_with(&state);
        let documents = self.documents.clone();
        let raw = self.raw.clone();
        let options = options.clone();
        let target = path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            write_pack(manifest, &documents, &raw, &state.segment, &options, &target)
        })
        .await
        .map_err(|e| PackError::Other(format!("save task failed: {}", e)))?
    }

    /// Read only the manifest of the pack at `path`. Needs no password.
    pub fn inspect(path: &Path) -> PackResult<Manifest> {
        let container = Container::open(path)?;
        read_manifest(&container)
    }

    /// Load and verify the pack at `path`, then bind providers.
    ///
    /// Providers are described here but only constructed on first use, so
    /// loading never needs a reachable model runtime. The returned status
    /// reports whether the stored index can serve the bound embedding
    /// provider.
    ///
    /// # Errors
    /// `NotFound` when the file is missing; `AuthenticationFailed` for a
    /// missing or wrong password or tampered ciphertext; `CorruptArtifact`
    /// for digest mismatches and malformed entries; `Schema` for an unknown
    /// format version; `IndexCorrupt` when the index does not match its
    /// manifest entry.
    pub fn load(path: &Path, options: LoadOptions) -> PackResult<(Self, ResolutionStatus)> {
        let start = Instant::now();
        let container = Container::open(path)?;
        let manifest = read_manifest(&container)?;

        let envelope = match (&manifest.encryption, options.password.as_deref()) {
            (Some(metadata), Some(password)) => Some(open_envelope(password, metadata)?),
            (Some(_), None) => {
                return Err(PackError::AuthenticationFailed(
                    "pack is encrypted and no password was given".to_string(),
                ))
            }
            (None, Some(_)) => {
                tracing::warn!(
                    "Pack '{}' is not encrypted; ignoring the supplied password",
                    manifest.name
                );
                None
            }
            (None, None) => None,
        };
        let envelope = envelope.as_ref();

        let mut documents = Vec::with_capacity(manifest.documents.len());
        let mut raw = BTreeMap::new();
        for entry in &manifest.documents {
            let bytes = read_entry(&container, envelope, &document_path(&entry.id), &entry.digest)?;
            let chunks = codec::decode_chunks(&bytes)?;
            if chunks.len() != entry.chunk_count {
                return Err(PackError::CorruptArtifact(format!(
                    "document '{}' holds {} chunks, manifest records {}",
                    entry.id,
                    chunks.len(),
                    entry.chunk_count
                )));
            }
            if let Some(raw_digest) = &entry.raw_digest {
                let bytes = read_entry(&container, envelope, &raw_path(&entry.id), raw_digest)?;
                raw.insert(entry.id.clone(), codec::decode_raw(&bytes)?);
            }
            documents.push(DocumentRecord {
                id: entry.id.clone(),
                filename: entry.filename.clone(),
                chunks,
            });
        }

        let segment = read_entry(&container, envelope, INDEX_PATH, &manifest.index.digest)?;
        let (engine, blob) = codec::decode_index(&segment)?;
        if engine != manifest.index.engine {
            return Err(PackError::CorruptArtifact(format!(
                "index segment was written by engine '{}', manifest records '{}'",
                engine, manifest.index.engine
            )));
        }
        let index = engine_for(&engine)?.load(&blob, manifest.index.embedding.dimensions)?;
        if index.len() != manifest.index.vector_count {
            return Err(PackError::IndexCorrupt(format!(
                "index holds {} vectors, manifest records {}",
                index.len(),
                manifest.index.vector_count
            )));
        }
        let total_chunks: usize = documents.iter().map(|d| d.chunks.len()).sum();
        if index.len() != total_chunks {
            return Err(PackError::IndexCorrupt(format!(
                "index holds {} vectors for {} chunks",
                index.len(),
                total_chunks
            )));
        }

        let embedding_config = match options.embedding_override {
            Some(config) => config,
            None => {
                recorded_embedding_config(&manifest.index.embedding, options.settings.as_ref())
            }
        };
        let llm_config = match options.llm_override {
            Some(config) => config,
            None => match &options.settings {
                Some(settings) => LlmConfig::from_app_config(&manifest.llm, settings),
                None => LlmConfig::from_descriptor(&manifest.llm),
            },
        };

        let resolution = resolve(
            &manifest.index.embedding,
            &manifest.llm,
            Some(&embedding_config.descriptor()),
            Some(&llm_config.descriptor()),
        );
        match &resolution.status {
            ResolutionStatus::RebuildRequired(mismatch) => tracing::warn!(
                "Pack '{}' needs a rebuild before it can be queried: {}",
                manifest.name,
                mismatch
            ),
            status => tracing::debug!(
                "Bound {} and {} ({})",
                resolution.embedding.label(),
                resolution.llm.label(),
                status.label()
            ),
        }

        let bound_status = match &resolution.status {
            ResolutionStatus::RebuildRequired(_) => resolution.status.clone(),
            _ => ResolutionStatus::Ready,
        };
        let state = IndexState {
            index,
            segment,
            entry: manifest.index.clone(),
            embedding: EmbeddingHandle::from_config(embedding_config),
            status: bound_status,
        };

        tracing::info!(
            "Loaded pack '{}' from {}: {} documents, {} vectors in {:.2}s",
            manifest.name,
            path.display(),
            documents.len(),
            state.entry.vector_count,
            start.elapsed().as_secs_f64()
        );

        let llm = LlmHandle::from_config(llm_config);
        Ok((
            Self::assemble(manifest, documents, raw, llm, state),
            resolution.status,
        ))
    }

    /// The `k` chunks most similar to `text`.
    ///
    /// # Errors
    /// `RebuildRequired` while the bound embedding provider cannot use the
    /// stored index.
    pub async fn query(&self, text: &str, k: usize) -> PackResult<Vec<RankedChunk>> {
        if text.trim().is_empty() {
            return Err(PackError::InvalidInput("query text is empty".to_string()));
        }

        let state = self.snapshot();
        if let ResolutionStatus::RebuildRequired(mismatch) = &state.status {
            return Err(PackError::RebuildRequired(mismatch.to_string()));
        }

        let vector = state.embedding.embed(text).await?;
        let hits = state.index.search(&vector, k)?;

        hits.into_iter()
            .map(|hit| {
                let record = self
                    .positions
                    .get(&hit.document_id)
                    .and_then(|&i| self.documents.get(i))
                    .ok_or_else(|| {
                        PackError::IndexCorrupt(format!(
                            "index references unknown document '{}'",
                            hit.document_id
                        ))
                    })?;
                let text = record.chunks.get(hit.chunk_index).ok_or_else(|| {
                    PackError::IndexCorrupt(format!(
                        "index references missing chunk {}",
                        record.vector_id(hit.chunk_index)
                    ))
                })?;
                Ok(RankedChunk {
                    document_id: hit.document_id,
                    filename: record.filename.clone(),
                    chunk_index: hit.chunk_index,
                    text: text.clone(),
                    score: hit.score,
                })
            })
            .collect()
    }

    /// Retrieve context for `question` and have the bound LLM answer it.
    pub async fn ask(&self, question: &str, options: &AskOptions) -> PackResult<RagAnswer> {
        tracing::info!(
            "Answering question with {} (top_k: {})",
            self.llm.descriptor().label(),
            options.top_k
        );
        let ranked = self.query(question, options.top_k).await?;
        rag::answer(question, ranked, &self.llm, options).await
    }

    /// Re-embed every stored chunk with the bound embedding provider and
    /// replace the index.
    ///
    /// The new index becomes visible in a single swap once it is complete.
    /// If this future is dropped or fails first, the previous index stays in
    /// place.
    pub async fn rebuild(&self) -> PackResult<RebuildReport> {
        let _writer = self.writer.lock().await;
        let start = Instant::now();

        let current = self.snapshot();
        let previous = current.entry.embedding.clone();
        tracing::info!(
            "Rebuilding index of '{}': {} -> {}",
            self.manifest.name,
            previous.label(),
            current.embedding.descriptor().label()
        );

        let next =
            index_documents(&self.documents, &current.embedding, &current.entry.engine).await?;

        let report = RebuildReport {
            previous,
            current: next.entry.embedding.clone(),
            documents: self.documents.len(),
            vectors: next.entry.vector_count,
            duration_secs: start.elapsed().as_secs_f64(),
        };

        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);

        tracing::info!(
            "Rebuilt index with {}: {} vectors in {:.2}s",
            report.current.label(),
            report.vectors,
            report.duration_secs
        );
        Ok(report)
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn document(&self, id: &str) -> Option<&DocumentRecord> {
        self.positions.get(id).and_then(|&i| self.documents.get(i))
    }

    /// Original bytes kept for document `id`, if any.
    pub fn raw(&self, id: &str) -> Option<&[u8]> {
        self.raw.get(id).map(Vec::as_slice)
    }

    /// The manifest as it would be saved now.
    pub fn manifest(&self) -> Manifest {
        self.manifest_with(&self.snapshot())
    }

    pub fn status(&self) -> ResolutionStatus {
        self.snapshot().status.clone()
    }

    pub fn embedding(&self) -> EmbeddingHandle {
        self.snapshot().embedding.clone()
    }

    pub fn llm(&self) -> &LlmHandle {
        &self.llm
    }

    fn assemble(
        manifest: Manifest,
        documents: Vec<DocumentRecord>,
        raw: BTreeMap<String, Vec<u8>>,
        llm: LlmHandle,
        state: IndexState,
    ) -> Self {
        let positions = documents
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();
        Self {
            manifest,
            documents,
            positions,
            raw,
            llm,
            state: RwLock::new(Arc::new(state)),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    fn snapshot(&self) -> Arc<IndexState> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn manifest_with(&self, state: &IndexState) -> Manifest {
        let mut manifest = self.manifest.clone();
        manifest.embedding = state.entry.embedding.clone();
        manifest.index = state.entry.clone();
        manifest.digest = String::new();
        manifest
    }
}

/// Embed every chunk of `records` and build an index over the vectors.
async fn index_documents(
    records: &[DocumentRecord],
    embedding: &EmbeddingHandle,
    engine_name: &str,
) -> PackResult<IndexState> {
    let engine = engine_for(engine_name)?;
    let dimensions = embedding.config().dimensions;

    let mut vectors = Vec::with_capacity(records.iter().map(|r| r.chunks.len()).sum());
    for record in records {
        let embeddings = embedding.embed_batch(&record.chunks).await?;
        tracing::debug!(
            "Embedded {} chunks of '{}'",
            embeddings.len(),
            record.id
        );
        vectors.extend(
            embeddings
                .into_iter()
                .enumerate()
                .map(|(chunk_index, vector)| IndexedVector {
                    document_id: record.id.clone(),
                    chunk_index,
                    vector,
                }),
        );
    }

    let blob = engine.build(&vectors, dimensions)?;
    let index = engine.load(&blob, dimensions)?;
    let segment = codec::encode(&Artifact::IndexSegment {
        engine: engine.name().to_string(),
        bytes: blob,
    });

    let entry = IndexEntry {
        engine: engine.name().to_string(),
        vector_count: vectors.len(),
        digest: sha256_hex(&segment),
        embedding: embedding.descriptor(),
    };

    Ok(IndexState {
        index,
        segment,
        entry,
        embedding: embedding.clone(),
        status: ResolutionStatus::Ready,
    })
}

fn document_entries(
    records: &[DocumentRecord],
    raw: &BTreeMap<String, Vec<u8>>,
) -> Vec<DocumentEntry> {
    records
        .iter()
        .map(|record| DocumentEntry {
            id: record.id.clone(),
            filename: record.filename.clone(),
            chunk_count: record.chunks.len(),
            digest: sha256_hex(&codec::encode(&Artifact::ChunkText(record.chunks.clone()))),
            raw_digest: raw
                .get(&record.id)
                .map(|bytes| sha256_hex(&codec::encode(&Artifact::RawDocument(bytes.clone())))),
        })
        .collect()
}

fn recorded_embedding_config(
    recorded: &EmbeddingDescriptor,
    settings: Option<&AppConfig>,
) -> EmbeddingConfig {
    match settings {
        Some(settings) => EmbeddingConfig::from_spec(
            &ProviderSpec::new(recorded.provider.clone(), recorded.model.clone()),
            recorded.dimensions,
            settings,
        ),
        None => EmbeddingConfig::from_descriptor(recorded),
    }
}

fn read_manifest(container: &Container) -> PackResult<Manifest> {
    let bytes = container.get(MANIFEST_PATH).map_err(|e| match e {
        PackError::NotFound(_) => PackError::CorruptArtifact("pack has no manifest".to_string()),
        other => other,
    })?;
    Manifest::parse(bytes)
}

/// Seal and commit every entry of a pack. Blocking.
fn write_pack(
    mut manifest: Manifest,
    documents: &[DocumentRecord],
    raw: &BTreeMap<String, Vec<u8>>,
    segment: &[u8],
    options: &SaveOptions,
    path: &Path,
) -> PackResult<()> {
    let mut envelope = match options.password.as_deref() {
        Some(password) => {
            let (envelope, metadata) = Envelope::create(password, &options.kdf)?;
            manifest.encryption = Some(metadata);
            Some(envelope)
        }
        None => {
            manifest.encryption = None;
            None
        }
    };

    let mut container = Container::create();
    for record in documents {
        let logical = document_path(&record.id);
        let bytes = codec::encode(&Artifact::ChunkText(record.chunks.clone()));
        container.put(&logical, seal_entry(envelope.as_mut(), bytes, &logical)?)?;
    }
    for (id, bytes) in raw {
        let logical = raw_path(id);
        let encoded = codec::encode(&Artifact::RawDocument(bytes.clone()));
        container.put(&logical, seal_entry(envelope.as_mut(), encoded, &logical)?)?;
    }
    container.put(
        INDEX_PATH,
        seal_entry(envelope.as_mut(), segment.to_vec(), INDEX_PATH)?,
    )?;
    container.put(MANIFEST_PATH, manifest.to_bytes()?)?;

    container.commit(path)?;

    tracing::info!(
        "Saved pack '{}' to {} ({} entries, {})",
        manifest.name,
        path.display(),
        container.len(),
        if manifest.is_encrypted() {
            "encrypted"
        } else {
            "plaintext"
        }
    );
    Ok(())
}

fn open_envelope(password: &str, metadata: &EncryptionMetadata) -> PackResult<Envelope> {
    tracing::debug!("Deriving pack key");
    Envelope::open(password, metadata)
}

fn seal_entry(envelope: Option<&mut Envelope>, bytes: Vec<u8>, logical: &str) -> PackResult<Vec<u8>> {
    match envelope {
        Some(envelope) => envelope.seal(&bytes, logical),
        None => Ok(bytes),
    }
}

/// Fetch, decrypt and digest-check one entry.
fn read_entry(
    container: &Container,
    envelope: Option<&Envelope>,
    logical: &str,
    expected_digest: &str,
) -> PackResult<Vec<u8>> {
    let stored = container.get(logical).map_err(|e| match e {
        PackError::NotFound(_) => {
            PackError::CorruptArtifact(format!("entry '{}' is missing", logical))
        }
        other => other,
    })?;

    let plaintext = match envelope {
        Some(envelope) => envelope.unseal(stored, logical)?,
        None => stored.to_vec(),
    };

    if sha256_hex(&plaintext) != expected_digest {
        return Err(PackError::CorruptArtifact(format!(
            "digest mismatch for '{}'",
            logical
        )));
    }
    tracing::debug!("Verified '{}' ({} bytes)", logical, plaintext.len());
    Ok(plaintext)
}

/// First hex characters of SHA-256 over the filename and chunk texts.
fn derive_document_id(filename: &str, chunks: &[String]) -> String {
    let mut material = Vec::with_capacity(filename.len() + 1);
    material.extend_from_slice(filename.as_bytes());
    for chunk in chunks {
        material.push(0);
        material.extend_from_slice(chunk.as_bytes());
    }
    sha256_hex(&material)[..DERIVED_ID_LEN].to_string()
}

/// Suffix a derived id (`-2`, `-3`, ...) until it is unused. Identical
/// name and content in two documents derive the same base id.
fn unique_derived_id(base: String, seen: &HashSet<String>) -> String {
    if !seen.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or(base)
}

fn validate_document_id(id: &str) -> PackResult<()> {
    let valid = !id.is_empty()
        && id.len() <= MAX_DOCUMENT_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && id != "."
        && id != "..";
    if valid {
        Ok(())
    } else {
        Err(PackError::InvalidInput(format!(
            "invalid document id '{}' (use letters, digits, '.', '_' or '-')",
            id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_ids_are_stable() {
        let chunks = vec!["alpha".to_string()];
        let a = derive_document_id("a.txt", &chunks);
        assert_eq!(a.len(), DERIVED_ID_LEN);
        assert_eq!(a, derive_document_id("a.txt", &chunks));
        assert_ne!(a, derive_document_id("b.txt", &chunks));
    }

    #[test]
    fn test_document_id_rules() {
        assert!(validate_document_id("guide-2024_v1.md").is_ok());
        assert!(validate_document_id("").is_err());
        assert!(validate_document_id("..").is_err());
        assert!(validate_document_id("a/b").is_err());
        assert!(validate_document_id("a#0").is_err());
        assert!(validate_document_id(&"x".repeat(MAX_DOCUMENT_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_colliding_derived_ids_get_suffixes() {
        let mut seen = HashSet::new();
        let first = unique_derived_id("0123456789abcdef".to_string(), &seen);
        seen.insert(first.clone());
        let second = unique_derived_id(first.clone(), &seen);
        seen.insert(second.clone());
        let third = unique_derived_id(first.clone(), &seen);

        assert_eq!(first, "0123456789abcdef");
        assert_eq!(second, "0123456789abcdef-2");
        assert_eq!(third, "0123456789abcdef-3");
        assert!(validate_document_id(&third).is_ok());
    }
}
