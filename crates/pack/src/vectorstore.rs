//! Vectorstore adapter.
//!
//! The pack treats the similarity-search structure as opaque bytes produced
//! and consumed by an [`IndexEngine`]. The engine name is recorded in the
//! manifest and used to pick the loader.

use ragpack_core::{PackError, PackResult};
use std::collections::HashMap;

/// One chunk embedding handed to an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedVector {
    pub document_id: String,
    pub chunk_index: usize,
    pub vector: Vec<f32>,
}

/// A search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub document_id: String,
    pub chunk_index: usize,
    pub score: f32,
}

/// A loaded, read-only index.
pub trait VectorIndex: Send + Sync {
    fn engine(&self) -> &str;

    fn dimensions(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Top `k` hits by descending score. Ties keep document insertion order,
    /// then chunk order.
    fn search(&self, query: &[f32], k: usize) -> PackResult<Vec<SearchHit>>;
}

/// Builds and loads one index format.
pub trait IndexEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Serialize an index over `vectors`. Document insertion order is the
    /// order in which document ids first appear.
    fn build(&self, vectors: &[IndexedVector], dimensions: usize) -> PackResult<Vec<u8>>;

    /// Load a blob produced by [`IndexEngine::build`].
    fn load(&self, blob: &[u8], expected_dimensions: usize) -> PackResult<Box<dyn VectorIndex>>;
}

/// Name of the built-in exact cosine engine.
pub const FLAT_ENGINE: &str = "flat";

static FLAT: FlatEngine = FlatEngine;

/// Look up an engine by the name recorded in a manifest.
pub fn engine_for(name: &str) -> PackResult<&'static dyn IndexEngine> {
    match name {
        FLAT_ENGINE => Ok(&FLAT),
        other => Err(PackError::IndexCorrupt(format!(
            "unknown index engine '{}'",
            other
        ))),
    }
}

const FLAT_MAGIC: &[u8; 4] = b"FLAT";

/// Exact brute-force cosine search.
///
/// Blob layout (little-endian): magic, `u32` dimensions, `u32` document
/// count, per document a `u16` length and UTF-8 id, `u32` entry count, then
/// per entry `u32` document ordinal, `u32` chunk index and the vector.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatEngine;

impl IndexEngine for FlatEngine {
    fn name(&self) -> &'static str {
        FLAT_ENGINE
    }

    fn build(&self, vectors: &[IndexedVector], dimensions: usize) -> PackResult<Vec<u8>> {
        if dimensions == 0 {
            return Err(PackError::IndexCorrupt(
                "index dimensionality must be positive".to_string(),
            ));
        }

        let mut ordinals: HashMap<&str, u32> = HashMap::new();
        let mut documents: Vec<&str> = Vec::new();
        for v in vectors {
            if v.vector.len() != dimensions {
                return Err(PackError::IndexCorrupt(format!(
                    "vector for {}#{} has {} dimensions, index expects {}",
                    v.document_id,
                    v.chunk_index,
                    v.vector.len(),
                    dimensions
                )));
            }
            if !ordinals.contains_key(v.document_id.as_str()) {
                ordinals.insert(&v.document_id, documents.len() as u32);
                documents.push(&v.document_id);
            }
        }

        let mut out = Vec::with_capacity(16 + vectors.len() * (8 + dimensions * 4));
        out.extend_from_slice(FLAT_MAGIC);
        out.extend_from_slice(&(dimensions as u32).to_le_bytes());
        out.extend_from_slice(&(documents.len() as u32).to_le_bytes());
        for id in &documents {
            let len = u16::try_from(id.len()).map_err(|_| {
                PackError::InvalidInput(format!("document id '{}' is too long", id))
            })?;
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(id.as_bytes());
        }
        out.extend_from_slice(&(vectors.len() as u32).to_le_bytes());
        for v in vectors {
            let ordinal = ordinals[v.document_id.as_str()];
            out.extend_from_slice(&ordinal.to_le_bytes());
            out.extend_from_slice(&(v.chunk_index as u32).to_le_bytes());
            for x in &v.vector {
                out.extend_from_slice(&x.to_le_bytes());
            }
        }

        Ok(out)
    }

    fn load(&self, blob: &[u8], expected_dimensions: usize) -> PackResult<Box<dyn VectorIndex>> {
        let mut r = BlobReader { bytes: blob, pos: 0 };

        if r.take(4)? != FLAT_MAGIC {
            return Err(PackError::IndexCorrupt("not a flat index blob".to_string()));
        }
        let dimensions = r.u32()? as usize;
        if dimensions != expected_dimensions {
            return Err(PackError::IndexCorrupt(format!(
                "index has {} dimensions, manifest records {}",
                dimensions, expected_dimensions
            )));
        }

        let doc_count = r.u32()? as usize;
        let mut documents = Vec::with_capacity(doc_count.min(r.remaining() / 2));
        for _ in 0..doc_count {
            let len = r.u16()? as usize;
            let id = std::str::from_utf8(r.take(len)?)
                .map_err(|_| PackError::IndexCorrupt("document id is not UTF-8".to_string()))?;
            documents.push(id.to_string());
        }

        let entry_count = r.u32()? as usize;
        let entry_len = 8 + dimensions * 4;
        if entry_count.checked_mul(entry_len) != Some(r.remaining()) {
            return Err(PackError::IndexCorrupt(format!(
                "{} entries of {} dimensions do not match {} remaining bytes",
                entry_count,
                dimensions,
                r.remaining()
            )));
        }

        let mut entries = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            let ordinal = r.u32()?;
            if ordinal as usize >= documents.len() {
                return Err(PackError::IndexCorrupt(format!(
                    "entry references unknown document ordinal {}",
                    ordinal
                )));
            }
            let chunk_index = r.u32()? as usize;
            let mut vector = Vec::with_capacity(dimensions);
            for _ in 0..dimensions {
                vector.push(f32::from_le_bytes(r.array()?));
            }
            let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            entries.push(FlatEntry {
                ordinal,
                chunk_index,
                vector,
                norm,
            });
        }

        Ok(Box::new(FlatIndex {
            dimensions,
            documents,
            entries,
        }))
    }
}

struct FlatEntry {
    ordinal: u32,
    chunk_index: usize,
    vector: Vec<f32>,
    norm: f32,
}

struct FlatIndex {
    dimensions: usize,
    documents: Vec<String>,
    entries: Vec<FlatEntry>,
}

impl VectorIndex for FlatIndex {
    fn engine(&self) -> &str {
        FLAT_ENGINE
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn search(&self, query: &[f32], k: usize) -> PackResult<Vec<SearchHit>> {
        if query.len() != self.dimensions {
            return Err(PackError::IndexCorrupt(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_norm = query.iter().map(|x| x * x).sum::<f32>().sqrt();

        let mut scored: Vec<(f32, &FlatEntry)> = self
            .entries
            .iter()
            .map(|entry| {
                let score = if query_norm == 0.0 || entry.norm == 0.0 {
                    0.0
                } else {
                    let dot: f32 = entry.vector.iter().zip(query).map(|(a, b)| a * b).sum();
                    dot / (entry.norm * query_norm)
                };
                (score, entry)
            })
            .collect();

        scored.sort_by(|(sa, a), (sb, b)| {
            sb.total_cmp(sa)
                .then_with(|| a.ordinal.cmp(&b.ordinal))
                .then_with(|| a.chunk_index.cmp(&b.chunk_index))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, entry)| SearchHit {
                document_id: self.documents[entry.ordinal as usize].clone(),
                chunk_index: entry.chunk_index,
                score,
            })
            .collect())
    }
}

struct BlobReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BlobReader<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, len: usize) -> PackResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(PackError::IndexCorrupt(format!(
                "index blob truncated at offset {}",
                self.pos
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> PackResult<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    fn u16(&mut self) -> PackResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> PackResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(doc: &str, chunk: usize, vector: &[f32]) -> IndexedVector {
        IndexedVector {
            document_id: doc.to_string(),
            chunk_index: chunk,
            vector: vector.to_vec(),
        }
    }

    fn load(vectors: &[IndexedVector], dims: usize) -> Box<dyn VectorIndex> {
        let engine = engine_for(FLAT_ENGINE).unwrap();
        let blob = engine.build(vectors, dims).unwrap();
        engine.load(&blob, dims).unwrap()
    }

    #[test]
    fn test_search_orders_by_score() {
        let index = load(
            &[
                v("A", 0, &[1.0, 0.0, 0.0]),
                v("A", 1, &[0.0, 1.0, 0.0]),
                v("B", 0, &[0.7, 0.7, 0.0]),
            ],
            3,
        );

        let hits = index.search(&[1.0, 0.0, 0.0], 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!((hits[0].document_id.as_str(), hits[0].chunk_index), ("A", 0));
        assert_eq!((hits[1].document_id.as_str(), hits[1].chunk_index), ("B", 0));
        assert_eq!((hits[2].document_id.as_str(), hits[2].chunk_index), ("A", 1));
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ties_follow_insertion_order() {
        let index = load(
            &[
                v("second", 1, &[1.0, 0.0]),
                v("first", 0, &[1.0, 0.0]),
                v("second", 0, &[1.0, 0.0]),
            ],
            2,
        );

        let hits = index.search(&[2.0, 0.0], 3).unwrap();
        let order: Vec<_> = hits
            .iter()
            .map(|h| (h.document_id.as_str(), h.chunk_index))
            .collect();
        assert_eq!(order, vec![("second", 0), ("second", 1), ("first", 0)]);
    }

    #[test]
    fn test_k_limits_results() {
        let index = load(&[v("A", 0, &[1.0]), v("A", 1, &[0.5]), v("B", 0, &[0.2])], 1);
        assert_eq!(index.search(&[1.0], 2).unwrap().len(), 2);
        assert!(index.search(&[1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_zero_vectors_score_zero() {
        let index = load(&[v("A", 0, &[0.0, 0.0])], 2);
        let hits = index.search(&[1.0, 1.0], 1).unwrap();
        assert_eq!(hits[0].score, 0.0);
    }

    #[test]
    fn test_build_rejects_wrong_dimensions() {
        let engine = FlatEngine;
        assert!(matches!(
            engine.build(&[v("A", 0, &[1.0, 2.0])], 3),
            Err(PackError::IndexCorrupt(_))
        ));
    }

    #[test]
    fn test_load_rejects_dimension_mismatch() {
        let engine = FlatEngine;
        let blob = engine.build(&[v("A", 0, &[1.0, 2.0])], 2).unwrap();
        assert!(matches!(engine.load(&blob, 3), Err(PackError::IndexCorrupt(_))));
    }

    #[test]
    fn test_search_rejects_dimension_mismatch() {
        let index = load(&[v("A", 0, &[1.0, 2.0])], 2);
        assert!(matches!(
            index.search(&[1.0], 1),
            Err(PackError::IndexCorrupt(_))
        ));
    }

    #[test]
    fn test_truncated_blob() {
        let engine = FlatEngine;
        let blob = engine.build(&[v("A", 0, &[1.0, 2.0])], 2).unwrap();
        assert!(matches!(
            engine.load(&blob[..blob.len() - 2], 2),
            Err(PackError::IndexCorrupt(_))
        ));
    }

    #[test]
    fn test_unknown_engine() {
        assert!(matches!(engine_for("hnsw"), Err(PackError::IndexCorrupt(_))));
    }

    #[test]
    fn test_empty_index() {
        let index = load(&[], 4);
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0, 0.0, 0.0], 5).unwrap().is_empty());
    }
}
