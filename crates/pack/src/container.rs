//! Single-file archive mapping logical paths to blobs.
//!
//! Layout:
//!
//! ```text
//! magic "RAGPACK\0" (8) | version u16 LE | toc_len u32 LE | toc JSON | blobs...
//! ```
//!
//! The table of contents lists every logical path with its offset (relative
//! to the start of the blob region) and size. Writes go to a temp file in the
//! target directory which is fsynced and renamed over the target, so a
//! failed commit never disturbs an existing pack.

use ragpack_core::{PackError, PackResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

pub const CONTAINER_MAGIC: &[u8; 8] = b"RAGPACK\0";
pub const CONTAINER_VERSION: u16 = 1;

const HEADER_LEN: usize = 8 + 2 + 4;

pub const MANIFEST_PATH: &str = "manifest";
pub const INDEX_PATH: &str = "index/main";

pub fn document_path(id: &str) -> String {
    format!("documents/{}", id)
}

pub fn raw_path(id: &str) -> String {
    format!("raw/{}", id)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TocEntry {
    path: String,
    offset: u64,
    size: u64,
}

fn validate_logical_path(path: &str) -> PackResult<()> {
    if path == MANIFEST_PATH {
        return Ok(());
    }
    let valid = ["documents/", "raw/", "index/"].iter().any(|prefix| {
        path.strip_prefix(prefix)
            .map(|rest| !rest.is_empty() && !rest.contains('/'))
            .unwrap_or(false)
    });
    if valid {
        Ok(())
    } else {
        Err(PackError::InvalidInput(format!(
            "invalid logical path '{}'",
            path
        )))
    }
}

/// An in-memory view of a pack archive.
#[derive(Debug, Default, Clone)]
pub struct Container {
    entries: BTreeMap<String, Vec<u8>>,
}

impl Container {
    /// Start an empty archive.
    pub fn create() -> Self {
        Self::default()
    }

    /// Read and validate an archive from disk.
    ///
    /// # Errors
    /// `NotFound` if the file does not exist; `CorruptArtifact` if the header
    /// or table of contents is inconsistent with the file length.
    pub fn open(path: &Path) -> PackResult<Self> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                PackError::NotFound(format!("pack file {}", path.display()))
            }
            _ => PackError::Io(e),
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parse an archive image.
    pub fn from_bytes(bytes: &[u8]) -> PackResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(PackError::CorruptArtifact(format!(
                "container is {} bytes, shorter than its header",
                bytes.len()
            )));
        }
        if &bytes[..8] != CONTAINER_MAGIC {
            return Err(PackError::CorruptArtifact(
                "not a ragpack container (bad magic)".to_string(),
            ));
        }

        let version = u16::from_le_bytes([bytes[8], bytes[9]]);
        if version != CONTAINER_VERSION {
            return Err(PackError::Schema(format!(
                "unsupported container version {}",
                version
            )));
        }

        let toc_len = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]) as usize;
        let blob_start = HEADER_LEN
            .checked_add(toc_len)
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| {
                PackError::CorruptArtifact("table of contents extends past end of file".to_string())
            })?;

        let toc: Vec<TocEntry> = serde_json::from_slice(&bytes[HEADER_LEN..blob_start])
            .map_err(|e| PackError::CorruptArtifact(format!("malformed table of contents: {}", e)))?;

        let blob_region = (bytes.len() - blob_start) as u64;

        // Validate everything before copying any blob out.
        for entry in &toc {
            let end = entry.offset.checked_add(entry.size);
            if end.map(|end| end > blob_region).unwrap_or(true) {
                return Err(PackError::CorruptArtifact(format!(
                    "entry '{}' extends past end of file (truncated pack?)",
                    entry.path
                )));
            }
            validate_logical_path(&entry.path)
                .map_err(|_| PackError::CorruptArtifact(format!("unknown entry '{}'", entry.path)))?;
        }

        let mut entries = BTreeMap::new();
        for entry in toc {
            let start = blob_start + entry.offset as usize;
            let end = start + entry.size as usize;
            if entries
                .insert(entry.path.clone(), bytes[start..end].to_vec())
                .is_some()
            {
                return Err(PackError::CorruptArtifact(format!(
                    "duplicate entry '{}'",
                    entry.path
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Add or replace a blob.
    pub fn put(&mut self, logical_path: &str, bytes: Vec<u8>) -> PackResult<()> {
        validate_logical_path(logical_path)?;
        self.entries.insert(logical_path.to_string(), bytes);
        Ok(())
    }

    /// Fetch a blob.
    pub fn get(&self, logical_path: &str) -> PackResult<&[u8]> {
        self.entries
            .get(logical_path)
            .map(|b| b.as_slice())
            .ok_or_else(|| PackError::NotFound(format!("entry '{}'", logical_path)))
    }

    pub fn contains(&self, logical_path: &str) -> bool {
        self.entries.contains_key(logical_path)
    }

    /// Logical paths in archive order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the archive image.
    pub fn to_bytes(&self) -> PackResult<Vec<u8>> {
        let mut toc = Vec::with_capacity(self.entries.len());
        let mut offset = 0u64;
        for (path, blob) in &self.entries {
            toc.push(TocEntry {
                path: path.clone(),
                offset,
                size: blob.len() as u64,
            });
            offset += blob.len() as u64;
        }

        let toc_bytes = serde_json::to_vec(&toc)?;
        let toc_len = u32::try_from(toc_bytes.len()).map_err(|_| {
            PackError::InvalidInput("table of contents exceeds 4 GiB".to_string())
        })?;

        let mut out = Vec::with_capacity(HEADER_LEN + toc_bytes.len() + offset as usize);
        out.extend_from_slice(CONTAINER_MAGIC);
        out.extend_from_slice(&CONTAINER_VERSION.to_le_bytes());
        out.extend_from_slice(&toc_len.to_le_bytes());
        out.extend_from_slice(&toc_bytes);
        for blob in self.entries.values() {
            out.extend_from_slice(blob);
        }
        Ok(out)
    }

    /// Atomically write the archive to `path`.
    ///
    /// The previous file at `path`, if any, stays intact unless the final
    /// rename succeeds.
    pub fn commit(&self, path: &Path) -> PackResult<()> {
        let bytes = self.to_bytes()?;

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        // Dropped (and deleted) on any early return.
        let mut tmp = tempfile::Builder::new()
            .prefix(".ragpack-")
            .suffix(".tmp")
            .tempfile_in(parent)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;

        tmp.persist(path).map_err(|e| PackError::Io(e.error))?;
        sync_dir(parent);

        tracing::debug!(
            "Committed {} entries ({} bytes) to {}",
            self.entries.len(),
            bytes.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = fs::File::open(dir) {
        if let Err(e) = handle.sync_all() {
            tracing::debug!("Directory fsync failed for {}: {}", dir.display(), e);
        }
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
