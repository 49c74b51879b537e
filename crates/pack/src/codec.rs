//! Binary codec for the artifacts stored inside a pack.
//!
//! Every artifact starts with a 4-byte magic identifying its kind and a
//! 1-byte codec version. Integers are little-endian. Chunk text is stored as
//! length-prefixed records so embedded newlines or separators never break
//! record boundaries.

use ragpack_core::{PackError, PackResult};

/// Current codec version written by `encode`.
pub const CODEC_VERSION: u8 = 1;

const RAW_DOCUMENT_MAGIC: &[u8; 4] = b"RPRD";
const CHUNK_TEXT_MAGIC: &[u8; 4] = b"RPCT";
const INDEX_SEGMENT_MAGIC: &[u8; 4] = b"RPIX";

/// Kind of artifact expected by `decode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    RawDocument,
    ChunkText,
    IndexSegment,
}

impl ArtifactKind {
    fn magic(self) -> &'static [u8; 4] {
        match self {
            ArtifactKind::RawDocument => RAW_DOCUMENT_MAGIC,
            ArtifactKind::ChunkText => CHUNK_TEXT_MAGIC,
            ArtifactKind::IndexSegment => INDEX_SEGMENT_MAGIC,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ArtifactKind::RawDocument => "raw document",
            ArtifactKind::ChunkText => "chunk text",
            ArtifactKind::IndexSegment => "index segment",
        }
    }
}

/// A decoded pack artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Original source bytes, opaque to the codec.
    RawDocument(Vec<u8>),
    /// Ordered chunk texts of one document.
    ChunkText(Vec<String>),
    /// Engine-native index bytes tagged with the engine name.
    IndexSegment { engine: String, bytes: Vec<u8> },
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::RawDocument(_) => ArtifactKind::RawDocument,
            Artifact::ChunkText(_) => ArtifactKind::ChunkText,
            Artifact::IndexSegment { .. } => ArtifactKind::IndexSegment,
        }
    }
}

/// Encode an artifact to bytes.
pub fn encode(artifact: &Artifact) -> Vec<u8> {
    let kind = artifact.kind();
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(kind.magic());
    out.push(CODEC_VERSION);

    match artifact {
        Artifact::RawDocument(bytes) => {
            out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
            out.extend_from_slice(bytes);
        }
        Artifact::ChunkText(chunks) => {
            out.extend_from_slice(&(chunks.len() as u32).to_le_bytes());
            for chunk in chunks {
                out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
                out.extend_from_slice(chunk.as_bytes());
            }
        }
        Artifact::IndexSegment { engine, bytes } => {
            out.extend_from_slice(&(engine.len() as u16).to_le_bytes());
            out.extend_from_slice(engine.as_bytes());
            out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
            out.extend_from_slice(bytes);
        }
    }

    out
}

/// Decode bytes that must hold an artifact of `kind`.
///
/// # Errors
/// `PackError::CorruptArtifact` on wrong magic, unsupported codec version,
/// truncated length prefix, invalid UTF-8 or trailing bytes.
pub fn decode(bytes: &[u8], kind: ArtifactKind) -> PackResult<Artifact> {
    let mut reader = Reader::new(bytes, kind);

    let magic = reader.take(4, "magic")?;
    if magic != kind.magic() {
        return Err(reader.corrupt("bad magic"));
    }

    let version = reader.u8("codec version")?;
    if version != CODEC_VERSION {
        return Err(reader.corrupt(&format!("unsupported codec version {}", version)));
    }

    let artifact = match kind {
        ArtifactKind::RawDocument => {
            let len = reader.len_u64("payload length")?;
            Artifact::RawDocument(reader.take(len, "payload")?.to_vec())
        }
        ArtifactKind::ChunkText => {
            let count = reader.u32("chunk count")? as usize;
            // Each record needs at least its 4-byte length prefix.
            if count > reader.remaining() / 4 {
                return Err(reader.corrupt("chunk count exceeds available bytes"));
            }
            let mut chunks = Vec::with_capacity(count);
            for i in 0..count {
                let len = reader.u32("chunk length")? as usize;
                let raw = reader.take(len, "chunk text")?;
                let text = std::str::from_utf8(raw)
                    .map_err(|e| reader.corrupt(&format!("chunk {} is not UTF-8: {}", i, e)))?;
                chunks.push(text.to_string());
            }
            Artifact::ChunkText(chunks)
        }
        ArtifactKind::IndexSegment => {
            let name_len = reader.u16("engine name length")? as usize;
            let raw_name = reader.take(name_len, "engine name")?;
            let engine = std::str::from_utf8(raw_name)
                .map_err(|e| reader.corrupt(&format!("engine name is not UTF-8: {}", e)))?
                .to_string();
            let len = reader.len_u64("payload length")?;
            let bytes = reader.take(len, "payload")?.to_vec();
            Artifact::IndexSegment { engine, bytes }
        }
    };

    if reader.remaining() != 0 {
        return Err(reader.corrupt(&format!("{} trailing bytes", reader.remaining())));
    }

    Ok(artifact)
}

/// Decode a chunk-text artifact straight into its chunks.
pub fn decode_chunks(bytes: &[u8]) -> PackResult<Vec<String>> {
    match decode(bytes, ArtifactKind::ChunkText)? {
        Artifact::ChunkText(chunks) => Ok(chunks),
        _ => Err(PackError::CorruptArtifact("expected chunk text".to_string())),
    }
}

/// Decode a raw-document artifact straight into its bytes.
pub fn decode_raw(bytes: &[u8]) -> PackResult<Vec<u8>> {
    match decode(bytes, ArtifactKind::RawDocument)? {
        Artifact::RawDocument(raw) => Ok(raw),
        _ => Err(PackError::CorruptArtifact("expected raw document".to_string())),
    }
}

/// Decode an index segment into `(engine, bytes)`.
pub fn decode_index(bytes: &[u8]) -> PackResult<(String, Vec<u8>)> {
    match decode(bytes, ArtifactKind::IndexSegment)? {
        Artifact::IndexSegment { engine, bytes } => Ok((engine, bytes)),
        _ => Err(PackError::CorruptArtifact("expected index segment".to_string())),
    }
}

/// Bounds-checked cursor over an artifact.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    kind: ArtifactKind,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], kind: ArtifactKind) -> Self {
        Self {
            bytes,
            pos: 0,
            kind,
        }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn corrupt(&self, reason: &str) -> PackError {
        PackError::CorruptArtifact(format!(
            "{} at offset {}: {}",
            self.kind.label(),
            self.pos,
            reason
        ))
    }

    fn take(&mut self, len: usize, what: &str) -> PackResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.corrupt(&format!(
                "truncated {} (need {} bytes, have {})",
                what,
                len,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &str) -> PackResult<[u8; N]> {
        let slice = self.take(N, what)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(slice);
        Ok(buf)
    }

    fn u8(&mut self, what: &str) -> PackResult<u8> {
        Ok(self.array::<1>(what)?[0])
    }

    fn u16(&mut self, what: &str) -> PackResult<u16> {
        Ok(u16::from_le_bytes(self.array(what)?))
    }

    fn u32(&mut self, what: &str) -> PackResult<u32> {
        Ok(u32::from_le_bytes(self.array(what)?))
    }

    fn len_u64(&mut self, what: &str) -> PackResult<usize> {
        let len = u64::from_le_bytes(self.array(what)?);
        usize::try_from(len).map_err(|_| self.corrupt(&format!("{} {} overflows", what, len)))
    }
}
