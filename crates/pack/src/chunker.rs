//! Text chunking with configurable size and overlap.

use crate::manifest::ChunkParams;
use ragpack_core::{PackError, PackResult};
use text_splitter::{ChunkConfig as SplitterConfig, TextSplitter};

/// Chunk size and overlap, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 64,
        }
    }
}

impl ChunkConfig {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap: 0,
        }
    }

    pub fn with_overlap(mut self, chunk_overlap: usize) -> PackResult<Self> {
        self.chunk_overlap = chunk_overlap;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> PackResult<()> {
        if self.chunk_size == 0 {
            return Err(PackError::InvalidInput(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(PackError::InvalidInput(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    pub fn params(&self) -> ChunkParams {
        ChunkParams {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
    }
}

impl From<ChunkParams> for ChunkConfig {
    fn from(params: ChunkParams) -> Self {
        Self {
            chunk_size: params.chunk_size,
            chunk_overlap: params.chunk_overlap,
        }
    }
}

/// Split `text` into trimmed, non-empty chunks.
pub fn chunk_text(text: &str, config: &ChunkConfig) -> PackResult<Vec<String>> {
    config.validate()?;

    let splitter_config = SplitterConfig::new(config.chunk_size)
        .with_overlap(config.chunk_overlap)
        .map_err(|e| PackError::InvalidInput(format!("invalid chunk configuration: {}", e)))?;
    let splitter = TextSplitter::new(splitter_config);

    let chunks: Vec<String> = splitter
        .chunks(text)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    tracing::debug!(
        "Chunked {} bytes into {} chunks (size: {}, overlap: {})",
        text.len(),
        chunks.len(),
        config.chunk_size,
        config.chunk_overlap
    );

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_basic() {
        let text = "This is a test. ".repeat(100);
        let chunks = chunk_text(&text, &ChunkConfig::new(200)).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 200);
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("alpha beta", &ChunkConfig::default()).unwrap();
        assert_eq!(chunks, vec!["alpha beta".to_string()]);
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("", &ChunkConfig::default()).unwrap().is_empty());
        assert!(chunk_text("   \n\n ", &ChunkConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn test_chunk_text_utf8() {
        let text = "Gamedex é um aplicativo 🎮 com acentuação: ã, õ, ç. ".repeat(50);
        let chunks = chunk_text(&text, &ChunkConfig::new(120).with_overlap(20).unwrap()).unwrap();
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        assert!(matches!(
            ChunkConfig::new(100).with_overlap(100),
            Err(PackError::InvalidInput(_))
        ));
        assert!(matches!(
            ChunkConfig::new(0).validate(),
            Err(PackError::InvalidInput(_))
        ));
    }
}
