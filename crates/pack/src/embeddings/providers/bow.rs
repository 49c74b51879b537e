//! Bag-of-words embedding provider.
//!
//! Hashes whole lowercase alphanumeric tokens into a fixed number of
//! buckets. Offline and deterministic like `trigram`, but a different model:
//! the two produce incompatible vector spaces, so switching between them
//! forces an index rebuild.

use crate::embeddings::provider::{normalize, EmbeddingProvider};
use ragpack_core::PackResult;

#[derive(Debug)]
pub struct BowProvider {
    dimensions: usize,
}

impl BowProvider {
    pub const MODEL: &'static str = "bow-v1";

    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn bucket(&self, token: &str) -> usize {
        // FNV-1a
        let hash = token.bytes().fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
            (acc ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
        });
        (hash % self.dimensions as u64) as usize
    }

    fn generate_bow_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            embedding[self.bucket(&token)] += 1.0;
        }
        normalize(&mut embedding);
        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for BowProvider {
    fn provider_name(&self) -> &str {
        "bow"
    }

    fn model_name(&self) -> &str {
        Self::MODEL
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> PackResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| self.generate_bow_embedding(text))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_tokens_same_vector() {
        let provider = BowProvider::new(64);
        let a = provider.embed("Alpha, beta!").await.unwrap();
        let b = provider.embed("beta alpha").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_unit_length() {
        let provider = BowProvider::new(64);
        let v = provider.embed("one two three").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_short_tokens_count() {
        // Unlike trigram, short words are not dropped.
        let provider = BowProvider::new(64);
        let v = provider.embed("a b").await.unwrap();
        assert!(v.iter().any(|&x| x > 0.0));
    }

    #[tokio::test]
    async fn test_batch_order() {
        let provider = BowProvider::new(32);
        let texts = vec!["gamma".to_string(), "delta".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[0], provider.embed("gamma").await.unwrap());
        assert_eq!(batch[1], provider.embed("delta").await.unwrap());
    }
}
