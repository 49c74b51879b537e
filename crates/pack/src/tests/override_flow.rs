//! Tests for provider overrides at load time and index rebuilds.

use super::*;
use crate::resolver::ResolutionStatus;
use crate::types::{AskOptions, LoadOptions};
use ragpack_core::PackError;
use ragpack_llm::LlmConfig;
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    async fn saved_trigram_pack(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("greek.rag");
        sample_pack(trigram()).await.save(&path, None).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_embedding_model_change_requires_rebuild() {
        let dir = TempDir::new().unwrap();
        let path = saved_trigram_pack(&dir).await;

        let (pack, status) = Pack::load(
            &path,
            LoadOptions::default().with_embedding(embedding("bow", "bow-v1")),
        )
        .unwrap();

        match &status {
            ResolutionStatus::RebuildRequired(mismatch) => {
                assert_eq!(mismatch.recorded.model, "trigram-v1");
                assert_eq!(mismatch.requested.model, "bow-v1");
            }
            other => panic!("expected RebuildRequired, got {:?}", other),
        }
        assert!(pack.status().needs_rebuild());

        assert!(matches!(
            pack.query("alpha", 1).await,
            Err(PackError::RebuildRequired(_))
        ));
        assert!(matches!(
            pack.ask("alpha", &AskOptions::default()).await,
            Err(PackError::RebuildRequired(_))
        ));
    }

    #[tokio::test]
    async fn test_rebuild_matches_fresh_build() {
        let dir = TempDir::new().unwrap();
        let path = saved_trigram_pack(&dir).await;

        let (pack, _) = Pack::load(
            &path,
            LoadOptions::default().with_embedding(embedding("bow", "bow-v1")),
        )
        .unwrap();

        let report = pack.rebuild().await.unwrap();
        assert_eq!(report.previous.model, "trigram-v1");
        assert_eq!(report.current.model, "bow-v1");
        assert_eq!(report.documents, 2);
        assert_eq!(report.vectors, 3);
        assert_eq!(pack.status(), ResolutionStatus::Ready);

        let fresh = sample_pack(bow()).await;
        assert_eq!(pack.manifest().index.digest, fresh.manifest().index.digest);
        for query in ["alpha", "beta", "gamma"] {
            assert_eq!(
                pack.query(query, 3).await.unwrap(),
                fresh.query(query, 3).await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_rebuilt_pack_saves_new_descriptor() {
        let dir = TempDir::new().unwrap();
        let path = saved_trigram_pack(&dir).await;

        let (pack, _) = Pack::load(
            &path,
            LoadOptions::default().with_embedding(embedding("bow", "bow-v1")),
        )
        .unwrap();
        pack.rebuild().await.unwrap();

        let rebuilt = dir.path().join("rebuilt.rag");
        pack.save(&rebuilt, None).await.unwrap();

        let manifest = Pack::inspect(&rebuilt).unwrap();
        assert_eq!(manifest.embedding.model, "bow-v1");
        assert_eq!(manifest.index.embedding.model, "bow-v1");

        // Reopening with the recorded provider needs no rebuild.
        let (reopened, status) = Pack::load(&rebuilt, LoadOptions::default()).unwrap();
        assert_eq!(status, ResolutionStatus::Bound);
        assert_eq!(
            reopened.query("gamma", 1).await.unwrap()[0].document_id,
            "B"
        );

        // The original file is untouched.
        assert_eq!(Pack::inspect(&path).unwrap().embedding.model, "trigram-v1");
    }

    #[tokio::test]
    async fn test_saving_before_rebuild_keeps_recorded_index() {
        let dir = TempDir::new().unwrap();
        let path = saved_trigram_pack(&dir).await;

        let (pack, _) = Pack::load(
            &path,
            LoadOptions::default().with_embedding(embedding("bow", "bow-v1")),
        )
        .unwrap();

        let copy = dir.path().join("copy.rag");
        pack.save(&copy, None).await.unwrap();

        let (reopened, status) = Pack::load(&copy, LoadOptions::default()).unwrap();
        assert_eq!(status, ResolutionStatus::Bound);
        assert_eq!(reopened.manifest().index.embedding.model, "trigram-v1");
    }

    #[tokio::test]
    async fn test_dimension_change_requires_rebuild() {
        let dir = TempDir::new().unwrap();
        let path = saved_trigram_pack(&dir).await;

        let mut wider = embedding("trigram", "trigram-v1");
        wider.dimensions = DIMENSIONS * 2;
        let (pack, status) =
            Pack::load(&path, LoadOptions::default().with_embedding(wider)).unwrap();
        assert!(status.needs_rebuild());

        pack.rebuild().await.unwrap();
        assert_eq!(pack.manifest().index.embedding.dimensions, DIMENSIONS * 2);
        assert_eq!(pack.query("alpha", 1).await.unwrap()[0].document_id, "A");
    }

    #[tokio::test]
    async fn test_llm_only_override() {
        let dir = TempDir::new().unwrap();
        let path = saved_trigram_pack(&dir).await;

        let (bound, _) = Pack::load(&path, LoadOptions::default()).unwrap();
        let llm = LlmConfig {
            provider: "extractive".to_string(),
            model: "extractive-v2".to_string(),
            ..Default::default()
        };
        let (overridden, status) =
            Pack::load(&path, LoadOptions::default().with_llm(llm)).unwrap();

        assert_eq!(status, ResolutionStatus::Overridden);
        assert_eq!(overridden.status(), ResolutionStatus::Ready);
        assert_eq!(overridden.llm().descriptor().model, "extractive-v2");
        assert_eq!(
            overridden.query("beta", 3).await.unwrap(),
            bound.query("beta", 3).await.unwrap()
        );

        let answer = overridden
            .ask("beta", &AskOptions::default())
            .await
            .unwrap();
        assert_eq!(answer.llm.as_deref(), Some("extractive:extractive-v2"));

        // Overrides are not written back.
        let copy = dir.path().join("copy.rag");
        overridden.save(&copy, None).await.unwrap();
        assert_eq!(Pack::inspect(&copy).unwrap().llm.model, "extractive-v1");
    }

    #[tokio::test]
    async fn test_compatible_embedding_override() {
        let dir = TempDir::new().unwrap();
        let path = saved_trigram_pack(&dir).await;

        let mut other_host = embedding("trigram", "trigram-v1");
        other_host.batch_size = 1;
        other_host.endpoint = Some("http://elsewhere:1234".to_string());
        let (pack, status) =
            Pack::load(&path, LoadOptions::default().with_embedding(other_host)).unwrap();

        // Same model and dimensions: the stored index stays valid.
        assert_eq!(status, ResolutionStatus::Bound);
        assert_eq!(pack.query("alpha", 1).await.unwrap()[0].document_id, "A");
    }

    #[tokio::test]
    async fn test_unavailable_providers_fail_on_first_use() {
        let dir = TempDir::new().unwrap();
        let path = saved_trigram_pack(&dir).await;

        let llm = LlmConfig {
            provider: "nonexistent".to_string(),
            model: "m".to_string(),
            ..Default::default()
        };
        let (pack, status) = Pack::load(&path, LoadOptions::default().with_llm(llm)).unwrap();
        assert_eq!(status, ResolutionStatus::Overridden);
        assert!(!pack.llm().is_initialized());

        // Retrieval does not need the LLM.
        assert_eq!(pack.query("alpha", 1).await.unwrap().len(), 1);
        assert!(matches!(
            pack.ask("alpha", &AskOptions::default()).await,
            Err(PackError::ProviderUnavailable(_))
        ));

        let (pack, status) = Pack::load(
            &path,
            LoadOptions::default().with_embedding(embedding("nonexistent", "trigram-v1")),
        )
        .unwrap();
        assert_eq!(status, ResolutionStatus::Overridden);
        assert!(!pack.embedding().is_initialized());
        assert!(matches!(
            pack.query("alpha", 1).await,
            Err(PackError::ProviderUnavailable(_))
        ));
    }
}
