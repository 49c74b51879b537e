//! Tests for save/load round trips, integrity and encryption.

use super::*;
use crate::container::{Container, INDEX_PATH, MANIFEST_PATH};
use crate::crypto::{MAX_KDF_MEMORY_KIB, NONCE_LEN};
use crate::manifest::Manifest;
use crate::resolver::ResolutionStatus;
use crate::types::{AskOptions, LoadOptions};
use ragpack_core::PackError;
use std::fs;
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(pack_hits: &[crate::types::RankedChunk]) -> Vec<(String, usize)> {
        pack_hits
            .iter()
            .map(|h| (h.document_id.clone(), h.chunk_index))
            .collect()
    }

    /// Rewrite one container entry in place.
    fn rewrite_entry(path: &std::path::Path, logical: &str, edit: impl FnOnce(&mut Vec<u8>)) {
        let mut container = Container::open(path).unwrap();
        let mut bytes = container.get(logical).unwrap().to_vec();
        edit(&mut bytes);
        container.put(logical, bytes).unwrap();
        container.commit(path).unwrap();
    }

    #[tokio::test]
    async fn test_alpha_beta_gamma_scenario() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("greek.rag");

        let pack = sample_pack(trigram()).await;
        let before = pack.query("alpha", 1).await.unwrap();
        assert_eq!(hits(&before), vec![("A".to_string(), 0)]);
        assert_eq!(before[0].text, "alpha");
        assert_eq!(before[0].filename, "a.txt");

        pack.save(&path, None).await.unwrap();
        let (loaded, status) = Pack::load(&path, LoadOptions::default()).unwrap();

        assert_eq!(status, ResolutionStatus::Bound);
        assert_eq!(loaded.status(), ResolutionStatus::Ready);
        let after = loaded.query("alpha", 1).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_plain_roundtrip_preserves_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.rag");

        let pack = sample_pack(trigram()).await;
        pack.save(&path, None).await.unwrap();
        let (loaded, _) = Pack::load(&path, LoadOptions::default()).unwrap();

        assert_eq!(loaded.documents(), pack.documents());
        let original = pack.manifest();
        let manifest = loaded.manifest();
        assert_eq!(manifest.pack_id, original.pack_id);
        assert_eq!(manifest.documents, original.documents);
        assert_eq!(manifest.index, original.index);
        assert!(!manifest.is_encrypted());

        for query in ["alpha", "beta", "gamma"] {
            assert_eq!(
                loaded.query(query, 3).await.unwrap(),
                pack.query(query, 3).await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_encrypted_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.rag");

        let pack = sample_pack(trigram()).await;
        pack.save_with(&path, &encrypted("correct horse")).await.unwrap();

        let (loaded, status) =
            Pack::load(&path, LoadOptions::default().with_password("correct horse")).unwrap();
        assert_eq!(status, ResolutionStatus::Bound);
        assert!(loaded.manifest().is_encrypted());
        assert_eq!(loaded.documents(), pack.documents());
        assert_eq!(
            hits(&loaded.query("gamma", 1).await.unwrap()),
            vec![("B".to_string(), 0)]
        );
    }

    #[tokio::test]
    async fn test_encrypted_file_hides_chunk_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.rag");

        let documents = vec![SourceDocument::text(
            "notes.md",
            "The launch code is hidden in the lighthouse",
        )];
        let pack = Pack::build(documents, trigram(), extractive(), BuildOptions::default())
            .await
            .unwrap();
        pack.save_with(&path, &encrypted("pw")).await.unwrap();

        let bytes = fs::read(&path).unwrap();
        let needle = b"lighthouse";
        assert!(!bytes.windows(needle.len()).any(|w| w == needle));
        // The manifest stays readable.
        let needle = b"notes.md";
        assert!(bytes.windows(needle.len()).any(|w| w == needle));
    }

    #[tokio::test]
    async fn test_inspect_without_password() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.rag");

        sample_pack(trigram())
            .await
            .save_with(&path, &encrypted("pw"))
            .await
            .unwrap();

        let manifest = Pack::inspect(&path).unwrap();
        assert_eq!(manifest.name, "greek");
        assert!(manifest.is_encrypted());
        assert_eq!(manifest.documents.len(), 2);
        assert_eq!(manifest.total_chunks(), 3);
        assert_eq!(manifest.embedding.model, "trigram-v1");
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.rag");

        sample_pack(trigram())
            .await
            .save_with(&path, &encrypted("right"))
            .await
            .unwrap();

        let result = Pack::load(&path, LoadOptions::default().with_password("wrong"));
        assert!(matches!(result, Err(PackError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_encrypted_pack_requires_password() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.rag");

        sample_pack(trigram())
            .await
            .save_with(&path, &encrypted("pw"))
            .await
            .unwrap();

        assert!(matches!(
            Pack::load(&path, LoadOptions::default()),
            Err(PackError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_password_on_plain_pack_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.rag");

        sample_pack(trigram()).await.save(&path, None).await.unwrap();
        let (loaded, _) =
            Pack::load(&path, LoadOptions::default().with_password("unused")).unwrap();
        assert_eq!(loaded.documents().len(), 2);
    }

    #[tokio::test]
    async fn test_tampered_ciphertext_fails_authentication() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.rag");

        sample_pack(trigram())
            .await
            .save_with(&path, &encrypted("pw"))
            .await
            .unwrap();

        rewrite_entry(&path, INDEX_PATH, |bytes| bytes[NONCE_LEN + 1] ^= 0x01);

        assert!(matches!(
            Pack::load(&path, LoadOptions::default().with_password("pw")),
            Err(PackError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_swapped_encrypted_entries_fail_authentication() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.rag");

        sample_pack(trigram())
            .await
            .save_with(&path, &encrypted("pw"))
            .await
            .unwrap();

        let mut container = Container::open(&path).unwrap();
        let a = container.get("documents/A").unwrap().to_vec();
        let b = container.get("documents/B").unwrap().to_vec();
        container.put("documents/A", b).unwrap();
        container.put("documents/B", a).unwrap();
        container.commit(&path).unwrap();

        assert!(matches!(
            Pack::load(&path, LoadOptions::default().with_password("pw")),
            Err(PackError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_tampered_plain_document_fails_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.rag");

        sample_pack(trigram()).await.save(&path, None).await.unwrap();

        // Same length, different text: only the digest can catch it.
        rewrite_entry(&path, "documents/B", |bytes| {
            let last = bytes.len() - 1;
            bytes[last] = b'x';
        });

        match Pack::load(&path, LoadOptions::default()) {
            Err(PackError::CorruptArtifact(msg)) => assert!(msg.contains("documents/B")),
            other => panic!("expected CorruptArtifact, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_truncated_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.rag");

        sample_pack(trigram()).await.save(&path, None).await.unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(matches!(
            Pack::load(&path, LoadOptions::default()),
            Err(PackError::CorruptArtifact(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_major_version_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.rag");

        sample_pack(trigram()).await.save(&path, None).await.unwrap();
        rewrite_entry(&path, MANIFEST_PATH, |bytes| {
            let mut manifest = Manifest::parse(bytes).unwrap();
            manifest.format_version += 1;
            *bytes = manifest.to_bytes().unwrap();
        });

        assert!(matches!(
            Pack::load(&path, LoadOptions::default()),
            Err(PackError::Schema(_))
        ));
        assert!(matches!(Pack::inspect(&path), Err(PackError::Schema(_))));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Pack::load(&dir.path().join("absent.rag"), LoadOptions::default()),
            Err(PackError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_save_replaces_existing_pack_atomically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pack.rag");

        let first = sample_pack(trigram()).await;
        first.save(&path, None).await.unwrap();

        // A stray temp file from an interrupted save must not matter.
        fs::write(dir.path().join(".ragpack-stale.tmp"), b"partial").unwrap();

        let second = sample_pack(trigram()).await;
        second.save(&path, None).await.unwrap();

        let (loaded, _) = Pack::load(&path, LoadOptions::default()).unwrap();
        assert_eq!(loaded.manifest().pack_id, second.manifest().pack_id);
        assert_ne!(loaded.manifest().pack_id, first.manifest().pack_id);

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp") && name != ".ragpack-stale.tmp")
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_pack() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pack.rag");

        let pack = sample_pack(trigram()).await;
        pack.save(&path, None).await.unwrap();
        let before = fs::read(&path).unwrap();

        // An empty password is rejected before anything is written.
        let result = pack.save_with(&path, &encrypted("")).await;
        assert!(matches!(result, Err(PackError::InvalidInput(_))));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_raw_bytes_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.rag");

        let documents = vec![SourceDocument::text("guide.md", "# Guide\n\nInstall the pack tool.")
            .with_id("guide")
            .with_raw(b"# Guide\n\nInstall the pack tool.".to_vec())];
        let pack = Pack::build(documents, trigram(), extractive(), BuildOptions::default())
            .await
            .unwrap();
        pack.save_with(&path, &encrypted("pw")).await.unwrap();

        let (loaded, _) = Pack::load(&path, LoadOptions::default().with_password("pw")).unwrap();
        assert_eq!(loaded.raw("guide"), Some(&b"# Guide\n\nInstall the pack tool."[..]));
        assert!(loaded.manifest().documents[0].raw_digest.is_some());
    }

    #[tokio::test]
    async fn test_ask_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("greek.rag");

        sample_pack(trigram()).await.save(&path, None).await.unwrap();
        let (loaded, _) = Pack::load(&path, LoadOptions::default()).unwrap();

        let answer = loaded.ask("alpha", &AskOptions::default()).await.unwrap();
        assert_eq!(answer.answer, "alpha");
        assert_eq!(answer.sources[0].document_id, "A");
        assert_eq!(answer.sources[0].source, "a.txt");
        assert_eq!(answer.llm.as_deref(), Some("extractive:extractive-v1"));
    }

    #[tokio::test]
    async fn test_build_rejects_bad_input() {
        let empty = Pack::build(Vec::new(), trigram(), extractive(), BuildOptions::default()).await;
        assert!(matches!(empty, Err(PackError::InvalidInput(_))));

        let duplicate = vec![
            SourceDocument::text("a.txt", "alpha").with_id("same"),
            SourceDocument::text("b.txt", "beta").with_id("same"),
        ];
        let result = Pack::build(duplicate, trigram(), extractive(), BuildOptions::default()).await;
        assert!(matches!(result, Err(PackError::InvalidInput(msg)) if msg.contains("duplicate")));

        let bad_id = vec![SourceDocument::text("a.txt", "alpha").with_id("../escape")];
        let result = Pack::build(bad_id, trigram(), extractive(), BuildOptions::default()).await;
        assert!(matches!(result, Err(PackError::InvalidInput(_))));

        let blank = vec![SourceDocument::text("blank.txt", "   \n")];
        let result = Pack::build(blank, trigram(), extractive(), BuildOptions::default()).await;
        assert!(matches!(result, Err(PackError::InvalidInput(msg)) if msg.contains("blank.txt")));
    }

    #[tokio::test]
    async fn test_derived_ids_are_unique_per_document() {
        let documents = vec![
            SourceDocument::text("one.md", "first document about rivers"),
            SourceDocument::text("two.md", "second document about mountains"),
        ];
        let pack = Pack::build(documents, trigram(), extractive(), BuildOptions::default())
            .await
            .unwrap();

        let ids: Vec<&str> = pack.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(pack.document(ids[0]).map(|d| d.filename.as_str()), Some("one.md"));
    }

    #[tokio::test]
    async fn test_oversized_kdf_parameters_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("costly.rag");

        sample_pack(trigram())
            .await
            .save_with(&path, &encrypted("s3cret"))
            .await
            .unwrap();
        rewrite_entry(&path, MANIFEST_PATH, |bytes| {
            let mut manifest = Manifest::parse(bytes).unwrap();
            if let Some(encryption) = manifest.encryption.as_mut() {
                encryption.kdf.memory_kib = 64 * 1024 * 1024;
            }
            *bytes = manifest.to_bytes().unwrap();
        });

        for password in ["wrong", "s3cret"] {
            match Pack::load(&path, LoadOptions::default().with_password(password)) {
                Err(PackError::CorruptArtifact(msg)) => assert!(msg.contains("KDF memory")),
                other => panic!("expected CorruptArtifact, got {:?}", other.map(|_| ())),
            }
        }
        // The manifest itself is still readable.
        let manifest = Pack::inspect(&path).unwrap();
        assert!(manifest.encryption.unwrap().kdf.memory_kib > MAX_KDF_MEMORY_KIB);
    }

    #[tokio::test]
    async fn test_interrupted_first_save_leaves_no_pack() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pack.rag");

        // A complete temp file that never got renamed into place.
        let scratch = TempDir::new().unwrap();
        let staged = scratch.path().join("staged.rag");
        sample_pack(trigram()).await.save(&staged, None).await.unwrap();
        fs::copy(&staged, dir.path().join(".ragpack-interrupted.tmp")).unwrap();

        assert!(matches!(
            Pack::load(&path, LoadOptions::default()),
            Err(PackError::NotFound(_))
        ));
        assert!(matches!(Pack::inspect(&path), Err(PackError::NotFound(_))));

        let pack = sample_pack(trigram()).await;
        pack.save(&path, None).await.unwrap();
        let (loaded, _) = Pack::load(&path, LoadOptions::default()).unwrap();
        assert_eq!(loaded.manifest().pack_id, pack.manifest().pack_id);
    }

    #[tokio::test]
    async fn test_stale_temp_file_does_not_shadow_existing_pack() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pack.rag");

        let first = sample_pack(trigram()).await;
        first.save(&path, None).await.unwrap();
        fs::write(dir.path().join(".ragpack-stale.tmp"), b"partial").unwrap();

        let (loaded, _) = Pack::load(&path, LoadOptions::default()).unwrap();
        assert_eq!(loaded.manifest().pack_id, first.manifest().pack_id);
        assert_eq!(loaded.query("alpha", 1).await.unwrap()[0].document_id, "A");
    }

    #[tokio::test]
    async fn test_identical_documents_get_distinct_ids() {
        let documents = vec![
            SourceDocument::text("README.md", "shared readme text"),
            SourceDocument::text("README.md", "shared readme text"),
        ];
        let pack = Pack::build(documents, trigram(), extractive(), BuildOptions::default())
            .await
            .unwrap();

        let ids: Vec<&str> = pack.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1], format!("{}-2", ids[0]));

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("twins.rag");
        pack.save(&path, None).await.unwrap();
        let (loaded, _) = Pack::load(&path, LoadOptions::default()).unwrap();
        assert_eq!(loaded.documents().len(), 2);
    }
}
