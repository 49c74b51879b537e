//! Password-based encryption envelope for pack blobs.
//!
//! A pack key is derived once per save/load with Argon2id from the password
//! and a per-pack random salt. Each blob is sealed with XChaCha20-Poly1305
//! under a fresh random 192-bit nonce, with the blob's logical path bound in
//! as associated data. Sealed blobs are laid out as
//! `nonce(24) || ciphertext || tag(16)`.

use argon2::Argon2;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    Key, XChaCha20Poly1305, XNonce,
};
use rand::{rngs::OsRng, RngCore};
use ragpack_core::{PackError, PackResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use zeroize::Zeroizing;

pub const KDF_ALGORITHM: &str = "argon2id";
pub const CIPHER: &str = "xchacha20poly1305";
pub const NONCE_SCHEME: &str = "random-192";

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 24;
pub const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

const KEY_CHECK_AAD: &[u8] = b"ragpack:key-check";
const KEY_CHECK_PLAINTEXT: &[u8] = b"ragpack key check v1";
const STANDALONE_AAD: &[u8] = b"ragpack:blob";

/// Upper bounds on KDF costs accepted from a manifest. The manifest is
/// plaintext, so these cap what a crafted pack can make `open` spend.
pub const MAX_KDF_MEMORY_KIB: u32 = 1024 * 1024;
pub const MAX_KDF_ITERATIONS: u32 = 16;
pub const MAX_KDF_PARALLELISM: u32 = 16;

/// Argon2id cost parameters recorded alongside an encrypted pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub algorithm: String,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            algorithm: KDF_ALGORITHM.to_string(),
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            algorithm: KDF_ALGORITHM.to_string(),
            memory_kib,
            iterations,
            parallelism,
        }
    }

    /// Check the costs against Argon2's minimums and the accepted ceilings.
    pub fn check_bounds(&self) -> Result<(), String> {
        if self.parallelism == 0 || self.parallelism > MAX_KDF_PARALLELISM {
            return Err(format!(
                "KDF parallelism {} outside 1..={}",
                self.parallelism, MAX_KDF_PARALLELISM
            ));
        }
        if self.iterations == 0 || self.iterations > MAX_KDF_ITERATIONS {
            return Err(format!(
                "KDF iterations {} outside 1..={}",
                self.iterations, MAX_KDF_ITERATIONS
            ));
        }
        let min_memory = 8 * self.parallelism;
        if self.memory_kib < min_memory || self.memory_kib > MAX_KDF_MEMORY_KIB {
            return Err(format!(
                "KDF memory {}KiB outside {}..={}KiB",
                self.memory_kib, min_memory, MAX_KDF_MEMORY_KIB
            ));
        }
        Ok(())
    }

    fn argon2(&self) -> PackResult<Argon2<'static>> {
        if self.algorithm != KDF_ALGORITHM {
            return Err(PackError::CorruptArtifact(format!(
                "unsupported KDF '{}'",
                self.algorithm
            )));
        }
        let params = argon2::Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| PackError::InvalidInput(format!("invalid Argon2 parameters: {}", e)))?;

        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }
}

/// Encryption metadata stored in the (plaintext) manifest.
///
/// Holds everything needed to re-derive the key from the password. The
/// password itself is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    pub kdf: KdfParams,
    /// Base64 of the 16-byte KDF salt.
    pub salt: String,
    pub cipher: String,
    pub nonce_scheme: String,
    /// Sealed constant used to reject a wrong password up front.
    pub key_check: String,
}

/// A derived pack key, ready to seal or unseal blobs.
pub struct Envelope {
    key: Zeroizing<[u8; KEY_LEN]>,
    issued_nonces: HashSet<[u8; NONCE_LEN]>,
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("key", &"<redacted>")
            .field("issued_nonces", &self.issued_nonces.len())
            .finish()
    }
}

impl Envelope {
    /// Derive a key under a fresh random salt.
    pub fn create(password: &str, params: &KdfParams) -> PackResult<(Self, EncryptionMetadata)> {
        if password.is_empty() {
            return Err(PackError::InvalidInput(
                "encryption password must not be empty".to_string(),
            ));
        }

        params.check_bounds().map_err(PackError::InvalidInput)?;

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let key = derive_key(password, &salt, params)?;
        let mut envelope = Self {
            key,
            issued_nonces: HashSet::new(),
        };

        let key_check = envelope.seal_with_aad(KEY_CHECK_PLAINTEXT, KEY_CHECK_AAD)?;
        let metadata = EncryptionMetadata {
            kdf: params.clone(),
            salt: STANDARD.encode(salt),
            cipher: CIPHER.to_string(),
            nonce_scheme: NONCE_SCHEME.to_string(),
            key_check: STANDARD.encode(key_check),
        };

        tracing::debug!(
            "Derived pack key (argon2id m={}KiB t={} p={})",
            params.memory_kib,
            params.iterations,
            params.parallelism
        );

        Ok((envelope, metadata))
    }

    /// Re-derive the key recorded by `metadata` and verify the password.
    ///
    /// # Errors
    /// `AuthenticationFailed` for a wrong password, `CorruptArtifact` for
    /// malformed metadata or KDF costs outside the accepted bounds.
    pub fn open(password: &str, metadata: &EncryptionMetadata) -> PackResult<Self> {
        metadata
            .kdf
            .check_bounds()
            .map_err(PackError::CorruptArtifact)?;
        if metadata.cipher != CIPHER {
            return Err(PackError::CorruptArtifact(format!(
                "unsupported cipher '{}'",
                metadata.cipher
            )));
        }
        if metadata.nonce_scheme != NONCE_SCHEME {
            return Err(PackError::CorruptArtifact(format!(
                "unsupported nonce scheme '{}'",
                metadata.nonce_scheme
            )));
        }

        let salt = STANDARD
            .decode(&metadata.salt)
            .map_err(|e| PackError::CorruptArtifact(format!("salt is not base64: {}", e)))?;
        if salt.len() != SALT_LEN {
            return Err(PackError::CorruptArtifact(format!(
                "salt must be {} bytes, found {}",
                SALT_LEN,
                salt.len()
            )));
        }
        let key_check = STANDARD
            .decode(&metadata.key_check)
            .map_err(|e| PackError::CorruptArtifact(format!("key check is not base64: {}", e)))?;

        let envelope = Self {
            key: derive_key(password, &salt, &metadata.kdf)?,
            issued_nonces: HashSet::new(),
        };

        let check = envelope
            .unseal_with_aad(&key_check, KEY_CHECK_AAD)
            .map_err(|e| match e {
                PackError::AuthenticationFailed(_) => {
                    PackError::AuthenticationFailed("wrong password".to_string())
                }
                other => other,
            })?;
        if check.as_slice() != KEY_CHECK_PLAINTEXT {
            return Err(PackError::AuthenticationFailed("wrong password".to_string()));
        }

        Ok(envelope)
    }

    /// Seal a blob stored under `logical_path`.
    pub fn seal(&mut self, plaintext: &[u8], logical_path: &str) -> PackResult<Vec<u8>> {
        self.seal_with_aad(plaintext, logical_path.as_bytes())
    }

    /// Unseal a blob read from `logical_path`.
    pub fn unseal(&self, sealed: &[u8], logical_path: &str) -> PackResult<Vec<u8>> {
        self.unseal_with_aad(sealed, logical_path.as_bytes())
            .map_err(|e| match e {
                PackError::AuthenticationFailed(_) => PackError::AuthenticationFailed(format!(
                    "'{}' failed authentication (wrong password or tampered data)",
                    logical_path
                )),
                other => other,
            })
    }

    /// Number of nonces issued by this envelope.
    pub fn nonces_issued(&self) -> usize {
        self.issued_nonces.len()
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new(Key::from_slice(self.key.as_slice()))
    }

    fn fresh_nonce(&mut self) -> [u8; NONCE_LEN] {
        loop {
            let mut nonce = [0u8; NONCE_LEN];
            OsRng.fill_bytes(&mut nonce);
            if self.issued_nonces.insert(nonce) {
                return nonce;
            }
        }
    }

    fn seal_with_aad(&mut self, plaintext: &[u8], aad: &[u8]) -> PackResult<Vec<u8>> {
        let nonce = self.fresh_nonce();
        let ciphertext = self
            .cipher()
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| PackError::Other("encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn unseal_with_aad(&self, sealed: &[u8], aad: &[u8]) -> PackResult<Vec<u8>> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(PackError::CorruptArtifact(format!(
                "sealed blob is {} bytes, shorter than nonce and tag",
                sealed.len()
            )));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher()
            .decrypt(
                XNonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| PackError::AuthenticationFailed("tag mismatch".to_string()))
    }
}

fn derive_key(
    password: &str,
    salt: &[u8],
    params: &KdfParams,
) -> PackResult<Zeroizing<[u8; KEY_LEN]>> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    params
        .argon2()?
        .hash_password_into(password.as_bytes(), salt, &mut key[..])
        .map_err(|e| PackError::Other(format!("key derivation failed: {}", e)))?;
    Ok(key)
}

/// Seal a standalone blob under a freshly derived key.
pub fn seal(
    plaintext: &[u8],
    password: &str,
    params: &KdfParams,
) -> PackResult<(Vec<u8>, EncryptionMetadata)> {
    let (mut envelope, metadata) = Envelope::create(password, params)?;
    let sealed = envelope.seal_with_aad(plaintext, STANDALONE_AAD)?;
    Ok((sealed, metadata))
}

/// Unseal a blob produced by [`seal`].
pub fn unseal(sealed: &[u8], metadata: &EncryptionMetadata, password: &str) -> PackResult<Vec<u8>> {
    Envelope::open(password, metadata)?.unseal_with_aad(sealed, STANDALONE_AAD)
}

#[cfg(test)]
pub(crate) fn test_kdf() -> KdfParams {
    KdfParams::new(1024, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_unseal() {
        let (sealed, metadata) = seal(b"alpha beta gamma", "hunter2", &test_kdf()).unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + 16 + TAG_LEN);
        assert_eq!(metadata.cipher, CIPHER);

        let plain = unseal(&sealed, &metadata, "hunter2").unwrap();
        assert_eq!(plain, b"alpha beta gamma");
    }

    #[test]
    fn test_wrong_password() {
        let (sealed, metadata) = seal(b"secret", "right", &test_kdf()).unwrap();
        match unseal(&sealed, &metadata, "wrong") {
            Err(PackError::AuthenticationFailed(msg)) => assert!(msg.contains("wrong password")),
            other => panic!("expected AuthenticationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_tampered_ciphertext() {
        let (mut sealed, metadata) = seal(b"secret payload", "pw", &test_kdf()).unwrap();
        sealed[NONCE_LEN + 2] ^= 0x01;
        assert!(matches!(
            unseal(&sealed, &metadata, "pw"),
            Err(PackError::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn test_short_blob_is_corrupt() {
        let (_, metadata) = seal(b"x", "pw", &test_kdf()).unwrap();
        assert!(matches!(
            unseal(&[0u8; 10], &metadata, "pw"),
            Err(PackError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn test_blob_bound_to_logical_path() {
        let (mut envelope, metadata) = Envelope::create("pw", &test_kdf()).unwrap();
        let sealed = envelope.seal(b"chunk record", "documents/a").unwrap();

        let reopened = Envelope::open("pw", &metadata).unwrap();
        assert_eq!(reopened.unseal(&sealed, "documents/a").unwrap(), b"chunk record");
        assert!(matches!(
            reopened.unseal(&sealed, "documents/b"),
            Err(PackError::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn test_nonces_never_repeat() {
        let (mut envelope, _) = Envelope::create("pw", &test_kdf()).unwrap();
        let mut nonces = HashSet::new();
        for i in 0..64 {
            let sealed = envelope.seal(b"same plaintext", &format!("documents/{}", i)).unwrap();
            assert!(nonces.insert(sealed[..NONCE_LEN].to_vec()));
        }
        // 64 blobs plus the key check.
        assert_eq!(envelope.nonces_issued(), 65);
    }

    #[test]
    fn test_bad_salt_is_corrupt() {
        let (_, mut metadata) = seal(b"x", "pw", &test_kdf()).unwrap();
        metadata.salt = STANDARD.encode([1u8; 4]);
        assert!(matches!(
            Envelope::open("pw", &metadata),
            Err(PackError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn test_oversized_kdf_costs_are_corrupt() {
        let (_, metadata) = seal(b"x", "pw", &test_kdf()).unwrap();

        let mut huge_memory = metadata.clone();
        huge_memory.kdf.memory_kib = 64 * 1024 * 1024;
        let mut huge_iterations = metadata.clone();
        huge_iterations.kdf.iterations = u32::MAX;
        let mut no_lanes = metadata.clone();
        no_lanes.kdf.parallelism = 0;
        let mut tiny_memory = metadata;
        tiny_memory.kdf.memory_kib = 4;

        for bad in [huge_memory, huge_iterations, no_lanes, tiny_memory] {
            assert!(matches!(
                Envelope::open("wrong", &bad),
                Err(PackError::CorruptArtifact(_))
            ));
        }
    }

    #[test]
    fn test_create_rejects_out_of_bounds_kdf() {
        let params = KdfParams::new(MAX_KDF_MEMORY_KIB + 1, 1, 1);
        assert!(matches!(
            Envelope::create("pw", &params),
            Err(PackError::InvalidInput(_))
        ));
        assert!(KdfParams::default().check_bounds().is_ok());
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(matches!(
            Envelope::create("", &test_kdf()),
            Err(PackError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let (envelope, _) = Envelope::create("pw", &test_kdf()).unwrap();
        let debug = format!("{:?}", envelope);
        assert!(debug.contains("<redacted>"));
    }
}
