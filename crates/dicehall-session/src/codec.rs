//! The session codec: encrypts an identity record into a portable token.
//!
//! Token format: `hex(iv) ":" hex(ciphertext)`, AES-128-CBC, key = first
//! 16 bytes of SHA-1 over the salt. A fresh random IV is drawn per call,
//! so encrypting the same identity twice yields unlinkable tokens. The
//! whole thing stays comfortably under the ~4000-byte cookie ceiling for
//! any identity that passed field normalization.
//!
//! # Key material
//!
//! The codec is constructed with an optional process-wide secret (usually
//! the `SESSION_KEY` environment variable). A per-call salt overrides it;
//! with neither, the key is derived from the empty string. That last path
//! is deliberately permissive — a dev-mode fallback, not a failure.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::Rng;
use sha1::{Digest, Sha1};

use dicehall_protocol::Identity;

use crate::SessionError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Encrypts and decrypts session tokens.
///
/// Holds only key material — no session table. Constructed once per
/// server instance and shared by reference.
pub struct SessionCodec {
    secret: Option<String>,
}

impl SessionCodec {
    /// Creates a codec with the given process-wide secret.
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    /// Creates a codec keyed from the `SESSION_KEY` environment variable.
    ///
    /// Logs a warning when the variable is unset, since every token
    /// issued without it is protected only by the empty-string key.
    pub fn from_env() -> Self {
        let secret = std::env::var("SESSION_KEY").ok();
        if secret.is_none() {
            tracing::warn!(
                "SESSION_KEY not set — session tokens use the weak \
                 empty-string key"
            );
        }
        Self::new(secret)
    }

    /// Derives the 16-byte AES key: SHA-1 of the salt (or the configured
    /// secret, or the empty string), truncated.
    fn derive_key(&self, salt: Option<&str>) -> [u8; 16] {
        let mut hasher = Sha1::new();
        match salt {
            Some(salt) => hasher.update(salt.as_bytes()),
            None => match &self.secret {
                Some(secret) => hasher.update(secret.as_bytes()),
                None => hasher.update(b""),
            },
        }
        let digest = hasher.finalize();
        let mut key = [0u8; 16];
        key.copy_from_slice(&digest[..16]);
        key
    }

    /// Encrypts a plaintext into a token. A fresh IV is drawn per call,
    /// so two encryptions of the same input never produce the same token.
    pub fn encrypt(&self, plaintext: &str, salt: Option<&str>) -> String {
        let key = self.derive_key(salt);
        let iv: [u8; 16] = rand::rng().random();
        let ciphertext = Aes128CbcEnc::new(&key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        format!("{}:{}", hex::encode(iv), hex::encode(ciphertext))
    }

    /// Decrypts a token produced by [`encrypt`](Self::encrypt) with the
    /// same salt.
    ///
    /// # Errors
    /// Returns [`SessionError::CorruptedSession`] when the token is
    /// malformed, either half fails hex decoding, the IV has the wrong
    /// size, padding doesn't verify after decryption, or the plaintext
    /// is not UTF-8.
    pub fn decrypt(
        &self,
        token: &str,
        salt: Option<&str>,
    ) -> Result<String, SessionError> {
        let (iv_hex, ct_hex) = token
            .split_once(':')
            .ok_or(SessionError::CorruptedSession)?;
        let iv: [u8; 16] = hex::decode(iv_hex)
            .map_err(|_| SessionError::CorruptedSession)?
            .try_into()
            .map_err(|_| SessionError::CorruptedSession)?;
        let ciphertext = hex::decode(ct_hex)
            .map_err(|_| SessionError::CorruptedSession)?;

        let key = self.derive_key(salt);
        let plaintext = Aes128CbcDec::new(&key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| SessionError::CorruptedSession)?;
        String::from_utf8(plaintext)
            .map_err(|_| SessionError::CorruptedSession)
    }

    /// Serializes an identity to canonical JSON and encrypts it with the
    /// default (configured) key.
    ///
    /// # Errors
    /// Returns [`SessionError::Unreadable`] if the identity fails to
    /// serialize.
    pub fn serialize_identity(
        &self,
        identity: &Identity,
    ) -> Result<String, SessionError> {
        let json = serde_json::to_string(identity)
            .map_err(|_| SessionError::Unreadable)?;
        Ok(self.encrypt(&json, None))
    }

    /// Decrypts a token and parses the payload back into an identity.
    ///
    /// # Errors
    /// Returns [`SessionError::Unreadable`] when decryption fails or the
    /// decrypted payload does not parse into a structurally valid
    /// identity.
    pub fn deserialize_identity(
        &self,
        token: &str,
    ) -> Result<Identity, SessionError> {
        let plaintext = self
            .decrypt(token, None)
            .map_err(|_| SessionError::Unreadable)?;
        serde_json::from_str(&plaintext)
            .map_err(|_| SessionError::Unreadable)
    }
}

// =========================================================================
// Tests
// =========================================================================
