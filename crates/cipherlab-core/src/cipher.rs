//! Keyed triple-pass XOR cipher.
//!
//! Despite the "EDE" naming this is not DES: every pass XORs 8-byte blocks
//! against the first 8 bytes of `SHA-256(key)`, with no stream advancement
//! between blocks. The construction is kept bit-for-bit so ciphertexts stay
//! wire compatible with existing clients.
//!
//! Encryption runs `padded(k1) -> strict(k2) -> padded(k3)` and decryption
//! runs `strict(k3) -> padded(k2) -> strict(k1)`. Padded passes zero-fill the
//! last block; strict passes stop at a trailing short block.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Block width of a single pass, in bytes.
pub const BLOCK_SIZE: usize = 8;

/// Normalized key length, in bytes.
pub const KEY_SIZE: usize = 8;

/// Prefix that marks a plaintext produced by [`TripleCipher::encrypt_text`].
pub const TEXT_MARKER: &[u8; 5] = b"UTF8:";

/// Errors from the text layer of the cipher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("encrypted text must be valid base64")]
    InvalidBase64,

    /// The decrypted bytes do not start with [`TEXT_MARKER`].
    #[error("decryption failed, check that the keys are correct")]
    MarkerMismatch,

    #[error("decrypted data is not valid UTF-8, check that the keys are correct")]
    InvalidUtf8,
}

type Key = [u8; KEY_SIZE];

/// Truncate or zero-pad key material to [`KEY_SIZE`] bytes.
pub fn normalize_key(raw: &[u8]) -> Key {
    let mut key = [0u8; KEY_SIZE];
    let n = raw.len().min(KEY_SIZE);
    key[..n].copy_from_slice(&raw[..n]);
    key
}

/// The per-key XOR window: the first block of `SHA-256(key)`.
pub fn derive_stream(key: &[u8]) -> [u8; BLOCK_SIZE] {
    let digest = Sha256::digest(key);
    let mut stream = [0u8; BLOCK_SIZE];
    stream.copy_from_slice(&digest[..BLOCK_SIZE]);
    stream
}

/// XOR every block with the key stream, zero-padding the final block.
fn pass_padded(data: &[u8], key: &Key) -> Vec<u8> {
    let stream = derive_stream(key);
    let mut out = Vec::with_capacity(data.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE);
    for chunk in data.chunks(BLOCK_SIZE) {
        let mut block = [0u8; BLOCK_SIZE];
        block[..chunk.len()].copy_from_slice(chunk);
        out.extend(block.iter().zip(stream.iter()).map(|(b, s)| b ^ s));
    }
    out
}

/// XOR every full block with the key stream; a short tail ends the pass.
fn pass_strict(data: &[u8], key: &Key) -> Vec<u8> {
    let stream = derive_stream(key);
    let mut out = Vec::with_capacity(data.len());
    for chunk in data.chunks(BLOCK_SIZE) {
        if chunk.len() < BLOCK_SIZE {
            break;
        }
        out.extend(chunk.iter().zip(stream.iter()).map(|(b, s)| b ^ s));
    }
    out
}

/// Three normalized keys applied in EDE order.
#[derive(Clone, PartialEq, Eq)]
pub struct TripleCipher {
    keys: [Key; 3],
}

impl std::fmt::Debug for TripleCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripleCipher").finish_non_exhaustive()
    }
}

impl TripleCipher {
    /// Build a cipher from raw key material of any length.
    pub fn new(key1: &[u8], key2: &[u8], key3: &[u8]) -> Self {
        Self {
            keys: [normalize_key(key1), normalize_key(key2), normalize_key(key3)],
        }
    }

    pub fn encrypt(&self, data: &[u8]) -> Vec<u8> {
        let [k1, k2, k3] = &self.keys;
        let step1 = pass_padded(data, k1);
        let step2 = pass_strict(&step1, k2);
        pass_padded(&step2, k3)
    }

    pub fn decrypt(&self, data: &[u8]) -> Vec<u8> {
        let [k1, k2, k3] = &self.keys;
        let step1 = pass_strict(data, k3);
        let step2 = pass_padded(&step1, k2);
        pass_strict(&step2, k1)
    }

    /// Mark, encrypt and base64-encode a text.
    pub fn encrypt_text(&self, text: &str) -> String {
        let mut marked = Vec::with_capacity(TEXT_MARKER.len() + text.len());
        marked.extend_from_slice(TEXT_MARKER);
        marked.extend_from_slice(text.as_bytes());
        STANDARD.encode(self.encrypt(&marked))
    }

    /// Reverse of [`encrypt_text`](Self::encrypt_text).
    ///
    /// A missing marker means the keys are wrong; the garbage is never
    /// returned as text. Trailing zero padding is dropped before decoding.
    pub fn decrypt_text(&self, encoded: &str) -> Result<String, CipherError> {
        let data = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CipherError::InvalidBase64)?;
        self.decrypt_marked(&data)
    }

    /// Decrypt raw ciphertext produced by [`encrypt_text`](Self::encrypt_text)
    /// after its base64 layer has been removed.
    pub fn decrypt_marked(&self, data: &[u8]) -> Result<String, CipherError> {
        let decrypted = self.decrypt(data);

        let payload = decrypted
            .strip_prefix(TEXT_MARKER.as_slice())
            .ok_or(CipherError::MarkerMismatch)?;
        let end = payload
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);

        String::from_utf8(payload[..end].to_vec()).map_err(|_| CipherError::InvalidUtf8)
    }
}

/// Produce 8 random bytes suitable as one key.
pub fn generate_key() -> Key {
    let mut key = [0u8; KEY_SIZE];
    rand::rng().fill(&mut key);
    key
}
