//! Text encryption and decryption.

use super::request::CipherKeys;
use crate::cipher::{CipherError, TripleCipher};
use crate::session::protocol::Response;
use crate::Result;
use serde_json::Map;

fn cipher_for(keys: &CipherKeys) -> TripleCipher {
    let [k1, k2, k3] = &keys.0;
    TripleCipher::new(k1, k2, k3)
}

/// ASCII controls other than whitespace only show up when the keys are wrong.
fn looks_garbled(text: &str) -> bool {
    text.chars()
        .any(|c| c.is_ascii_control() && !c.is_whitespace() && c != '\0')
}

pub(super) fn encrypt(text: &str, keys: &CipherKeys) -> Result<Response> {
    let encrypted = cipher_for(keys).encrypt_text(text);
    Ok(Response::success(Map::new()).with_data("encrypted_text", encrypted))
}

pub(super) fn decrypt(ciphertext: &[u8], keys: &CipherKeys) -> Result<Response> {
    let text = cipher_for(keys).decrypt_marked(ciphertext)?;
    if looks_garbled(&text) {
        return Err(CipherError::MarkerMismatch.into());
    }
    Ok(Response::success(Map::new()).with_data("decrypted_text", text))
}
