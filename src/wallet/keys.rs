//! Keypair generation and private-key import.
//!
//! Private keys travel as base-58 text of the full 64-byte ed25519 secret,
//! the same encoding Solana tooling displays. `decode_private_key` is the
//! single re-import path, so anything `generate` hands to a user can be
//! pasted back later.

use solana_sdk::signer::keypair::Keypair;
use solana_sdk::signer::Signer;
use thiserror::Error;

/// Length of a full ed25519 secret (seed + public half)
pub const SECRET_KEY_LEN: usize = 64;

/// Reasons a pasted private key cannot be imported
#[derive(Debug, Error)]
pub enum KeyDecodeError {
    /// Input is not valid base-58 text
    #[error("not valid base-58 text")]
    Base58(#[from] bs58::decode::Error),
    /// Decoded byte length is wrong
    #[error("decoded {0} bytes, expected {SECRET_KEY_LEN}")]
    Length(usize),
    /// Bytes do not form a usable ed25519 keypair
    #[error("not a valid ed25519 secret key")]
    InvalidKey,
}

/// A keypair in its displayable/storable text form
#[derive(Debug, Clone)]
pub struct GeneratedKeypair {
    /// Base-58 public address
    pub public_key: String,
    /// Base-58 encoded 64-byte secret
    pub private_key: String,
}

/// Generate a fresh keypair from the OS secure random source
#[must_use]
pub fn generate() -> GeneratedKeypair {
    let keypair = Keypair::new();
    GeneratedKeypair {
        public_key: keypair.pubkey().to_string(),
        private_key: bs58::encode(keypair.to_bytes()).into_string(),
    }
}

/// Decode pasted private-key text and derive its public address.
///
/// # Errors
///
/// Returns a `KeyDecodeError` when the text is not base-58, has the wrong
/// length, or does not form a valid keypair. The caller keeps the user in
/// the retry prompt in that case.
pub fn decode_private_key(text: &str) -> Result<GeneratedKeypair, KeyDecodeError> {
    let bytes = bs58::decode(text.trim()).into_vec()?;
    if bytes.len() != SECRET_KEY_LEN {
        return Err(KeyDecodeError::Length(bytes.len()));
    }
    let keypair = Keypair::from_bytes(&bytes).map_err(|_| KeyDecodeError::InvalidKey)?;
    Ok(GeneratedKeypair {
        public_key: keypair.pubkey().to_string(),
        private_key: bs58::encode(keypair.to_bytes()).into_string(),
    })
}
