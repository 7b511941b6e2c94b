//! Wallet keypair generation and encoding
//!
//! The address is the Base58 encoding of the ed25519 public key. The
//! storable secret is the JSON encoding of the raw 64 keypair bytes
//! (secret half followed by public half) - a textual form, never a
//! binary blob.

use crate::error::{Error, Result};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

/// A freshly generated or restored custodial keypair
#[derive(Debug)]
pub struct WalletKeypair {
    signing: SigningKey,
}

impl WalletKeypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Base58 address form of the public key
    pub fn public_key(&self) -> String {
        bs58::encode(self.signing.verifying_key().as_bytes()).into_string()
    }

    /// Storable secret: JSON array of the 64 raw keypair bytes
    pub fn secret_key_json(&self) -> Result<String> {
        let bytes = self.signing.to_keypair_bytes();
        serde_json::to_string(&bytes.to_vec())
            .map_err(|e| Error::Internal(format!("Failed to encode secret key: {}", e)))
    }

    /// Restore a keypair from its stored JSON form
    pub fn from_secret_key_json(json: &str) -> Result<Self> {
        let bytes: Vec<u8> = serde_json::from_str(json)
            .map_err(|e| Error::Internal(format!("Invalid stored secret key: {}", e)))?;

        let array: [u8; 64] = bytes
            .try_into()
            .map_err(|_| Error::Internal("Stored secret key is not 64 bytes".to_string()))?;

        let signing = SigningKey::from_keypair_bytes(&array)
            .map_err(|e| Error::Internal(format!("Stored secret key is inconsistent: {}", e)))?;

        Ok(Self { signing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_is_base58() {
        let keypair = WalletKeypair::generate();
        let address = keypair.public_key();

        // 32 bytes of ed25519 public key encode to 43-44 Base58 characters
        assert!(address.len() >= 32 && address.len() <= 44);
        assert!(address
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && c != '0' && c != 'O' && c != 'I' && c != 'l'));
    }

    #[test]
    fn secret_key_is_json_byte_array() {
        let keypair = WalletKeypair::generate();
        let json = keypair.secret_key_json().unwrap();

        let bytes: Vec<u8> = serde_json::from_str(&json).unwrap();
        assert_eq!(bytes.len(), 64);
    }

    #[test]
    fn secret_key_round_trips() {
        let keypair = WalletKeypair::generate();
        let json = keypair.secret_key_json().unwrap();

        let restored = WalletKeypair::from_secret_key_json(&json).unwrap();
        assert_eq!(restored.public_key(), keypair.public_key());
    }

    #[test]
    fn truncated_secret_key_is_rejected() {
        let err = WalletKeypair::from_secret_key_json("[1,2,3]").unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn generated_keypairs_are_distinct() {
        let a = WalletKeypair::generate();
        let b = WalletKeypair::generate();
        assert_ne!(a.public_key(), b.public_key());
    }
}
