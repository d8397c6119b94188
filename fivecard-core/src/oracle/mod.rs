//! Encrypted selections: opaque ciphertext handles, their validity proofs and
//! ACL-gated decryption.

pub mod encryption;
pub mod local;

pub use local::LocalOracle;

use crate::crypto::{sha256_concat, MessageSignature};
use crate::error::{CoreError, Result};
use crate::types::Address;
use async_trait::async_trait;
use bitcoin::Network;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const HANDLE_LEN: usize = 32;

const INPUT_PROOF_DOMAIN: &[u8] = b"fivecard/input-proof/v1";
const DECRYPT_DOMAIN: &[u8] = b"fivecard/decrypt/v1";

/// Opaque reference to an encrypted card value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CiphertextHandle([u8; HANDLE_LEN]);

impl CiphertextHandle {
    pub fn from_bytes(bytes: [u8; HANDLE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HANDLE_LEN] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| CoreError::oracle(format!("Invalid handle hex: {}", e)))?;
        let raw: [u8; HANDLE_LEN] = bytes.as_slice().try_into().map_err(|_| {
            CoreError::oracle(format!(
                "Handle must be {} bytes, got {}",
                HANDLE_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Digest the oracle signs to vouch that `submitter` produced this handle.
    pub fn input_proof_digest(&self, submitter: &Address) -> [u8; 32] {
        sha256_concat(&[INPUT_PROOF_DOMAIN, &self.0, submitter.as_str().as_bytes()])
    }

    /// Digest a requester signs to ask for decryption.
    pub fn decrypt_digest(&self) -> [u8; 32] {
        sha256_concat(&[DECRYPT_DOMAIN, &self.0])
    }
}

impl fmt::Debug for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CiphertextHandle({})", self.to_hex())
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for CiphertextHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CiphertextHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// What a client gets back from the encryption side: the handle plus a proof
/// that it was produced for a specific submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedInput {
    pub handle: CiphertextHandle,
    #[serde(with = "hex_bytes")]
    pub proof: Vec<u8>,
}

/// Requester-signed permission to decrypt one handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptCapability(MessageSignature);

impl DecryptCapability {
    pub fn new(signature: MessageSignature) -> Self {
        Self(signature)
    }

    /// Who signed this capability for `handle`.
    pub fn requester(&self, handle: &CiphertextHandle, network: Network) -> Result<Address> {
        self.0.recover_address(&handle.decrypt_digest(), network)
    }
}

/// Synchronous proof check used when a selection is submitted.
pub trait CiphertextVerifier: Send + Sync {
    fn verify_ciphertext(&self, handle: &CiphertextHandle, proof: &[u8], submitter: &Address)
        -> bool;
}

/// Client-side decryption. Answers only requesters on the handle's ACL.
#[async_trait]
pub trait DecryptionOracle: Send + Sync {
    async fn decrypt(&self, handle: &CiphertextHandle, capability: &DecryptCapability)
        -> Result<u8>;
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_hex() {
        let handle = CiphertextHandle::from_bytes([0xab; HANDLE_LEN]);
        assert_eq!(CiphertextHandle::from_hex(&handle.to_hex()).unwrap(), handle);
        assert_eq!(
            CiphertextHandle::from_hex(&format!("0x{}", handle.to_hex())).unwrap(),
            handle
        );
        assert!(CiphertextHandle::from_hex("abcd").is_err());
    }

    #[test]
    fn test_proof_digest_binds_submitter() {
        let handle = CiphertextHandle::from_bytes([1; HANDLE_LEN]);
        let alice = Address::from_stored("bcrt1qalice".to_string());
        let bob = Address::from_stored("bcrt1qbob".to_string());

        assert_ne!(
            handle.input_proof_digest(&alice),
            handle.input_proof_digest(&bob)
        );
        assert_ne!(handle.input_proof_digest(&alice), handle.decrypt_digest());
    }

    #[test]
    fn test_encrypted_input_json() {
        let input = EncryptedInput {
            handle: CiphertextHandle::from_bytes([2; HANDLE_LEN]),
            proof: vec![1, 2, 3],
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["proof"], "010203");

        let back: EncryptedInput = serde_json::from_value(json).unwrap();
        assert_eq!(back, input);
    }
}
