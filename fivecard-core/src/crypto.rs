//! Digests and recoverable "signed message" signatures.
//!
//! Every signature that has to be attributed to an identity without a
//! separately transmitted public key (selection attestations, decryption
//! capabilities, oracle input proofs) uses the same format: the signer signs
//! `SHA-256(SIGNED_MESSAGE_PREFIX || digest)` with recoverable ECDSA, and the
//! 65-byte encoding is `[27 + recovery id || r || s]`.

use crate::error::{CoreError, Result};
use crate::types::Address;
use bitcoin::secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use bitcoin::secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use bitcoin::Network;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19FiveCard Signed Message:\n32";

pub const SIGNATURE_LEN: usize = 65;

/// SHA-256 over the concatenation of `parts`.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// The hash that is actually signed for a 32-byte message digest.
pub fn signed_message_hash(digest: &[u8; 32]) -> [u8; 32] {
    sha256_concat(&[SIGNED_MESSAGE_PREFIX, digest])
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MessageSignature([u8; SIGNATURE_LEN]);

impl MessageSignature {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; SIGNATURE_LEN] = bytes.try_into().map_err(|_| {
            CoreError::signature(format!(
                "expected {} signature bytes, got {}",
                SIGNATURE_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| CoreError::signature(format!("invalid hex: {}", e)))?;
        Self::from_slice(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Sign `digest` in signed-message form.
    pub fn sign(secret_key: &SecretKey, digest: &[u8; 32]) -> Self {
        let secp = Secp256k1::signing_only();
        let message = Message::from_digest(signed_message_hash(digest));
        let signature = secp.sign_ecdsa_recoverable(&message, secret_key);
        let (recovery_id, compact) = signature.serialize_compact();

        let mut raw = [0u8; SIGNATURE_LEN];
        raw[0] = 27 + recovery_id.to_i32() as u8;
        raw[1..].copy_from_slice(&compact);
        Self(raw)
    }

    /// Recover the public key that produced this signature over `digest`.
    ///
    /// Any well-formed signature recovers *some* key for any digest; callers
    /// must compare the result with the identity they expect.
    pub fn recover(&self, digest: &[u8; 32]) -> Result<PublicKey> {
        let header = self.0[0];
        if !(27..=30).contains(&header) {
            return Err(CoreError::signature(format!(
                "invalid recovery header {}",
                header
            )));
        }
        let recovery_id = RecoveryId::from_i32(i32::from(header - 27))
            .map_err(|e| CoreError::signature(e.to_string()))?;
        let signature = RecoverableSignature::from_compact(&self.0[1..], recovery_id)
            .map_err(|e| CoreError::signature(e.to_string()))?;

        let secp = Secp256k1::verification_only();
        let message = Message::from_digest(signed_message_hash(digest));
        secp.recover_ecdsa(&message, &signature)
            .map_err(|e| CoreError::signature(e.to_string()))
    }

    /// Recover the signer as an address on `network`.
    pub fn recover_address(&self, digest: &[u8; 32], network: Network) -> Result<Address> {
        let public_key = self.recover(digest)?;
        Ok(Address::from_public_key(&public_key, network))
    }
}

impl fmt::Debug for MessageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageSignature({})", self.to_hex())
    }
}

impl Serialize for MessageSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for MessageSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
