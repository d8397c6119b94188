pub mod binding;

pub use binding::{check_ciphertext, resolve_attestation};

use crate::types::GameId;
use fivecard_core::crypto::sha256_concat;
use fivecard_core::{CiphertextHandle, EncryptedInput, MessageSignature, PlayerKey};
use serde::{Deserialize, Serialize};

const SELECTION_DOMAIN: &[u8] = b"fivecard/selection/v1";

/// `SHA-256(domain || game id (u64 BE) || choice)`.
///
/// The player is not part of the digest; the recovered signer binds it.
pub fn selection_digest(game: GameId, choice: u8) -> [u8; 32] {
    sha256_concat(&[SELECTION_DOMAIN, &game.to_be_bytes(), &[choice]])
}

/// Everything a player sends to commit to a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub handle: CiphertextHandle,
    #[serde(with = "hex_proof")]
    pub proof: Vec<u8>,
    pub signature: MessageSignature,
}

impl Submission {
    /// Pair an encrypted input with the player's attestation over
    /// `(game, choice)`.
    pub fn new(key: &PlayerKey, input: EncryptedInput, game: GameId, choice: u8) -> Self {
        Self {
            handle: input.handle,
            proof: input.proof,
            signature: key.sign_digest(&selection_digest(game, choice)),
        }
    }
}

mod hex_proof {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
