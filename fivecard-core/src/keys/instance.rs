use crate::crypto::MessageSignature;
use crate::oracle::{CiphertextHandle, DecryptCapability};
use crate::types::Address;

use bitcoin::key::Keypair;
use bitcoin::secp256k1::{PublicKey, SecretKey};
use bitcoin::Network;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A player's signing identity.
pub struct PlayerKey {
    id: String,
    name: String,
    keypair: Keypair,
    network: Network,
    created_at: DateTime<Utc>,
}

impl PlayerKey {
    pub fn new(
        id: String,
        name: String,
        keypair: Keypair,
        network: Network,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            keypair,
            network,
            created_at,
        }
    }

    /// A key that lives only in memory, for tests and throwaway sessions.
    pub fn ephemeral(name: &str, keypair: Keypair, network: Network) -> Self {
        Self::new(
            Uuid::new_v4().to_string(),
            name.to_string(),
            keypair,
            network,
            Utc::now(),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(&self.keypair.public_key(), self.network)
    }

    /// Signed-message signature over a 32-byte digest.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> MessageSignature {
        MessageSignature::sign(&self.secret_key(), digest)
    }

    /// Token proving to the decryption oracle that this key asked for `handle`.
    pub fn decrypt_capability(&self, handle: &CiphertextHandle) -> DecryptCapability {
        DecryptCapability::new(self.sign_digest(&handle.decrypt_digest()))
    }

    pub(crate) fn secret_key(&self) -> SecretKey {
        self.keypair.secret_key()
    }
}

impl std::fmt::Debug for PlayerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerKey")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("address", &self.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256_concat;
    use bitcoin::secp256k1::Secp256k1;

    fn key(byte: u8) -> PlayerKey {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[byte; 32]).unwrap();
        PlayerKey::ephemeral("alice", Keypair::from_secret_key(&secp, &secret), Network::Regtest)
    }

    #[test]
    fn test_signature_recovers_own_address() {
        let alice = key(11);
        let digest = sha256_concat(&[b"card"]);

        let signature = alice.sign_digest(&digest);
        let signer = signature.recover_address(&digest, Network::Regtest).unwrap();

        assert_eq!(signer, alice.address());
    }

    #[test]
    fn test_debug_hides_secret() {
        let alice = key(12);
        let debug = format!("{:?}", alice);
        assert!(debug.contains("alice"));
        assert!(!debug.contains(&hex::encode(alice.secret_key().secret_bytes())));
    }
}
