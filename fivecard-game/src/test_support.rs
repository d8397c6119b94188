//! Fixtures shared by the unit tests.

use bitcoin::key::Keypair;
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use fivecard_core::{
    Address, CiphertextHandle, CiphertextVerifier, EncryptedInput, Network, PlayerKey,
};

pub fn player(byte: u8) -> PlayerKey {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(&[byte; 32]).unwrap();
    PlayerKey::ephemeral(
        &format!("player-{}", byte),
        Keypair::from_secret_key(&secp, &secret),
        Network::Regtest,
    )
}

/// A handle nobody can decrypt, with an empty proof.
pub fn fake_input(byte: u8) -> EncryptedInput {
    EncryptedInput {
        handle: CiphertextHandle::from_bytes([byte; 32]),
        proof: Vec::new(),
    }
}

pub struct AcceptAll;

impl CiphertextVerifier for AcceptAll {
    fn verify_ciphertext(&self, _: &CiphertextHandle, _: &[u8], _: &Address) -> bool {
        true
    }
}

pub struct RejectAll;

impl CiphertextVerifier for RejectAll {
    fn verify_ciphertext(&self, _: &CiphertextHandle, _: &[u8], _: &Address) -> bool {
        false
    }
}
