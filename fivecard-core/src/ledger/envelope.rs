use crate::crypto::sha256_concat;
use crate::error::{CoreError, Result};
use crate::keys::PlayerKey;
use crate::types::Address;
use bitcoin::secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1};
use bitcoin::Network;
use serde::{Deserialize, Serialize};

/// A call authenticated by its sender.
///
/// The signature is a plain (non-recoverable) ECDSA signature over
/// `SHA-256(json((nonce, call)))`; the sender ships its public key alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub sender: PublicKey,
    pub nonce: u64,
    pub call: T,
    pub signature: Signature,
}

impl<T: Serialize> Envelope<T> {
    pub fn sign(key: &PlayerKey, nonce: u64, call: T) -> Result<Self> {
        let digest = payload_digest(nonce, &call)?;
        let secp = Secp256k1::signing_only();
        let signature = secp.sign_ecdsa(&Message::from_digest(digest), &key.secret_key());

        Ok(Self {
            sender: key.public_key(),
            nonce,
            call,
            signature,
        })
    }

    /// Check the signature and return the sender's address.
    pub fn verify(&self, network: Network) -> Result<Address> {
        let digest = payload_digest(self.nonce, &self.call)?;
        let secp = Secp256k1::verification_only();
        secp.verify_ecdsa(&Message::from_digest(digest), &self.signature, &self.sender)
            .map_err(|e| CoreError::signature(format!("Envelope signature invalid: {}", e)))?;

        Ok(Address::from_public_key(&self.sender, network))
    }
}

fn payload_digest<T: Serialize>(nonce: u64, call: &T) -> Result<[u8; 32]> {
    let payload = serde_json::to_vec(&(nonce, call))?;
    Ok(sha256_concat(&[&payload]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::key::Keypair;
    use bitcoin::secp256k1::SecretKey;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Transfer {
        to: String,
        amount: u64,
    }

    fn key(byte: u8) -> PlayerKey {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[byte; 32]).unwrap();
        PlayerKey::ephemeral("k", Keypair::from_secret_key(&secp, &secret), Network::Regtest)
    }

    #[test]
    fn test_verify_returns_sender() {
        let alice = key(1);
        let call = Transfer {
            to: "bob".into(),
            amount: 1,
        };

        let envelope = Envelope::sign(&alice, 0, call).unwrap();
        assert_eq!(envelope.verify(Network::Regtest).unwrap(), alice.address());
    }

    #[test]
    fn test_tampering_breaks_signature() {
        let alice = key(1);
        let call = Transfer {
            to: "bob".into(),
            amount: 1,
        };
        let envelope = Envelope::sign(&alice, 0, call).unwrap();

        let mut bumped = envelope.clone();
        bumped.nonce = 1;
        assert!(bumped.verify(Network::Regtest).is_err());

        let mut richer = envelope.clone();
        richer.call.amount = 100;
        assert!(richer.verify(Network::Regtest).is_err());

        let mut stolen = envelope;
        stolen.sender = key(2).public_key();
        assert!(stolen.verify(Network::Regtest).is_err());
    }

    #[test]
    fn test_survives_json() {
        let alice = key(3);
        let envelope = Envelope::sign(
            &alice,
            4,
            Transfer {
                to: "carol".into(),
                amount: 2,
            },
        )
        .unwrap();

        let json = serde_json::to_string(&envelope).unwrap();
        let back: Envelope<Transfer> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.verify(Network::Regtest).unwrap(), alice.address());
    }
}
