use crate::crypto::{sha256_concat, MessageSignature};
use crate::error::{CoreError, Result};
use crate::oracle::encryption::{open, seal};
use crate::oracle::{
    CiphertextHandle, CiphertextVerifier, DecryptCapability, DecryptionOracle, EncryptedInput,
};
use crate::storage::{AclStore, Storage};
use crate::types::Address;
use async_trait::async_trait;
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use bitcoin::Network;
use chacha20poly1305::Key;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;

const SECRET_KEY: &str = "oracle_secret";
const AEAD_DOMAIN: &[u8] = b"fivecard/oracle/aead";
const SIGNING_DOMAIN: &[u8] = b"fivecard/oracle/sign";

/// Single-process oracle backed by the ledger database.
///
/// One stored secret yields both the symmetric key for handles and the
/// signing key for input proofs.
pub struct LocalOracle {
    storage: Arc<Storage>,
    network: Network,
    cipher_key: Key,
    signing_key: SecretKey,
    public_key: PublicKey,
}

impl LocalOracle {
    /// Open the oracle, generating its secret on first use.
    pub async fn open(storage: Arc<Storage>, network: Network) -> Result<Self> {
        let secret: [u8; 32] = match storage.get_meta(SECRET_KEY).await? {
            Some(hex_secret) => {
                let bytes = hex::decode(&hex_secret)
                    .map_err(|e| CoreError::oracle(format!("Corrupt oracle secret: {}", e)))?;
                bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| CoreError::oracle("Oracle secret must be 32 bytes"))?
            }
            None => {
                let mut secret = [0u8; 32];
                OsRng.fill_bytes(&mut secret);
                storage.set_meta(SECRET_KEY, &hex::encode(secret)).await?;
                tracing::info!("Generated new oracle secret");
                secret
            }
        };

        Self::from_secret(storage, network, secret)
    }

    pub fn from_secret(storage: Arc<Storage>, network: Network, secret: [u8; 32]) -> Result<Self> {
        let cipher_key = *Key::from_slice(&sha256_concat(&[AEAD_DOMAIN, &secret]));
        let signing_key =
            SecretKey::from_slice(&sha256_concat(&[SIGNING_DOMAIN, &secret]))
                .map_err(|e| CoreError::oracle(format!("Bad oracle signing key: {}", e)))?;
        let public_key = PublicKey::from_secret_key(&Secp256k1::signing_only(), &signing_key);

        Ok(Self {
            storage,
            network,
            cipher_key,
            signing_key,
            public_key,
        })
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Encrypt `value` for `submitter` and sign the resulting handle.
    pub fn encrypt_input(&self, value: u8, submitter: &Address) -> Result<EncryptedInput> {
        let handle = CiphertextHandle::from_bytes(seal(&self.cipher_key, value)?);
        let proof = MessageSignature::sign(&self.signing_key, &handle.input_proof_digest(submitter));

        tracing::debug!("Encrypted input {} for {}", handle, submitter.short());
        Ok(EncryptedInput {
            handle,
            proof: proof.to_bytes().to_vec(),
        })
    }

    pub async fn allowed(&self, handle: &CiphertextHandle) -> Result<Vec<Address>> {
        AclStore::new(&self.storage)
            .allowed_addresses(&handle.to_hex())
            .await
    }
}

impl CiphertextVerifier for LocalOracle {
    fn verify_ciphertext(
        &self,
        handle: &CiphertextHandle,
        proof: &[u8],
        submitter: &Address,
    ) -> bool {
        let Ok(signature) = MessageSignature::from_slice(proof) else {
            return false;
        };
        match signature.recover(&handle.input_proof_digest(submitter)) {
            Ok(signer) => signer == self.public_key,
            Err(_) => false,
        }
    }
}

#[async_trait]
impl DecryptionOracle for LocalOracle {
    async fn decrypt(
        &self,
        handle: &CiphertextHandle,
        capability: &DecryptCapability,
    ) -> Result<u8> {
        let requester = capability.requester(handle, self.network)?;

        let allowed = AclStore::new(&self.storage)
            .is_allowed(&handle.to_hex(), &requester)
            .await?;
        if !allowed {
            tracing::warn!("Refused decryption of {} for {}", handle, requester);
            return Err(CoreError::access_denied(format!(
                "{} may not decrypt {}",
                requester, handle
            )));
        }

        open(&self.cipher_key, handle.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::PlayerKey;
    use bitcoin::key::Keypair;
    use tempfile::tempdir;

    fn key(byte: u8) -> PlayerKey {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[byte; 32]).unwrap();
        PlayerKey::ephemeral("p", Keypair::from_secret_key(&secp, &secret), Network::Regtest)
    }

    #[tokio::test]
    async fn test_proof_verifies_only_for_submitter() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(Storage::new(&dir.path().join("ledger.db")).await.unwrap());
        let oracle = LocalOracle::open(storage, Network::Regtest).await.unwrap();
        let alice = key(1).address();
        let bob = key(2).address();

        let input = oracle.encrypt_input(9, &alice).unwrap();
        assert!(oracle.verify_ciphertext(&input.handle, &input.proof, &alice));
        assert!(!oracle.verify_ciphertext(&input.handle, &input.proof, &bob));
        assert!(!oracle.verify_ciphertext(&input.handle, &[0u8; 10], &alice));

        let other = oracle.encrypt_input(9, &alice).unwrap();
        assert!(!oracle.verify_ciphertext(&other.handle, &input.proof, &alice));
    }

    #[tokio::test]
    async fn test_decrypt_requires_grant() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(Storage::new(&dir.path().join("ledger.db")).await.unwrap());
        let oracle = LocalOracle::open(storage.clone(), Network::Regtest)
            .await
            .unwrap();
        let alice = key(1);
        let bob = key(2);

        let input = oracle.encrypt_input(4, &alice.address()).unwrap();
        let capability = alice.decrypt_capability(&input.handle);

        let err = oracle.decrypt(&input.handle, &capability).await.unwrap_err();
        assert!(matches!(err, CoreError::AccessDenied(_)));

        storage
            .transaction(|tx| AclStore::grant(tx, &input.handle.to_hex(), &alice.address()))
            .await
            .unwrap();
        assert_eq!(oracle.decrypt(&input.handle, &capability).await.unwrap(), 4);

        let bob_capability = bob.decrypt_capability(&input.handle);
        assert!(oracle.decrypt(&input.handle, &bob_capability).await.is_err());
        assert_eq!(
            oracle.allowed(&input.handle).await.unwrap(),
            vec![alice.address()]
        );
    }

    #[tokio::test]
    async fn test_secret_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let alice = key(1).address();

        let input = {
            let storage = Arc::new(Storage::new(&path).await.unwrap());
            let oracle = LocalOracle::open(storage, Network::Regtest).await.unwrap();
            oracle.encrypt_input(13, &alice).unwrap()
        };

        let storage = Arc::new(Storage::new(&path).await.unwrap());
        let oracle = LocalOracle::open(storage, Network::Regtest).await.unwrap();
        assert!(oracle.verify_ciphertext(&input.handle, &input.proof, &alice));
    }
}
