pub mod instance;
pub mod manager;

pub use instance::PlayerKey;
pub use manager::KeyManager;

use crate::error::{CoreError, Result};
use bip39::{Language, Mnemonic};
use bitcoin::key::Keypair;
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use std::str::FromStr;

const DERIVATION_PATH: &str = "m/84'/0'/0'/0/0";

pub fn generate_mnemonic() -> Result<String> {
    let mut rng = bip39::rand::thread_rng();
    let mnemonic = Mnemonic::generate_in_with(&mut rng, Language::English, 24)
        .map_err(|e| CoreError::internal(format!("Failed to generate mnemonic: {}", e)))?;
    Ok(mnemonic.to_string())
}

pub fn mnemonic_to_keypair(mnemonic: &str, network: bitcoin::Network) -> Result<Keypair> {
    let mnemonic = Mnemonic::parse_in(Language::English, mnemonic)
        .map_err(|e| CoreError::key(format!("Invalid mnemonic: {}", e)))?;

    let seed = mnemonic.to_seed("");
    let secp = Secp256k1::new();

    let master_key = bitcoin::bip32::Xpriv::new_master(network, &seed)
        .map_err(|e| CoreError::internal(format!("Failed to derive master key: {}", e)))?;

    let path = bitcoin::bip32::DerivationPath::from_str(DERIVATION_PATH)
        .map_err(|e| CoreError::config(format!("Invalid derivation path: {}", e)))?;

    let child_key = master_key
        .derive_priv(&secp, &path)
        .map_err(|e| CoreError::internal(format!("Failed to derive child key: {}", e)))?;

    let secret_key = SecretKey::from_slice(&child_key.private_key.secret_bytes())
        .map_err(|e| CoreError::internal(format!("Invalid secret key: {}", e)))?;

    Ok(Keypair::from_secret_key(&secp, &secret_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::Network;

    #[test]
    fn test_generated_mnemonic_has_24_words() {
        let mnemonic = generate_mnemonic().unwrap();
        assert_eq!(mnemonic.split_whitespace().count(), 24);
    }

    #[test]
    fn test_same_mnemonic_same_key() {
        let mnemonic = generate_mnemonic().unwrap();
        let a = mnemonic_to_keypair(&mnemonic, Network::Regtest).unwrap();
        let b = mnemonic_to_keypair(&mnemonic, Network::Regtest).unwrap();
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_invalid_mnemonic_rejected() {
        let err = mnemonic_to_keypair("not a real mnemonic", Network::Regtest).unwrap_err();
        assert!(matches!(err, CoreError::Key(_)));
    }
}
