use crate::error::{CoreError, Result};
use crate::oracle::HANDLE_LEN;
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    ChaCha20Poly1305, Key, Nonce,
};

pub const HANDLE_VERSION: u8 = 1;

const NONCE_SIZE: usize = 12;
const SEALED_SIZE: usize = 17; // 1 byte ciphertext + 16 byte tag
const NONCE_START: usize = 1;
const SEALED_START: usize = NONCE_START + NONCE_SIZE;

/// Encrypt one byte into a handle:
/// `[version | nonce (12) | ciphertext (1) | tag (16) | reserved (2)]`.
pub fn seal(key: &Key, value: u8) -> Result<[u8; HANDLE_LEN]> {
    let cipher = ChaCha20Poly1305::new(key);
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);

    let sealed = cipher
        .encrypt(&nonce, [value].as_ref())
        .map_err(|e| CoreError::oracle(format!("Encryption failed: {}", e)))?;
    if sealed.len() != SEALED_SIZE {
        return Err(CoreError::oracle(format!(
            "Unexpected sealed length {}",
            sealed.len()
        )));
    }

    let mut handle = [0u8; HANDLE_LEN];
    handle[0] = HANDLE_VERSION;
    handle[NONCE_START..SEALED_START].copy_from_slice(&nonce);
    handle[SEALED_START..SEALED_START + SEALED_SIZE].copy_from_slice(&sealed);
    Ok(handle)
}

pub fn open(key: &Key, handle: &[u8; HANDLE_LEN]) -> Result<u8> {
    if handle[0] != HANDLE_VERSION {
        return Err(CoreError::oracle(format!(
            "Unsupported handle version {}",
            handle[0]
        )));
    }

    let cipher = ChaCha20Poly1305::new(key);
    let nonce = Nonce::from_slice(&handle[NONCE_START..SEALED_START]);

    let plain = cipher
        .decrypt(nonce, &handle[SEALED_START..SEALED_START + SEALED_SIZE])
        .map_err(|e| CoreError::oracle(format!("Decryption failed: {}", e)))?;

    match plain.as_slice() {
        [value] => Ok(*value),
        _ => Err(CoreError::oracle("Decrypted payload is not one byte")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open() {
        let key = *Key::from_slice(&[7u8; 32]);
        let handle = seal(&key, 12).unwrap();

        assert_eq!(handle[0], HANDLE_VERSION);
        assert_eq!(&handle[HANDLE_LEN - 2..], &[0, 0]);
        assert_eq!(open(&key, &handle).unwrap(), 12);
    }

    #[test]
    fn test_same_value_different_handles() {
        let key = *Key::from_slice(&[7u8; 32]);
        assert_ne!(seal(&key, 3).unwrap(), seal(&key, 3).unwrap());
    }

    #[test]
    fn test_wrong_key_or_tamper() {
        let key = *Key::from_slice(&[7u8; 32]);
        let handle = seal(&key, 5).unwrap();

        assert!(open(&*Key::from_slice(&[8u8; 32]), &handle).is_err());

        let mut tampered = handle;
        tampered[SEALED_START] ^= 1;
        assert!(open(&key, &tampered).is_err());

        let mut versioned = handle;
        versioned[0] = 9;
        assert!(open(&key, &versioned).is_err());
    }
}
