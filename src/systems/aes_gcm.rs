//! AES-256-GCM 内容加密
use crate::error::CryptoError;
use crate::systems::ContentCipher;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16; // AES-GCM's tag is 16 bytes

/// AES-256-GCM 对称加密系统，不使用附加数据
#[derive(Debug)]
pub struct AesGcmSystem;

impl AesGcmSystem {
    fn cipher(key: &[u8]) -> Result<Aes256Gcm, CryptoError> {
        Aes256Gcm::new_from_slice(key).map_err(|_| {
            CryptoError::EncryptionFailed(format!(
                "invalid key size: expected {KEY_SIZE}, got {}",
                key.len()
            ))
        })
    }

    fn check_nonce(nonce: &[u8]) -> Result<&Nonce<aes_gcm::aead::consts::U12>, CryptoError> {
        if nonce.len() != NONCE_SIZE {
            return Err(CryptoError::EncryptionFailed(format!(
                "invalid nonce size: expected {NONCE_SIZE}, got {}",
                nonce.len()
            )));
        }
        Ok(Nonce::from_slice(nonce))
    }
}

impl ContentCipher for AesGcmSystem {
    const KEY_SIZE: usize = KEY_SIZE;
    const NONCE_SIZE: usize = NONCE_SIZE;
    const TAG_SIZE: usize = TAG_SIZE;

    fn encrypt_detached(
        key: &[u8],
        nonce: &[u8],
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
        let cipher = Self::cipher(key)?;
        let nonce = Self::check_nonce(nonce)?;

        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(nonce, &[], &mut buffer)
            .map_err(|e| CryptoError::EncryptionFailed(format!("AES-GCM encryption failed: {e}")))?;

        Ok((buffer, tag.to_vec()))
    }

    fn decrypt_detached(
        key: &[u8],
        nonce: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let cipher = Self::cipher(key)?;
        let nonce = Self::check_nonce(nonce)?;
        if tag.len() != TAG_SIZE {
            return Err(CryptoError::MalformedPayload(format!(
                "invalid tag size: expected {TAG_SIZE}, got {}",
                tag.len()
            )));
        }

        let mut buffer = ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(nonce, &[], &mut buffer, Tag::from_slice(tag))
            .map_err(|_| CryptoError::MalformedPayload("authentication tag mismatch".to_string()))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_roundtrip_keeps_length() {
        let key = [3u8; KEY_SIZE];
        let nonce = [9u8; NONCE_SIZE];
        let plaintext = b"multi\nline\nvalue";

        let (ciphertext, tag) = AesGcmSystem::encrypt_detached(&key, &nonce, plaintext).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len());
        assert_eq!(tag.len(), TAG_SIZE);

        let opened = AesGcmSystem::decrypt_detached(&key, &nonce, &ciphertext, &tag).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let key = [3u8; KEY_SIZE];
        let nonce = [9u8; NONCE_SIZE];
        let (mut ciphertext, tag) = AesGcmSystem::encrypt_detached(&key, &nonce, b"secret").unwrap();
        ciphertext[0] ^= 0x01;
        assert!(AesGcmSystem::decrypt_detached(&key, &nonce, &ciphertext, &tag).is_err());
    }

    #[test]
    fn wrong_key_size_fails() {
        let err = AesGcmSystem::encrypt_detached(&[0u8; 16], &[0u8; NONCE_SIZE], b"x").unwrap_err();
        assert!(matches!(err, CryptoError::EncryptionFailed(_)));
    }
}
