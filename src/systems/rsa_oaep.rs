//! RSA-OAEP 会话密钥封装（SHA-256 摘要，MGF1-SHA-256）

use crate::certificate::PublicKeyMaterial;
use crate::error::CryptoError;
use crate::systems::KeyEncapsulation;
use rsa::Oaep;
use rsa::rand_core::OsRng as RsaOsRng;
use sha2::Sha256;

/// 构造与 kubeseal 一致的 OAEP 填充：摘要与 MGF1 均为 SHA-256
pub fn oaep_padding(label: &str) -> Oaep {
    Oaep::new_with_label::<Sha256, _>(label)
}

impl KeyEncapsulation for PublicKeyMaterial {
    fn encapsulated_len(&self) -> usize {
        self.size()
    }

    fn encapsulate(&self, session_key: &[u8], label: &str) -> Result<Vec<u8>, CryptoError> {
        let mut rng = RsaOsRng;
        self.as_rsa()
            .encrypt(&mut rng, oaep_padding(label), session_key)
            .map_err(|e| CryptoError::EncryptionFailed(format!("RSA-OAEP encryption failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::RsaPrivateKey;

    #[test]
    fn label_is_bound_into_ciphertext() {
        let mut rng = RsaOsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let public = PublicKeyMaterial::from(private_key.to_public_key());

        let wrapped = public.encapsulate(&[7u8; 32], "default.db.password").unwrap();
        assert_eq!(wrapped.len(), public.encapsulated_len());

        let opened = private_key
            .decrypt(oaep_padding("default.db.password"), &wrapped)
            .unwrap();
        assert_eq!(opened, vec![7u8; 32]);
        assert!(private_key.decrypt(oaep_padding("password"), &wrapped).is_err());
    }

    #[test]
    fn undersized_modulus_fails() {
        let mut rng = RsaOsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 512).unwrap();
        let public = PublicKeyMaterial::from(private_key.to_public_key());

        let err = public.encapsulate(&[0u8; 32], "k").unwrap_err();
        assert!(matches!(err, CryptoError::EncryptionFailed(_)));
    }
}
