//! 密文的线格式：
//!
//! ```text
//! [2 字节大端长度 L][L 字节 RSA-OAEP 会话密钥][12 字节 IV][密文][16 字节标签]
//! ```

use crate::error::CryptoError;
use crate::systems::{AesGcmSystem, ContentCipher};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

const LENGTH_PREFIX_SIZE: usize = 2;

/// 拆分后的密文字段。不携带任何绑定元数据。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub enc_session_key: Vec<u8>,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

impl SealedPayload {
    /// 按线格式拼接所有字段
    pub fn to_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        let key_len = u16::try_from(self.enc_session_key.len()).map_err(|_| {
            CryptoError::EncryptionFailed(format!(
                "encrypted session key too long: {} bytes",
                self.enc_session_key.len()
            ))
        })?;

        let mut out = Vec::with_capacity(
            LENGTH_PREFIX_SIZE
                + self.enc_session_key.len()
                + self.iv.len()
                + self.ciphertext.len()
                + self.tag.len(),
        );
        out.extend_from_slice(&key_len.to_be_bytes());
        out.extend_from_slice(&self.enc_session_key);
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
        Ok(out)
    }

    /// 按线格式拆分字节串，不做解密
    pub fn parse(bytes: &[u8]) -> Result<Self, CryptoError> {
        let nonce_size = AesGcmSystem::NONCE_SIZE;
        let tag_size = AesGcmSystem::TAG_SIZE;

        if bytes.len() < LENGTH_PREFIX_SIZE {
            return Err(CryptoError::MalformedPayload(
                "payload is too short to contain length prefix".to_string(),
            ));
        }
        let (len_slice, rest) = bytes.split_at(LENGTH_PREFIX_SIZE);
        let key_len = u16::from_be_bytes([len_slice[0], len_slice[1]]) as usize;

        if rest.len() < key_len + nonce_size + tag_size {
            return Err(CryptoError::MalformedPayload(format!(
                "payload of {} bytes cannot hold a {key_len} byte session key, IV and tag",
                bytes.len()
            )));
        }
        let (enc_session_key, rest) = rest.split_at(key_len);
        let (iv, rest) = rest.split_at(nonce_size);
        let (ciphertext, tag) = rest.split_at(rest.len() - tag_size);

        Ok(Self {
            enc_session_key: enc_session_key.to_vec(),
            iv: iv.to_vec(),
            ciphertext: ciphertext.to_vec(),
            tag: tag.to_vec(),
        })
    }

    pub fn to_base64(&self) -> Result<String, CryptoError> {
        Ok(BASE64.encode(self.to_bytes()?))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        Self::parse(&BASE64.decode(encoded)?)
    }
}
