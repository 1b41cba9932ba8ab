//! 加密原语的接口边界
//!
//! 封装引擎只依赖这里定义的两个 trait：非对称的会话密钥封装（RSA-OAEP）
//! 与对称的内容加密（AES-256-GCM）。任何满足相同参数的实现都可以替换进来，
//! 但线格式要求的长度（密钥 32 字节、IV 12 字节、标签 16 字节）不能改变。

pub mod aes_gcm;
pub mod rsa_oaep;

use crate::error::CryptoError;
use rand_core::{OsRng, TryRngCore};
use zeroize::Zeroizing;

pub use self::aes_gcm::AesGcmSystem;

/// 用公钥封装一次性会话密钥，并把 OAEP 标签绑定进密文
pub trait KeyEncapsulation {
    /// 封装结果的字节长度（RSA 模数长度）
    fn encapsulated_len(&self) -> usize;

    /// 加密会话密钥。`label` 不会写入密文，解密方必须用相同标签重建。
    fn encapsulate(&self, session_key: &[u8], label: &str) -> Result<Vec<u8>, CryptoError>;
}

/// 带认证的对称内容加密，密文与认证标签分离输出
pub trait ContentCipher {
    const KEY_SIZE: usize;
    const NONCE_SIZE: usize;
    const TAG_SIZE: usize;

    /// 返回 `(ciphertext, tag)`，密文长度与明文相同
    fn encrypt_detached(
        key: &[u8],
        nonce: &[u8],
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), CryptoError>;

    fn decrypt_detached(
        key: &[u8],
        nonce: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;
}

/// 从操作系统的 CSPRNG 读取随机字节。每次调用独立取数，不共享状态。
pub fn random_bytes(len: usize) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let mut bytes = Zeroizing::new(vec![0u8; len]);
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::EncryptionFailed(format!("random source unavailable: {e}")))?;
    Ok(bytes)
}
