//!
//! 集成测试的通用辅助函数
//!
#![allow(dead_code)]

use rcgen::{CertificateParams, DnType, KeyPair};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::RsaPrivateKey;
use sealed_kit::seal::SealedPayload;
use sealed_kit::systems::rsa_oaep::oaep_padding;
use sealed_kit::systems::{AesGcmSystem, ContentCipher};
use std::sync::OnceLock;
use time::OffsetDateTime;

/// 测试进程内共享的 2048 位密钥，避免重复生成
pub fn controller_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 2048).unwrap())
}

fn rcgen_key(private_key: &RsaPrivateKey) -> KeyPair {
    let pem = private_key.to_pkcs8_pem(LineEnding::LF).unwrap();
    KeyPair::from_pem(&pem).unwrap()
}

/// 用给定密钥签发一个自签名证书，有效期为 `[not_before, not_after]`
pub fn certificate_pem_with_validity(
    private_key: &RsaPrivateKey,
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
) -> String {
    let mut params = CertificateParams::new(vec!["sealed-secrets-controller".to_string()]).unwrap();
    params
        .distinguished_name
        .push(DnType::CommonName, "sealed-secret");
    params.not_before = not_before;
    params.not_after = not_after;
    params.self_signed(&rcgen_key(private_key)).unwrap().pem()
}

/// 有效期为十年的控制器证书
pub fn controller_certificate() -> &'static str {
    static PEM: OnceLock<String> = OnceLock::new();
    PEM.get_or_init(|| {
        let now = OffsetDateTime::now_utc();
        certificate_pem_with_validity(
            controller_key(),
            now - time::Duration::days(1),
            now + time::Duration::days(3650),
        )
    })
}

/// ECDSA 证书，用于验证非 RSA 密钥被拒绝
pub fn ecdsa_certificate() -> String {
    let key_pair = KeyPair::generate().unwrap();
    let params = CertificateParams::new(vec!["ecdsa.example".to_string()]).unwrap();
    params.self_signed(&key_pair).unwrap().pem()
}

/// 模拟控制器侧的解密：用私钥和重建出的标签解开载荷
pub fn open(private_key: &RsaPrivateKey, payload: &[u8], label: &str) -> Result<Vec<u8>, String> {
    let parsed = SealedPayload::parse(payload).map_err(|e| e.to_string())?;
    let session_key = private_key
        .decrypt(oaep_padding(label), &parsed.enc_session_key)
        .map_err(|e| e.to_string())?;
    AesGcmSystem::decrypt_detached(&session_key, &parsed.iv, &parsed.ciphertext, &parsed.tag)
        .map_err(|e| e.to_string())
}

pub fn open_base64(private_key: &RsaPrivateKey, payload: &str, label: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| e.to_string())?;
    open(private_key, &bytes, label)
}
