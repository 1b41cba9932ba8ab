//! 控制器证书处理：从 PEM 中提取 RSA 公钥，并计算有效期元数据。

use crate::error::CryptoError;
use chrono::{DateTime, TimeDelta, Utc};
use rsa::RsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use sha2::{Digest, Sha256};
use tracing::debug;
use x509_parser::certificate::X509Certificate;
use x509_parser::pem::{Pem, parse_x509_pem};
use x509_parser::public_key::PublicKey;

/// 从证书中提取出的 RSA 公钥
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyMaterial {
    key: RsaPublicKey,
}

impl PublicKeyMaterial {
    /// 模数（大端字节）
    pub fn modulus(&self) -> Vec<u8> {
        self.key.n().to_bytes_be()
    }

    /// 公开指数（大端字节）
    pub fn public_exponent(&self) -> Vec<u8> {
        self.key.e().to_bytes_be()
    }

    pub fn key_bits(&self) -> usize {
        self.key.n().bits()
    }

    /// 模数长度（字节），也是 RSA-OAEP 密文的长度
    pub fn size(&self) -> usize {
        self.key.size()
    }

    pub fn as_rsa(&self) -> &RsaPublicKey {
        &self.key
    }
}

impl From<RsaPublicKey> for PublicKeyMaterial {
    fn from(key: RsaPublicKey) -> Self {
        Self { key }
    }
}

/// 证书有效期元数据，按需从 PEM 计算，不做持久化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub is_expired: bool,
    /// 距离过期的整天数（向下取整），过期后为负
    pub days_until_expiry: i64,
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    /// DER 编码证书的 SHA-256 指纹（大写十六进制）
    pub fingerprint_sha256: String,
}

fn decode_pem(pem: &str) -> Result<Pem, CryptoError> {
    let (_, pem) = parse_x509_pem(pem.trim().as_bytes())
        .map_err(|e| CryptoError::Malformed(format!("invalid PEM encoding: {e}")))?;
    if pem.label != "CERTIFICATE" {
        return Err(CryptoError::Malformed(format!(
            "expected a CERTIFICATE block, found {}",
            pem.label
        )));
    }
    Ok(pem)
}

fn parse_der(pem: &Pem) -> Result<X509Certificate<'_>, CryptoError> {
    pem.parse_x509()
        .map_err(|e| CryptoError::Malformed(format!("invalid X.509 structure: {e}")))
}

fn to_datetime(timestamp: i64) -> Result<DateTime<Utc>, CryptoError> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .ok_or_else(|| CryptoError::Malformed(format!("validity time out of range: {timestamp}")))
}

/// 按整天向下取整；`num_days` 向零截断，负数时需要再减一天
fn floor_days(delta: TimeDelta) -> i64 {
    let days = delta.num_days();
    if delta < TimeDelta::days(days) {
        days - 1
    } else {
        days
    }
}

/// 解析 PEM 证书并提取 RSA 公钥
pub fn parse_public_key(pem: &str) -> Result<PublicKeyMaterial, CryptoError> {
    let pem = decode_pem(pem)?;
    let cert = parse_der(&pem)?;
    let spki = cert.public_key();

    match spki.parsed() {
        Ok(PublicKey::RSA(_)) => {}
        Ok(_) => {
            return Err(CryptoError::UnsupportedKeyType(
                spki.algorithm.algorithm.to_id_string(),
            ));
        }
        Err(e) => return Err(CryptoError::Malformed(format!("invalid public key: {e}"))),
    }

    let key = RsaPublicKey::from_public_key_der(spki.raw)
        .map_err(|e| CryptoError::Malformed(format!("invalid RSA public key: {e}")))?;
    let material = PublicKeyMaterial::from(key);
    debug!(key_bits = material.key_bits(), "parsed controller public key");
    Ok(material)
}

/// 按给定时间点计算证书有效期信息
pub fn certificate_info_at(pem: &str, now: DateTime<Utc>) -> Result<CertificateInfo, CryptoError> {
    let pem_block = decode_pem(pem)?;
    let cert = parse_der(&pem_block)?;
    let validity = cert.validity();

    let not_before = to_datetime(validity.not_before.timestamp())?;
    let not_after = to_datetime(validity.not_after.timestamp())?;
    let days_until_expiry = floor_days(not_after - now);

    let fingerprint_sha256 = Sha256::digest(&pem_block.contents)
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<String>();

    debug!(%not_after, days_until_expiry, "computed certificate validity");

    Ok(CertificateInfo {
        not_before,
        not_after,
        is_expired: now > not_after,
        days_until_expiry,
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        serial: cert.raw_serial_as_string(),
        fingerprint_sha256,
    })
}

/// 以当前时间计算证书有效期信息
pub fn certificate_info(pem: &str) -> Result<CertificateInfo, CryptoError> {
    certificate_info_at(pem, Utc::now())
}

/// 证书未过期且剩余天数不超过阈值
pub fn is_expiring_soon(info: &CertificateInfo, threshold_days: i64) -> bool {
    !info.is_expired && info.days_until_expiry <= threshold_days
}

/// 能否从该 PEM 中提取出可用的公钥
pub fn validate_certificate(pem: &str) -> bool {
    parse_public_key(pem).is_ok()
}
