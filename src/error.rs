//! Defines the error types for the `sealed-kit` crate.
//!
//! 每一类失败都有独立的错误枚举，`Error` 负责统一汇总。

use std::fmt;
use thiserror::Error;

/// 校验失败时所指向的输入字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Name,
    Namespace,
    /// 出错的键名
    Key(String),
    /// 出错的值所属的键名
    Value(String),
    Certificate,
    Entries,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name => f.write_str("name"),
            Field::Namespace => f.write_str("namespace"),
            Field::Key(key) => write!(f, "key \"{key}\""),
            Field::Value(key) => write!(f, "value for key \"{key}\""),
            Field::Certificate => f.write_str("certificate"),
            Field::Entries => f.write_str("entries"),
        }
    }
}

/// 结构校验错误，总是可以由调用方在本地修正
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: Field, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// 证书解析与加密原语相关的错误。永远不会自动重试。
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("failed to parse certificate: {0}")]
    Malformed(String),

    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("failed to encrypt key '{key}': {source}")]
    Entry {
        key: String,
        #[source]
        source: Box<CryptoError>,
    },

    #[error("sealed payload is malformed: {0}")]
    MalformedPayload(String),

    #[error("decoding from Base64 failed: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// 证书获取或 RBAC 探测时的传输层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("{url} responded with status {status}")]
    Status { status: u16, url: String },

    #[error("malformed response body: {0}")]
    Body(String),

    #[error("request timed out")]
    Timeout,
}

/// The main error type for the `sealed-kit` crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("unable to reach controller: {0}")]
    Network(#[from] NetworkError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_error_names_the_offending_key() {
        let err = CryptoError::Entry {
            key: "password".to_string(),
            source: Box::new(CryptoError::EncryptionFailed("message too long".to_string())),
        };
        let message = err.to_string();
        assert!(message.contains("'password'"));
        assert!(message.contains("message too long"));
    }

    #[test]
    fn validation_error_mentions_field() {
        let err = ValidationError::new(Field::Key("api/key".into()), "bad characters");
        assert_eq!(err.to_string(), "invalid key \"api/key\": bad characters");
    }
}
