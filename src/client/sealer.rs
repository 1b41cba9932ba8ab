//! Provides a high-level client-side sealer that turns plaintext entries into
//! a ready-to-apply `SealedSecret`.
//!
//! 流程：校验输入 → 获取控制器证书 → 检查证书有效期 → 提取公钥 →
//! 逐键加密 → 构建资源对象。证书过期只产生警告，不阻止加密。

use crate::certificate::{CertificateInfo, certificate_info, is_expiring_soon, parse_public_key};
use crate::controller::ControllerApi;
use crate::error::{Error, Field, ValidationError};
use crate::manifest::SealedSecret;
use crate::seal::{EncryptionScope, encrypt_many};
use crate::validation::{
    validate_key_name, validate_namespace_name, validate_resource_name, validate_secret_value,
};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// 证书剩余天数低于该值时给出警告
pub const DEFAULT_EXPIRY_WARNING_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealerOptions {
    pub expiry_warning_days: i64,
}

impl Default for SealerOptions {
    fn default() -> Self {
        Self {
            expiry_warning_days: DEFAULT_EXPIRY_WARNING_DAYS,
        }
    }
}

/// 一组待加密的键值，值在释放时清零
#[derive(Clone)]
pub struct SecretEntry {
    pub key: String,
    pub value: Zeroizing<Vec<u8>>,
}

impl SecretEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: Zeroizing::new(value.into()),
        }
    }
}

impl fmt::Debug for SecretEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretEntry")
            .field("key", &self.key)
            .field("value_len", &self.value.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SealRequest {
    pub name: String,
    pub namespace: String,
    pub scope: EncryptionScope,
    pub entries: Vec<SecretEntry>,
}

/// 证书有效期相关的提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateWarning {
    Expired { not_after: DateTime<Utc> },
    ExpiringSoon { days: i64, not_after: DateTime<Utc> },
}

impl fmt::Display for CertificateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateWarning::Expired { not_after } => write!(
                f,
                "controller certificate expired on {}; secrets may not be decryptable",
                not_after.format("%Y-%m-%d")
            ),
            CertificateWarning::ExpiringSoon { days, not_after } => write!(
                f,
                "controller certificate expires in {days} days ({})",
                not_after.format("%Y-%m-%d")
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SealOutcome {
    pub sealed_secret: SealedSecret,
    pub certificate_info: Option<CertificateInfo>,
    pub warnings: Vec<CertificateWarning>,
}

fn validate_request(request: &SealRequest) -> Result<(), ValidationError> {
    validate_resource_name(&request.name).into_result(Field::Name)?;
    validate_namespace_name(&request.namespace).into_result(Field::Namespace)?;

    if request.entries.is_empty() {
        return Err(ValidationError::new(
            Field::Entries,
            "At least one key-value pair is required",
        ));
    }
    for entry in &request.entries {
        validate_key_name(&entry.key).into_result(Field::Key(entry.key.clone()))?;
        validate_secret_value(&entry.value).into_result(Field::Value(entry.key.clone()))?;
    }
    Ok(())
}

fn expiry_warnings(info: &CertificateInfo, threshold_days: i64) -> Vec<CertificateWarning> {
    if info.is_expired {
        vec![CertificateWarning::Expired {
            not_after: info.not_after,
        }]
    } else if is_expiring_soon(info, threshold_days) {
        vec![CertificateWarning::ExpiringSoon {
            days: info.days_until_expiry,
            not_after: info.not_after,
        }]
    } else {
        Vec::new()
    }
}

/// 客户端封装器。每次调用都重新获取证书，不缓存密钥材料。
pub struct SecretSealer<C: ?Sized> {
    controller: Arc<C>,
    options: SealerOptions,
}

impl<C: ControllerApi> SecretSealer<C> {
    pub fn new(controller: C) -> Self {
        Self::from_arc(Arc::new(controller))
    }
}

impl<C: ControllerApi + ?Sized> SecretSealer<C> {
    pub fn from_arc(controller: Arc<C>) -> Self {
        Self {
            controller,
            options: SealerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SealerOptions) -> Self {
        self.options = options;
        self
    }

    /// 加密所有条目并构建 SealedSecret；要么全部成功，要么返回错误
    pub async fn seal(&self, request: &SealRequest) -> Result<SealOutcome, Error> {
        validate_request(request)?;

        let pem = self.controller.fetch_certificate().await?;

        let (certificate_info, warnings) = match certificate_info(&pem) {
            Ok(info) => {
                let warnings = expiry_warnings(&info, self.options.expiry_warning_days);
                for warning in &warnings {
                    warn!(%warning, "controller certificate validity");
                }
                (Some(info), warnings)
            }
            Err(e) => {
                debug!(error = %e, "could not read certificate validity");
                (None, Vec::new())
            }
        };

        let public_key = parse_public_key(&pem)?;
        let encrypted_data = encrypt_many(
            &public_key,
            request
                .entries
                .iter()
                .map(|entry| (entry.key.as_str(), entry.value.as_slice())),
            &request.namespace,
            &request.name,
            request.scope,
        )?;

        debug!(
            name = %request.name,
            namespace = %request.namespace,
            scope = %request.scope,
            keys = encrypted_data.len(),
            "built sealed secret"
        );

        Ok(SealOutcome {
            sealed_secret: SealedSecret::new(
                &request.name,
                &request.namespace,
                request.scope,
                encrypted_data,
            ),
            certificate_info,
            warnings,
        })
    }

    /// 询问控制器能否解密该对象
    pub async fn verify(&self, sealed_secret: &SealedSecret) -> Result<bool, Error> {
        let body = sealed_secret.to_json()?;
        Ok(self.controller.verify(&body).await?)
    }

    /// 让控制器用当前密钥重新加密，返回控制器给出的对象文本
    pub async fn rotate(&self, sealed_secret: &SealedSecret) -> Result<String, Error> {
        let body = sealed_secret.to_json()?;
        Ok(self.controller.rotate(&body).await?)
    }
}
