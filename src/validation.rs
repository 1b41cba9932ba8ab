//! 输入的结构校验：资源名、命名空间、键名、值与 PEM 文本。
//!
//! 所有函数都是纯函数，返回 [`ValidationOutcome`] 而不是错误；
//! 需要 `?` 传播时调用 [`ValidationOutcome::into_result`]。

use crate::error::{Field, ValidationError};

pub const MAX_RESOURCE_NAME_LEN: usize = 253;
pub const MAX_NAMESPACE_LEN: usize = 63;
pub const MAX_KEY_LEN: usize = 253;
/// 值的大小上限（字节），达到即拒绝
pub const MAX_VALUE_BYTES: usize = 1_000_000;

pub const PEM_BEGIN_MARKER: &str = "-----BEGIN CERTIFICATE-----";
pub const PEM_END_MARKER: &str = "-----END CERTIFICATE-----";

/// 单次校验的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    valid: bool,
    reason: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// 失败原因，校验通过时为 `None`
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// 将结果绑定到具体字段并转换为 `Result`
    pub fn into_result(self, field: Field) -> Result<(), ValidationError> {
        match self.reason {
            Some(reason) if !self.valid => Err(ValidationError::new(field, reason)),
            _ => Ok(()),
        }
    }
}

fn is_dns_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
}

fn is_alnum(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

fn validate_dns_name(name: &str, max_len: usize, what: &str) -> ValidationOutcome {
    if name.is_empty() {
        return ValidationOutcome::invalid(format!("{what} is required"));
    }
    if name.len() > max_len {
        return ValidationOutcome::invalid(format!(
            "{what} must be {max_len} characters or less"
        ));
    }
    if !name.chars().all(is_dns_char) {
        return ValidationOutcome::invalid(format!(
            "{what} must consist of lowercase alphanumeric characters or hyphens"
        ));
    }
    let starts_ok = name.chars().next().is_some_and(is_alnum);
    let ends_ok = name.chars().last().is_some_and(is_alnum);
    if !starts_ok || !ends_ok {
        return ValidationOutcome::invalid(format!(
            "{what} must start and end with an alphanumeric character"
        ));
    }
    ValidationOutcome::valid()
}

/// 校验资源名（RFC 1123 子域名风格，最长 253）
pub fn validate_resource_name(name: &str) -> ValidationOutcome {
    validate_dns_name(name, MAX_RESOURCE_NAME_LEN, "Name")
}

/// 校验命名空间名，字符规则同资源名，但最长 63
pub fn validate_namespace_name(name: &str) -> ValidationOutcome {
    validate_dns_name(name, MAX_NAMESPACE_LEN, "Namespace")
}

/// 校验 Secret 中的键名：字母数字、`.`、`_`、`-`
pub fn validate_key_name(key: &str) -> ValidationOutcome {
    if key.is_empty() {
        return ValidationOutcome::invalid("Key name is required");
    }
    if key.len() > MAX_KEY_LEN {
        return ValidationOutcome::invalid(format!(
            "Key name must be {MAX_KEY_LEN} characters or less"
        ));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if !key.chars().all(allowed) {
        return ValidationOutcome::invalid(
            "Key name must consist of alphanumeric characters, '-', '_' or '.'",
        );
    }
    ValidationOutcome::valid()
}

/// 校验明文值。允许换行与控制字符。
pub fn validate_secret_value(value: &[u8]) -> ValidationOutcome {
    if value.is_empty() {
        return ValidationOutcome::invalid("Value is required");
    }
    if value.len() >= MAX_VALUE_BYTES {
        return ValidationOutcome::invalid(format!(
            "Value is too large ({} bytes); values must be smaller than 1MB",
            value.len()
        ));
    }
    ValidationOutcome::valid()
}

/// 浅层 PEM 结构检查，只看起止标记，不做密码学验证
pub fn validate_pem(text: &str) -> ValidationOutcome {
    let text = text.trim();
    if text.is_empty() {
        return ValidationOutcome::invalid("Certificate is required");
    }
    let has_begin = text.contains(PEM_BEGIN_MARKER);
    let has_end = text.contains(PEM_END_MARKER);
    match (has_begin, has_end) {
        (true, true) => ValidationOutcome::valid(),
        (false, false) => ValidationOutcome::invalid(
            "Not a valid PEM certificate: expected BEGIN CERTIFICATE and END CERTIFICATE markers",
        ),
        (false, true) => ValidationOutcome::invalid(format!(
            "Certificate is missing the {PEM_BEGIN_MARKER} marker"
        )),
        (true, false) => ValidationOutcome::invalid(format!(
            "Certificate is missing the {PEM_END_MARKER} marker"
        )),
    }
}
