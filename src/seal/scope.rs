//! 加密作用域与 OAEP 标签派生。
//!
//! 标签格式由外部的解密服务固定，任何改动都会让密文无法解密。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const NAMESPACE_WIDE_ANNOTATION: &str = "sealedsecrets.bitnami.com/namespace-wide";
pub const CLUSTER_WIDE_ANNOTATION: &str = "sealedsecrets.bitnami.com/cluster-wide";

/// 密文绑定的范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncryptionScope {
    /// 绑定命名空间与名称
    #[default]
    Strict,
    /// 只绑定命名空间
    NamespaceWide,
    /// 不绑定命名空间与名称
    ClusterWide,
}

impl EncryptionScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionScope::Strict => "strict",
            EncryptionScope::NamespaceWide => "namespace-wide",
            EncryptionScope::ClusterWide => "cluster-wide",
        }
    }

    /// 该作用域对应的资源注解键，Strict 没有注解
    pub fn annotation(&self) -> Option<&'static str> {
        match self {
            EncryptionScope::Strict => None,
            EncryptionScope::NamespaceWide => Some(NAMESPACE_WIDE_ANNOTATION),
            EncryptionScope::ClusterWide => Some(CLUSTER_WIDE_ANNOTATION),
        }
    }

    /// 从资源注解推断作用域，cluster-wide 优先
    pub fn from_annotations<'a, I>(annotations: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut scope = EncryptionScope::Strict;
        for (key, value) in annotations {
            if value != "true" {
                continue;
            }
            match key {
                CLUSTER_WIDE_ANNOTATION => return EncryptionScope::ClusterWide,
                NAMESPACE_WIDE_ANNOTATION => scope = EncryptionScope::NamespaceWide,
                _ => {}
            }
        }
        scope
    }
}

impl fmt::Display for EncryptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown encryption scope: {0}")]
pub struct ParseScopeError(String);

impl FromStr for EncryptionScope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(EncryptionScope::Strict),
            "namespace-wide" => Ok(EncryptionScope::NamespaceWide),
            "cluster-wide" => Ok(EncryptionScope::ClusterWide),
            other => Err(ParseScopeError(other.to_string())),
        }
    }
}

/// 单个值的绑定上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
    pub key: &'a str,
}

impl<'a> Binding<'a> {
    pub fn new(namespace: &'a str, name: &'a str, key: &'a str) -> Self {
        Self {
            namespace,
            name,
            key,
        }
    }

    /// 按作用域派生 RSA-OAEP 标签
    pub fn label(&self, scope: EncryptionScope) -> String {
        match scope {
            EncryptionScope::Strict => format!("{}.{}.{}", self.namespace, self.name, self.key),
            EncryptionScope::NamespaceWide => format!("{}.{}", self.namespace, self.key),
            EncryptionScope::ClusterWide => self.key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_per_scope() {
        let binding = Binding::new("prod", "db-creds", "password");
        assert_eq!(binding.label(EncryptionScope::Strict), "prod.db-creds.password");
        assert_eq!(binding.label(EncryptionScope::NamespaceWide), "prod.password");
        assert_eq!(binding.label(EncryptionScope::ClusterWide), "password");
    }

    #[test]
    fn scope_names_roundtrip() {
        for scope in [
            EncryptionScope::Strict,
            EncryptionScope::NamespaceWide,
            EncryptionScope::ClusterWide,
        ] {
            assert_eq!(scope.as_str().parse::<EncryptionScope>().unwrap(), scope);
            let json = serde_json::to_string(&scope).unwrap();
            assert_eq!(json, format!("\"{scope}\""));
        }
        let err = "global".parse::<EncryptionScope>().unwrap_err();
        assert_eq!(err.to_string(), "unknown encryption scope: global");
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn scope_from_annotations() {
        assert_eq!(
            EncryptionScope::from_annotations(std::iter::empty()),
            EncryptionScope::Strict
        );
        assert_eq!(
            EncryptionScope::from_annotations([(NAMESPACE_WIDE_ANNOTATION, "true")]),
            EncryptionScope::NamespaceWide
        );
        assert_eq!(
            EncryptionScope::from_annotations([
                (NAMESPACE_WIDE_ANNOTATION, "true"),
                (CLUSTER_WIDE_ANNOTATION, "true"),
            ]),
            EncryptionScope::ClusterWide
        );
        assert_eq!(
            EncryptionScope::from_annotations([(CLUSTER_WIDE_ANNOTATION, "false")]),
            EncryptionScope::Strict
        );
    }
}
