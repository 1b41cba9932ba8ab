//! SealedSecret 资源对象（`bitnami.com/v1alpha1`）

use crate::seal::EncryptionScope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const API_VERSION: &str = "bitnami.com/v1alpha1";
pub const KIND: &str = "SealedSecret";
pub const SYNCED_CONDITION: &str = "Synced";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// 解密后生成的 Secret 的模板
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretTemplate {
    #[serde(default)]
    pub metadata: TemplateMeta,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMeta {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedSecretSpec {
    /// 键名到 Base64 密文的映射
    pub encrypted_data: BTreeMap<String, String>,
    #[serde(default)]
    pub template: SecretTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    /// `True` / `False` / `Unknown`
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedSecretStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedSecret {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: SealedSecretSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SealedSecretStatus>,
}

impl SealedSecret {
    /// 构建对象，并按作用域写入注解
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        scope: EncryptionScope,
        encrypted_data: BTreeMap<String, String>,
    ) -> Self {
        let mut annotations = BTreeMap::new();
        if let Some(annotation) = scope.annotation() {
            annotations.insert(annotation.to_string(), "true".to_string());
        }

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ObjectMeta {
                name: name.into(),
                namespace: namespace.into(),
                annotations,
                labels: BTreeMap::new(),
            },
            spec: SealedSecretSpec {
                encrypted_data,
                template: SecretTemplate::default(),
            },
            status: None,
        }
    }

    pub fn scope(&self) -> EncryptionScope {
        EncryptionScope::from_annotations(
            self.metadata
                .annotations
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    pub fn encrypted_keys_count(&self) -> usize {
        self.spec.encrypted_data.len()
    }

    pub fn sync_condition(&self) -> Option<&Condition> {
        self.status
            .as_ref()?
            .conditions
            .iter()
            .find(|c| c.condition_type == SYNCED_CONDITION)
    }

    pub fn is_synced(&self) -> bool {
        self.sync_condition().is_some_and(|c| c.status == "True")
    }

    /// 同步状态说明：message，其次 reason，最后 status
    pub fn sync_message(&self) -> &str {
        match self.sync_condition() {
            None => "Unknown",
            Some(c) => c
                .message
                .as_deref()
                .filter(|m| !m.is_empty())
                .or(c.reason.as_deref().filter(|r| !r.is_empty()))
                .unwrap_or(c.status.as_str()),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
