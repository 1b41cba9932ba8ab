//! RBAC 权限探测与汇总。
//!
//! 每个动作单独发起一次授权查询，并发执行。任何单个查询的失败
//! （传输错误、解析错误、超时）都只会把对应能力置为 `false`，
//! 不会中断其他查询，也不会向调用方返回错误。

use crate::error::NetworkError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

pub const SEALED_SECRETS_RESOURCE: &str = "sealedsecrets";
pub const SEALED_SECRETS_GROUP: &str = "bitnami.com";
pub const SECRETS_RESOURCE: &str = "secrets";

/// 被探测的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    List,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::List,
    ];

    /// Kubernetes 动词
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "get",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::List => "list",
        }
    }
}

/// 单次授权查询的资源属性；省略 namespace 表示集群范围
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAttributes {
    pub verb: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ResourceAttributes {
    /// 空字符串的 group / namespace 视为未设置
    pub fn new(verb: &str, resource: &str, group: &str, namespace: Option<&str>) -> Self {
        Self {
            verb: verb.to_string(),
            resource: resource.to_string(),
            group: (!group.is_empty()).then(|| group.to_string()),
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
        }
    }
}

/// 授权决策端点
#[async_trait]
pub trait AccessReviewer: Send + Sync {
    /// 返回该请求是否被允许
    async fn review(&self, attributes: &ResourceAttributes) -> Result<bool, NetworkError>;
}

#[async_trait]
impl<T: AccessReviewer + ?Sized> AccessReviewer for Arc<T> {
    async fn review(&self, attributes: &ResourceAttributes) -> Result<bool, NetworkError> {
        (**self).review(attributes).await
    }
}

/// 某一时刻的能力快照，切换命名空间后需要重新计算
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSet {
    pub can_create: bool,
    pub can_read: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub can_list: bool,
}

impl PermissionSet {
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.can_create,
            Action::Read => self.can_read,
            Action::Update => self.can_update,
            Action::Delete => self.can_delete,
            Action::List => self.can_list,
        }
    }

    pub fn has_write_access(&self) -> bool {
        self.can_create || self.can_update || self.can_delete
    }

    pub fn is_read_only(&self) -> bool {
        (self.can_read || self.can_list) && !self.has_write_access()
    }
}

/// 默认的单次探测超时
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// 对授权端点做失败即拒绝的并发探测
pub struct PermissionChecker<R: ?Sized> {
    reviewer: Arc<R>,
    probe_timeout: Option<Duration>,
}

impl<R: ?Sized> Clone for PermissionChecker<R> {
    fn clone(&self) -> Self {
        Self {
            reviewer: Arc::clone(&self.reviewer),
            probe_timeout: self.probe_timeout,
        }
    }
}

impl<R: AccessReviewer> PermissionChecker<R> {
    pub fn new(reviewer: R) -> Self {
        Self::from_arc(Arc::new(reviewer))
    }
}

impl<R: AccessReviewer + ?Sized> PermissionChecker<R> {
    pub fn from_arc(reviewer: Arc<R>) -> Self {
        Self {
            reviewer,
            probe_timeout: Some(DEFAULT_PROBE_TIMEOUT),
        }
    }

    /// 设置单次探测超时；`None` 表示交给底层传输自行处理
    pub fn with_probe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.probe_timeout = timeout;
        self
    }

    async fn probe(&self, attributes: ResourceAttributes) -> bool {
        let review = self.reviewer.review(&attributes);
        let result = match self.probe_timeout {
            Some(limit) => tokio::time::timeout(limit, review)
                .await
                .unwrap_or(Err(NetworkError::Timeout)),
            None => review.await,
        };

        match result {
            Ok(allowed) => {
                debug!(
                    verb = %attributes.verb,
                    resource = %attributes.resource,
                    allowed,
                    "permission probe settled"
                );
                allowed
            }
            Err(e) => {
                warn!(
                    verb = %attributes.verb,
                    resource = %attributes.resource,
                    error = %e,
                    "permission probe failed, assuming denied"
                );
                false
            }
        }
    }

    /// 并发探测五个动作，全部结束后返回汇总结果。从不返回错误。
    pub async fn check_permissions(
        &self,
        resource: &str,
        group: &str,
        namespace: Option<&str>,
    ) -> PermissionSet {
        let attrs = |action: Action| ResourceAttributes::new(action.verb(), resource, group, namespace);

        let (can_create, can_read, can_update, can_delete, can_list) = tokio::join!(
            self.probe(attrs(Action::Create)),
            self.probe(attrs(Action::Read)),
            self.probe(attrs(Action::Update)),
            self.probe(attrs(Action::Delete)),
            self.probe(attrs(Action::List)),
        );

        PermissionSet {
            can_create,
            can_read,
            can_update,
            can_delete,
            can_list,
        }
    }

    /// SealedSecret 资源（`bitnami.com`）的权限
    pub async fn check_sealed_secret_permissions(&self, namespace: Option<&str>) -> PermissionSet {
        self.check_permissions(SEALED_SECRETS_RESOURCE, SEALED_SECRETS_GROUP, namespace)
            .await
    }

    /// 能否读取解密后的 Secret
    pub async fn can_decrypt_secrets(&self, namespace: &str) -> bool {
        self.probe(ResourceAttributes::new(
            Action::Read.verb(),
            SECRETS_RESOURCE,
            "",
            Some(namespace),
        ))
        .await
    }

    /// 能否查看控制器命名空间中的封装密钥
    pub async fn can_view_sealing_keys(&self, controller_namespace: &str) -> bool {
        self.can_decrypt_secrets(controller_namespace).await
    }
}

impl<R: AccessReviewer + ?Sized + 'static> PermissionChecker<R> {
    /// 并发检查多个命名空间的 SealedSecret 权限
    pub async fn check_multi_namespace_permissions<S: AsRef<str>>(
        &self,
        namespaces: &[S],
    ) -> BTreeMap<String, PermissionSet> {
        let mut set = JoinSet::new();
        for namespace in namespaces {
            let checker = self.clone();
            let namespace = namespace.as_ref().to_string();
            set.spawn(async move {
                let permissions = checker
                    .check_sealed_secret_permissions(Some(&namespace))
                    .await;
                (namespace, permissions)
            });
        }

        let mut result = BTreeMap::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((namespace, permissions)) => {
                    result.insert(namespace, permissions);
                }
                Err(e) => warn!(error = %e, "namespace permission task failed"),
            }
        }
        result
    }
}
