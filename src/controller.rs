//! sealed-secrets 控制器的连接配置与 HTTP 接口约定。
//!
//! 控制器通过 Kubernetes API 的 service proxy 访问：
//! `/api/v1/namespaces/{namespace}/services/http:{name}:{port}/proxy{path}`

use crate::error::{Error, NetworkError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_CONTROLLER_NAME: &str = "sealed-secrets-controller";
pub const DEFAULT_CONTROLLER_NAMESPACE: &str = "kube-system";
pub const DEFAULT_CONTROLLER_PORT: u16 = 8080;

/// 控制器连接配置，由调用方显式传入。记录中缺失的字段取默认值。
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerConfig {
    pub controller_name: String,
    pub controller_namespace: String,
    pub controller_port: u16,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            controller_name: DEFAULT_CONTROLLER_NAME.to_string(),
            controller_namespace: DEFAULT_CONTROLLER_NAMESPACE.to_string(),
            controller_port: DEFAULT_CONTROLLER_PORT,
        }
    }
}

impl ControllerConfig {
    /// 解析存储的 JSON 配置记录
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// 没有存储记录或记录损坏时回退到默认配置
    pub fn from_json_or_default(json: Option<&str>) -> Self {
        match json.map(Self::from_json) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                warn!(error = %e, "stored controller configuration is invalid, using defaults");
                Self::default()
            }
            None => Self::default(),
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// 渲染 service proxy 路径
    pub fn proxy_path(&self, path: &str) -> String {
        format!(
            "/api/v1/namespaces/{}/services/http:{}:{}/proxy{}",
            self.controller_namespace, self.controller_name, self.controller_port, path
        )
    }

    pub fn endpoint_path(&self, endpoint: ControllerEndpoint) -> String {
        self.proxy_path(endpoint.path())
    }
}

/// 控制器暴露的端点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEndpoint {
    /// `GET`，返回 PEM 证书
    Certificate,
    /// `POST`，2xx 表示控制器能解密
    Verify,
    /// `POST`，返回用当前密钥重新加密后的对象
    Rotate,
}

impl ControllerEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            ControllerEndpoint::Certificate => "/v1/cert.pem",
            ControllerEndpoint::Verify => "/v1/verify",
            ControllerEndpoint::Rotate => "/v1/rotate",
        }
    }
}

/// 控制器 HTTP 接口
#[async_trait]
pub trait ControllerApi: Send + Sync {
    /// 获取控制器的 PEM 证书；非 2xx 视为失败
    async fn fetch_certificate(&self) -> Result<String, NetworkError>;

    /// 检查控制器能否解密给定的 SealedSecret（JSON/YAML 文本）
    async fn verify(&self, sealed_secret: &str) -> Result<bool, NetworkError>;

    /// 用当前活跃密钥重新加密给定的 SealedSecret
    async fn rotate(&self, sealed_secret: &str) -> Result<String, NetworkError>;
}
