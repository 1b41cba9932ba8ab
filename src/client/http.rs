//! 基于 `reqwest` 的集群 API 客户端：经 service proxy 访问控制器，
//! 并通过 SelfSubjectAccessReview 查询授权。

use crate::controller::{ControllerApi, ControllerConfig, ControllerEndpoint};
use crate::error::NetworkError;
use crate::rbac::{AccessReviewer, ResourceAttributes};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const ACCESS_REVIEW_PATH: &str = "/apis/authorization.k8s.io/v1/selfsubjectaccessreviews";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SelfSubjectAccessReview<'a> {
    api_version: &'static str,
    kind: &'static str,
    spec: ReviewSpec<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewSpec<'a> {
    resource_attributes: &'a ResourceAttributes,
}

#[derive(Deserialize)]
struct ReviewResponse {
    #[serde(default)]
    status: Option<ReviewStatus>,
}

#[derive(Deserialize)]
struct ReviewStatus {
    #[serde(default)]
    allowed: bool,
}

fn transport_error(err: reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout
    } else {
        NetworkError::Request(err.to_string())
    }
}

fn ensure_success(response: Response) -> Result<Response, NetworkError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(NetworkError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

/// 集群 API 的 HTTP 客户端
#[derive(Clone, Debug)]
pub struct HttpClusterClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    config: ControllerConfig,
}

impl HttpClusterClient {
    /// `base_url` 是集群 API 的地址，例如 `https://127.0.0.1:6443`
    pub fn new(base_url: impl Into<String>, config: ControllerConfig) -> Self {
        Self::with_client(Client::new(), base_url, config)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, config: ControllerConfig) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token: None,
            config,
        }
    }

    /// 使用 Bearer token 认证
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn post_to_controller(
        &self,
        endpoint: ControllerEndpoint,
        body: &str,
    ) -> Result<Response, NetworkError> {
        self.request(Method::POST, &self.config.endpoint_path(endpoint))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(transport_error)
    }
}

#[async_trait]
impl ControllerApi for HttpClusterClient {
    async fn fetch_certificate(&self) -> Result<String, NetworkError> {
        let path = self.config.endpoint_path(ControllerEndpoint::Certificate);
        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(transport_error)?;
        let pem = ensure_success(response)?
            .text()
            .await
            .map_err(|e| NetworkError::Body(e.to_string()))?;
        debug!(bytes = pem.len(), "fetched controller certificate");
        Ok(pem)
    }

    async fn verify(&self, sealed_secret: &str) -> Result<bool, NetworkError> {
        let response = self
            .post_to_controller(ControllerEndpoint::Verify, sealed_secret)
            .await?;
        Ok(response.status().is_success())
    }

    async fn rotate(&self, sealed_secret: &str) -> Result<String, NetworkError> {
        let response = self
            .post_to_controller(ControllerEndpoint::Rotate, sealed_secret)
            .await?;
        ensure_success(response)?
            .text()
            .await
            .map_err(|e| NetworkError::Body(e.to_string()))
    }
}

#[async_trait]
impl AccessReviewer for HttpClusterClient {
    async fn review(&self, attributes: &ResourceAttributes) -> Result<bool, NetworkError> {
        let review = SelfSubjectAccessReview {
            api_version: "authorization.k8s.io/v1",
            kind: "SelfSubjectAccessReview",
            spec: ReviewSpec {
                resource_attributes: attributes,
            },
        };
        let response = self
            .request(Method::POST, ACCESS_REVIEW_PATH)
            .json(&review)
            .send()
            .await
            .map_err(transport_error)?;
        let body: ReviewResponse = ensure_success(response)?
            .json()
            .await
            .map_err(|e| NetworkError::Body(e.to_string()))?;
        Ok(body.status.is_some_and(|s| s.allowed))
    }
}
