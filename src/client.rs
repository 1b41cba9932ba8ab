//! 客户端侧组件：集群 API 的 HTTP 传输与高层封装流程。

#[cfg(feature = "http")]
pub mod http;
pub mod sealer;

#[cfg(feature = "http")]
pub use http::HttpClusterClient;
pub use sealer::{
    CertificateWarning, SealOutcome, SealRequest, SealerOptions, SecretEntry, SecretSealer,
};
