//! # Sealed-Kit: Client-Side Sealing for Kubernetes Sealed Secrets
//!
//! `sealed-kit` encrypts secret values on the client so that plaintext never
//! reaches the cluster. The resulting ciphertext can only be opened by the
//! sealed-secrets controller that holds the matching private key.
//!
//! ## Core Concepts
//!
//! - **Sealing engine** (`seal`): RSA-OAEP(SHA-256) wraps a one-time AES-256-GCM
//!   session key; the payload layout is bit-compatible with `kubeseal`.
//! - **Scope** (`EncryptionScope`): binds each ciphertext to a namespace/name/key
//!   through the OAEP label.
//! - **Certificate** (`certificate`): public key extraction and expiry metadata.
//! - **Permissions** (`rbac`): concurrent, fail-closed RBAC probes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sealed_kit::certificate::parse_public_key;
//! use sealed_kit::seal::{encrypt_many, EncryptionScope};
//!
//! fn main() -> sealed_kit::Result<()> {
//!     let pem = std::fs::read_to_string("cert.pem")
//!         .map_err(|e| sealed_kit::Error::Config(e.to_string()))?;
//!     let key = parse_public_key(&pem)?;
//!
//!     let sealed = encrypt_many(
//!         &key,
//!         [("password", "hunter2")],
//!         "prod",
//!         "db-creds",
//!         EncryptionScope::Strict,
//!     )?;
//!     println!("{}", sealed["password"]);
//!     Ok(())
//! }
//! ```

pub mod certificate;
pub mod client;
pub mod controller;
pub mod error;
pub mod manifest;
pub mod rbac;
pub mod seal;
pub mod systems;
pub mod validation;

pub use error::{CryptoError, Error, NetworkError, Result, ValidationError};

/// The version of the `sealed-kit` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use crate::certificate::{
        CertificateInfo, PublicKeyMaterial, certificate_info, is_expiring_soon, parse_public_key,
    };
    #[cfg(feature = "http")]
    pub use crate::client::HttpClusterClient;
    pub use crate::client::{SealRequest, SecretEntry, SecretSealer};
    pub use crate::controller::{ControllerApi, ControllerConfig};
    pub use crate::error::{CryptoError, Error, NetworkError, ValidationError};
    pub use crate::manifest::SealedSecret;
    pub use crate::rbac::{AccessReviewer, PermissionChecker, PermissionSet};
    pub use crate::seal::{Binding, EncryptionScope, SealedPayload, encrypt_many, encrypt_value};
    pub use crate::validation::ValidationOutcome;
}
