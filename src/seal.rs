//! 封装引擎：RSA-OAEP 包裹一次性会话密钥，AES-256-GCM 加密明文。
//!
//! 每个值都独立生成会话密钥和 IV，引擎本身不持有任何跨调用状态，
//! 可以在任意线程上并发调用。

pub mod payload;
pub mod scope;

pub use payload::SealedPayload;
pub use scope::{Binding, EncryptionScope};

use crate::error::CryptoError;
use crate::systems::{AesGcmSystem, ContentCipher, KeyEncapsulation, random_bytes};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::collections::BTreeMap;
use tracing::debug;

/// 加密单个值，返回线格式的原始字节
///
/// 密文只能由持有对应私钥、并以相同 `(namespace, name, key, scope)`
/// 重建出 OAEP 标签的一方解开。
pub fn encrypt_value<K>(
    public_key: &K,
    plaintext: &[u8],
    binding: Binding<'_>,
    scope: EncryptionScope,
) -> Result<Vec<u8>, CryptoError>
where
    K: KeyEncapsulation + ?Sized,
{
    let session_key = random_bytes(AesGcmSystem::KEY_SIZE)?;
    let label = binding.label(scope);

    let enc_session_key = public_key.encapsulate(&session_key, &label)?;
    if enc_session_key.len() != public_key.encapsulated_len() {
        return Err(CryptoError::EncryptionFailed(format!(
            "encapsulated key has {} bytes, expected {}",
            enc_session_key.len(),
            public_key.encapsulated_len()
        )));
    }

    let iv = random_bytes(AesGcmSystem::NONCE_SIZE)?;
    let (ciphertext, tag) = AesGcmSystem::encrypt_detached(&session_key, &iv, plaintext)?;

    let payload = SealedPayload {
        enc_session_key,
        iv: iv.to_vec(),
        ciphertext,
        tag,
    };
    let bytes = payload.to_bytes()?;
    debug!(key = binding.key, %scope, payload_len = bytes.len(), "sealed value");
    Ok(bytes)
}

/// 同 [`encrypt_value`]，直接返回 Base64 文本
pub fn encrypt_value_base64<K>(
    public_key: &K,
    plaintext: &[u8],
    binding: Binding<'_>,
    scope: EncryptionScope,
) -> Result<String, CryptoError>
where
    K: KeyEncapsulation + ?Sized,
{
    encrypt_value(public_key, plaintext, binding, scope).map(|bytes| BASE64.encode(bytes))
}

fn seal_entry<K>(
    public_key: &K,
    namespace: &str,
    name: &str,
    key: &str,
    plaintext: &[u8],
    scope: EncryptionScope,
) -> Result<String, CryptoError>
where
    K: KeyEncapsulation + ?Sized,
{
    encrypt_value_base64(public_key, plaintext, Binding::new(namespace, name, key), scope).map_err(
        |e| CryptoError::Entry {
            key: key.to_string(),
            source: Box::new(e),
        },
    )
}

/// 按顺序逐个加密多组键值
///
/// 任何一项失败都会立即终止并返回标明该键的错误，不会返回部分结果。
/// 重复的键以最后一次写入为准。
pub fn encrypt_many<K, I, S, V>(
    public_key: &K,
    entries: I,
    namespace: &str,
    name: &str,
    scope: EncryptionScope,
) -> Result<BTreeMap<String, String>, CryptoError>
where
    K: KeyEncapsulation + ?Sized,
    I: IntoIterator<Item = (S, V)>,
    S: AsRef<str>,
    V: AsRef<[u8]>,
{
    let mut sealed = BTreeMap::new();
    for (key, plaintext) in entries {
        let key = key.as_ref();
        let value = seal_entry(public_key, namespace, name, key, plaintext.as_ref(), scope)?;
        sealed.insert(key.to_string(), value);
    }
    Ok(sealed)
}

/// [`encrypt_many`] 的并行版本
///
/// 所有条目都会执行完毕；若有失败，返回输入顺序中最靠前的那一个。
#[cfg(feature = "parallel")]
pub fn encrypt_many_parallel<K, S, V>(
    public_key: &K,
    entries: &[(S, V)],
    namespace: &str,
    name: &str,
    scope: EncryptionScope,
) -> Result<BTreeMap<String, String>, CryptoError>
where
    K: KeyEncapsulation + Sync + ?Sized,
    S: AsRef<str> + Sync,
    V: AsRef<[u8]> + Sync,
{
    use rayon::prelude::*;

    let results: Vec<Result<(String, String), CryptoError>> = entries
        .par_iter()
        .map(|(key, plaintext)| {
            let key = key.as_ref();
            seal_entry(public_key, namespace, name, key, plaintext.as_ref(), scope)
                .map(|value| (key.to_string(), value))
        })
        .collect();

    let mut sealed = BTreeMap::new();
    for result in results {
        let (key, value) = result?;
        sealed.insert(key, value);
    }
    Ok(sealed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 固定长度的假封装，记录收到的标签
    struct FakeKem {
        len: usize,
        fail_on_label: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FakeKem {
        fn new(len: usize) -> Self {
            Self {
                len,
                fail_on_label: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl KeyEncapsulation for FakeKem {
        fn encapsulated_len(&self) -> usize {
            self.len
        }

        fn encapsulate(&self, session_key: &[u8], label: &str) -> Result<Vec<u8>, CryptoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_label.is_some_and(|l| l == label) {
                return Err(CryptoError::EncryptionFailed("rejected".to_string()));
            }
            let mut out = session_key.to_vec();
            out.resize(self.len, 0);
            Ok(out)
        }
    }

    #[test]
    fn payload_layout_matches_wire_format() {
        let kem = FakeKem::new(256);
        let plaintext = b"hunter2";
        let bytes = encrypt_value(
            &kem,
            plaintext,
            Binding::new("ns", "name", "key"),
            EncryptionScope::Strict,
        )
        .unwrap();

        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), 256);
        assert_eq!(bytes.len(), 2 + 256 + 12 + plaintext.len() + 16);

        // 假封装把会话密钥原样放在前 32 字节，可以直接解开
        let payload = SealedPayload::parse(&bytes).unwrap();
        let session_key = &payload.enc_session_key[..32];
        let opened = AesGcmSystem::decrypt_detached(
            session_key,
            &payload.iv,
            &payload.ciphertext,
            &payload.tag,
        )
        .unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn fresh_session_key_and_iv_per_call() {
        let kem = FakeKem::new(128);
        let binding = Binding::new("ns", "name", "key");
        let a = encrypt_value(&kem, b"same", binding, EncryptionScope::Strict).unwrap();
        let b = encrypt_value(&kem, b"same", binding, EncryptionScope::Strict).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_encapsulation_length_is_rejected() {
        struct Short;
        impl KeyEncapsulation for Short {
            fn encapsulated_len(&self) -> usize {
                256
            }
            fn encapsulate(&self, _: &[u8], _: &str) -> Result<Vec<u8>, CryptoError> {
                Ok(vec![0u8; 10])
            }
        }
        let err = encrypt_value(
            &Short,
            b"x",
            Binding::new("a", "b", "c"),
            EncryptionScope::ClusterWide,
        )
        .unwrap_err();
        assert!(matches!(err, CryptoError::EncryptionFailed(_)));
    }

    #[test]
    fn encrypt_many_fails_fast_and_names_key() {
        let kem = FakeKem {
            fail_on_label: Some("ns.app.second"),
            ..FakeKem::new(64)
        };
        let entries = [("first", "1"), ("second", "2"), ("third", "3")];
        let err = encrypt_many(&kem, entries, "ns", "app", EncryptionScope::Strict).unwrap_err();

        match err {
            CryptoError::Entry { key, .. } => assert_eq!(key, "second"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(kem.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn encrypt_many_last_write_wins() {
        let kem = FakeKem::new(64);
        let entries = vec![("k".to_string(), b"one".to_vec()), ("k".to_string(), b"two".to_vec())];
        let sealed = encrypt_many(&kem, entries, "ns", "app", EncryptionScope::NamespaceWide).unwrap();
        assert_eq!(sealed.len(), 1);

        let payload = SealedPayload::from_base64(&sealed["k"]).unwrap();
        let opened = AesGcmSystem::decrypt_detached(
            &payload.enc_session_key[..32],
            &payload.iv,
            &payload.ciphertext,
            &payload.tag,
        )
        .unwrap();
        assert_eq!(opened, b"two");
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_reports_lowest_failing_index() {
        struct FailOn(&'static [&'static str]);
        impl KeyEncapsulation for FailOn {
            fn encapsulated_len(&self) -> usize {
                32
            }
            fn encapsulate(&self, key: &[u8], label: &str) -> Result<Vec<u8>, CryptoError> {
                if self.0.iter().any(|l| *l == label) {
                    return Err(CryptoError::EncryptionFailed(label.to_string()));
                }
                Ok(key.to_vec())
            }
        }

        let entries: Vec<(String, Vec<u8>)> = (0..32)
            .map(|i| (format!("key{i}"), vec![b'v'; 8]))
            .collect();
        let kem = FailOn(&["key7", "key3", "key20"]);
        for _ in 0..5 {
            let err = encrypt_many_parallel(&kem, &entries, "ns", "app", EncryptionScope::ClusterWide)
                .unwrap_err();
            match err {
                CryptoError::Entry { key, .. } => assert_eq!(key, "key3"),
                other => panic!("unexpected error: {other:?}"),
            }
        }

        let ok = encrypt_many_parallel(&FailOn(&[]), &entries, "ns", "app", EncryptionScope::ClusterWide)
            .unwrap();
        assert_eq!(ok.len(), 32);
    }
}
