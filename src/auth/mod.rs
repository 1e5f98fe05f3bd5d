//! # 认证模块
//!
//! Bearer 密钥提取与用户解析。用户/密钥存储是外部协作方，
//! 通过 `ApiKeyStore` trait 接入；内置实现从密钥派生稳定的用户标识

use crate::error::{ProxyError, Result};
use async_trait::async_trait;
use axum::http::HeaderMap;
use uuid::Uuid;

/// 认证通过的调用方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub api_key_id: Uuid,
}

/// 用户/API密钥存储的接入点
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// 按 API 密钥解析用户，未知密钥返回认证错误
    async fn resolve(&self, api_key: &str) -> Result<AuthenticatedUser>;
}

/// 从 `Authorization: Bearer <key>` 头提取密钥
pub fn extract_bearer_key(headers: &HeaderMap) -> Result<&str> {
    let header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ProxyError::auth("missing or invalid Authorization header"))?;
    let key = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ProxyError::auth("missing or invalid Authorization header"))?
        .trim();
    if key.is_empty() {
        return Err(ProxyError::auth("missing or invalid Authorization header"));
    }
    Ok(key)
}

/// 内置密钥解析器
///
/// 接受所有格式合规的密钥，并用 v5 UUID 从密钥字节派生
/// user_id / api_key_id，保证同一密钥的审计行可关联。
/// 生产部署用真实用户库实现 `ApiKeyStore` 替换
#[derive(Debug, Default, Clone, Copy)]
pub struct DerivedKeyStore;

/// api_key_id 与 user_id 使用不同命名空间，避免两者相等
const API_KEY_NAMESPACE: Uuid = Uuid::NAMESPACE_URL;
const USER_NAMESPACE: Uuid = Uuid::NAMESPACE_OID;

#[async_trait]
impl ApiKeyStore for DerivedKeyStore {
    async fn resolve(&self, api_key: &str) -> Result<AuthenticatedUser> {
        if api_key.is_empty() || !api_key.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ProxyError::auth("invalid API key"));
        }
        Ok(AuthenticatedUser {
            user_id: Uuid::new_v5(&USER_NAMESPACE, api_key.as_bytes()),
            api_key_id: Uuid::new_v5(&API_KEY_NAMESPACE, api_key.as_bytes()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers_with_auth("Bearer k1");
        assert_eq!(extract_bearer_key(&headers).unwrap(), "k1");
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert!(extract_bearer_key(&HeaderMap::new()).is_err());
        assert!(extract_bearer_key(&headers_with_auth("Basic abc")).is_err());
        assert!(extract_bearer_key(&headers_with_auth("Bearer ")).is_err());
    }

    #[tokio::test]
    async fn derived_ids_are_stable_per_key() {
        let store = DerivedKeyStore;
        let first = store.resolve("k1").await.unwrap();
        let second = store.resolve("k1").await.unwrap();
        let other = store.resolve("k2").await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first.user_id, other.user_id);
        assert_ne!(first.user_id, first.api_key_id);
    }

    #[tokio::test]
    async fn rejects_non_printable_keys() {
        let store = DerivedKeyStore;
        assert!(store.resolve("has space").await.is_err());
        assert!(store.resolve("").await.is_err());
    }
}
