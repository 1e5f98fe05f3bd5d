//! # 上游转发工具
//!
//! 共享HTTP客户端构建、白名单头拷贝、token用量提取

use crate::error::{ProxyError, Result};
use axum::http::{HeaderMap, Method};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// 每次上游调用的超时上限
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(55);

/// 流式中继的单帧上限
pub const STREAM_CHUNK_SIZE: usize = 1024;

/// 允许透传到上游的请求头
const SAFE_HEADERS: [&str; 7] = [
    "authorization",
    "content-type",
    "accept",
    "user-agent",
    "openai-organization",
    "anthropic-version",
    "x-request-id",
];

/// 构建共享上游HTTP客户端
///
/// 连接池：每host至少100个空闲连接，90秒空闲回收，整体60秒超时
pub fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(100)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|e| ProxyError::internal_with_source("上游HTTP客户端构建失败", e))
}

/// 构建发往上游的请求
///
/// 只拷贝白名单头；Content-Type 缺失时补 application/json；
/// 单次调用55秒超时
pub fn build_upstream_request(
    client: &reqwest::Client,
    method: &Method,
    target_url: &Url,
    incoming_headers: &HeaderMap,
    body: Vec<u8>,
) -> reqwest::RequestBuilder {
    let method = reqwest::Method::from_bytes(method.as_str().as_bytes())
        .unwrap_or(reqwest::Method::POST);

    let mut builder = client
        .request(method, target_url.as_str())
        .timeout(UPSTREAM_TIMEOUT)
        .body(body);

    let mut has_content_type = false;
    for name in SAFE_HEADERS {
        if let Some(value) = incoming_headers.get(name) {
            if let Ok(value_str) = value.to_str() {
                if name == "content-type" {
                    has_content_type = true;
                }
                builder = builder.header(name, value_str);
            }
        }
    }
    if !has_content_type {
        builder = builder.header("content-type", "application/json");
    }

    builder
}

/// 从上游响应JSON中提取 usage token 统计
#[must_use]
pub fn extract_token_usage(body: &Value) -> (Option<i32>, Option<i32>, Option<i32>) {
    let Some(usage) = body.get("usage") else {
        return (None, None, None);
    };
    let read = |key: &str| {
        usage
            .get(key)
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
    };
    (
        read("prompt_tokens").or_else(|| read("input_tokens")),
        read("completion_tokens").or_else(|| read("output_tokens")),
        read("total_tokens"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_openai_style_usage() {
        let body = json!({
            "choices": [],
            "usage": {"prompt_tokens": 12, "completion_tokens": 34, "total_tokens": 46}
        });
        assert_eq!(extract_token_usage(&body), (Some(12), Some(34), Some(46)));
    }

    #[test]
    fn extracts_anthropic_style_usage() {
        let body = json!({"usage": {"input_tokens": 5, "output_tokens": 7}});
        assert_eq!(extract_token_usage(&body), (Some(5), Some(7), None));
    }

    #[test]
    fn missing_usage_yields_nones() {
        assert_eq!(extract_token_usage(&json!({"id": "x"})), (None, None, None));
    }
}
