//! # 生成端点处理器
//!
//! `/v1/{*path}` 的请求状态机。终态只有两个：完整送达并落库，
//! 或带着错误码失败。审计写入在独立任务里执行，
//! 客户端断连不会取消已进入的落库

use crate::audit::{NewRequestLog, NewResponseLog};
use crate::error::ProxyError;
use crate::logging::{LogComponent, LogStage};
use crate::proxy::metrics::RequestMetrics;
use crate::proxy::upstream::{
    STREAM_CHUNK_SIZE, build_upstream_request, extract_token_usage,
};
use crate::request::RawGenerateRequest;
use crate::server::AppState;
use crate::{ldebug, linfo, lwarn};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

/// 入站请求体大小上限
const MAX_BODY_SIZE: usize = 4 * 1024 * 1024;

/// 不向客户端透传的逐跳响应头
const HOP_BY_HOP_HEADERS: [&str; 4] = ["connection", "transfer-encoding", "keep-alive", "upgrade"];

/// 代理生成端点
pub async fn generate_handler(State(state): State<AppState>, req: Request) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let headers = req.headers().clone();

    // 路由挂在 /v1/{*path}，转发路径是去掉前缀的剩余部分
    let forward_path = uri
        .path()
        .strip_prefix("/v1")
        .unwrap_or(uri.path())
        .to_string();
    let raw_query = uri.query().map(str::to_string);
    let client_ip = client_ip_of(&headers, &req);

    let mut metrics = RequestMetrics::new(forward_path.clone());

    // ========================= 读取请求体 =========================
    let body_bytes = match axum::body::to_bytes(req.into_body(), MAX_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(e) => {
            metrics.status = StatusCode::BAD_REQUEST.as_u16();
            return error_response(StatusCode::BAD_REQUEST, &format!("failed to read body: {e}"));
        }
    };
    let raw: RawGenerateRequest = match serde_json::from_slice(&body_bytes) {
        Ok(raw) => raw,
        Err(e) => {
            metrics.status = StatusCode::BAD_REQUEST.as_u16();
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    // ========================= 解析请求 =========================
    let lookup_start = Instant::now();
    let request = match raw
        .parse(
            &headers,
            &forward_path,
            raw_query.as_deref(),
            client_ip,
            &state.registry,
            state.key_store.as_ref(),
        )
        .await
    {
        Ok(request) => request,
        Err(e) => {
            // 解析阶段的失败一律400，认证类除外（401）
            let status = if matches!(e, ProxyError::Auth { .. }) {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::BAD_REQUEST
            };
            metrics.status = status.as_u16();
            return error_response(status, &e.to_string());
        }
    };
    metrics.lookup_time = lookup_start.elapsed();
    metrics.name = request.model.name.to_string();
    metrics.model = request.model.model.to_string();
    metrics.streaming = request.is_streaming;

    // ========================= 请求落库 =========================
    let request_id = match state
        .audit
        .log_request(NewRequestLog {
            user_id: request.user.user_id,
            api_key_id: request.user.api_key_id,
            model: request.model.name.to_string(),
            target_url: request.target_url.to_string(),
            messages: request.audit_messages(),
            parameters: request.audit_parameters(),
            client_ip: request.client_ip.clone(),
        })
        .await
    {
        Ok(request_id) => request_id,
        Err(e) => {
            lwarn!(
                "unknown",
                LogStage::Audit,
                LogComponent::AuditSink,
                "log_request",
                format!("请求行写入失败: {e}")
            );
            metrics.status = StatusCode::INTERNAL_SERVER_ERROR.as_u16();
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
        }
    };

    linfo!(
        request_id,
        LogStage::RequestStart,
        LogComponent::Proxy,
        "request_logged",
        format!("{} -> {}", request.model.name, request.target_url)
    );

    // ========================= 防火墙 Hook =========================
    if let Some(hook) = &state.hook {
        if let Err(e) = hook.on_request(request_id, &request).await {
            metrics.status = e.status_code().as_u16();
            return e.into_response();
        }
    }

    // ========================= 构建上游请求 =========================
    let body_start = Instant::now();
    let upstream_body = match serde_json::to_vec(&request.to_upstream_body()) {
        Ok(body) => body,
        Err(e) => {
            lwarn!(
                request_id,
                LogStage::UpstreamRequest,
                LogComponent::Proxy,
                "encode_body",
                format!("上游请求体编码失败: {e}")
            );
            metrics.status = StatusCode::INTERNAL_SERVER_ERROR.as_u16();
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to process request to json",
            );
        }
    };
    metrics.body_time = body_start.elapsed();

    // ========================= 上游转发 =========================
    linfo!(
        request_id,
        LogStage::UpstreamRequest,
        LogComponent::Upstream,
        "dispatch",
        format!("转发到 {}", request.target_url)
    );
    let upstream_start = Instant::now();
    let upstream_response = match build_upstream_request(
        &state.http_client,
        &method,
        &request.target_url,
        &headers,
        upstream_body,
    )
    .send()
    .await
    {
        Ok(response) => response,
        Err(e) => {
            lwarn!(
                request_id,
                LogStage::ResponseFailure,
                LogComponent::Upstream,
                "dispatch",
                format!("上游不可达: {e}")
            );
            metrics.status = StatusCode::BAD_GATEWAY.as_u16();
            return error_response(StatusCode::BAD_GATEWAY, "upstream service unavailable");
        }
    };
    metrics.upstream_latency = upstream_start.elapsed();

    let status = StatusCode::from_u16(upstream_response.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    metrics.status = status.as_u16();

    let response_headers = copy_response_headers(upstream_response.headers());

    // ========================= 响应中继 =========================
    if request.is_streaming {
        relay_streaming(
            state,
            metrics,
            request_id,
            status,
            response_headers,
            upstream_response,
            upstream_start,
        )
    } else {
        relay_unary(
            state,
            metrics,
            request_id,
            status,
            response_headers,
            upstream_response,
            upstream_start,
        )
        .await
    }
}

/// 一次性响应：整体缓冲后送出，再解析JSON用于审计
async fn relay_unary(
    state: AppState,
    mut metrics: RequestMetrics,
    request_id: Uuid,
    status: StatusCode,
    response_headers: HeaderMap,
    upstream_response: reqwest::Response,
    upstream_start: Instant,
) -> Response {
    let body = match upstream_response.bytes().await {
        Ok(body) => body,
        Err(e) => {
            lwarn!(
                request_id,
                LogStage::ResponseFailure,
                LogComponent::Upstream,
                "read_body",
                format!("读取上游响应失败: {e}")
            );
            metrics.status = StatusCode::BAD_GATEWAY.as_u16();
            return error_response(StatusCode::BAD_GATEWAY, "upstream service unavailable");
        }
    };
    let latency_ms = elapsed_ms(upstream_start);

    // 审计写入用独立任务，客户端断连不影响
    let audit = Arc::clone(&state.audit);
    let body_for_audit = body.clone();
    tokio::spawn(async move {
        let text = String::from_utf8_lossy(&body_for_audit).to_string();
        let (response_text, input_tokens, output_tokens, total_tokens) =
            match serde_json::from_str::<Value>(&text) {
                Ok(parsed) => {
                    let (input, output, total) = extract_token_usage(&parsed);
                    (text, input, output, total)
                }
                Err(e) => {
                    lwarn!(
                        request_id,
                        LogStage::Audit,
                        LogComponent::AuditSink,
                        "parse_response",
                        format!("上游响应不是合法JSON: {e}")
                    );
                    (String::new(), None, None, None)
                }
            };
        write_response_row(
            &audit,
            NewResponseLog {
                request_id,
                response: response_text,
                latency_ms,
                input_tokens,
                output_tokens,
                total_tokens,
            },
        )
        .await;
    });

    build_client_response(status, response_headers, Body::from(body))
}

/// 流式响应：按 ≤1KiB 帧中继，每帧随到随写；
/// 中继任务在流结束后写响应行，指标守卫随任务结束输出
fn relay_streaming(
    state: AppState,
    metrics: RequestMetrics,
    request_id: Uuid,
    status: StatusCode,
    response_headers: HeaderMap,
    upstream_response: reqwest::Response,
    upstream_start: Instant,
) -> Response {
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, std::io::Error>>(64);

    let audit = Arc::clone(&state.audit);
    tokio::spawn(async move {
        let _metrics = metrics;
        let mut stream = upstream_response.bytes_stream();
        let mut collected: Vec<u8> = Vec::new();

        'relay: while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(mut bytes) => {
                    collected.extend_from_slice(&bytes);
                    // 上游帧可能大于中继帧上限，切开逐帧送出
                    while !bytes.is_empty() {
                        let frame = bytes.split_to(bytes.len().min(STREAM_CHUNK_SIZE));
                        if tx.send(Ok(frame)).await.is_err() {
                            // 客户端断开即取消上游读取，已收字节照常审计
                            lwarn!(
                                request_id,
                                LogStage::ResponseFailure,
                                LogComponent::Proxy,
                                "client_gone",
                                "客户端中途断开，取消上游流"
                            );
                            break 'relay;
                        }
                    }
                }
                Err(e) => {
                    lwarn!(
                        request_id,
                        LogStage::ResponseFailure,
                        LogComponent::Upstream,
                        "stream_read",
                        format!("上游流读取中断: {e}")
                    );
                    let _ = tx.send(Err(std::io::Error::other(e))).await;
                    break;
                }
            }
        }
        // 流在此丢弃，未读完的上游连接随之取消
        drop(stream);
        drop(tx);

        let latency_ms = elapsed_ms(upstream_start);
        ldebug!(
            request_id,
            LogStage::Response,
            LogComponent::Proxy,
            "stream_done",
            format!("流式中继结束，共 {} 字节", collected.len())
        );
        write_response_row(
            &audit,
            NewResponseLog {
                request_id,
                response: String::from_utf8_lossy(&collected).to_string(),
                latency_ms,
                input_tokens: None,
                output_tokens: None,
                total_tokens: None,
            },
        )
        .await;
    });

    build_client_response(
        status,
        response_headers,
        Body::from_stream(ReceiverStream::new(rx)),
    )
}

/// 响应行写失败只记日志（字节已经送出，不再打扰客户端）
async fn write_response_row(audit: &crate::audit::AuditLogger, entry: NewResponseLog) {
    let request_id = entry.request_id;
    if let Err(e) = audit.log_response(entry).await {
        lwarn!(
            request_id,
            LogStage::Audit,
            LogComponent::AuditSink,
            "log_response",
            format!("响应行写入失败: {e}")
        );
    }
}

fn build_client_response(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// 拷贝上游响应头，剔除逐跳头
fn copy_response_headers(upstream: &reqwest::header::HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in upstream {
        if HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            header::HeaderName::from_bytes(name.as_str().as_bytes()),
            header::HeaderValue::from_bytes(value.as_bytes()),
        ) {
            headers.append(name, value);
        }
    }
    headers
}

/// 客户端IP：X-Forwarded-For 首个地址优先，其次传输层地址
fn client_ip_of(headers: &HeaderMap, req: &Request) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    req.extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_default()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        axum::Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

fn elapsed_ms(start: Instant) -> i32 {
    i32::try_from(start.elapsed().as_millis()).unwrap_or(i32::MAX)
}
