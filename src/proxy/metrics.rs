//! # 请求指标
//!
//! 每个请求结束时输出一条JSON指标行。
//! 用守卫的 Drop 保证提前返回的失败路径也会输出

use crate::logging::{LogComponent, LogStage};
use chrono::Utc;
use std::time::{Duration, Instant};

/// 单请求指标收集器
#[derive(Debug)]
pub struct RequestMetrics {
    start: Instant,
    pub path: String,
    pub name: String,
    pub model: String,
    pub status: u16,
    pub lookup_time: Duration,
    pub body_time: Duration,
    pub upstream_latency: Duration,
    pub streaming: bool,
}

impl RequestMetrics {
    #[must_use]
    pub fn new(path: String) -> Self {
        Self {
            start: Instant::now(),
            path,
            name: String::new(),
            model: String::new(),
            status: 0,
            lookup_time: Duration::ZERO,
            body_time: Duration::ZERO,
            upstream_latency: Duration::ZERO,
            streaming: false,
        }
    }
}

impl Drop for RequestMetrics {
    fn drop(&mut self) {
        let line = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "name": self.name,
            "model": self.model,
            "status": self.status,
            "lookup_ms": self.lookup_time.as_millis() as u64,
            "body_process_ms": self.body_time.as_millis() as u64,
            "upstream_ms": self.upstream_latency.as_millis() as u64,
            "total_ms": self.start.elapsed().as_millis() as u64,
            "streaming": self.streaming,
            "path": self.path,
        });
        crate::linfo!(
            "metrics",
            LogStage::Response,
            LogComponent::Metrics,
            "request_metrics",
            line.to_string()
        );
    }
}
