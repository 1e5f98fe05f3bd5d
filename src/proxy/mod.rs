//! # 代理引擎
//!
//! 单个请求的状态机：解析 → 请求落库 → 防火墙链 → 上游转发 →
//! 响应中继（流式/一次性）→ 响应落库，任一步失败进入终态

mod handler;
mod metrics;
mod upstream;

pub use handler::generate_handler;
pub use metrics::RequestMetrics;
pub use upstream::build_http_client;
