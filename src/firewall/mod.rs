//! # 防火墙模块
//!
//! 配置化的内容过滤链：每个过滤器包装一次分类调用和一个拦截阈值，
//! 按声明顺序求值，首个拦截即短路

mod chain;
mod config;
mod rule;

pub use chain::{FirewallChain, RequestHook};
pub use config::FirewallConfig;
pub use rule::{Firewall, Verdict};
