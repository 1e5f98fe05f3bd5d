//! # 校验值类型模块
//!
//! 所有跨层传递的基础值都在构造时完成校验，
//! 构造成功即满足不变量，下游不再重复检查

mod domain;
mod firewall;
mod message;

pub use domain::{ApiUrl, MaxTokens, ModelId, ModelName, ModelProvider, ModelStatus, Temperature};
pub use firewall::{FirewallType, InternalModelType};
pub use message::{Message, MessageRole};
