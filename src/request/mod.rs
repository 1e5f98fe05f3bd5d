//! # 请求解析模块
//!
//! 入站 JSON 到内部已校验请求对象的转换

mod generate;
mod register;

pub use generate::{GenerateRequest, RawGenerateRequest, join_target_url};
pub use register::RawRegisterRequest;
