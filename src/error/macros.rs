//! # 错误处理宏

/// 快速创建配置错误的宏
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::ProxyError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::ProxyError::config(format!($fmt, $($arg)*))
    };
}

/// 快速创建数据库错误的宏
#[macro_export]
macro_rules! database_error {
    ($msg:expr) => {
        $crate::error::ProxyError::database($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::ProxyError::database(format!($fmt, $($arg)*))
    };
}

/// 快速创建校验错误的宏
#[macro_export]
macro_rules! validation_error {
    ($msg:expr) => {
        $crate::error::ProxyError::validation($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::ProxyError::validation(format!($fmt, $($arg)*))
    };
}

/// 快速创建认证错误的宏
#[macro_export]
macro_rules! auth_error {
    ($msg:expr) => {
        $crate::error::ProxyError::auth($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::ProxyError::auth(format!($fmt, $($arg)*))
    };
}

/// 快速创建内部错误的宏
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::error::ProxyError::internal($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::ProxyError::internal(format!($fmt, $($arg)*))
    };
}
