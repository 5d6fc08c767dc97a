// crates/ms_config/src/error.rs

//! 配置层错误类型

use ms_foundation::MsError;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },

    /// 计算精度与配置不一致
    #[error("精度不匹配: 配置为 {configured}, 实际为 {requested}")]
    PrecisionMismatch {
        /// 配置中的精度
        configured: String,
        /// 构建时使用的精度
        requested: String,
    },
}

impl ConfigError {
    /// 构造无效值错误
    pub fn invalid(key: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for MsError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => MsError::from(e),
            ConfigError::Parse(msg) => MsError::serialization(msg),
            ConfigError::InvalidValue { key, value, reason } => {
                MsError::invalid_config(key, value, reason)
            }
            e @ ConfigError::PrecisionMismatch { .. } => MsError::config(e.to_string()),
        }
    }
}
