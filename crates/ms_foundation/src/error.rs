// crates/ms_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `MsError` 枚举和 `MsResult` 类型别名，用于整个项目的错误处理。
//!
//! # 设计原则
//!
//! 1. **层次化**: 基础层只定义核心错误，变换/动力相关错误在各自 crate 中定义，
//!    并通过 `From` 汇入 `MsError`
//! 2. **易用性**: 提供便捷的构造方法
//! 3. **可追溯**: 支持错误链
//!
//! # 示例
//!
//! ```
//! use ms_foundation::error::{MsError, MsResult};
//!
//! fn read_config() -> MsResult<()> {
//!     Err(MsError::config("配置文件格式错误"))
//! }
//! ```

use thiserror::Error;

/// 统一结果类型
pub type MsResult<T> = Result<T, MsError>;

/// MariSpectral 错误类型
#[derive(Error, Debug)]
pub enum MsError {
    // ========================================================================
    // IO / 序列化
    // ========================================================================

    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 序列化失败原因
        message: String,
    },

    // ========================================================================
    // 输入与形状
    // ========================================================================

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 场的布局（截断、纬圈、层数）与算子不一致
    #[error("形状不匹配: {message}")]
    ShapeMismatch {
        /// 具体错误信息
        message: String,
    },

    // ========================================================================
    // 配置
    // ========================================================================

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键名
        key: String,
        /// 配置值
        value: String,
        /// 无效原因说明
        reason: String,
    },

    // ========================================================================
    // 数值
    // ========================================================================

    /// 退化的数值算子（奇异、除零）
    #[error("数值算子退化: {message}")]
    DegenerateOperator {
        /// 具体错误信息
        message: String,
    },

    /// 使用了尚未初始化的状态
    #[error("状态未初始化: {resource}")]
    NotInitialized {
        /// 资源名称
        resource: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl MsError {
    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 形状不匹配
    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            message: message.into(),
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 配置值无效
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 退化算子
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateOperator {
            message: message.into(),
        }
    }

    /// 未初始化
    pub fn not_initialized(resource: impl Into<String>) -> Self {
        Self::NotInitialized {
            resource: resource.into(),
        }
    }
}

impl From<std::io::Error> for MsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
