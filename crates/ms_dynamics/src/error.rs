// crates/ms_dynamics/src/error.rs

//! 半隐式修正错误类型

use ms_foundation::MsError;
use ms_transform::TransformError;
use thiserror::Error;

/// 半隐式修正结果类型
pub type ImplicitResult<T> = Result<T, ImplicitError>;

/// 半隐式修正错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImplicitError {
    /// 参数超出有效范围
    #[error("无效的隐式参数 {name}={value}: {reason}")]
    InvalidParameter {
        /// 参数名
        name: &'static str,
        /// 参数值
        value: f64,
        /// 原因
        reason: &'static str,
    },

    /// 某个阶的隐式分母为零或其倒数非有限
    #[error("隐式算子在 l={degree} 处退化: 1 - ξH₀·ξg∇² = {denominator}")]
    DegenerateOperator {
        /// 退化的阶
        degree: usize,
        /// 分母的值
        denominator: f64,
    },

    /// 场的截断或层数与算子状态不一致
    #[error("形状不匹配 ({what}): 期望 {expected}, 实际 {actual}")]
    ShapeMismatch {
        /// 不一致的对象
        what: &'static str,
        /// 期望的布局
        expected: String,
        /// 实际的布局
        actual: String,
    },

    /// 修正前未初始化算子状态
    #[error("隐式算子尚未初始化")]
    NotInitialized,
}

impl ImplicitError {
    /// 参数无效
    pub fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter { name, value, reason }
    }

    /// 形状不匹配
    pub fn shape(what: &'static str, expected: impl ToString, actual: impl ToString) -> Self {
        Self::ShapeMismatch {
            what,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl From<TransformError> for ImplicitError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::ShapeMismatch { what, expected, actual } => {
                Self::ShapeMismatch { what, expected, actual }
            }
            TransformError::InvalidParameter { name, value, reason } => {
                Self::InvalidParameter { name, value, reason }
            }
            other => Self::shape("transform", "valid layout", other),
        }
    }
}

impl From<ImplicitError> for MsError {
    fn from(err: ImplicitError) -> Self {
        match err {
            ImplicitError::InvalidParameter { name, value, reason } => {
                MsError::invalid_config(name, value.to_string(), reason)
            }
            e @ ImplicitError::DegenerateOperator { .. } => MsError::degenerate(e.to_string()),
            e @ ImplicitError::ShapeMismatch { .. } => MsError::shape_mismatch(e.to_string()),
            ImplicitError::NotInitialized => MsError::not_initialized("implicit operator state"),
        }
    }
}
