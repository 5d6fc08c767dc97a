// crates/ms_transform/src/error.rs

//! 谱变换错误类型

use ms_foundation::MsError;
use thiserror::Error;

/// 变换结果类型
pub type TransformResult<T> = Result<T, TransformError>;

/// 谱变换错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransformError {
    /// 场的布局与变换上下文的预计算表不一致
    #[error("形状不匹配 ({what}): 期望 {expected}, 实际 {actual}")]
    ShapeMismatch {
        /// 不一致的对象
        what: &'static str,
        /// 期望的布局
        expected: String,
        /// 实际的布局
        actual: String,
    },

    /// 无效截断
    #[error("无效截断: lmax={lmax}, mmax={mmax} ({reason})")]
    InvalidTruncation {
        /// 最大阶
        lmax: usize,
        /// 最大序
        mmax: usize,
        /// 原因
        reason: &'static str,
    },

    /// 无效网格
    #[error("无效网格: {0}")]
    InvalidGrid(String),

    /// 无效参数
    #[error("无效参数 {name}={value}: {reason}")]
    InvalidParameter {
        /// 参数名
        name: &'static str,
        /// 参数值
        value: f64,
        /// 原因
        reason: &'static str,
    },
}

impl TransformError {
    /// 形状不匹配
    pub fn shape(what: &'static str, expected: impl ToString, actual: impl ToString) -> Self {
        Self::ShapeMismatch {
            what,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// 检查两个尺寸是否一致
    #[inline]
    pub fn check(what: &'static str, expected: usize, actual: usize) -> TransformResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::shape(what, expected, actual))
        }
    }
}

impl From<TransformError> for MsError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::ShapeMismatch { .. } => MsError::shape_mismatch(err.to_string()),
            TransformError::InvalidParameter { name, value, reason } => {
                MsError::invalid_config(name, value.to_string(), reason)
            }
            other => MsError::invalid_input(other.to_string()),
        }
    }
}
