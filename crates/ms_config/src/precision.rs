// crates/ms_config/src/precision.rs

//! 运行时精度选择
//!
//! 提供 `Precision` 枚举用于在配置层选择计算精度，
//! 计算层通过 `Scalar` 泛型单态化。

use ms_foundation::Scalar;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 运行时精度枚举
///
/// # 示例
///
/// ```rust
/// use ms_config::Precision;
///
/// assert_eq!(Precision::of::<f32>(), Precision::F32);
/// assert_eq!("double".parse::<Precision>().unwrap(), Precision::F64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// 单精度浮点 (f32)
    ///
    /// Legendre 表内存减半，往返误差约 1e-6。
    F32,
    /// 双精度浮点 (f64)
    #[default]
    F64,
}

impl Precision {
    /// 获取精度名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// 每个标量占用的字节数
    pub fn size_bytes(&self) -> usize {
        match self {
            Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// 标量类型对应的精度
    pub fn of<S: Scalar>() -> Self {
        if std::mem::size_of::<S>() == 4 {
            Self::F32
        } else {
            Self::F64
        }
    }

    /// 机器精度
    pub fn epsilon(&self) -> f64 {
        match self {
            Self::F32 => f32::EPSILON as f64,
            Self::F64 => f64::EPSILON,
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 精度解析错误
#[derive(Debug, Clone)]
pub struct PrecisionParseError(String);

impl FromStr for Precision {
    type Err = PrecisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "f32" | "float" | "single" | "float32" => Ok(Self::F32),
            "f64" | "double" | "float64" => Ok(Self::F64),
            _ => Err(PrecisionParseError(s.to_string())),
        }
    }
}

impl std::fmt::Display for PrecisionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "无效的精度值: '{}', 期望 'f32' 或 'f64'", self.0)
    }
}

impl std::error::Error for PrecisionParseError {}
