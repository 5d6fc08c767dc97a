// crates/ms_foundation/src/scalar.rs

//! 统一标量类型抽象
//!
//! 变换与隐式算子对精度泛型，预计算表一律在 f64 中计算后再转换到 `S`。
//!
//! # 使用示例
//!
//! ```
//! use ms_foundation::Scalar;
//!
//! fn eigenvalue<S: Scalar>(l: usize, radius: S) -> S {
//!     let l = S::from_usize_lossy(l);
//!     -l * (l + S::ONE) / (radius * radius)
//! }
//!
//! assert_eq!(eigenvalue(2, 1.0f64), -6.0);
//! assert_eq!(eigenvalue(2, 1.0f32), -6.0);
//! ```

use std::fmt::{Debug, Display};
use std::iter::Sum;

use num_traits::{Float, FromPrimitive, NumAssign};

// 密封trait，禁止外部实现
mod private {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// 统一标量类型约束
///
/// 只作为泛型边界使用（`<S: Scalar>`），不作为 trait 对象。
pub trait Scalar:
    private::Sealed
    + Float
    + FromPrimitive
    + NumAssign
    + Debug
    + Display
    + Send
    + Sync
    + Sum
    + Default
    + 'static
{
    /// 零值: `0.0`
    const ZERO: Self;

    /// 单位值: `1.0`
    const ONE: Self;

    /// 二: `2.0`
    const TWO: Self;

    /// 一半: `0.5`
    const HALF: Self;

    /// 机器精度
    const EPSILON: Self;

    /// 从配置层 f64 转换（f32 下会舍入）
    fn from_f64_lossy(v: f64) -> Self;

    /// 从整数索引转换
    #[inline]
    fn from_usize_lossy(v: usize) -> Self {
        Self::from_f64_lossy(v as f64)
    }

    /// 转换回 f64（用于日志和跨层接口）
    fn as_f64(self) -> f64;
}

impl Scalar for f32 {
    const ZERO: f32 = 0.0;
    const ONE: f32 = 1.0;
    const TWO: f32 = 2.0;
    const HALF: f32 = 0.5;
    const EPSILON: f32 = f32::EPSILON;

    #[inline]
    fn from_f64_lossy(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Scalar for f64 {
    const ZERO: f64 = 0.0;
    const ONE: f64 = 1.0;
    const TWO: f64 = 2.0;
    const HALF: f64 = 0.5;
    const EPSILON: f64 = f64::EPSILON;

    #[inline]
    fn from_f64_lossy(v: f64) -> Self {
        v
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}
