// crates/ms_foundation/src/lib.rs

//! MariSpectral Foundation Layer
//!
//! 基础层，提供整个项目共享的最小抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `MsError` 与 `ensure!` 宏
//! - [`scalar`]: 密封的标量 trait（仅 f32/f64）
//! - [`tolerance`]: 浮点比较容差
//!
//! # 示例
//!
//! ```
//! use ms_foundation::{MsError, MsResult, Scalar};
//!
//! fn half<S: Scalar>(x: S) -> MsResult<S> {
//!     ms_foundation::ensure!(x.is_finite(), MsError::invalid_input("x 必须有限"));
//!     Ok(x * S::HALF)
//! }
//!
//! assert_eq!(half(4.0f64).unwrap(), 2.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod scalar;
pub mod tolerance;

pub use error::{MsError, MsResult};
pub use scalar::Scalar;
pub use tolerance::Tolerance;

/// 条件不满足时提前返回错误
///
/// ```
/// use ms_foundation::{ensure, MsError, MsResult};
///
/// fn positive(x: f64) -> MsResult<f64> {
///     ensure!(x > 0.0, MsError::invalid_input("x 必须为正"));
///     Ok(x)
/// }
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err(($err).into());
        }
    };
}

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{MsError, MsResult};
    pub use crate::scalar::Scalar;
    pub use crate::tolerance::Tolerance;
    pub use crate::ensure;
}
