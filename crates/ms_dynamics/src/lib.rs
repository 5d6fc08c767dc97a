// crates/ms_dynamics/src/lib.rs

//! MariSpectral 动力核心
//!
//! 在谱空间上完成半隐式时间积分所需的重力波修正。
//!
//! # 模块概览
//!
//! - [`implicit`]: 半隐式算子状态的预计算与逐阶修正
//! - [`core`]: 从配置一次性构建变换、特征值表与隐式状态
//! - [`error`]: 动力核心错误类型
//!
//! # 设计原则
//!
//! 水平 Laplace 在球谐基下是对角的，散度与自由面高度的 2×2 隐式方程组
//! 按阶 l 解耦，每个系数只需一次闭式求解。
//!
//! # 示例
//!
//! ```
//! use ms_dynamics::ImplicitCorrection;
//! use ms_transform::{EigenvalueTable, SpectralField, Truncation};
//! use num_complex::Complex;
//!
//! let trunc = Truncation::triangular(3);
//! let eigen = EigenvalueTable::<f64>::new(&trunc, 1.0).unwrap();
//! let mut implicit = ImplicitCorrection::new(trunc.clone());
//! implicit.initialize_implicit(1.0, 0.5, 1.0, 1.0, 1.0, &eigen).unwrap();
//!
//! let mut div_tend = SpectralField::zeros(trunc.clone(), 1);
//! let mut pres_tend = SpectralField::zeros(trunc.clone(), 1);
//! let zeros = SpectralField::zeros(trunc.clone(), 1);
//! div_tend.set(2, 1, Complex::new(1.0, 0.0));
//!
//! implicit
//!     .apply_correction(&mut div_tend, &mut pres_tend, &zeros, &zeros, &zeros, &zeros)
//!     .unwrap();
//! assert!((div_tend.get(2, 1).unwrap().re - 0.4).abs() < 1e-14);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod error;
pub mod implicit;

pub use crate::core::SpectralCore;
pub use error::{ImplicitError, ImplicitResult};
pub use implicit::{ImplicitCorrection, ImplicitOperatorState, ImplicitParams};
