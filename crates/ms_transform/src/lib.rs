// crates/ms_transform/src/lib.rs

//! 谱变换引擎
//!
//! 在经纬网格表示与球谐谱表示之间转换物理场：
//! - 网格拓扑 (grid) - 纬圈数、每圈经度点数、纬度与求积权重
//! - 求积 (quadrature) - Gauss-Legendre、Clenshaw-Curtis（Fejér）与等面积权重
//! - Legendre 表 (legendre) - 正交归一化连带 Legendre 函数，预计算或按需计算
//! - 谱场 (spectral) - 三角截断存储，扁平缓冲区加列偏移表
//! - 网格场 (field) - 按纬圈存储的实值场
//! - 傅里叶 (fourier) - 每个纬圈长度的 FFT 计划
//! - 变换 (transform) - 正/逆变换与截断
//! - 特征值 (eigen) - Laplace-Beltrami 算子特征值表
//! - 谱算子 (operators) - Laplace 与逆 Laplace
//!
//! # 示例
//!
//! ```
//! use ms_transform::{GridTopology, SpectralTransform, TransformOptions, Truncation, SpectralField};
//! use ms_config::GridFamily;
//! use num_complex::Complex;
//!
//! let trunc = Truncation::triangular(15);
//! let grid = GridTopology::from_truncation(GridFamily::FullGaussian, 15, 2.0).unwrap();
//! let transform = SpectralTransform::<f64>::new(trunc.clone(), grid, TransformOptions::default()).unwrap();
//!
//! let mut spec = SpectralField::zeros(trunc, 1);
//! spec.set(0, 0, Complex::new(1.0, 0.0));
//! let field = transform.inverse(&spec).unwrap();
//! assert!(field.as_slice().iter().all(|&v| (v - 0.5 / std::f64::consts::PI.sqrt()).abs() < 1e-12));
//! ```

#![warn(clippy::all)]

pub mod eigen;
pub mod error;
pub mod field;
pub mod fourier;
pub mod grid;
pub mod legendre;
pub mod operators;
pub mod quadrature;
pub mod spectral;
pub mod transform;

use ms_foundation::Scalar;

/// 变换层使用的标量：在 `Scalar` 之上要求 FFT 支持
pub trait TransformScalar: Scalar + rustfft::FftNum {}

impl<T: Scalar + rustfft::FftNum> TransformScalar for T {}

// 重导出常用类型
pub use eigen::EigenvalueTable;
pub use error::{TransformError, TransformResult};
pub use field::GridField;
pub use grid::{GridTopology, QuadratureKind};
pub use legendre::LegendreTable;
pub use spectral::{SpectralField, Truncation};
pub use transform::{SpectralTransform, TransformOptions};

pub use ms_config::{GridFamily, LegendreStrategy};
