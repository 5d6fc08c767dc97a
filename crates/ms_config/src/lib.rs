// crates/ms_config/src/lib.rs

//! MariSpectral Config Layer
//!
//! 配置层，提供分辨率、网格族、Legendre 表策略、精度和物理常数配置。
//! 本层完全无泛型，所有数值使用 f64，在构建变换上下文时再转换到计算精度。
//!
//! # 模块概览
//!
//! - [`precision`]: Precision 枚举（F32/F64）
//! - [`model_config`]: ModelConfig 模型配置（全 f64）
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 4: ms_dynamics   ─> SpectralCore::from_config, 隐式校正
//! Layer 3: ms_transform  ─> GridTopology, SpectralTransform
//! Layer 2: ms_config     ─> ModelConfig, GridFamily, Precision (本层)
//! Layer 1: ms_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod model_config;
pub mod precision;

// 重导出核心类型
pub use error::ConfigError;
pub use model_config::{
    GridFamily, ImplicitConfig, LegendreStrategy, ModelConfig, PlanetConfig, SpectralConfig,
};
pub use precision::Precision;
