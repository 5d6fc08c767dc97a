// crates/ms_config/src/model_config.rs

//! ModelConfig - 谱核心配置（全 f64）
//!
//! 定义分辨率、网格族、Legendre 表策略、行星常数和隐式参数，
//! 使用纯 f64 类型以便 JSON 序列化，构建变换上下文时再转换到计算精度。

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::precision::Precision;

/// 网格族
///
/// 各网格族只在纬圈布局（纬圈数、每圈经度点数、纬度与求积权重）上不同，
/// 变换算法对所有网格族通用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GridFamily {
    /// 全 Gauss 网格：Gauss 纬度，每圈 4·nlat_half 点
    #[serde(rename = "full_gaussian")]
    FullGaussian,
    /// 全 Clenshaw 网格：等角纬度（含赤道、不含极点）
    #[serde(rename = "full_clenshaw")]
    FullClenshaw,
    /// 八面体约化 Gauss 网格：每圈 16+4j 点
    #[serde(rename = "octahedral_gaussian")]
    #[default]
    OctahedralGaussian,
    /// 八面体约化 Clenshaw 网格
    #[serde(rename = "octahedral_clenshaw")]
    OctahedralClenshaw,
    /// HEALPix 等面积网格
    #[serde(rename = "healpix")]
    HEALPix,
    /// 八面体 HEALPix 等面积网格：每圈 4j 点
    #[serde(rename = "octahealpix")]
    OctaHEALPix,
    /// HEALPix 纬度上的全网格
    #[serde(rename = "full_healpix")]
    FullHEALPix,
    /// 八面体 HEALPix 纬度上的全网格
    #[serde(rename = "full_octahealpix")]
    FullOctaHEALPix,
}

impl GridFamily {
    /// 全部网格族
    pub const ALL: [GridFamily; 8] = [
        Self::FullGaussian,
        Self::FullClenshaw,
        Self::OctahedralGaussian,
        Self::OctahedralClenshaw,
        Self::HEALPix,
        Self::OctaHEALPix,
        Self::FullHEALPix,
        Self::FullOctaHEALPix,
    ];

    /// 配置文件中使用的名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::FullGaussian => "full_gaussian",
            Self::FullClenshaw => "full_clenshaw",
            Self::OctahedralGaussian => "octahedral_gaussian",
            Self::OctahedralClenshaw => "octahedral_clenshaw",
            Self::HEALPix => "healpix",
            Self::OctaHEALPix => "octahealpix",
            Self::FullHEALPix => "full_healpix",
            Self::FullOctaHEALPix => "full_octahealpix",
        }
    }

    /// 每圈经度点数是否相同
    pub fn is_full(&self) -> bool {
        matches!(
            self,
            Self::FullGaussian | Self::FullClenshaw | Self::FullHEALPix | Self::FullOctaHEALPix
        )
    }

    /// 是否要求 nlat_half 为偶数（HEALPix 的 nside = nlat_half/2）
    pub fn requires_even_nlat_half(&self) -> bool {
        matches!(self, Self::HEALPix | Self::FullHEALPix)
    }
}

impl std::fmt::Display for GridFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for GridFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .iter()
            .copied()
            .find(|g| g.name() == key)
            .ok_or_else(|| ConfigError::invalid("spectral.grid", s, "未知的网格族"))
    }
}

/// Legendre 表生命周期策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LegendreStrategy {
    /// 构建时一次性计算全部纬圈的 Legendre 值（快，占内存）
    #[default]
    Precomputed,
    /// 每次变换时按纬圈重新计算（慢，省内存）
    OnDemand,
}

/// 谱分辨率配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectralConfig {
    /// 三角截断阶数（lmax = mmax = trunc）
    #[serde(default = "default_trunc")]
    pub trunc: usize,

    /// 去混淆因子（2 = 二次网格，3 = 三次网格）
    #[serde(default = "default_dealiasing")]
    pub dealiasing: f64,

    /// 网格族
    #[serde(default)]
    pub grid: GridFamily,

    /// Legendre 表策略
    #[serde(default)]
    pub legendre: LegendreStrategy,

    /// 计算精度
    #[serde(default)]
    pub precision: Precision,

    /// 是否启用 rayon 并行
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_trunc() -> usize { 31 }
fn default_dealiasing() -> f64 { 2.0 }
fn default_parallel() -> bool { true }

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            trunc: default_trunc(),
            dealiasing: default_dealiasing(),
            grid: GridFamily::default(),
            legendre: LegendreStrategy::default(),
            precision: Precision::default(),
            parallel: default_parallel(),
        }
    }
}

/// 行星常数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetConfig {
    /// 行星半径 [m]
    #[serde(default = "default_radius")]
    pub radius: f64,

    /// 重力加速度 [m/s²]
    #[serde(default = "default_gravity")]
    pub gravity: f64,
}

fn default_radius() -> f64 { 6.371e6 }
fn default_gravity() -> f64 { 9.81 }

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            gravity: default_gravity(),
        }
    }
}

/// 半隐式参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplicitConfig {
    /// 时间步长 [s]
    #[serde(default = "default_time_step")]
    pub time_step: f64,

    /// 隐式权重 α（0 = 显式，0.5 = 中心隐式，1 = 后向隐式）
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// 平均层厚 H₀ [m]
    #[serde(default = "default_layer_thickness")]
    pub layer_thickness: f64,
}

fn default_time_step() -> f64 { 1800.0 }
fn default_alpha() -> f64 { 1.0 }
fn default_layer_thickness() -> f64 { 8500.0 }

impl Default for ImplicitConfig {
    fn default() -> Self {
        Self {
            time_step: default_time_step(),
            alpha: default_alpha(),
            layer_thickness: default_layer_thickness(),
        }
    }
}

/// 模型配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelConfig {
    /// 谱分辨率
    #[serde(default)]
    pub spectral: SpectralConfig,

    /// 行星常数
    #[serde(default)]
    pub planet: PlanetConfig,

    /// 半隐式参数
    #[serde(default)]
    pub implicit: ImplicitConfig,
}

impl ModelConfig {
    /// 从 JSON 文件加载配置并验证
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串解析配置并验证
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: ModelConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.spectral;
        if s.trunc == 0 {
            return Err(ConfigError::invalid("spectral.trunc", s.trunc, "截断阶数必须为正"));
        }
        if !(s.dealiasing.is_finite() && s.dealiasing >= 1.0) {
            return Err(ConfigError::invalid(
                "spectral.dealiasing",
                s.dealiasing,
                "去混淆因子必须 >= 1",
            ));
        }
        if s.dealiasing < 2.0 {
            log::warn!(
                "去混淆因子 {} < 2，非线性项将产生混淆",
                s.dealiasing
            );
        }

        let p = &self.planet;
        check_positive("planet.radius", p.radius)?;
        check_positive("planet.gravity", p.gravity)?;

        let i = &self.implicit;
        if !(i.alpha >= 0.0 && i.alpha <= 1.0) {
            return Err(ConfigError::invalid("implicit.alpha", i.alpha, "隐式权重必须在 [0, 1] 内"));
        }
        if !(i.time_step.is_finite() && i.time_step >= 0.0) {
            return Err(ConfigError::invalid("implicit.time_step", i.time_step, "时间步长不能为负"));
        }
        check_positive("implicit.layer_thickness", i.layer_thickness)?;

        Ok(())
    }
}

fn check_positive(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, value, "必须为有限正数"))
    }
}
