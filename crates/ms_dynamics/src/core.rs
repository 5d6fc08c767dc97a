// crates/ms_dynamics/src/core.rs

//! 模型核心构建
//!
//! 从 `ModelConfig` 一次性构建谱变换上下文、特征值表与半隐式修正，
//! 三者共享同一截断。构建后变换与特征值表只读，隐式状态只在时间步长变化时重算。

use ms_config::{ConfigError, ModelConfig, Precision};
use ms_foundation::{ensure, MsResult};
use ms_transform::{EigenvalueTable, SpectralField, SpectralTransform, TransformScalar};

use crate::implicit::{ImplicitCorrection, ImplicitParams};

/// 谱动力核心
#[derive(Debug, Clone)]
pub struct SpectralCore<S: TransformScalar> {
    config: ModelConfig,
    transform: SpectralTransform<S>,
    eigenvalues: EigenvalueTable<S>,
    implicit: ImplicitCorrection<S>,
}

impl<S: TransformScalar> SpectralCore<S> {
    /// 按配置构建
    ///
    /// 配置的精度必须与标量类型 `S` 一致。
    pub fn new(config: ModelConfig) -> MsResult<Self> {
        config.validate()?;

        let requested = Precision::of::<S>();
        ensure!(
            config.spectral.precision == requested,
            ConfigError::PrecisionMismatch {
                configured: config.spectral.precision.to_string(),
                requested: requested.to_string(),
            }
        );

        let transform = SpectralTransform::from_config(&config.spectral)?;
        let eigenvalues = EigenvalueTable::new(transform.truncation(), config.planet.radius)?;
        let mut implicit =
            ImplicitCorrection::new(transform.truncation().clone()).with_parallel(config.spectral.parallel);
        implicit.initialize(ImplicitParams::from_config(&config), &eigenvalues)?;

        log::info!(
            "谱核心: {} {} 网格, {} 纬圈 / {} 点, 精度 {}",
            transform.truncation(),
            config.spectral.grid,
            transform.topology().nlat(),
            transform.topology().npoints(),
            requested
        );

        Ok(Self {
            config,
            transform,
            eigenvalues,
            implicit,
        })
    }

    /// 从 JSON 配置文件构建
    pub fn from_file(path: impl AsRef<std::path::Path>) -> MsResult<Self> {
        Self::new(ModelConfig::from_file(path)?)
    }

    /// 配置
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// 谱变换
    pub fn transform(&self) -> &SpectralTransform<S> {
        &self.transform
    }

    /// 特征值表
    pub fn eigenvalues(&self) -> &EigenvalueTable<S> {
        &self.eigenvalues
    }

    /// 半隐式修正
    pub fn implicit(&self) -> &ImplicitCorrection<S> {
        &self.implicit
    }

    /// 更换时间步长；仅在步长变化时重算隐式算子，返回是否重算
    pub fn set_time_step(&mut self, time_step: f64) -> MsResult<bool> {
        if !self.implicit.needs_update(time_step, self.config.implicit.alpha) {
            return Ok(false);
        }
        let mut params = ImplicitParams::from_config(&self.config);
        params.time_step = time_step;
        self.implicit.initialize(params, &self.eigenvalues)?;
        self.config.implicit.time_step = time_step;
        Ok(true)
    }

    /// 半隐式修正（见 [`ImplicitCorrection::apply_correction`]）
    pub fn apply_correction(
        &self,
        div_tend: &mut SpectralField<S>,
        pres_tend: &mut SpectralField<S>,
        div_now: &SpectralField<S>,
        div_prev: &SpectralField<S>,
        pres_now: &SpectralField<S>,
        pres_prev: &SpectralField<S>,
    ) -> MsResult<()> {
        self.implicit
            .apply_correction(div_tend, pres_tend, div_now, div_prev, pres_now, pres_prev)?;
        Ok(())
    }
}
