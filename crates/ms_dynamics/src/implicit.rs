// crates/ms_dynamics/src/implicit.rs

//! 半隐式重力波修正
//!
//! 浅水方程中散度 D 与自由面高度 η 的线性重力波项以隐式权重 α 处理。
//! Laplace 在球谐基下是对角的（特征值 λ_l），2×2 隐式方程组按阶 l 解耦：
//!
//! ```text
//! ξ = α·Δt
//! G_D = D_tend − ξgR∇²[l]·(η_now − η_prev)
//! G_η = η_tend − ξRH₀·(D_now − D_prev)
//! δD  = (G_D − ξg∇²[l]·G_η) / (1 − ξH₀·ξg∇²[l])
//! D_tend ← δD ;  η_tend ← G_η − ξH₀·δD
//! ```
//!
//! 算子状态只在时间步长或隐式权重变化时重算，每步修正只读。

use num_complex::Complex;
use rayon::prelude::*;

use ms_config::ModelConfig;
use ms_foundation::Tolerance;
use ms_transform::{EigenvalueTable, SpectralField, TransformScalar, Truncation};

use crate::error::{ImplicitError, ImplicitResult};

/// 参数半径与特征值表半径的相对容差
const RADIUS_REL_TOL: f64 = 1e-12;

/// 半隐式参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImplicitParams {
    /// 时间步长 Δt [s]
    pub time_step: f64,
    /// 隐式权重 α ∈ [0, 1]
    pub alpha: f64,
    /// 平均层厚 H₀ [m]
    pub layer_thickness: f64,
    /// 重力加速度 g [m/s²]
    pub gravity: f64,
    /// 行星半径 R [m]
    pub radius: f64,
}

impl ImplicitParams {
    /// 从模型配置提取
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            time_step: config.implicit.time_step,
            alpha: config.implicit.alpha,
            layer_thickness: config.implicit.layer_thickness,
            gravity: config.planet.gravity,
            radius: config.planet.radius,
        }
    }

    /// 检查参数有效性
    pub fn validate(&self) -> ImplicitResult<()> {
        if !(self.alpha.is_finite() && (0.0..=1.0).contains(&self.alpha)) {
            return Err(ImplicitError::invalid("alpha", self.alpha, "隐式权重必须在 [0, 1] 内"));
        }
        if !(self.time_step.is_finite() && self.time_step >= 0.0) {
            return Err(ImplicitError::invalid("time_step", self.time_step, "时间步长必须为非负有限值"));
        }
        for (name, value) in [
            ("layer_thickness", self.layer_thickness),
            ("gravity", self.gravity),
            ("radius", self.radius),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ImplicitError::invalid(name, value, "必须为正的有限值"));
            }
        }
        Ok(())
    }

    /// ξ = α·Δt
    #[inline]
    pub fn xi(&self) -> f64 {
        self.alpha * self.time_step
    }
}

/// 预计算的隐式算子
///
/// 标量 ξH₀、ξRH₀ 与按阶的 ξg∇²[l]、ξgR∇²[l]、div_impl[l]，l = 0..=lmax+1。
#[derive(Debug, Clone, PartialEq)]
pub struct ImplicitOperatorState<S: TransformScalar> {
    xi_h0: S,
    xi_r_h0: S,
    xi_g_lap: Vec<S>,
    xi_g_r_lap: Vec<S>,
    div_impl: Vec<S>,
}

impl<S: TransformScalar> ImplicitOperatorState<S> {
    /// 按参数与特征值计算；先在双精度下完成并检查退化，再转换为 S
    fn compute(params: &ImplicitParams, eigen: &[f64]) -> ImplicitResult<Self> {
        let xi = params.xi();
        let xi_h0 = xi * params.layer_thickness;
        let xi_r_h0 = xi_h0 * params.radius;
        let xig = xi * params.gravity;

        let n = eigen.len();
        let mut xi_g_lap = Vec::with_capacity(n);
        let mut xi_g_r_lap = Vec::with_capacity(n);
        let mut div_impl = Vec::with_capacity(n);

        for (l, &lambda) in eigen.iter().enumerate() {
            let g_lap = xig * lambda;
            let g_r_lap = xig * params.radius * lambda;
            let denominator = 1.0 - xi_h0 * g_lap;
            let inv = 1.0 / denominator;
            if denominator == 0.0 || !inv.is_finite() {
                return Err(ImplicitError::DegenerateOperator {
                    degree: l,
                    denominator,
                });
            }
            xi_g_lap.push(S::from_f64_lossy(g_lap));
            xi_g_r_lap.push(S::from_f64_lossy(g_r_lap));
            div_impl.push(S::from_f64_lossy(inv));
        }

        Ok(Self {
            xi_h0: S::from_f64_lossy(xi_h0),
            xi_r_h0: S::from_f64_lossy(xi_r_h0),
            xi_g_lap,
            xi_g_r_lap,
            div_impl,
        })
    }

    /// ξH₀
    pub fn xi_h0(&self) -> S {
        self.xi_h0
    }

    /// ξRH₀
    pub fn xi_r_h0(&self) -> S {
        self.xi_r_h0
    }

    /// ξg∇²[l]
    pub fn xi_g_lap(&self) -> &[S] {
        &self.xi_g_lap
    }

    /// ξgR∇²[l]
    pub fn xi_g_r_lap(&self) -> &[S] {
        &self.xi_g_r_lap
    }

    /// 1 / (1 − ξH₀·ξg∇²[l])
    pub fn div_impl(&self) -> &[S] {
        &self.div_impl
    }
}

/// 半隐式修正
///
/// 由时间推进驱动独占：`initialize_implicit` 需要 `&mut self`，
/// `apply_correction` 只读，借用检查保证两者不会交错。
#[derive(Debug, Clone)]
pub struct ImplicitCorrection<S: TransformScalar> {
    truncation: Truncation,
    params: Option<ImplicitParams>,
    state: Option<ImplicitOperatorState<S>>,
    parallel: bool,
}

impl<S: TransformScalar> ImplicitCorrection<S> {
    /// 为给定截断创建未初始化的修正器
    pub fn new(truncation: Truncation) -> Self {
        Self {
            truncation,
            params: None,
            state: None,
            parallel: true,
        }
    }

    /// 设置是否按 m 并行
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// 截断
    pub fn truncation(&self) -> &Truncation {
        &self.truncation
    }

    /// 最近一次成功初始化使用的参数
    pub fn params(&self) -> Option<&ImplicitParams> {
        self.params.as_ref()
    }

    /// 算子状态
    pub fn state(&self) -> Option<&ImplicitOperatorState<S>> {
        self.state.as_ref()
    }

    /// 是否已初始化
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// 时间步长或隐式权重变化时返回 true
    pub fn needs_update(&self, time_step: f64, alpha: f64) -> bool {
        match &self.params {
            Some(p) => p.time_step != time_step || p.alpha != alpha,
            None => true,
        }
    }

    /// 重算隐式算子
    ///
    /// 参数无效或某阶退化时返回错误，原有状态保持不变。
    pub fn initialize_implicit(
        &mut self,
        time_step: f64,
        alpha: f64,
        layer_thickness: f64,
        gravity: f64,
        radius: f64,
        eigen: &EigenvalueTable<S>,
    ) -> ImplicitResult<()> {
        let params = ImplicitParams {
            time_step,
            alpha,
            layer_thickness,
            gravity,
            radius,
        };
        self.initialize(params, eigen)
    }

    /// 按参数结构重算隐式算子
    pub fn initialize(&mut self, params: ImplicitParams, eigen: &EigenvalueTable<S>) -> ImplicitResult<()> {
        params.validate()?;
        eigen.check_covers(&self.truncation)?;
        if let Some(table_radius) = eigen.radius() {
            if !Tolerance::<f64>::new(RADIUS_REL_TOL, 0.0).approx_eq(params.radius, table_radius) {
                return Err(ImplicitError::invalid("radius", params.radius, "与特征值表的半径不一致"));
            }
        }

        let degrees = self.truncation.lmax() + 2;
        let state = ImplicitOperatorState::<S>::compute(&params, &eigen.as_slice()[..degrees])?;

        log::debug!(
            "半隐式算子: Δt={}, α={}, ξH₀={:.4e}, 阶数={}",
            params.time_step,
            params.alpha,
            state.xi_h0.as_f64(),
            degrees
        );
        self.params = Some(params);
        self.state = Some(state);
        Ok(())
    }

    /// 对散度与压力倾向做半隐式修正（原地）
    ///
    /// 六个场必须与算子状态共享截断与层数，检查先于任何写入。
    pub fn apply_correction(
        &self,
        div_tend: &mut SpectralField<S>,
        pres_tend: &mut SpectralField<S>,
        div_now: &SpectralField<S>,
        div_prev: &SpectralField<S>,
        pres_now: &SpectralField<S>,
        pres_prev: &SpectralField<S>,
    ) -> ImplicitResult<()> {
        let state = self.state.as_ref().ok_or(ImplicitError::NotInitialized)?;

        let nlev = div_tend.nlev();
        for (what, field) in [
            ("divergence tendency", &*div_tend),
            ("pressure tendency", &*pres_tend),
            ("divergence (now)", div_now),
            ("divergence (prev)", div_prev),
            ("pressure (now)", pres_now),
            ("pressure (prev)", pres_prev),
        ] {
            if field.truncation() != &self.truncation {
                return Err(ImplicitError::shape(what, &self.truncation, field.truncation()));
            }
            if field.nlev() != nlev {
                return Err(ImplicitError::shape(what, format!("{} levels", nlev), format!("{} levels", field.nlev())));
            }
        }

        let inputs = ColumnInputs {
            div_now,
            div_prev,
            pres_now,
            pres_prev,
        };
        for k in 0..nlev {
            let div_cols = div_tend.columns_mut(k);
            let pres_cols = pres_tend.columns_mut(k);
            let task = |(m, (d, p)): (usize, (&mut [Complex<S>], &mut [Complex<S>]))| {
                self.correct_column(state, &inputs, k, m, d, p);
            };
            if self.parallel {
                div_cols.into_par_iter().zip(pres_cols).enumerate().for_each(task);
            } else {
                div_cols.into_iter().zip(pres_cols).enumerate().for_each(task);
            }
        }

        log::trace!("半隐式修正 {} 层, 截断 {}", nlev, self.truncation);
        Ok(())
    }

    fn correct_column(
        &self,
        state: &ImplicitOperatorState<S>,
        inputs: &ColumnInputs<'_, S>,
        k: usize,
        m: usize,
        div_tend: &mut [Complex<S>],
        pres_tend: &mut [Complex<S>],
    ) {
        // 保护行只参与递推，修正后保持为零
        let nl = div_tend.len() - 1;
        div_tend[nl] = Complex::new(S::ZERO, S::ZERO);
        pres_tend[nl] = Complex::new(S::ZERO, S::ZERO);

        let start = self.truncation.offset(m);
        let div_now = &inputs.div_now.layer(k)[start..];
        let div_prev = &inputs.div_prev.layer(k)[start..];
        let pres_now = &inputs.pres_now.layer(k)[start..];
        let pres_prev = &inputs.pres_prev.layer(k)[start..];

        for (i, (d, p)) in div_tend[..nl].iter_mut().zip(pres_tend[..nl].iter_mut()).enumerate() {
            let l = m + i;
            let g_div = *d - (pres_now[i] - pres_prev[i]) * state.xi_g_r_lap[l];
            let g_eta = *p - (div_now[i] - div_prev[i]) * state.xi_r_h0;
            let delta_div = (g_div - g_eta * state.xi_g_lap[l]) * state.div_impl[l];
            *d = delta_div;
            *p = g_eta - delta_div * state.xi_h0;
        }
    }
}

/// 修正所需的四个只读场
struct ColumnInputs<'a, S: TransformScalar> {
    div_now: &'a SpectralField<S>,
    div_prev: &'a SpectralField<S>,
    pres_now: &'a SpectralField<S>,
    pres_prev: &'a SpectralField<S>,
}
