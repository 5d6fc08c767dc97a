// crates/ms_transform/src/eigen.rs

//! Laplace-Beltrami 特征值表
//!
//! 球谐函数 Y_lm 是水平 Laplace 算子的特征函数：∇²Y_lm = λ_l Y_lm，
//! λ_l = −l(l+1)/R²。特征值只依赖阶 l，因此 Laplace 在谱空间是对角的，
//! 半隐式修正和逆 Laplace 都按阶逐个求解。
//!
//! 表覆盖 l = 0..=lmax+1（含保护行），截断和半径确定后不再改变。

use std::marker::PhantomData;

use crate::error::{TransformError, TransformResult};
use crate::spectral::Truncation;
use crate::TransformScalar;

/// 每个阶 l 的 Laplace 特征值
#[derive(Debug, Clone, PartialEq)]
pub struct EigenvalueTable<S: TransformScalar> {
    radius: Option<f64>,
    values: Vec<f64>,
    _marker: PhantomData<S>,
}

impl<S: TransformScalar> EigenvalueTable<S> {
    /// 按截断与行星半径构建
    pub fn new(truncation: &Truncation, radius: f64) -> TransformResult<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(TransformError::InvalidParameter {
                name: "radius",
                value: radius,
                reason: "半径必须为正的有限值",
            });
        }

        let r2 = radius * radius;
        let values = (0..=truncation.lmax() + 1)
            .map(|l| {
                let l = l as f64;
                -l * (l + 1.0) / r2
            })
            .collect::<Vec<_>>();

        log::debug!("特征值表: {} 个阶, R = {}", values.len(), radius);
        Ok(Self {
            radius: Some(radius),
            values,
            _marker: PhantomData,
        })
    }

    /// 直接给定每个阶的特征值
    ///
    /// 用于自定义算子或构造特定的退化情形。
    pub fn from_values(values: Vec<f64>) -> TransformResult<Self> {
        if values.is_empty() {
            return Err(TransformError::InvalidParameter {
                name: "eigenvalues",
                value: 0.0,
                reason: "特征值表不能为空",
            });
        }
        if let Some(&bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(TransformError::InvalidParameter {
                name: "eigenvalues",
                value: bad,
                reason: "特征值必须为有限值",
            });
        }
        Ok(Self {
            radius: None,
            values,
            _marker: PhantomData,
        })
    }

    /// 构建时使用的半径（自定义表为 None）
    pub fn radius(&self) -> Option<f64> {
        self.radius
    }

    /// 阶数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空（构造保证非空）
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 第 l 阶特征值
    #[inline]
    pub fn get(&self, l: usize) -> Option<S> {
        self.values.get(l).map(|&v| S::from_f64_lossy(v))
    }

    /// 第 l 阶特征值（双精度）
    #[inline]
    pub fn get_f64(&self, l: usize) -> Option<f64> {
        self.values.get(l).copied()
    }

    /// 全部特征值（双精度）
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// 检查表是否覆盖截断的全部阶（含保护行）
    pub fn check_covers(&self, truncation: &Truncation) -> TransformResult<()> {
        let needed = truncation.lmax() + 2;
        if self.len() >= needed {
            Ok(())
        } else {
            Err(TransformError::shape("eigenvalue degrees", needed, self.len()))
        }
    }
}
