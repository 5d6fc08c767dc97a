// crates/ms_transform/src/legendre.rs

//! 正交归一化连带 Legendre 函数表
//!
//! 归一化满足 2π ∫_{-1}^{1} λ_lm(z)² dz = 1，即球谐函数在单位球上正交归一。
//! 递推在 f64 中进行，结果再转换到计算精度：
//!
//! ```text
//! λ_00   = 1/√(4π)
//! λ_mm   = √((2m+1)/(2m)) · √(1-z²) · λ_{m-1,m-1}
//! λ_m+1m = √(2m+3) · z · λ_mm
//! λ_lm   = a_lm · (z·λ_{l-1,m} - b_lm·λ_{l-2,m})
//! a_lm   = √((4l²-1)/(l²-m²)),  b_lm = √(((l-1)²-m²)/(4(l-1)²-1))
//! ```
//!
//! 对称网格只为北半球（含赤道圈）建表，南半球由 λ_lm(-z) = (-1)^(l+m) λ_lm(z) 得到。
//! 表的布局与谱场相同（按列，含保护行），第 k 圈第 m 列的切片可以直接与谱场的第 m 列对齐。

use std::borrow::Cow;
use std::f64::consts::PI;

use ms_config::LegendreStrategy;

use crate::grid::GridTopology;
use crate::spectral::Truncation;
use crate::TransformScalar;

/// Legendre 表
#[derive(Debug, Clone)]
pub struct LegendreTable<S: TransformScalar> {
    strategy: LegendreStrategy,
    truncation: Truncation,
    symmetric: bool,
    nlat: usize,
    /// 每个 Legendre 圈的 z
    z: Vec<f64>,
    /// 每个 Legendre 圈的求积权重（已乘 2π）
    weights: Vec<S>,
    /// λ_mm 递推因子 √((2m+1)/(2m))，下标 m
    diag_factor: Vec<f64>,
    /// 递推系数 a_lm, b_lm，按谱场扁平索引
    coeff_a: Vec<f64>,
    coeff_b: Vec<f64>,
    /// 预计算值，按需策略下为空
    values: Vec<S>,
}

impl<S: TransformScalar> LegendreTable<S> {
    /// 为给定截断和网格拓扑建表
    pub fn new(truncation: &Truncation, topology: &GridTopology, strategy: LegendreStrategy) -> Self {
        let symmetric = topology.is_symmetric();
        let nlat = topology.nlat();
        let nrings = if symmetric { (nlat + 1) / 2 } else { nlat };

        let z = topology.z()[..nrings].to_vec();
        let weights = topology.weights()[..nrings]
            .iter()
            .map(|&w| S::from_f64_lossy(2.0 * PI * w))
            .collect();

        let diag_factor = (0..=truncation.mmax())
            .map(|m| {
                if m == 0 {
                    1.0
                } else {
                    let mf = m as f64;
                    ((2.0 * mf + 1.0) / (2.0 * mf)).sqrt()
                }
            })
            .collect();

        let n = truncation.ncoeffs();
        let mut coeff_a = vec![0.0; n];
        let mut coeff_b = vec![0.0; n];
        for (l, m, idx) in truncation.iter() {
            if l >= m + 2 {
                let (lf, mf) = (l as f64, m as f64);
                coeff_a[idx] = ((4.0 * lf * lf - 1.0) / (lf * lf - mf * mf)).sqrt();
                let lm1 = lf - 1.0;
                coeff_b[idx] = ((lm1 * lm1 - mf * mf) / (4.0 * lm1 * lm1 - 1.0)).sqrt();
            }
        }

        let mut table = Self {
            strategy,
            truncation: truncation.clone(),
            symmetric,
            nlat,
            z,
            weights,
            diag_factor,
            coeff_a,
            coeff_b,
            values: Vec::new(),
        };

        if strategy == LegendreStrategy::Precomputed {
            let mut ring = vec![0.0; n];
            let mut values = Vec::with_capacity(n * nrings);
            for k in 0..nrings {
                table.fill_ring(table.z[k], &mut ring);
                values.extend(ring.iter().map(|&v| S::from_f64_lossy(v)));
            }
            table.values = values;
        }

        log::debug!(
            "Legendre 表 {}: {} 圈, 策略 {:?}, {} 字节",
            truncation,
            nrings,
            strategy,
            table.memory_bytes()
        );
        table
    }

    /// 表的生命周期策略
    pub fn strategy(&self) -> LegendreStrategy {
        self.strategy
    }

    /// Legendre 圈数（对称网格为北半球圈数）
    pub fn nrings(&self) -> usize {
        self.z.len()
    }

    /// 是否利用赤道对称
    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// 第 k 个 Legendre 圈的求积权重（已乘 2π）
    #[inline]
    pub fn weight(&self, k: usize) -> S {
        self.weights[k]
    }

    /// 网格纬圈 j 对应的 Legendre 圈及其是否位于南半球
    #[inline]
    pub fn ring_of(&self, j: usize) -> (usize, bool) {
        if self.symmetric && j >= self.z.len() {
            (self.nlat - 1 - j, true)
        } else {
            (j, false)
        }
    }

    /// 第 k 圈第 m 列的值，l = m..=lmax+1
    ///
    /// 预计算策略下借用表内切片，按需策略下当场递推。
    pub fn column(&self, k: usize, m: usize) -> Cow<'_, [S]> {
        let start = self.truncation.offset(m);
        let len = self.truncation.column_len(m);
        if self.values.is_empty() {
            let mut col = vec![0.0; len];
            self.fill_column(self.z[k], m, &mut col);
            Cow::Owned(col.into_iter().map(S::from_f64_lossy).collect())
        } else {
            let base = k * self.truncation.ncoeffs() + start;
            Cow::Borrowed(&self.values[base..base + len])
        }
    }

    /// 预计算值占用的字节数
    pub fn memory_bytes(&self) -> usize {
        self.values.len() * std::mem::size_of::<S>()
    }

    /// 计算一整圈的值（λ_mm 沿 m 累乘）
    fn fill_ring(&self, z: f64, out: &mut [f64]) {
        let s = (1.0 - z * z).max(0.0).sqrt();
        let mut pmm = 1.0 / (4.0 * PI).sqrt();
        for m in 0..=self.truncation.mmax() {
            if m > 0 {
                pmm *= self.diag_factor[m] * s;
            }
            let start = self.truncation.offset(m);
            let len = self.truncation.column_len(m);
            self.recur_column(z, m, pmm, &mut out[start..start + len]);
        }
    }

    /// 计算单列（λ_mm 从 λ_00 重新累乘）
    fn fill_column(&self, z: f64, m: usize, out: &mut [f64]) {
        let s = (1.0 - z * z).max(0.0).sqrt();
        let mut pmm = 1.0 / (4.0 * PI).sqrt();
        for i in 1..=m {
            pmm *= self.diag_factor[i] * s;
        }
        self.recur_column(z, m, pmm, out);
    }

    /// 从 λ_mm 沿 l 递推一列
    fn recur_column(&self, z: f64, m: usize, pmm: f64, col: &mut [f64]) {
        let start = self.truncation.offset(m);
        col[0] = pmm;
        if col.len() > 1 {
            col[1] = (2.0 * m as f64 + 3.0).sqrt() * z * pmm;
        }
        for i in 2..col.len() {
            let idx = start + i;
            col[i] = self.coeff_a[idx] * (z * col[i - 1] - self.coeff_b[idx] * col[i - 2]);
        }
    }
}
