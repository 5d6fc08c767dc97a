// crates/ms_transform/src/transform.rs

//! 球谐变换
//!
//! # 算法概述
//!
//! 正变换（网格 → 谱）：
//! 1. 每个纬圈做实值 FFT，得到 F_m(j)，m = 0..=mmax
//! 2. 对每个 m，沿纬圈用 Legendre 值和求积权重积分：
//!    a(l,m) = Σ_j 2π w_j λ_lm(z_j) F_m(j)，l = m..=lmax
//!
//! 逆变换（谱 → 网格）：
//! 1. 每个纬圈对每个 m 求和 g_m(j) = Σ_l a(l,m) λ_lm(z_j)
//! 2. 每个纬圈做逆 FFT，按该圈点数丢弃不可表示的波数
//!
//! 对称网格只用北半球的 Legendre 值：南北两圈的和/差分别对应 l+m 为偶/奇的项，
//! Legendre 积分与求和的工作量减半。
//!
//! # 并行与可复现性
//!
//! FFT 阶段按纬圈并行，Legendre 积分按 m 并行，Legendre 求和按纬圈并行。
//! 每个并行单元内部的累加顺序固定，结果与线程数无关。

use std::sync::Arc;

use num_complex::Complex;
use rayon::prelude::*;

use ms_config::{LegendreStrategy, SpectralConfig};

use crate::error::{TransformError, TransformResult};
use crate::field::GridField;
use crate::fourier::RingFft;
use crate::grid::GridTopology;
use crate::legendre::LegendreTable;
use crate::spectral::{SpectralField, Truncation};
use crate::TransformScalar;

/// 变换选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// Legendre 表策略
    pub legendre: LegendreStrategy,
    /// 是否使用 rayon 并行
    pub parallel: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            legendre: LegendreStrategy::Precomputed,
            parallel: true,
        }
    }
}

impl TransformOptions {
    /// 按需计算 Legendre 值的选项
    pub fn on_demand() -> Self {
        Self {
            legendre: LegendreStrategy::OnDemand,
            ..Default::default()
        }
    }

    /// 串行选项
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Default::default()
        }
    }
}

/// 谱变换上下文
///
/// 每个（网格, 截断, 精度）组合构建一次，构建后只读，可在线程间共享。
#[derive(Debug, Clone)]
pub struct SpectralTransform<S: TransformScalar> {
    truncation: Truncation,
    topology: Arc<GridTopology>,
    legendre: LegendreTable<S>,
    fft: RingFft<S>,
    options: TransformOptions,
}

impl<S: TransformScalar> SpectralTransform<S> {
    /// 构建变换上下文
    pub fn new(
        truncation: Truncation,
        topology: impl Into<Arc<GridTopology>>,
        options: TransformOptions,
    ) -> TransformResult<Self> {
        let topology = topology.into();

        if let Some(degree) = topology.exact_degree() {
            if degree < 2 * truncation.lmax() {
                log::warn!(
                    "网格求积只对 {} 次多项式精确, 不足以精确变换截断 {}",
                    degree,
                    truncation
                );
            }
        }
        let widest = (0..topology.nlat())
            .map(|j| topology.max_wavenumber(j))
            .max()
            .unwrap_or(0);
        if widest < truncation.mmax() {
            log::warn!(
                "最长纬圈只能表示 m ≤ {}, 截断 {} 的高波数将被丢弃",
                widest,
                truncation
            );
        }

        let legendre = LegendreTable::new(&truncation, &topology, options.legendre);
        let fft = RingFft::new(&topology, truncation.mmax());

        Ok(Self {
            truncation,
            topology,
            legendre,
            fft,
            options,
        })
    }

    /// 从谱配置构建（lmax = mmax = trunc）
    pub fn from_config(config: &SpectralConfig) -> TransformResult<Self> {
        let truncation = Truncation::triangular(config.trunc);
        let topology = GridTopology::from_truncation(config.grid, config.trunc, config.dealiasing)?;
        let options = TransformOptions {
            legendre: config.legendre,
            parallel: config.parallel,
        };
        Self::new(truncation, topology, options)
    }

    /// 截断
    pub fn truncation(&self) -> &Truncation {
        &self.truncation
    }

    /// 网格拓扑
    pub fn topology(&self) -> &Arc<GridTopology> {
        &self.topology
    }

    /// Legendre 表
    pub fn legendre(&self) -> &LegendreTable<S> {
        &self.legendre
    }

    /// 选项
    pub fn options(&self) -> TransformOptions {
        self.options
    }

    /// 与本上下文匹配的全零网格场
    pub fn grid_zeros(&self, nlev: usize) -> GridField<S> {
        GridField::zeros(self.topology.clone(), nlev)
    }

    /// 与本上下文匹配的全零谱场
    pub fn spectral_zeros(&self, nlev: usize) -> SpectralField<S> {
        SpectralField::zeros(self.truncation.clone(), nlev)
    }

    // ========================================================================
    // 形状检查
    // ========================================================================

    fn check_grid(&self, grid: &GridField<S>) -> TransformResult<()> {
        if grid.topology().same_layout(&self.topology) {
            Ok(())
        } else {
            Err(TransformError::shape(
                "grid layout",
                format!("{} rings / {} points", self.topology.nlat(), self.topology.npoints()),
                format!(
                    "{} rings / {} points",
                    grid.topology().nlat(),
                    grid.topology().npoints()
                ),
            ))
        }
    }

    fn check_spectral(&self, spec: &SpectralField<S>) -> TransformResult<()> {
        if spec.truncation() == &self.truncation {
            Ok(())
        } else {
            Err(TransformError::shape(
                "truncation",
                &self.truncation,
                spec.truncation(),
            ))
        }
    }

    // ========================================================================
    // 正变换
    // ========================================================================

    /// 网格 → 谱，返回新谱场
    pub fn forward(&self, grid: &GridField<S>) -> TransformResult<SpectralField<S>> {
        let mut spec = self.spectral_zeros(grid.nlev());
        self.forward_into(grid, &mut spec)?;
        Ok(spec)
    }

    /// 网格 → 谱，写入已有谱场；形状不符时不写入任何值
    pub fn forward_into(&self, grid: &GridField<S>, spec: &mut SpectralField<S>) -> TransformResult<()> {
        self.check_grid(grid)?;
        self.check_spectral(spec)?;
        TransformError::check("levels", grid.nlev(), spec.nlev())?;

        let nlat = self.topology.nlat();
        let ncol = self.truncation.mmax() + 1;
        let mut fourier = vec![zero::<S>(); nlat * ncol];

        for k in 0..grid.nlev() {
            let layer = grid.layer(k);
            let ring_task = |(j, out): (usize, &mut [Complex<S>])| {
                self.fft.forward(j, &layer[self.topology.ring_range(j)], out);
            };
            if self.options.parallel {
                fourier.par_chunks_mut(ncol).enumerate().for_each(ring_task);
            } else {
                fourier.chunks_mut(ncol).enumerate().for_each(ring_task);
            }

            let columns = spec.columns_mut(k);
            let column_task = |(m, col): (usize, &mut [Complex<S>])| {
                self.integrate_column(m, &fourier, col);
            };
            if self.options.parallel {
                columns.into_par_iter().enumerate().for_each(column_task);
            } else {
                columns.into_iter().enumerate().for_each(column_task);
            }
        }

        log::trace!("正变换 {} 层, 截断 {}", grid.nlev(), self.truncation);
        Ok(())
    }

    /// 沿纬圈积分第 m 列，保护行保持为零
    fn integrate_column(&self, m: usize, fourier: &[Complex<S>], col: &mut [Complex<S>]) {
        col.fill(zero());
        let ncol = self.truncation.mmax() + 1;
        let nl = self.truncation.lmax() + 1 - m;
        let nlat = self.topology.nlat();
        let table = &self.legendre;

        for k in 0..table.nrings() {
            if m > self.fft.mmax_ring(k) {
                continue;
            }
            let w = table.weight(k);
            let lam = table.column(k, m);
            let north = fourier[k * ncol + m];

            if table.is_symmetric() {
                let s = nlat - 1 - k;
                let (even, odd) = if s == k {
                    (north * w, north * w)
                } else {
                    let south = fourier[s * ncol + m];
                    ((north + south) * w, (north - south) * w)
                };
                // l = m + i，l+m 与 i 同奇偶
                for i in 0..nl {
                    let f = if i % 2 == 0 { even } else { odd };
                    col[i] += f * lam[i];
                }
            } else {
                let f = north * w;
                for i in 0..nl {
                    col[i] += f * lam[i];
                }
            }
        }
    }

    // ========================================================================
    // 逆变换
    // ========================================================================

    /// 谱 → 网格，返回新网格场
    pub fn inverse(&self, spec: &SpectralField<S>) -> TransformResult<GridField<S>> {
        let mut grid = self.grid_zeros(spec.nlev());
        self.inverse_into(spec, &mut grid)?;
        Ok(grid)
    }

    /// 谱 → 网格，写入已有网格场；形状不符时不写入任何值
    pub fn inverse_into(&self, spec: &SpectralField<S>, grid: &mut GridField<S>) -> TransformResult<()> {
        self.check_spectral(spec)?;
        self.check_grid(grid)?;
        TransformError::check("levels", spec.nlev(), grid.nlev())?;

        let nrings = self.legendre.nrings();
        let ncol = self.truncation.mmax() + 1;
        let mut even = vec![zero::<S>(); nrings * ncol];
        let mut odd = vec![zero::<S>(); nrings * ncol];

        for k in 0..spec.nlev() {
            let coeffs = spec.layer(k);
            let sum_task = |(ring, (e, o)): (usize, (&mut [Complex<S>], &mut [Complex<S>]))| {
                self.sum_ring(ring, coeffs, e, o);
            };
            if self.options.parallel {
                even.par_chunks_mut(ncol)
                    .zip(odd.par_chunks_mut(ncol))
                    .enumerate()
                    .for_each(sum_task);
            } else {
                even.chunks_mut(ncol)
                    .zip(odd.chunks_mut(ncol))
                    .enumerate()
                    .for_each(sum_task);
            }

            let rings = split_rings(grid.layer_mut(k), self.topology.nlons());
            let (even_sums, odd_sums) = (&even, &odd);
            let fft_task = |(j, out): (usize, &mut [S])| {
                let (ring, south) = self.legendre.ring_of(j);
                let e = &even_sums[ring * ncol..(ring + 1) * ncol];
                let o = &odd_sums[ring * ncol..(ring + 1) * ncol];
                let g = e
                    .iter()
                    .zip(o)
                    .map(|(&e, &o)| if south { e - o } else { e + o })
                    .collect::<Vec<_>>();
                self.fft.inverse(j, &g, out);
            };
            if self.options.parallel {
                rings.into_par_iter().enumerate().for_each(fft_task);
            } else {
                rings.into_iter().enumerate().for_each(fft_task);
            }
        }

        log::trace!("逆变换 {} 层, 截断 {}", spec.nlev(), self.truncation);
        Ok(())
    }

    /// 在第 k 个 Legendre 圈上按 l+m 奇偶分别求和
    fn sum_ring(
        &self,
        k: usize,
        coeffs: &[Complex<S>],
        even: &mut [Complex<S>],
        odd: &mut [Complex<S>],
    ) {
        even.fill(zero());
        odd.fill(zero());
        let lmax = self.truncation.lmax();
        let mr = self.fft.mmax_ring(k);

        for m in 0..=mr {
            let lam = self.legendre.column(k, m);
            let start = self.truncation.offset(m);
            let col = &coeffs[start..start + lmax + 1 - m];
            let mut e = zero::<S>();
            let mut o = zero::<S>();
            for (i, (a, &p)) in col.iter().zip(lam.iter()).enumerate() {
                if i % 2 == 0 {
                    e += *a * p;
                } else {
                    o += *a * p;
                }
            }
            even[m] = e;
            odd[m] = o;
        }
    }

    // ========================================================================
    // 截断
    // ========================================================================

    /// 将谱场超出截断的系数清零，幂等
    pub fn truncate(&self, spec: &mut SpectralField<S>) -> TransformResult<()> {
        self.check_spectral(spec)?;
        spec.truncate();
        Ok(())
    }
}

#[inline]
fn zero<S: TransformScalar>() -> Complex<S> {
    Complex::new(S::ZERO, S::ZERO)
}

/// 将一层网格值按纬圈拆成互不重叠的可变切片
fn split_rings<'a, T>(mut data: &'a mut [T], nlons: &[usize]) -> Vec<&'a mut [T]> {
    let mut rings = Vec::with_capacity(nlons.len());
    for &n in nlons {
        let (head, tail) = std::mem::take(&mut data).split_at_mut(n);
        rings.push(head);
        data = tail;
    }
    rings
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_config::GridFamily;

    #[test]
    fn test_constant_mode() {
        let t = SpectralTransform::<f64>::new(
            Truncation::triangular(5),
            GridTopology::new(GridFamily::OctahedralGaussian, 4).unwrap(),
            TransformOptions::default(),
        )
        .unwrap();
        let mut spec = t.spectral_zeros(1);
        spec.set(0, 0, Complex::new(1.0, 0.0));
        let grid = t.inverse(&spec).unwrap();
        let c = 1.0 / (4.0 * std::f64::consts::PI).sqrt();
        assert!(grid.as_slice().iter().all(|&v| (v - c).abs() < 1e-14));
    }

    #[test]
    fn test_split_rings() {
        let mut values = vec![0.0; 10];
        let rings = split_rings(&mut values, &[4, 2, 4]);
        assert_eq!(rings.iter().map(|r| r.len()).collect::<Vec<_>>(), vec![4, 2, 4]);
    }

    #[test]
    fn test_shape_mismatch_leaves_output_untouched() {
        let t = SpectralTransform::<f64>::new(
            Truncation::triangular(5),
            GridTopology::new(GridFamily::FullGaussian, 4).unwrap(),
            TransformOptions::default(),
        )
        .unwrap();
        let grid = t.grid_zeros(1);
        let mut wrong = SpectralField::zeros(Truncation::triangular(6), 1);
        wrong.set(1, 1, Complex::new(7.0, 0.0));
        assert!(matches!(
            t.forward_into(&grid, &mut wrong),
            Err(TransformError::ShapeMismatch { .. })
        ));
        assert_eq!(wrong.get(1, 1), Some(Complex::new(7.0, 0.0)));

        let mut levels = t.spectral_zeros(2);
        assert!(t.forward_into(&grid, &mut levels).is_err());
    }
}
