// crates/ms_transform/src/fourier.rs

//! 纬圈上的实值 FFT
//!
//! 每种纬圈长度只规划一次，正/逆计划在所有线程间共享。
//!
//! 约定（φ_n = φ_0 + 2πn/N）：
//!
//! ```text
//! 正变换  F_m = (1/N) Σ_n f_n e^{-imφ_n}
//! 逆变换  f_n = Re g_0 + 2 Re Σ_{m≥1} g_m e^{imφ_n}
//! ```
//!
//! 超出纬圈可表示范围（m > (N-1)/2）的波数在正变换中置零、在逆变换中丢弃。

use std::collections::HashMap;
use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::grid::GridTopology;
use crate::TransformScalar;

/// 一种纬圈长度的正/逆 FFT 计划
#[derive(Clone)]
struct RingPlan<S: TransformScalar> {
    forward: Arc<dyn Fft<S>>,
    inverse: Arc<dyn Fft<S>>,
}

/// 所有纬圈的 FFT 计划
#[derive(Clone)]
pub struct RingFft<S: TransformScalar> {
    plans: HashMap<usize, RingPlan<S>>,
    /// 每圈首点经度
    lon_offsets: Vec<f64>,
    /// 每圈参与变换的最高波数 min(mmax, (N-1)/2)
    mmax_ring: Vec<usize>,
}

impl<S: TransformScalar> std::fmt::Debug for RingFft<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut lengths = self.plans.keys().copied().collect::<Vec<_>>();
        lengths.sort_unstable();
        f.debug_struct("RingFft")
            .field("lengths", &lengths)
            .field("nrings", &self.mmax_ring.len())
            .finish()
    }
}

impl<S: TransformScalar> RingFft<S> {
    /// 为网格的所有纬圈长度规划 FFT
    pub fn new(topology: &GridTopology, mmax: usize) -> Self {
        let mut planner = FftPlanner::<S>::new();
        let mut plans = HashMap::new();
        for &n in topology.nlons() {
            plans.entry(n).or_insert_with(|| RingPlan {
                forward: planner.plan_fft_forward(n),
                inverse: planner.plan_fft_inverse(n),
            });
        }

        let nlat = topology.nlat();
        let lon_offsets = (0..nlat).map(|j| topology.lon_offset(j)).collect();
        let mmax_ring = (0..nlat)
            .map(|j| mmax.min(topology.max_wavenumber(j)))
            .collect();

        log::debug!("规划 FFT: {} 种纬圈长度", plans.len());
        Self {
            plans,
            lon_offsets,
            mmax_ring,
        }
    }

    /// 第 j 圈参与变换的最高波数
    #[inline]
    pub fn mmax_ring(&self, j: usize) -> usize {
        self.mmax_ring[j]
    }

    /// 第 j 圈：网格值 → 傅里叶系数，`out` 长度为 mmax+1
    pub fn forward(&self, j: usize, values: &[S], out: &mut [Complex<S>]) {
        let n = values.len();
        let plan = &self.plans[&n];
        let mut buf = values
            .iter()
            .map(|&v| Complex::new(v, S::ZERO))
            .collect::<Vec<_>>();
        plan.forward.process(&mut buf);

        let scale = S::ONE / S::from_usize_lossy(n);
        let phi0 = self.lon_offsets[j];
        let mr = self.mmax_ring[j];
        for (m, c) in out.iter_mut().enumerate() {
            *c = if m <= mr {
                rotate(buf[m] * scale, -(m as f64) * phi0)
            } else {
                Complex::new(S::ZERO, S::ZERO)
            };
        }
    }

    /// 第 j 圈：傅里叶系数 → 网格值
    pub fn inverse(&self, j: usize, coeffs: &[Complex<S>], out: &mut [S]) {
        let n = out.len();
        let plan = &self.plans[&n];
        let mut buf = vec![Complex::new(S::ZERO, S::ZERO); n];

        let phi0 = self.lon_offsets[j];
        buf[0] = Complex::new(coeffs[0].re, S::ZERO);
        for m in 1..=self.mmax_ring[j].min(coeffs.len() - 1) {
            let c = rotate(coeffs[m], m as f64 * phi0);
            buf[m] = c;
            buf[n - m] = c.conj();
        }
        plan.inverse.process(&mut buf);

        for (v, c) in out.iter_mut().zip(&buf) {
            *v = c.re;
        }
    }
}

/// 乘以 e^{iθ}，θ = 0 时原样返回
#[inline]
fn rotate<S: TransformScalar>(c: Complex<S>, theta: f64) -> Complex<S> {
    if theta == 0.0 {
        c
    } else {
        c * Complex::from_polar(S::ONE, S::from_f64_lossy(theta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_config::GridFamily;
    use std::f64::consts::PI;

    #[test]
    fn test_single_wave_roundtrip() {
        let grid = GridTopology::new(GridFamily::HEALPix, 4).unwrap();
        let fft = RingFft::<f64>::new(&grid, 5);
        // 第 0 圈 4 点，只能表示 m ≤ 1
        assert_eq!(fft.mmax_ring(0), 1);
        assert_eq!(fft.mmax_ring(3), 3);

        let j = 3;
        let n = grid.nlon(j);
        let values = (0..n)
            .map(|i| 1.0 + 0.5 * (2.0 * grid.longitude(j, i)).cos())
            .collect::<Vec<_>>();
        let mut coeffs = vec![Complex::new(0.0, 0.0); 6];
        fft.forward(j, &values, &mut coeffs);
        assert!((coeffs[0].re - 1.0).abs() < 1e-14);
        assert!((coeffs[2] - Complex::new(0.25, 0.0)).norm() < 1e-14);
        assert!(coeffs[1].norm() < 1e-14);

        let mut back = vec![0.0; n];
        fft.inverse(j, &coeffs, &mut back);
        for (a, b) in values.iter().zip(&back) {
            assert!((a - b).abs() < 1e-13);
        }
    }

    #[test]
    fn test_offset_ring_phase() {
        let grid = GridTopology::new(GridFamily::HEALPix, 4).unwrap();
        let fft = RingFft::<f64>::new(&grid, 1);
        // 第 0 圈首点经度 π/4
        let values = (0..4)
            .map(|i| grid.longitude(0, i).sin())
            .collect::<Vec<_>>();
        let mut coeffs = vec![Complex::new(0.0, 0.0); 2];
        fft.forward(0, &values, &mut coeffs);
        // sin φ = (e^{iφ} - e^{-iφ})/2i → F_1 = -i/2
        assert!((coeffs[1] - Complex::new(0.0, -0.5)).norm() < 1e-14);
        assert!((values[0] - (PI / 4.0).sin()).abs() < 1e-15);
    }
}
