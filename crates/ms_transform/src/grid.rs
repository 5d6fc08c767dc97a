// crates/ms_transform/src/grid.rs

//! 网格拓扑描述
//!
//! 所有网格族都由同一个数据驱动的描述符表示：纬圈数、每圈经度点数、
//! 纬度、求积权重、每圈首点经度偏移以及赤道对称标志。变换算法只读取
//! 描述符，不区分网格族。
//!
//! 纬圈从北到南编号，`nlat_half` 是北半球（含赤道圈）的纬圈数。

use std::f64::consts::PI;

use ms_config::GridFamily;
use ms_foundation::Tolerance;

use crate::error::{TransformError, TransformResult};
use crate::quadrature;

/// 对称性检测容差
const SYMMETRY_TOL: f64 = 1e-12;

/// 纬向求积类型，决定求积精确的多项式次数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadratureKind {
    /// Gauss-Legendre：对次数 ≤ 2·nlat-1 精确
    Gauss,
    /// Clenshaw-Curtis（Fejér 第二类）：对次数 ≤ nlat-1 精确
    Clenshaw,
    /// 等面积权重：近似求积
    EqualArea,
    /// 用户提供的权重
    Custom,
}

/// 网格拓扑描述符
#[derive(Debug, Clone, PartialEq)]
pub struct GridTopology {
    family: Option<GridFamily>,
    quadrature: QuadratureKind,
    nlat_half: usize,
    /// 每圈经度点数
    nlons: Vec<usize>,
    /// 每圈在扁平数组中的起始位置，长度 nlat+1
    ring_offsets: Vec<usize>,
    /// sin(纬度)
    z: Vec<f64>,
    /// 纬度 [rad]
    latitudes: Vec<f64>,
    /// 求积权重（∫dz）
    weights: Vec<f64>,
    /// 每圈首点经度 [rad]
    lon_offsets: Vec<f64>,
    symmetric: bool,
}

impl GridTopology {
    /// 按网格族和 nlat_half 构建
    pub fn new(family: GridFamily, nlat_half: usize) -> TransformResult<Self> {
        if nlat_half == 0 {
            return Err(TransformError::InvalidGrid("nlat_half 必须为正".into()));
        }
        if family.requires_even_nlat_half() && nlat_half % 2 != 0 {
            return Err(TransformError::InvalidGrid(format!(
                "{} 要求 nlat_half 为偶数, 实际 {}",
                family, nlat_half
            )));
        }

        let (z, weights, reduced_nlons, lon_offsets, quadrature) = match family {
            GridFamily::FullGaussian | GridFamily::OctahedralGaussian => {
                let (z, w) = quadrature::gauss_legendre(2 * nlat_half)?;
                let nlons = mirror(&octahedral_nlons(nlat_half), false);
                let offsets = vec![0.0; z.len()];
                (z, w, nlons, offsets, QuadratureKind::Gauss)
            }
            GridFamily::FullClenshaw | GridFamily::OctahedralClenshaw => {
                let (z, w) = quadrature::clenshaw_curtis(2 * nlat_half - 1)?;
                let nlons = mirror(&octahedral_nlons(nlat_half), true);
                let offsets = vec![0.0; z.len()];
                (z, w, nlons, offsets, QuadratureKind::Clenshaw)
            }
            GridFamily::HEALPix | GridFamily::FullHEALPix => {
                let (z, nlons, offsets) = healpix_rings(nlat_half / 2);
                let w = quadrature::equal_area(&nlons);
                (z, w, nlons, offsets, QuadratureKind::EqualArea)
            }
            GridFamily::OctaHEALPix | GridFamily::FullOctaHEALPix => {
                let (z, nlons, offsets) = octahealpix_rings(nlat_half);
                let w = quadrature::equal_area(&nlons);
                (z, w, nlons, offsets, QuadratureKind::EqualArea)
            }
        };

        // 全网格沿用约化网格的纬度与权重，每圈 4·nlat_half 点，无经度偏移
        let (nlons, lon_offsets) = if family.is_full() {
            (vec![4 * nlat_half; z.len()], vec![0.0; z.len()])
        } else {
            (reduced_nlons, lon_offsets)
        };

        let mut grid = Self::assemble(z, weights, nlons, lon_offsets, quadrature)?;
        grid.family = Some(family);
        grid.nlat_half = nlat_half;
        log::debug!(
            "构建网格 {}: nlat_half={}, nlat={}, npoints={}",
            family,
            nlat_half,
            grid.nlat(),
            grid.npoints()
        );
        Ok(grid)
    }

    /// 由截断阶数和去混淆因子确定分辨率
    ///
    /// nlat_half = roundup_fft(⌈((1+dealiasing)·trunc+1)/4⌉)
    pub fn from_truncation(
        family: GridFamily,
        trunc: usize,
        dealiasing: f64,
    ) -> TransformResult<Self> {
        Self::new(family, nlat_half_for(family, trunc, dealiasing)?)
    }

    /// 用户自定义拓扑（纬度单位 rad，由北到南）
    ///
    /// 对称性由镜像布局自动检测。
    pub fn custom(
        latitudes: Vec<f64>,
        nlons: Vec<usize>,
        weights: Vec<f64>,
        lon_offsets: Vec<f64>,
    ) -> TransformResult<Self> {
        let z = latitudes.iter().map(|lat| lat.sin()).collect();
        Self::assemble(z, weights, nlons, lon_offsets, QuadratureKind::Custom)
    }

    fn assemble(
        z: Vec<f64>,
        weights: Vec<f64>,
        nlons: Vec<usize>,
        lon_offsets: Vec<f64>,
        quadrature: QuadratureKind,
    ) -> TransformResult<Self> {
        let nlat = z.len();
        if nlat == 0 {
            return Err(TransformError::InvalidGrid("纬圈数必须为正".into()));
        }
        TransformError::check("ring point counts", nlat, nlons.len())?;
        TransformError::check("quadrature weights", nlat, weights.len())?;
        TransformError::check("longitude offsets", nlat, lon_offsets.len())?;

        if nlons.iter().any(|&n| n == 0) {
            return Err(TransformError::InvalidGrid("每圈经度点数必须为正".into()));
        }
        if z.iter().any(|v| !v.is_finite() || v.abs() > 1.0) {
            return Err(TransformError::InvalidGrid("纬度必须在 [-π/2, π/2] 内".into()));
        }
        if z.windows(2).any(|p| p[0] <= p[1]) {
            return Err(TransformError::InvalidGrid("纬圈必须由北向南严格排列".into()));
        }
        if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(TransformError::InvalidGrid("求积权重必须为有限正数".into()));
        }

        let mut ring_offsets = Vec::with_capacity(nlat + 1);
        let mut offset = 0;
        for &n in &nlons {
            ring_offsets.push(offset);
            offset += n;
        }
        ring_offsets.push(offset);

        let symmetric = is_mirror_symmetric(&z, &weights, &nlons, &lon_offsets);
        let latitudes = z.iter().map(|v: &f64| v.asin()).collect();

        Ok(Self {
            family: None,
            quadrature,
            nlat_half: (nlat + 1) / 2,
            nlons,
            ring_offsets,
            z,
            latitudes,
            weights,
            lon_offsets,
            symmetric,
        })
    }

    /// 网格族，自定义拓扑为 None
    pub fn family(&self) -> Option<GridFamily> {
        self.family
    }

    /// 求积类型
    pub fn quadrature(&self) -> QuadratureKind {
        self.quadrature
    }

    /// 北半球纬圈数（含赤道圈）
    pub fn nlat_half(&self) -> usize {
        self.nlat_half
    }

    /// 纬圈数
    #[inline]
    pub fn nlat(&self) -> usize {
        self.nlons.len()
    }

    /// 总网格点数
    #[inline]
    pub fn npoints(&self) -> usize {
        self.ring_offsets[self.nlat()]
    }

    /// 第 j 圈经度点数
    #[inline]
    pub fn nlon(&self, j: usize) -> usize {
        self.nlons[j]
    }

    /// 所有纬圈的经度点数
    pub fn nlons(&self) -> &[usize] {
        &self.nlons
    }

    /// 第 j 圈在扁平数组中的范围
    #[inline]
    pub fn ring_range(&self, j: usize) -> std::ops::Range<usize> {
        self.ring_offsets[j]..self.ring_offsets[j + 1]
    }

    /// sin(纬度)
    pub fn z(&self) -> &[f64] {
        &self.z
    }

    /// 纬度 [rad]
    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    /// 求积权重
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// 第 j 圈首点经度 [rad]
    pub fn lon_offset(&self, j: usize) -> f64 {
        self.lon_offsets[j]
    }

    /// 第 j 圈第 i 点的经度 [rad]
    pub fn longitude(&self, j: usize, i: usize) -> f64 {
        self.lon_offsets[j] + 2.0 * PI * i as f64 / self.nlons[j] as f64
    }

    /// 是否关于赤道镜像对称
    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// 求积精确的最高多项式次数，近似求积为 None
    pub fn exact_degree(&self) -> Option<usize> {
        match self.quadrature {
            QuadratureKind::Gauss => Some(2 * self.nlat() - 1),
            QuadratureKind::Clenshaw => Some(self.nlat() - 1),
            QuadratureKind::EqualArea | QuadratureKind::Custom => None,
        }
    }

    /// 第 j 圈可表示的最高纬向波数（严格低于 Nyquist）
    #[inline]
    pub fn max_wavenumber(&self, j: usize) -> usize {
        (self.nlons[j] - 1) / 2
    }

    /// 两拓扑的纬圈布局是否一致
    ///
    /// 点数、纬度、求积权重与经度偏移都须一致，后三者按 `SYMMETRY_TOL` 比较。
    pub fn same_layout(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let tol = Tolerance::new(SYMMETRY_TOL, SYMMETRY_TOL);
        let close = |a: &[f64], b: &[f64]| a.len() == b.len() && a.iter().zip(b).all(|(x, y)| tol.approx_eq(*x, *y));
        self.nlons == other.nlons
            && close(&self.z, &other.z)
            && close(&self.weights, &other.weights)
            && close(&self.lon_offsets, &other.lon_offsets)
    }
}

/// 由截断阶数和去混淆因子计算 nlat_half
pub fn nlat_half_for(family: GridFamily, trunc: usize, dealiasing: f64) -> TransformResult<usize> {
    if !(dealiasing.is_finite() && dealiasing >= 1.0) {
        return Err(TransformError::InvalidParameter {
            name: "dealiasing",
            value: dealiasing,
            reason: "去混淆因子必须 >= 1",
        });
    }
    let raw = (((1.0 + dealiasing) * trunc as f64 + 1.0) / 4.0).ceil() as usize;
    Ok(roundup_fft(raw.max(1), family.requires_even_nlat_half()))
}

/// 向上取整到 2^a·3^b·5^c 形式的 FFT 友好整数
pub fn roundup_fft(n: usize, even: bool) -> usize {
    let mut k = n.max(1);
    loop {
        if is_fft_friendly(k) && (!even || k % 2 == 0) {
            return k;
        }
        k += 1;
    }
}

fn is_fft_friendly(mut n: usize) -> bool {
    for p in [2, 3, 5] {
        while n % p == 0 {
            n /= p;
        }
    }
    n == 1
}

/// 八面体网格北半球每圈点数：16 + 4j，j = 1..=nlat_half
fn octahedral_nlons(nlat_half: usize) -> Vec<usize> {
    (1..=nlat_half).map(|j| 16 + 4 * j).collect()
}

/// 北半球纬圈镜像到南半球，`with_equator` 时北半球最后一圈是赤道圈
fn mirror<T: Copy>(north: &[T], with_equator: bool) -> Vec<T> {
    let mut rings = north.to_vec();
    let skip = usize::from(with_equator);
    rings.extend(north.iter().rev().skip(skip));
    rings
}

/// HEALPix 纬圈：nside 为分辨率参数，共 4·nside-1 圈
fn healpix_rings(nside: usize) -> (Vec<f64>, Vec<usize>, Vec<f64>) {
    let n = nside as f64;
    let mut z = Vec::with_capacity(2 * nside);
    let mut nlons = Vec::with_capacity(2 * nside);
    let mut offsets = Vec::with_capacity(2 * nside);

    // 极冠
    for i in 1..nside {
        let i_f = i as f64;
        z.push(1.0 - i_f * i_f / (3.0 * n * n));
        nlons.push(4 * i);
        offsets.push(PI / (4.0 * i_f));
    }
    // 赤道带（至赤道圈 i = 2·nside）
    for i in nside..=2 * nside {
        z.push(4.0 / 3.0 - 2.0 * i as f64 / (3.0 * n));
        nlons.push(4 * nside);
        let shifted = (i - nside) % 2 == 0;
        offsets.push(if shifted { PI / (4.0 * n) } else { 0.0 });
    }

    let z_south = z.iter().map(|v| -v).collect::<Vec<_>>();
    let mut z_all = z.clone();
    z_all.extend(z_south.iter().rev().skip(1));
    (z_all, mirror(&nlons, true), mirror(&offsets, true))
}

/// 八面体 HEALPix 纬圈：每圈 4j 点，j = 1..=nlat_half，共 2·nlat_half-1 圈
fn octahealpix_rings(nlat_half: usize) -> (Vec<f64>, Vec<usize>, Vec<f64>) {
    let nh = nlat_half as f64;
    let z_north = (1..=nlat_half)
        .map(|j| 1.0 - (j * j) as f64 / (nh * nh))
        .collect::<Vec<_>>();
    let nlons = (1..=nlat_half).map(|j| 4 * j).collect::<Vec<_>>();
    let offsets = (1..=nlat_half)
        .map(|j| PI / (4.0 * j as f64))
        .collect::<Vec<_>>();

    let mut z = z_north.clone();
    z.extend(z_north.iter().rev().skip(1).map(|v| -v));
    (z, mirror(&nlons, true), mirror(&offsets, true))
}

fn is_mirror_symmetric(z: &[f64], weights: &[f64], nlons: &[usize], offsets: &[f64]) -> bool {
    let nlat = z.len();
    let tol = Tolerance::new(SYMMETRY_TOL, SYMMETRY_TOL);
    (0..(nlat + 1) / 2).all(|j| {
        let s = nlat - 1 - j;
        tol.approx_eq(z[j], -z[s])
            && tol.approx_eq(weights[j], weights[s])
            && nlons[j] == nlons[s]
            && tol.approx_eq(offsets[j], offsets[s])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundup_fft() {
        assert_eq!(roundup_fft(7, false), 8);
        assert_eq!(roundup_fft(24, false), 24);
        assert_eq!(roundup_fft(31, false), 32);
        assert_eq!(roundup_fft(25, true), 30);
        assert_eq!(roundup_fft(0, false), 1);
    }

    #[test]
    fn test_nlat_half_for() {
        // T31 二次网格：⌈94/4⌉ = 24
        assert_eq!(nlat_half_for(GridFamily::FullGaussian, 31, 2.0).unwrap(), 24);
        // T31 三次网格：⌈125/4⌉ = 32
        assert_eq!(nlat_half_for(GridFamily::FullClenshaw, 31, 3.0).unwrap(), 32);
        assert!(nlat_half_for(GridFamily::FullGaussian, 31, 0.5).is_err());
    }

    #[test]
    fn test_full_gaussian_layout() {
        let g = GridTopology::new(GridFamily::FullGaussian, 8).unwrap();
        assert_eq!(g.nlat(), 16);
        assert!(g.nlons().iter().all(|&n| n == 32));
        assert_eq!(g.npoints(), 16 * 32);
        assert!(g.is_symmetric());
        assert_eq!(g.exact_degree(), Some(31));
        assert!((g.weights().iter().sum::<f64>() - 2.0).abs() < 1e-13);
    }

    #[test]
    fn test_octahedral_layout() {
        let g = GridTopology::new(GridFamily::OctahedralGaussian, 4).unwrap();
        assert_eq!(g.nlons(), &[20, 24, 28, 32, 32, 28, 24, 20]);
        let c = GridTopology::new(GridFamily::OctahedralClenshaw, 4).unwrap();
        assert_eq!(c.nlons(), &[20, 24, 28, 32, 28, 24, 20]);
        assert_eq!(c.z()[3], 0.0);
        assert!(c.is_symmetric());
    }

    #[test]
    fn test_healpix_layout() {
        let g = GridTopology::new(GridFamily::HEALPix, 4).unwrap();
        // nside = 2: 4·2-1 = 7 圈，共 12·nside² = 48 点
        assert_eq!(g.nlat(), 7);
        assert_eq!(g.nlons(), &[4, 8, 8, 8, 8, 8, 4]);
        assert_eq!(g.npoints(), 48);
        assert!(g.is_symmetric());
        assert!((g.z()[0] - (1.0 - 1.0 / 12.0)).abs() < 1e-15);
        assert!((g.z()[1] - 2.0 / 3.0).abs() < 1e-15);
        assert!(GridTopology::new(GridFamily::HEALPix, 3).is_err());
    }

    #[test]
    fn test_octahealpix_layout() {
        let g = GridTopology::new(GridFamily::OctaHEALPix, 3).unwrap();
        assert_eq!(g.nlons(), &[4, 8, 12, 8, 4]);
        assert_eq!(g.npoints(), 4 * 3 * 3);
        assert_eq!(g.z()[2], 0.0);
    }

    #[test]
    fn test_full_variants_share_latitudes() {
        let reduced = GridTopology::new(GridFamily::OctaHEALPix, 6).unwrap();
        let full = GridTopology::new(GridFamily::FullOctaHEALPix, 6).unwrap();
        assert_eq!(reduced.z(), full.z());
        assert_eq!(reduced.weights(), full.weights());
        assert!(full.nlons().iter().all(|&n| n == 24));
        assert!(!reduced.same_layout(&full));
    }

    #[test]
    fn test_same_layout_compares_offsets_and_weights() {
        let g = GridTopology::new(GridFamily::FullGaussian, 4).unwrap();
        let nlat = g.nlat();
        let offsets: Vec<f64> = (0..nlat).map(|j| g.lon_offset(j)).collect();
        let copy = GridTopology::custom(
            g.latitudes().to_vec(),
            g.nlons().to_vec(),
            g.weights().to_vec(),
            offsets.clone(),
        )
        .unwrap();
        assert!(g.same_layout(&copy));

        let shifted = GridTopology::custom(
            g.latitudes().to_vec(),
            g.nlons().to_vec(),
            g.weights().to_vec(),
            vec![0.7; nlat],
        )
        .unwrap();
        assert!(!g.same_layout(&shifted));

        let flat = GridTopology::custom(
            g.latitudes().to_vec(),
            g.nlons().to_vec(),
            vec![2.0 / nlat as f64; nlat],
            offsets.clone(),
        )
        .unwrap();
        assert!(!g.same_layout(&flat));
    }

    #[test]
    fn test_all_families_valid() {
        for family in GridFamily::ALL {
            let g = GridTopology::from_truncation(family, 21, 2.0).unwrap();
            assert!(g.is_symmetric(), "{}", family);
            assert!((g.weights().iter().sum::<f64>() - 2.0).abs() < 1e-12, "{}", family);
            assert_eq!(g.family(), Some(family));
        }
    }

    #[test]
    fn test_custom_topology() {
        let lats = vec![0.5, 0.0, -0.5];
        let g = GridTopology::custom(lats, vec![8, 8, 8], vec![0.5, 1.0, 0.5], vec![0.0; 3]).unwrap();
        assert!(g.is_symmetric());
        assert_eq!(g.family(), None);

        let asym = GridTopology::custom(
            vec![0.6, 0.0, -0.5],
            vec![8, 8, 8],
            vec![0.5, 1.0, 0.5],
            vec![0.0; 3],
        )
        .unwrap();
        assert!(!asym.is_symmetric());

        let bad = GridTopology::custom(vec![-0.5, 0.5], vec![8, 8], vec![1.0, 1.0], vec![0.0; 2]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_longitudes() {
        let g = GridTopology::new(GridFamily::HEALPix, 4).unwrap();
        assert!((g.longitude(0, 0) - PI / 4.0).abs() < 1e-15);
        assert!((g.longitude(0, 1) - 3.0 * PI / 4.0).abs() < 1e-15);
    }
}
