// crates/ms_transform/tests/transform_tests.rs
//!
//! 谱变换正确性测试
//!
//! 覆盖全部网格族的往返精度、常数模态、截断幂等、两种 Legendre 策略的一致性
//! 以及并行与串行结果逐位相同。

use std::f64::consts::PI;
use std::sync::Arc;

use ms_config::{GridFamily, LegendreStrategy, SpectralConfig};
use ms_foundation::Tolerance;
use ms_transform::{
    GridField, GridTopology, SpectralField, SpectralTransform, TransformError, TransformOptions,
    Truncation,
};
use num_complex::Complex;

/// 随机带限谱场：m = 0 的系数为实数，保护行为零
fn random_spectral(truncation: &Truncation, nlev: usize, seed: u64) -> SpectralField<f64> {
    let mut rng_state = seed;
    let mut next_rand = || -> f64 {
        rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((rng_state >> 33) as f64) / (u32::MAX as f64) - 0.5
    };

    let mut field = SpectralField::zeros(truncation.clone(), nlev);
    for k in 0..nlev {
        for m in 0..=truncation.mmax() {
            for l in m..=truncation.lmax() {
                let im = if m == 0 { 0.0 } else { next_rand() };
                field.set_at(l, m, k, Complex::new(next_rand(), im));
            }
        }
    }
    field
}

/// 随机网格场（非带限）
fn random_grid(topology: &Arc<GridTopology>, seed: u64) -> GridField<f64> {
    let mut rng_state = seed;
    let mut next_rand = || -> f64 {
        rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((rng_state >> 33) as f64) / (u32::MAX as f64) - 0.5
    };
    let data = (0..topology.npoints()).map(|_| next_rand()).collect();
    GridField::from_vec(topology.clone(), 1, data).unwrap()
}

fn build(family: GridFamily, trunc: usize, dealiasing: f64, options: TransformOptions) -> SpectralTransform<f64> {
    let topology = GridTopology::from_truncation(family, trunc, dealiasing).unwrap();
    SpectralTransform::new(Truncation::triangular(trunc), topology, options).unwrap()
}

/// 精确求积网格的去混淆因子：Clenshaw 需要三次网格
fn exact_dealiasing(family: GridFamily) -> f64 {
    match family {
        GridFamily::FullClenshaw | GridFamily::OctahedralClenshaw => 3.0,
        _ => 2.0,
    }
}

// ============================================================
// 往返精度
// ============================================================

#[test]
fn test_roundtrip_exact_grids() {
    let trunc = 10;
    for family in [
        GridFamily::FullGaussian,
        GridFamily::OctahedralGaussian,
        GridFamily::FullClenshaw,
        GridFamily::OctahedralClenshaw,
    ] {
        let transform = build(family, trunc, exact_dealiasing(family), TransformOptions::default());
        let spec = random_spectral(transform.truncation(), 1, 42);

        let grid = transform.inverse(&spec).unwrap();
        let back = transform.forward(&grid).unwrap();
        let err = back.max_abs_diff(&spec).unwrap();
        assert!(err < 1e-11, "{}: 往返误差 {:.3e}", family, err);
        assert!(back.approx_eq(&spec, &Tolerance::for_truncation(trunc)), "{}", family);
    }
}

#[test]
fn test_roundtrip_octahedral_t31() {
    let transform = build(GridFamily::OctahedralGaussian, 31, 2.0, TransformOptions::default());
    assert_eq!(transform.topology().nlat(), 48);

    let spec = random_spectral(transform.truncation(), 1, 7);
    let back = transform.forward(&transform.inverse(&spec).unwrap()).unwrap();
    let err = back.max_abs_diff(&spec).unwrap();
    assert!(err < 1e-7, "往返误差 {:.3e}", err);
}

#[test]
fn test_roundtrip_asymmetric_custom_grid() {
    // Gauss 纬圈，北半球整体旋转，走非对称路径
    let nlat = 18;
    let (z, weights) = ms_transform::quadrature::gauss_legendre(nlat).unwrap();
    let latitudes: Vec<f64> = z.iter().map(|v| v.asin()).collect();
    let offsets: Vec<f64> = z.iter().map(|&v| if v > 0.0 { 0.3 } else { 0.0 }).collect();
    let topology = GridTopology::custom(latitudes, vec![36; nlat], weights, offsets).unwrap();
    assert!(!topology.is_symmetric());

    let transform =
        SpectralTransform::<f64>::new(Truncation::triangular(8), topology, TransformOptions::default()).unwrap();
    let spec = random_spectral(transform.truncation(), 2, 11);
    let back = transform.forward(&transform.inverse(&spec).unwrap()).unwrap();
    let err = back.max_abs_diff(&spec).unwrap();
    assert!(err < 1e-11, "往返误差 {:.3e}", err);
}

#[test]
fn test_roundtrip_healpix_families() {
    // 等面积求积只是近似的，误差随分辨率缓慢下降
    let trunc = 10;
    for family in [
        GridFamily::HEALPix,
        GridFamily::OctaHEALPix,
        GridFamily::FullHEALPix,
        GridFamily::FullOctaHEALPix,
    ] {
        let transform = build(family, trunc, 3.0, TransformOptions::default());
        let spec = random_spectral(transform.truncation(), 1, 42);

        let back = transform.forward(&transform.inverse(&spec).unwrap()).unwrap();
        let err = back.max_abs_diff(&spec).unwrap();
        assert!(err < 0.1, "{}: 往返误差 {:.3e}", family, err);
        // 常数模态总能被保持
        let a00 = back.get(0, 0).unwrap();
        assert!((a00 - spec.get(0, 0).unwrap()).norm() < 0.1, "{}", family);
    }
}

#[test]
fn test_projection_does_not_drift() {
    let transform = build(GridFamily::OctahedralGaussian, 15, 2.0, TransformOptions::default());
    let grid = random_grid(transform.topology(), 99);

    let spec1 = transform.forward(&grid).unwrap();
    let grid1 = transform.inverse(&spec1).unwrap();
    let spec2 = transform.forward(&grid1).unwrap();
    let grid2 = transform.inverse(&spec2).unwrap();

    assert!(spec2.max_abs_diff(&spec1).unwrap() < 1e-12);
    assert!(grid2.max_abs_diff(&grid1).unwrap() < 1e-12);
}

// ============================================================
// 解析场
// ============================================================

#[test]
fn test_constant_mode_is_positive() {
    for family in GridFamily::ALL {
        let transform = build(family, 5, exact_dealiasing(family), TransformOptions::default());
        let mut spec = transform.spectral_zeros(1);
        spec.set(0, 0, Complex::new(1.0, 0.0));

        let grid = transform.inverse(&spec).unwrap();
        let expected = 1.0 / (4.0 * PI).sqrt();
        for &v in grid.as_slice() {
            assert!(v > 0.0);
            assert!((v - expected).abs() < 1e-13, "{}: {}", family, v);
        }
    }
}

#[test]
fn test_analytic_degree_one() {
    let transform = build(GridFamily::FullGaussian, 8, 2.0, TransformOptions::default());

    // sin(lat) = z = √(4π/3) · Y_10
    let field = GridField::from_fn(transform.topology().clone(), |lat, _| lat.sin());
    let spec = transform.forward(&field).unwrap();
    let a10 = spec.get(1, 0).unwrap();
    assert!((a10.re - (4.0 * PI / 3.0).sqrt()).abs() < 1e-13);

    // cos(lat)·cos(lon) 只落在 (1,1)
    let field = GridField::from_fn(transform.topology().clone(), |lat, lon| lat.cos() * lon.cos());
    let spec = transform.forward(&field).unwrap();
    for (l, m, idx) in spec.truncation().iter() {
        let v = spec.as_slice()[idx];
        if (l, m) != (1, 1) {
            assert!(v.norm() < 1e-13, "({}, {}) = {}", l, m, v);
        } else {
            assert!(v.norm() > 0.1);
            assert!(v.im.abs() < 1e-13);
        }
    }
}

#[test]
fn test_grid_mean_matches_constant_mode() {
    let transform = build(GridFamily::OctahedralGaussian, 12, 2.0, TransformOptions::default());
    let grid = random_grid(transform.topology(), 5);
    let spec = transform.forward(&grid).unwrap();

    // 全球平均 = a00 · Y_00
    let mean = spec.get(0, 0).unwrap().re / (4.0 * PI).sqrt();
    assert!((grid.mean(0) - mean).abs() < 1e-13);
}

// ============================================================
// 截断
// ============================================================

#[test]
fn test_truncate_idempotent() {
    let transform = build(GridFamily::FullGaussian, 8, 2.0, TransformOptions::default());
    let mut spec = random_spectral(transform.truncation(), 2, 3);
    let lmax = transform.truncation().lmax();
    for m in 0..=transform.truncation().mmax() {
        let idx = transform.truncation().index(lmax + 1, m).unwrap();
        spec.as_mut_slice()[idx] = Complex::new(1.0, 1.0);
    }

    transform.truncate(&mut spec).unwrap();
    let once = spec.clone();
    transform.truncate(&mut spec).unwrap();
    assert_eq!(spec, once);

    for m in 0..=transform.truncation().mmax() {
        assert_eq!(spec.get(lmax + 1, m), Some(Complex::new(0.0, 0.0)));
    }

    let mut other = SpectralField::<f64>::zeros(Truncation::triangular(4), 1);
    assert!(transform.truncate(&mut other).is_err());
}

#[test]
fn test_forward_leaves_guard_row_zero() {
    let transform = build(GridFamily::OctahedralGaussian, 8, 2.0, TransformOptions::default());
    let spec = transform.forward(&random_grid(transform.topology(), 11)).unwrap();
    let lmax = transform.truncation().lmax();
    for m in 0..=transform.truncation().mmax() {
        assert_eq!(spec.get(lmax + 1, m), Some(Complex::new(0.0, 0.0)));
    }
}

// ============================================================
// 策略与并行
// ============================================================

#[test]
fn test_legendre_strategies_agree() {
    for family in [GridFamily::OctahedralGaussian, GridFamily::HEALPix] {
        let pre = build(family, 12, 2.0, TransformOptions::default());
        let lazy = build(family, 12, 2.0, TransformOptions::on_demand());
        assert_eq!(lazy.legendre().strategy(), LegendreStrategy::OnDemand);

        let spec = random_spectral(pre.truncation(), 1, 21);
        let g1 = pre.inverse(&spec).unwrap();
        let g2 = lazy.inverse(&spec).unwrap();
        assert!(g1.max_abs_diff(&g2).unwrap() < 1e-13, "{}", family);

        let s1 = pre.forward(&g1).unwrap();
        let s2 = lazy.forward(&g1).unwrap();
        assert!(s1.approx_eq(&s2, &Tolerance::for_truncation(12)), "{}", family);
    }
}

#[test]
fn test_parallel_is_bitwise_reproducible() {
    let par = build(GridFamily::OctahedralClenshaw, 15, 3.0, TransformOptions::default());
    let seq = build(GridFamily::OctahedralClenshaw, 15, 3.0, TransformOptions::sequential());

    let spec = random_spectral(par.truncation(), 3, 1234);
    let g_par = par.inverse(&spec).unwrap();
    let g_seq = seq.inverse(&spec).unwrap();
    assert_eq!(g_par.as_slice(), g_seq.as_slice());

    let s_par = par.forward(&g_par).unwrap();
    let s_seq = seq.forward(&g_seq).unwrap();
    assert_eq!(s_par.as_slice(), s_seq.as_slice());
}

#[test]
fn test_levels_are_independent() {
    let transform = build(GridFamily::FullGaussian, 6, 2.0, TransformOptions::default());
    let spec = random_spectral(transform.truncation(), 3, 8);
    let grid = transform.inverse(&spec).unwrap();

    for k in 0..3 {
        let single = SpectralField::from_vec(transform.truncation().clone(), 1, spec.layer(k).to_vec()).unwrap();
        let g = transform.inverse(&single).unwrap();
        assert_eq!(g.layer(0), grid.layer(k));
    }
}

// ============================================================
// 形状检查
// ============================================================

#[test]
fn test_shape_mismatch() {
    let transform = build(GridFamily::OctahedralGaussian, 8, 2.0, TransformOptions::default());

    let other = Arc::new(GridTopology::from_truncation(GridFamily::FullGaussian, 8, 2.0).unwrap());
    let wrong_grid = random_grid(&other, 1);
    assert!(matches!(
        transform.forward(&wrong_grid),
        Err(TransformError::ShapeMismatch { .. })
    ));

    let spec = SpectralField::<f64>::zeros(Truncation::triangular(9), 1);
    assert!(matches!(
        transform.inverse(&spec),
        Err(TransformError::ShapeMismatch { .. })
    ));

    let spec = transform.spectral_zeros(2);
    let mut grid = transform.grid_zeros(1);
    grid.as_mut_slice()[0] = 3.0;
    assert!(transform.inverse_into(&spec, &mut grid).is_err());
    assert_eq!(grid.as_slice()[0], 3.0);
}

#[test]
fn test_foreign_offsets_and_weights_rejected() {
    let transform = build(GridFamily::FullGaussian, 8, 2.0, TransformOptions::default());
    let native = transform.topology().clone();
    let nlat = native.nlat();

    // 纬度与点数相同，但经度偏移与权重不同
    let foreign = Arc::new(
        GridTopology::custom(
            native.latitudes().to_vec(),
            native.nlons().to_vec(),
            vec![2.0 / nlat as f64; nlat],
            vec![0.7; nlat],
        )
        .unwrap(),
    );
    let grid = random_grid(&foreign, 3);
    assert!(matches!(
        transform.forward(&grid),
        Err(TransformError::ShapeMismatch { .. })
    ));

    let mut out = GridField::zeros(foreign, 1);
    assert!(matches!(
        transform.inverse_into(&transform.spectral_zeros(1), &mut out),
        Err(TransformError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_shared_topology_instance() {
    let topology = Arc::new(GridTopology::from_truncation(GridFamily::FullClenshaw, 8, 3.0).unwrap());
    let transform =
        SpectralTransform::<f64>::new(Truncation::triangular(8), topology.clone(), TransformOptions::default())
            .unwrap();
    let grid = GridField::from_fn(topology, |lat, lon| lat.sin() + lon.cos());
    assert!(transform.forward(&grid).is_ok());
}

// ============================================================
// 配置与精度
// ============================================================

#[test]
fn test_from_config() {
    let config = SpectralConfig {
        trunc: 21,
        grid: GridFamily::FullGaussian,
        ..Default::default()
    };
    let transform = SpectralTransform::<f64>::from_config(&config).unwrap();
    assert_eq!(transform.truncation().lmax(), 21);
    assert_eq!(transform.topology().nlat_half(), 16);
    assert_eq!(transform.options(), TransformOptions::default());

    let bad = SpectralConfig {
        dealiasing: 0.5,
        ..Default::default()
    };
    assert!(SpectralTransform::<f64>::from_config(&bad).is_err());
}

#[test]
fn test_single_precision_roundtrip() {
    let topology = GridTopology::from_truncation(GridFamily::OctahedralGaussian, 10, 2.0).unwrap();
    let trunc = Truncation::triangular(10);
    let transform = SpectralTransform::<f32>::new(trunc.clone(), topology, TransformOptions::default()).unwrap();

    let spec64 = random_spectral(&trunc, 1, 77);
    let data = spec64
        .as_slice()
        .iter()
        .map(|c| Complex::new(c.re as f32, c.im as f32))
        .collect();
    let spec = SpectralField::from_vec(trunc, 1, data).unwrap();

    let back = transform.forward(&transform.inverse(&spec).unwrap()).unwrap();
    let err = back.max_abs_diff(&spec).unwrap();
    assert!(err < 1e-4, "f32 往返误差 {:.3e}", err);
}
