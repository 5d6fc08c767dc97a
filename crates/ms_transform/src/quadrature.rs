// crates/ms_transform/src/quadrature.rs

//! 纬向求积规则
//!
//! 所有权重满足 ∫_{-1}^{1} f(z) dz ≈ Σ_j w_j f(z_j)，z = sin(纬度)，
//! 纬圈按从北到南排列（z 递减）。

use std::f64::consts::PI;

use crate::error::{TransformError, TransformResult};

/// Newton 迭代上限
const MAX_NEWTON_ITER: usize = 100;

/// Newton 迭代收敛阈值
const NEWTON_TOL: f64 = 1e-15;

/// Gauss-Legendre 节点与权重（n 个点，z 从北到南递减）
///
/// 对次数不超过 2n-1 的多项式精确。
pub fn gauss_legendre(n: usize) -> TransformResult<(Vec<f64>, Vec<f64>)> {
    if n == 0 {
        return Err(TransformError::InvalidGrid("Gauss 求积点数必须为正".into()));
    }

    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    let nf = n as f64;

    // 只求北半球的根，南半球镜像
    for i in 0..(n + 1) / 2 {
        let mut z = (PI * (i as f64 + 0.75) / (nf + 0.5)).cos();
        let mut converged = false;
        for _ in 0..MAX_NEWTON_ITER {
            let (p, dp) = legendre_with_derivative(n, z);
            let dz = p / dp;
            z -= dz;
            if dz.abs() < NEWTON_TOL {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(TransformError::InvalidGrid(format!(
                "Gauss-Legendre 第 {} 个节点未收敛 (n={})",
                i, n
            )));
        }
        let (_, dp) = legendre_with_derivative(n, z);
        let w = 2.0 / ((1.0 - z * z) * dp * dp);

        nodes[i] = z;
        nodes[n - 1 - i] = -z;
        weights[i] = w;
        weights[n - 1 - i] = w;
    }

    // 奇数点时赤道节点精确为 0
    if n % 2 == 1 {
        nodes[n / 2] = 0.0;
    }

    Ok((nodes, weights))
}

/// Legendre 多项式 P_n(z) 及其导数
fn legendre_with_derivative(n: usize, z: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = z;
    for k in 2..=n {
        let kf = k as f64;
        let p2 = ((2.0 * kf - 1.0) * z * p1 - (kf - 1.0) * p0) / kf;
        p0 = p1;
        p1 = p2;
    }
    let p = if n == 0 { 1.0 } else { p1 };
    let dp = n as f64 * (z * p - p0) / (z * z - 1.0);
    (p, dp)
}

/// 不含极点的等角纬度 Clenshaw-Curtis（Fejér 第二类）求积
///
/// 余纬 θ_j = jπ/(n+1)，j = 1..=n；对次数不超过 n-1 的多项式精确。
pub fn clenshaw_curtis(n: usize) -> TransformResult<(Vec<f64>, Vec<f64>)> {
    if n == 0 {
        return Err(TransformError::InvalidGrid("Clenshaw-Curtis 求积点数必须为正".into()));
    }

    let np1 = (n + 1) as f64;
    let half = (n + 1) / 2;
    let mut nodes = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    for j in 1..=n {
        let theta = j as f64 * PI / np1;
        let sum: f64 = (1..=half)
            .map(|k| {
                let odd = (2 * k - 1) as f64;
                (odd * theta).sin() / odd
            })
            .sum();
        nodes.push(theta.cos());
        weights.push(4.0 * theta.sin() / np1 * sum);
    }

    if n % 2 == 1 {
        nodes[n / 2] = 0.0;
    }

    Ok((nodes, weights))
}

/// 等面积网格的纬圈权重：w_j = 2·nlon_j / npoints
pub fn equal_area(nlons: &[usize]) -> Vec<f64> {
    let npoints: usize = nlons.iter().sum();
    nlons
        .iter()
        .map(|&n| 2.0 * n as f64 / npoints as f64)
        .collect()
}
