// crates/ms_transform/src/field.rs

//! 网格场
//!
//! 按纬圈存储的实值场，各层连续存放。每个场持有其网格拓扑的共享引用，
//! 变换时据此检查布局是否与变换上下文一致。

use std::sync::Arc;

use num_traits::Float;

use crate::error::{TransformError, TransformResult};
use crate::grid::GridTopology;
use crate::TransformScalar;

/// 网格场
#[derive(Debug, Clone)]
pub struct GridField<S: TransformScalar> {
    topology: Arc<GridTopology>,
    nlev: usize,
    data: Vec<S>,
}

impl<S: TransformScalar> GridField<S> {
    /// 全零网格场
    pub fn zeros(topology: Arc<GridTopology>, nlev: usize) -> Self {
        let len = topology.npoints() * nlev;
        Self {
            topology,
            nlev,
            data: vec![S::ZERO; len],
        }
    }

    /// 从扁平数据构建（层连续，层内纬圈由北向南）
    pub fn from_vec(topology: Arc<GridTopology>, nlev: usize, data: Vec<S>) -> TransformResult<Self> {
        TransformError::check("grid points", topology.npoints() * nlev, data.len())?;
        Ok(Self {
            topology,
            nlev,
            data,
        })
    }

    /// 由函数 f(纬度, 经度) 采样单层场（弧度）
    pub fn from_fn(topology: Arc<GridTopology>, f: impl Fn(f64, f64) -> f64) -> Self {
        let mut data = Vec::with_capacity(topology.npoints());
        for j in 0..topology.nlat() {
            let lat = topology.latitudes()[j];
            for i in 0..topology.nlon(j) {
                data.push(S::from_f64_lossy(f(lat, topology.longitude(j, i))));
            }
        }
        Self {
            topology,
            nlev: 1,
            data,
        }
    }

    /// 网格拓扑
    #[inline]
    pub fn topology(&self) -> &Arc<GridTopology> {
        &self.topology
    }

    /// 层数
    #[inline]
    pub fn nlev(&self) -> usize {
        self.nlev
    }

    /// 全部数据
    #[inline]
    pub fn as_slice(&self) -> &[S] {
        &self.data
    }

    /// 全部数据（可变）
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [S] {
        &mut self.data
    }

    /// 第 k 层
    #[inline]
    pub fn layer(&self, k: usize) -> &[S] {
        let n = self.topology.npoints();
        &self.data[k * n..(k + 1) * n]
    }

    /// 第 k 层（可变）
    #[inline]
    pub fn layer_mut(&mut self, k: usize) -> &mut [S] {
        let n = self.topology.npoints();
        &mut self.data[k * n..(k + 1) * n]
    }

    /// 第 k 层第 j 圈
    #[inline]
    pub fn ring(&self, j: usize, k: usize) -> &[S] {
        &self.layer(k)[self.topology.ring_range(j)]
    }

    /// 第 k 层的面积加权平均（按求积权重）
    pub fn mean(&self, k: usize) -> S {
        let weights = self.topology.weights();
        let total: f64 = weights.iter().sum();
        let acc: f64 = (0..self.topology.nlat())
            .map(|j| {
                let ring = self.ring(j, k);
                let ring_mean = ring.iter().map(|v| v.as_f64()).sum::<f64>() / ring.len() as f64;
                weights[j] * ring_mean
            })
            .sum();
        S::from_f64_lossy(acc / total)
    }

    /// 最大绝对差
    pub fn max_abs_diff(&self, other: &Self) -> TransformResult<S> {
        TransformError::check("grid points", self.data.len(), other.data.len())?;
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| Float::abs(*a - *b))
            .fold(S::ZERO, |acc, d| acc.max(d)))
    }
}
