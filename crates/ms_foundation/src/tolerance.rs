// crates/ms_foundation/src/tolerance.rs

//! 浮点比较容差
//!
//! 变换往返误差随截断阶数增长，`Tolerance::for_truncation` 给出按
//! 机器精度和截断规模缩放的容差。

use crate::scalar::Scalar;

/// 混合相对/绝对容差
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance<S: Scalar> {
    /// 相对容差
    pub rel: S,
    /// 绝对容差
    pub abs: S,
}

impl<S: Scalar> Tolerance<S> {
    /// 创建容差
    pub fn new(rel: S, abs: S) -> Self {
        Self { rel, abs }
    }

    /// 按截断阶数缩放的往返容差
    ///
    /// 经验上误差随 lmax 线性增长，系数取 100 倍机器精度。
    pub fn for_truncation(lmax: usize) -> Self {
        let scale = S::from_f64_lossy(100.0) * S::from_usize_lossy(lmax + 1);
        let eps = S::EPSILON * scale;
        Self { rel: eps, abs: eps }
    }

    /// 判断两值是否接近
    #[inline]
    pub fn approx_eq(&self, a: S, b: S) -> bool {
        let diff = (a - b).abs();
        diff <= self.abs || diff <= self.rel * a.abs().max(b.abs())
    }
}

impl<S: Scalar> Default for Tolerance<S> {
    fn default() -> Self {
        Self::for_truncation(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        let tol = Tolerance::<f64>::new(1e-10, 1e-14);
        assert!(tol.approx_eq(1.0, 1.0 + 1e-12));
        assert!(!tol.approx_eq(1.0, 1.001));
        assert!(tol.approx_eq(0.0, 1e-15));
    }

    #[test]
    fn test_scales_with_truncation() {
        let small = Tolerance::<f64>::for_truncation(5);
        let large = Tolerance::<f64>::for_truncation(500);
        assert!(large.abs > small.abs);
        assert!(Tolerance::<f32>::for_truncation(5).abs > small.abs as f32);
    }
}
