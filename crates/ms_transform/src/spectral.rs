// crates/ms_transform/src/spectral.rs

//! 三角截断谱场
//!
//! 系数 a(l, m) 只在 0 ≤ m ≤ l、m ≤ mmax 上存储，m > l 的上三角不分配。
//! 存储按序 m 分列：第 m 列依次存放 l = m..=lmax+1，最后一行 l = lmax+1
//! 是截断保护行，任何可能写入它的操作之后都必须清零。
//!
//! ```text
//!  m=0        m=1        m=2
//! [l=0..L+1] [l=1..L+1] [l=2..L+1] ...   offset[m] = Σ_{m'<m} (L+2-m')
//! ```

use num_complex::Complex;

use ms_foundation::Tolerance;

use crate::error::{TransformError, TransformResult};
use crate::TransformScalar;

/// 三角截断及其索引映射
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    lmax: usize,
    mmax: usize,
    /// 每列起始偏移，长度 mmax+2，最后一项为系数总数
    offsets: Vec<usize>,
    /// 每个扁平索引对应的阶 l
    degrees: Vec<usize>,
}

impl Truncation {
    /// 创建截断，要求 mmax ≤ lmax
    pub fn new(lmax: usize, mmax: usize) -> TransformResult<Self> {
        if mmax > lmax {
            return Err(TransformError::InvalidTruncation {
                lmax,
                mmax,
                reason: "mmax 不能大于 lmax",
            });
        }

        let mut offsets = Vec::with_capacity(mmax + 2);
        let mut degrees = Vec::new();
        let mut offset = 0;
        for m in 0..=mmax {
            offsets.push(offset);
            degrees.extend(m..=lmax + 1);
            offset += lmax + 2 - m;
        }
        offsets.push(offset);

        Ok(Self {
            lmax,
            mmax,
            offsets,
            degrees,
        })
    }

    /// 三角截断 lmax = mmax = trunc
    pub fn triangular(trunc: usize) -> Self {
        Self::new(trunc, trunc).unwrap_or_else(|_| unreachable!("lmax == mmax"))
    }

    /// 最大阶
    #[inline]
    pub fn lmax(&self) -> usize {
        self.lmax
    }

    /// 最大序
    #[inline]
    pub fn mmax(&self) -> usize {
        self.mmax
    }

    /// 每层系数个数（含保护行）
    #[inline]
    pub fn ncoeffs(&self) -> usize {
        self.offsets[self.mmax + 1]
    }

    /// 第 m 列的起始偏移
    #[inline]
    pub fn offset(&self, m: usize) -> usize {
        self.offsets[m]
    }

    /// 第 m 列的长度（l = m..=lmax+1）
    #[inline]
    pub fn column_len(&self, m: usize) -> usize {
        self.lmax + 2 - m
    }

    /// (l, m) 的扁平索引，l 可以取保护行 lmax+1
    #[inline]
    pub fn index(&self, l: usize, m: usize) -> Option<usize> {
        if m <= self.mmax && m <= l && l <= self.lmax + 1 {
            Some(self.offsets[m] + (l - m))
        } else {
            None
        }
    }

    /// 扁平索引对应的阶
    #[inline]
    pub fn degree(&self, index: usize) -> usize {
        self.degrees[index]
    }

    /// 按存储顺序的阶表
    #[inline]
    pub fn degrees(&self) -> &[usize] {
        &self.degrees
    }

    /// (l, m) 是否在截断三角内（不含保护行）
    #[inline]
    pub fn contains(&self, l: usize, m: usize) -> bool {
        m <= self.mmax && m <= l && l <= self.lmax
    }

    /// 按存储顺序遍历 (l, m, index)，包含保护行
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (0..=self.mmax).flat_map(move |m| {
            let offset = self.offsets[m];
            (m..=self.lmax + 1).map(move |l| (l, m, offset + l - m))
        })
    }
}

impl std::fmt::Display for Truncation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.lmax == self.mmax {
            write!(f, "T{}", self.lmax)
        } else {
            write!(f, "T{}x{}", self.lmax, self.mmax)
        }
    }
}

/// 谱场：每层一组三角截断复系数
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralField<S: TransformScalar> {
    truncation: Truncation,
    nlev: usize,
    data: Vec<Complex<S>>,
}

impl<S: TransformScalar> SpectralField<S> {
    /// 全零谱场
    pub fn zeros(truncation: Truncation, nlev: usize) -> Self {
        let len = truncation.ncoeffs() * nlev;
        Self {
            truncation,
            nlev,
            data: vec![Complex::new(S::ZERO, S::ZERO); len],
        }
    }

    /// 与另一谱场同形状的全零谱场
    pub fn zeros_like(other: &Self) -> Self {
        Self::zeros(other.truncation.clone(), other.nlev)
    }

    /// 从扁平系数构建（层连续存储），保护行会被清零
    pub fn from_vec(
        truncation: Truncation,
        nlev: usize,
        data: Vec<Complex<S>>,
    ) -> TransformResult<Self> {
        TransformError::check("spectral coefficients", truncation.ncoeffs() * nlev, data.len())?;
        let mut field = Self {
            truncation,
            nlev,
            data,
        };
        field.truncate();
        Ok(field)
    }

    /// 截断
    #[inline]
    pub fn truncation(&self) -> &Truncation {
        &self.truncation
    }

    /// 层数
    #[inline]
    pub fn nlev(&self) -> usize {
        self.nlev
    }

    /// 全部系数
    #[inline]
    pub fn as_slice(&self) -> &[Complex<S>] {
        &self.data
    }

    /// 全部系数（可变）
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Complex<S>] {
        &mut self.data
    }

    /// 第 k 层系数
    #[inline]
    pub fn layer(&self, k: usize) -> &[Complex<S>] {
        let n = self.truncation.ncoeffs();
        &self.data[k * n..(k + 1) * n]
    }

    /// 第 k 层系数（可变）
    #[inline]
    pub fn layer_mut(&mut self, k: usize) -> &mut [Complex<S>] {
        let n = self.truncation.ncoeffs();
        &mut self.data[k * n..(k + 1) * n]
    }

    /// 第 k 层按 m 拆成互不重叠的列，第 m 列为 l = m..=lmax+1
    pub fn columns_mut(&mut self, k: usize) -> Vec<&mut [Complex<S>]> {
        let truncation = &self.truncation;
        let n = truncation.ncoeffs();
        let mut rest = &mut self.data[k * n..(k + 1) * n];
        let mut columns = Vec::with_capacity(truncation.mmax() + 1);
        for m in 0..=truncation.mmax() {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(truncation.column_len(m));
            columns.push(head);
            rest = tail;
        }
        columns
    }

    /// 第 0 层的 a(l, m)，三角外返回 None
    #[inline]
    pub fn get(&self, l: usize, m: usize) -> Option<Complex<S>> {
        self.get_at(l, m, 0)
    }

    /// 第 k 层的 a(l, m)
    #[inline]
    pub fn get_at(&self, l: usize, m: usize, k: usize) -> Option<Complex<S>> {
        let idx = self.truncation.index(l, m)?;
        self.layer_checked(k).map(|layer| layer[idx])
    }

    fn layer_checked(&self, k: usize) -> Option<&[Complex<S>]> {
        (k < self.nlev).then(|| self.layer(k))
    }

    /// 设置第 0 层的 a(l, m)
    pub fn set(&mut self, l: usize, m: usize, value: Complex<S>) -> bool {
        self.set_at(l, m, 0, value)
    }

    /// 设置第 k 层的 a(l, m)；(l, m) 超出截断三角（含保护行）时返回 false
    pub fn set_at(&mut self, l: usize, m: usize, k: usize, value: Complex<S>) -> bool {
        if !self.truncation.contains(l, m) || k >= self.nlev {
            return false;
        }
        let idx = self.truncation.offset(m) + l - m;
        self.layer_mut(k)[idx] = value;
        true
    }

    /// 是否与另一谱场同截断、同层数
    pub fn same_shape(&self, other: &Self) -> bool {
        self.nlev == other.nlev && self.truncation == other.truncation
    }

    /// 将保护行 l = lmax+1 清零，幂等
    pub fn truncate(&mut self) {
        let lmax = self.truncation.lmax();
        self.truncate_to(lmax, self.truncation.mmax());
    }

    /// 将 l > ltrunc 或 m > mtrunc 的系数清零（保护行总是清零）
    pub fn truncate_to(&mut self, ltrunc: usize, mtrunc: usize) {
        let zero = Complex::new(S::ZERO, S::ZERO);
        let n = self.truncation.ncoeffs();
        for layer in self.data.chunks_mut(n) {
            for (l, m, idx) in self.truncation.iter() {
                if l > ltrunc || m > mtrunc || l > self.truncation.lmax() {
                    layer[idx] = zero;
                }
            }
        }
    }

    /// 插值到另一截断：重叠部分复制，新增部分为零
    pub fn resize(&self, truncation: Truncation) -> Self {
        let mut out = Self::zeros(truncation, self.nlev);
        let lmax = self.truncation.lmax().min(out.truncation.lmax());
        let mmax = self.truncation.mmax().min(out.truncation.mmax());
        for k in 0..self.nlev {
            for m in 0..=mmax {
                for l in m..=lmax {
                    if let Some(v) = self.get_at(l, m, k) {
                        out.set_at(l, m, k, v);
                    }
                }
            }
        }
        out
    }

    /// 逐系数比较实部与虚部；形状不同时为 false
    pub fn approx_eq(&self, other: &Self, tol: &Tolerance<S>) -> bool {
        self.same_shape(other)
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| tol.approx_eq(a.re, b.re) && tol.approx_eq(a.im, b.im))
    }

    /// 与另一谱场的最大系数模差
    pub fn max_abs_diff(&self, other: &Self) -> TransformResult<S> {
        if !self.same_shape(other) {
            return Err(TransformError::shape(
                "spectral field",
                format!("{} x {}", self.truncation, self.nlev),
                format!("{} x {}", other.truncation, other.nlev),
            ));
        }
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).norm())
            .fold(S::ZERO, |acc, d| acc.max(d)))
    }
}
