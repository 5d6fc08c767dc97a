// crates/ms_transform/src/operators.rs

//! 谱空间算子
//!
//! Laplace 在球谐基下是对角的，两个算子都只是按阶缩放系数。

use crate::eigen::EigenvalueTable;
use crate::error::{TransformError, TransformResult};
use crate::spectral::SpectralField;
use crate::TransformScalar;

/// ∇²：a(l,m) ← λ_l a(l,m)
pub fn laplacian<S: TransformScalar>(
    field: &SpectralField<S>,
    eigen: &EigenvalueTable<S>,
) -> TransformResult<SpectralField<S>> {
    let mut out = SpectralField::zeros_like(field);
    laplacian_into(field, &mut out, eigen)?;
    Ok(out)
}

/// ∇²，写入已有谱场
pub fn laplacian_into<S: TransformScalar>(
    field: &SpectralField<S>,
    out: &mut SpectralField<S>,
    eigen: &EigenvalueTable<S>,
) -> TransformResult<()> {
    check(field, out, eigen)?;
    let scale = eigen_per_coeff(field, eigen, |lambda| lambda);
    apply(field, out, &scale);
    Ok(())
}

/// ∇⁻²：a(l,m) ← a(l,m) / λ_l，特征值为零的模态（全球平均）置零
pub fn inverse_laplacian<S: TransformScalar>(
    field: &SpectralField<S>,
    eigen: &EigenvalueTable<S>,
) -> TransformResult<SpectralField<S>> {
    let mut out = SpectralField::zeros_like(field);
    inverse_laplacian_into(field, &mut out, eigen)?;
    Ok(out)
}

/// ∇⁻²，写入已有谱场
pub fn inverse_laplacian_into<S: TransformScalar>(
    field: &SpectralField<S>,
    out: &mut SpectralField<S>,
    eigen: &EigenvalueTable<S>,
) -> TransformResult<()> {
    check(field, out, eigen)?;
    let scale = eigen_per_coeff(field, eigen, |lambda| {
        if lambda == 0.0 {
            0.0
        } else {
            1.0 / lambda
        }
    });
    apply(field, out, &scale);
    Ok(())
}

fn check<S: TransformScalar>(
    field: &SpectralField<S>,
    out: &SpectralField<S>,
    eigen: &EigenvalueTable<S>,
) -> TransformResult<()> {
    if !field.same_shape(out) {
        return Err(TransformError::shape(
            "operator output",
            format!("{} x {}", field.truncation(), field.nlev()),
            format!("{} x {}", out.truncation(), out.nlev()),
        ));
    }
    eigen.check_covers(field.truncation())
}

/// 每个扁平系数对应的缩放因子（双精度计算后转换）
fn eigen_per_coeff<S: TransformScalar>(
    field: &SpectralField<S>,
    eigen: &EigenvalueTable<S>,
    f: impl Fn(f64) -> f64,
) -> Vec<S> {
    let values = eigen.as_slice();
    field
        .truncation()
        .degrees()
        .iter()
        .map(|&l| S::from_f64_lossy(f(values[l])))
        .collect()
}

fn apply<S: TransformScalar>(field: &SpectralField<S>, out: &mut SpectralField<S>, scale: &[S]) {
    for k in 0..field.nlev() {
        for ((o, &a), &s) in out.layer_mut(k).iter_mut().zip(field.layer(k)).zip(scale) {
            *o = a * s;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;
    use crate::spectral::Truncation;

    fn setup() -> (SpectralField<f64>, EigenvalueTable<f64>) {
        let trunc = Truncation::triangular(4);
        let eigen = EigenvalueTable::new(&trunc, 2.0).unwrap();
        let mut field = SpectralField::zeros(trunc, 2);
        field.set(0, 0, Complex::new(5.0, 0.0));
        field.set(3, 1, Complex::new(1.0, -2.0));
        field.set_at(4, 4, 1, Complex::new(0.5, 0.25));
        (field, eigen)
    }

    #[test]
    fn test_laplacian_scales_by_degree() {
        let (field, eigen) = setup();
        let lap = laplacian(&field, &eigen).unwrap();
        assert_eq!(lap.get(0, 0), Some(Complex::new(0.0, 0.0)));
        assert_eq!(lap.get(3, 1), Some(Complex::new(-3.0, 6.0)));
        assert_eq!(lap.get_at(4, 4, 1), Some(Complex::new(-2.5, -1.25)));
    }

    #[test]
    fn test_inverse_laplacian_drops_mean() {
        let (field, eigen) = setup();
        let lap = laplacian(&field, &eigen).unwrap();
        let back = inverse_laplacian(&lap, &eigen).unwrap();

        let mut expected = field.clone();
        expected.set(0, 0, Complex::new(0.0, 0.0));
        assert!(back.max_abs_diff(&expected).unwrap() < 1e-14);

        let inv = inverse_laplacian(&field, &eigen).unwrap();
        assert_eq!(inv.get(0, 0), Some(Complex::new(0.0, 0.0)));
    }

    #[test]
    fn test_shape_checks() {
        let (field, eigen) = setup();
        let mut wrong = SpectralField::zeros(Truncation::triangular(4), 1);
        assert!(laplacian_into(&field, &mut wrong, &eigen).is_err());

        let short = EigenvalueTable::new(&Truncation::triangular(2), 1.0).unwrap();
        assert!(laplacian(&field, &short).is_err());
    }
}
