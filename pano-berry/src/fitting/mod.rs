//! 曲线拟合.
//!
//! 给定一系列点 `(x, y)`, 该模块可以拟合出一条多项式曲线 `y = p(x)`.

mod polynomial;

pub use polynomial::Polynomial;

use itertools::{Itertools, MinMaxResult};
use nalgebra::{DMatrix, DVector};

/// 奇异值相对最大奇异值小于该比例时视为 0.
const RANK_EPS: f64 = 1e-12;

/// 基于最小二乘法拟合 `degree` 次多项式.
///
/// `x` 是自变量, `y` 是对应函数值. 以 SVD 求解范德蒙德矩阵的最小二乘问题.
///
/// # 返回值
///
/// 当 `x`, `y` 长度不一致, 点数不足 `degree + 1`, 存在非有限值,
/// 矩阵秩不足 (例如不同的 `x` 值太少) 或结果不是有限值时, 返回 `None`.
pub fn polynomial_f64(x: &[f64], y: &[f64], degree: usize) -> Option<Polynomial<f64>> {
    let n = degree + 1;
    if x.len() != y.len() || x.len() < n {
        return None;
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return None;
    }

    // shape: (m, n); m = x.len(), n = degree + 1
    let v_mat = DMatrix::from_fn(x.len(), n, |m, k| x[m].powi(k as i32));
    let rhs = DVector::from_column_slice(y);

    let svd = v_mat.svd(true, true);
    let max_sv = svd.singular_values.max();
    if !(max_sv > 0.0) {
        return None;
    }
    let eps = max_sv * RANK_EPS;
    if svd.rank(eps) < n {
        return None;
    }

    let theta = svd.solve(&rhs, eps).ok()?;
    if theta.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(Polynomial::new(theta.iter().copied().collect()))
}

/// `x` 中的最小值和最大值. `x` 为空时返回 `None`.
pub fn x_range(x: &[f64]) -> Option<(f64, f64)> {
    match x.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
    }
}
