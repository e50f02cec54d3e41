//! 多项式曲线.

use ndarray::Array1;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 多项式. 系数按次数从低到高保存, 即 `p(x) = c[0] + c[1] * x + c[2] * x^2 + ...`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polynomial<T: num::Float>(Array1<T>);

impl<T: num::Float> Polynomial<T> {
    /// 由系数 (低次在前) 构建. 系数不能为空.
    pub fn new(coefficients: Array1<T>) -> Self {
        assert!(!coefficients.is_empty(), "多项式至少需要一个系数");
        Self(coefficients)
    }

    /// 系数, 低次在前.
    #[inline]
    pub fn coefficients(&self) -> &Array1<T> {
        &self.0
    }

    /// 多项式次数.
    #[inline]
    pub fn degree(&self) -> usize {
        self.0.len() - 1
    }

    /// 以 Horner 法则求值.
    #[inline]
    pub fn eval(&self, x: T) -> T {
        self.0.iter().rev().fold(T::zero(), |acc, &cur| acc * x + cur)
    }

    /// 在 `[x0, x1]` 上等距取 `n` 个点 (包含两个端点) 并求值, 返回 `(x, p(x))`.
    pub fn sample(&self, x0: T, x1: T, n: usize) -> Vec<(T, T)> {
        Array1::linspace(x0, x1, n)
            .into_iter()
            .map(|x| (x, self.eval(x)))
            .collect()
    }
}
