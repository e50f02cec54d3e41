use crate::morph::BinaryMask;
use crate::Idx2d;
use ndarray::iter::Iter;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis, Ix2};
use ordered_float::OrderedFloat;
use std::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 不可变、借用的二维水平 CBCT 切片.
///
/// 由 [`crate::CbctVolume`] 或 [`OwnedScanSlice`] 产生, 因此保证非空.
#[derive(Clone, Copy)]
pub struct ScanSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::CbctVolume`].
    ///
    /// 这里有意把代码写死为 `ArrayView` 降低灵活性, 但使结构的意图更加明确.
    data: ArrayView2<'a, f32>,
}

impl Index<Idx2d> for ScanSlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> ScanSlice<'a> {
    /// 直接初始化. 调用方保证 `data` 非空.
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, f32>) -> Self {
        debug_assert!(!data.is_empty());
        Self { data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'a, f32> {
        self.data
    }

    /// 获取可以迭代图像像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, f32, Ix2> {
        self.data.iter()
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&f32> {
        self.data.get(pos)
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 获得图像的高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 获得图像的宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 克隆自己, 获得一个拥有所有权的切片对象.
    pub fn to_owned(&self) -> OwnedScanSlice {
        OwnedScanSlice {
            data: self.data.to_owned(),
        }
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 体素值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &f32)> {
        self.data.indexed_iter()
    }

    /// 以行优先规则, 获取能迭代图像所有索引的迭代器.
    #[inline]
    pub fn pos_iter(&self) -> impl Iterator<Item = Idx2d> {
        super::PosIter::new(self.shape())
    }

    /// 获取第 `w` 列 (自上而下). 越界时 panic.
    #[inline]
    pub fn column(&self, w: usize) -> ArrayView1<'a, f32> {
        self.data.index_axis_move(Axis(1), w)
    }

    /// 体素值的算术平均.
    pub fn mean(&self) -> f64 {
        self.iter().map(|&v| v as f64).sum::<f64>() / self.size() as f64
    }

    /// 体素值的 (总体) 标准差.
    pub fn std(&self) -> f64 {
        let mean = self.mean();
        let var = self
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.size() as f64;
        var.sqrt()
    }

    /// 第 `q` 百分位 (`0 <= q <= 100`), 在相邻两个秩之间线性插值.
    pub fn percentile(&self, q: f64) -> f64 {
        assert!((0.0..=100.0).contains(&q), "百分位必须位于 [0, 100]");

        let mut sorted: Vec<OrderedFloat<f32>> = self.iter().copied().map(OrderedFloat).collect();
        sorted.sort_unstable();

        let rank = q / 100.0 * (sorted.len() - 1) as f64;
        let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
        let (a, b) = (sorted[lo].0 as f64, sorted[hi].0 as f64);
        a + (b - a) * (rank - lo as f64)
    }

    /// 严格大于 `threshold` 的像素个数.
    #[inline]
    pub fn count_above(&self, threshold: f64) -> usize {
        self.iter().filter(|&&v| v as f64 > threshold).count()
    }

    /// 严格大于 `threshold` 的像素构成的二值图.
    #[inline]
    pub fn mask_above(&self, threshold: f64) -> BinaryMask {
        BinaryMask::new(self.data.mapv(|v| v as f64 > threshold))
    }
}

/// 拥有所有权的二维水平 CBCT 切片.
///
/// `OwnedScanSlice` 仅提供到 `ScanSlice` 的轻量转换和底层数据移动,
/// 不提供任何其它方法.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OwnedScanSlice {
    data: Array2<f32>,
}

impl OwnedScanSlice {
    /// 从二维数组创建. 如果 `data` 为空则返回 `None`.
    #[inline]
    pub fn from_array(data: Array2<f32>) -> Option<Self> {
        (!data.is_empty()).then_some(Self { data })
    }

    #[inline]
    pub(crate) fn from_nonempty(data: Array2<f32>) -> Self {
        debug_assert!(!data.is_empty());
        Self { data }
    }

    /// 获得不可变切片引用.
    #[inline]
    pub fn as_immutable(&self) -> ScanSlice<'_> {
        ScanSlice::new(self.data.view())
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<f32> {
        self.data
    }
}
