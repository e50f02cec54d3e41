//! 二维二值形态学.
//!
//! 所有操作都以 3×3 (8-邻域) 结构元素进行, 越界像素一律视为背景.

mod thinning;

pub use thinning::{Thinning, ThinningOutcome, ThinningStop};

use crate::data::slice::ImgWriteVis;
use crate::Idx2d;
use image::{GrayImage, ImageResult, Luma};
use ndarray::{Array2, ArrayView2, Axis, Zip};
use std::path::Path;

/// 获得 `(h, w)` 的 8-邻居索引. 不检查越界.
///
/// 左 / 上越界的分量会回绕为很大的值, 因此可以直接交给 `get` 判断.
#[inline]
pub(crate) fn neighbour8((h, w): Idx2d) -> [Idx2d; 8] {
    [
        (h.wrapping_sub(1), w.wrapping_sub(1)),
        (h.wrapping_sub(1), w),
        (h.wrapping_sub(1), w.saturating_add(1)),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
        (h.saturating_add(1), w.wrapping_sub(1)),
        (h.saturating_add(1), w),
        (h.saturating_add(1), w.saturating_add(1)),
    ]
}

/// 二值图. `true` 为前景.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    data: Array2<bool>,
}

impl BinaryMask {
    /// 直接初始化.
    #[inline]
    pub fn new(data: Array2<bool>) -> Self {
        Self { data }
    }

    /// 以 `(h, w)` 为参数逐像素生成.
    #[inline]
    pub fn from_fn<F: FnMut(Idx2d) -> bool>(shape: Idx2d, f: F) -> Self {
        Self::new(Array2::from_shape_fn(shape, f))
    }

    /// 全背景.
    #[inline]
    pub fn zeros(shape: Idx2d) -> Self {
        Self::new(Array2::from_elem(shape, false))
    }

    /// 形状 `(h, w)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 前景像素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// 是否没有任何前景像素?
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<bool> {
        self.data.get(pos).copied()
    }

    /// 底层数据的视图.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<'_, bool> {
        self.data.view()
    }

    /// 一次膨胀: 3×3 邻域内存在前景, 则该像素为前景.
    pub fn dilate(&self) -> Self {
        Self::from_fn(self.shape(), |pos| {
            self.data[pos]
                || neighbour8(pos)
                    .into_iter()
                    .any(|p| self.get(p).unwrap_or(false))
        })
    }

    /// 连续膨胀 `n` 次.
    pub fn dilate_n(&self, n: u32) -> Self {
        (0..n).fold(self.clone(), |acc, _| acc.dilate())
    }

    /// 一次腐蚀: 3×3 邻域全部为前景, 该像素才保留. 因此图像边缘上的像素一定被腐蚀.
    pub fn erode(&self) -> Self {
        Self::from_fn(self.shape(), |pos| {
            self.data[pos]
                && neighbour8(pos)
                    .into_iter()
                    .all(|p| self.get(p).unwrap_or(false))
        })
    }

    /// 在 `self` 中为前景, 但在 `other` 中为背景的像素. 两者形状必须相同.
    pub fn and_not(&self, other: &BinaryMask) -> Self {
        assert_eq!(self.shape(), other.shape(), "二值图形状不一致");
        let data = Zip::from(&self.data)
            .and(&other.data)
            .map_collect(|&a, &b| a && !b);
        Self::new(data)
    }

    /// 高斯平滑后重新二值化.
    ///
    /// 前景先映射为 255, 以标准差 `sigma` 模糊后, 严格大于 `cutoff * 255` 的像素为前景.
    /// `cutoff` 以 `[0, 1]` 为尺度.
    pub fn smooth(&self, sigma: f32, cutoff: f32) -> Self {
        let blurred = imageproc::filter::gaussian_blur_f32(&self.to_gray_image(), sigma);
        let level = cutoff * u8::MAX as f32;
        Self::from_fn(self.shape(), |(h, w)| {
            blurred.get_pixel(w as u32, h as u32).0[0] as f32 > level
        })
    }

    /// 每个存在前景的列 `x`, 以及该列前景像素行号的平均值 `y`. 按 `x` 升序.
    pub fn column_means(&self) -> Vec<(f64, f64)> {
        self.data
            .axis_iter(Axis(1))
            .enumerate()
            .filter_map(|(x, col)| {
                let (n, sum) = col
                    .iter()
                    .enumerate()
                    .filter(|&(_, &v)| v)
                    .fold((0usize, 0usize), |(n, sum), (y, _)| (n + 1, sum + y));
                (n > 0).then(|| (x as f64, sum as f64 / n as f64))
            })
            .collect()
    }

    /// 前景为白色 (255), 背景为黑色 (0).
    pub fn to_gray_image(&self) -> GrayImage {
        let (h, w) = self.shape();
        GrayImage::from_fn(w as u32, h as u32, |x, y| {
            Luma([if self.data[(y as usize, x as usize)] {
                u8::MAX
            } else {
                u8::MIN
            }])
        })
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<bool> {
        self.data
    }
}

impl ImgWriteVis for BinaryMask {
    #[inline]
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.to_gray_image().save(path)
    }
}
