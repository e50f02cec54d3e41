//! 全景 (曲面重建) 图像.
//!
//! 沿牙弓曲线逐点取深度方向的体素列, 按曲线顺序拼成二维栅格.

mod encode;

pub use encode::NormalizedRaster;

use crate::arch::{ArchCurve, ArchSource};
use crate::consts::panoramic::SLAB_HALF_HEIGHT;
use crate::{CbctVolume, Idx2dF, PanoError, PanoResult};
use ndarray::{s, Array2, ArrayView2, ArrayViewMut1, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 投影参数.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanoramicParams {
    /// 投影半高, 以切片个数为单位. 输出高度为 `2 * thickness`.
    pub thickness: usize,
}

impl Default for PanoramicParams {
    #[inline]
    fn default() -> Self {
        Self {
            thickness: SLAB_HALF_HEIGHT,
        }
    }
}

impl PanoramicParams {
    /// 以给定半高构建.
    #[inline]
    pub fn with_thickness(thickness: usize) -> Self {
        Self { thickness }
    }

    /// 半高必须为正.
    pub fn validate(&self) -> PanoResult<()> {
        if self.thickness == 0 {
            Err(PanoError::invalid_params("projection thickness must be positive"))
        } else {
            Ok(())
        }
    }
}

/// 全景图像. 宽为曲线点数, 高为 `2 * thickness`. 构建后不可修改.
///
/// 第 `i` 列对应曲线第 `i` 个点处的深度方向体素, 自上而下深度递增.
#[derive(Clone, Debug, PartialEq)]
pub struct PanoramicImage {
    data: Array2<f32>,
    source: ArchSource,
}

impl PanoramicImage {
    /// 沿 `curve` 投影, 以 `center` 为中心切片.
    ///
    /// `center` 越界时截断到最后一个切片. 曲线不满足不变量或参数非法时返回 `Err`.
    pub fn project(
        volume: &CbctVolume,
        curve: &ArchCurve,
        params: &PanoramicParams,
        center: usize,
    ) -> PanoResult<Self> {
        params.validate()?;
        curve.validate()?;
        Ok(Self {
            data: project_points(volume, curve.points(), params.thickness, center),
            source: curve.source(),
        })
    }

    /// 宽 (曲线点数).
    #[inline]
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// 高 (`2 * thickness`).
    #[inline]
    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// 形状 `(高, 宽)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// 底层数据的视图.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<f32> {
        self.data
    }

    /// 投影所沿曲线的来源.
    #[inline]
    pub fn arch_source(&self) -> ArchSource {
        self.source
    }

    /// 投影所沿曲线是否来自降级方法?
    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.source.is_fallback()
    }
}

/// 沿 `points` 投影, 得到 `(2 * thickness, points.len())` 的栅格.
///
/// 每个点 `(x, y)` 先截断为整数并限制在切片范围内, 再取深度
/// `[center - thickness, center + thickness) ∩ [0, depth)` 的体素,
/// 从第 `(2 * thickness - len) / 2` 行开始放置; 其余位置为 0.
/// `center` 越界时截断到最后一个切片.
pub fn project_points(
    volume: &CbctVolume,
    points: &[Idx2dF],
    thickness: usize,
    center: usize,
) -> Array2<f32> {
    let depth = volume.depth();
    let center = if center >= depth {
        log::warn!("center slice {center} out of range, clamped to {}", depth - 1);
        depth - 1
    } else {
        center
    };

    let mut out = Array2::<f32>::zeros((2 * thickness, points.len()));

    #[cfg(feature = "rayon")]
    out.axis_iter_mut(Axis(1))
        .into_par_iter()
        .enumerate()
        .for_each(|(i, col)| fill_column(volume, col, points[i], thickness, center));

    #[cfg(not(feature = "rayon"))]
    out.axis_iter_mut(Axis(1))
        .enumerate()
        .for_each(|(i, col)| fill_column(volume, col, points[i], thickness, center));

    out
}

/// 填充一列. `center < depth`.
fn fill_column(
    volume: &CbctVolume,
    mut col: ArrayViewMut1<'_, f32>,
    (x, y): Idx2dF,
    thickness: usize,
    center: usize,
) {
    let (depth, rows, cols) = volume.shape();
    // 浮点转整数会截断, 负数和 NaN 得到 0.
    let w = (x as usize).min(cols - 1);
    let h = (y as usize).min(rows - 1);

    let z0 = center.saturating_sub(thickness);
    let z1 = center.saturating_add(thickness).min(depth);
    let len = z1 - z0;
    let offset = (2 * thickness - len) / 2;

    col.slice_mut(s![offset..offset + len])
        .assign(&volume.depth_profile((h, w)).slice(s![z0..z1]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VoxelSpacing;
    use ndarray::{arr2, Array3};

    /// 3 层, 4x4. 体素值为 `100 * z + 10 * h + w`.
    fn tiny_volume() -> CbctVolume {
        let data = Array3::from_shape_fn((3, 4, 4), |(z, h, w)| (100 * z + 10 * h + w) as f32);
        CbctVolume::new(data, VoxelSpacing::unit()).unwrap()
    }

    #[test]
    fn test_project_known_profiles() {
        let vol = tiny_volume();
        let pts = [(0.0, 0.0), (1.9, 2.2), (9.0, -3.0)];
        let out = project_points(&vol, &pts, 2, 1);
        // 深度 [-1, 3) ∩ [0, 3) = [0, 3), 长度 3, 偏移 (4 - 3) / 2 = 0.
        assert_eq!(
            out,
            arr2(&[
                [0.0, 21.0, 3.0],
                [100.0, 121.0, 103.0],
                [200.0, 221.0, 203.0],
                [0.0, 0.0, 0.0],
            ])
        );
    }

    #[test]
    fn test_project_fixed_point_curve() {
        let vol = tiny_volume();
        // 5 个点重合于 (x, y) = (2, 1).
        let curve = ArchCurve::new(vec![(2.0, 1.0); 5], [1.0, 0.0, 0.0], 1, 1.0, ArchSource::Synthetic)
            .unwrap();
        let profile = vol.depth_profile((1, 2)).to_vec();
        assert_eq!(profile, vec![12.0, 112.0, 212.0]);

        // 深度 [0, 3), 偏移 (4 - 3) / 2 = 0.
        let img = PanoramicImage::project(&vol, &curve, &PanoramicParams::with_thickness(2), 1)
            .unwrap();
        assert_eq!(img.shape(), (4, 5));
        for col in img.data().columns() {
            assert_eq!(col.to_vec(), vec![12.0, 112.0, 212.0, 0.0]);
        }

        // 深度 [0, 3), 偏移 (6 - 3) / 2 = 1.
        let img = PanoramicImage::project(&vol, &curve, &PanoramicParams::with_thickness(3), 1)
            .unwrap();
        for col in img.data().columns() {
            assert_eq!(col.to_vec(), vec![0.0, 12.0, 112.0, 212.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_project_centered_offset() {
        let vol = tiny_volume();
        // 深度 [0, 3), 长度 3, 偏移 (6 - 3) / 2 = 1.
        let out = project_points(&vol, &[(3.0, 3.0), (3.0, 3.0)], 3, 1);
        assert_eq!(out.dim(), (6, 2));
        assert_eq!(out.column(0).to_vec(), vec![0.0, 33.0, 133.0, 233.0, 0.0, 0.0]);
    }

    #[test]
    fn test_project_center_clamped() {
        let vol = tiny_volume();
        let a = project_points(&vol, &[(0.0, 0.0), (1.0, 1.0)], 1, 99);
        let b = project_points(&vol, &[(0.0, 0.0), (1.0, 1.0)], 1, 2);
        assert_eq!(a, b);
        assert_eq!(a.column(1).to_vec(), vec![111.0, 211.0]);
    }

    #[test]
    fn test_dimension_law() {
        let vol = tiny_volume();
        let curve = ArchCurve::new(
            vec![(0.0, 0.0), (1.0, 0.5), (2.0, 1.0), (3.0, 1.5), (3.0, 2.0)],
            [0.0, 0.5, 0.0],
            1,
            1.0,
            ArchSource::Centroid,
        )
        .unwrap();
        for t in [1, 2, 7] {
            let img = PanoramicImage::project(&vol, &curve, &PanoramicParams::with_thickness(t), 1)
                .unwrap();
            assert_eq!(img.shape(), (2 * t, 5));
            assert_eq!((img.height(), img.width()), (2 * t, 5));
            assert_eq!(img.arch_source(), ArchSource::Centroid);
            assert!(img.is_fallback());
        }
        let err = PanoramicImage::project(&vol, &curve, &PanoramicParams::with_thickness(0), 1);
        assert!(matches!(err, Err(PanoError::InvalidParams(_))));
    }
}
