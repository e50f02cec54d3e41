use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayView, ArrayView1, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::{Idx2d, Idx3d, PanoError, PanoResult};

pub mod slice;
pub mod window;

pub use slice::{ImgWriteVis, OwnedScanSlice, ScanSlice};
pub use window::IntensityWindow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 体素间距, 以毫米为单位.
///
/// 分别代表行方向 (自然图像的垂直方向), 列方向 (自然图像的水平方向)
/// 和切片方向 (相邻 2D 切片的方向). 三者都保证为正的有限值.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoxelSpacing {
    row_mm: f64,
    col_mm: f64,
    slice_mm: f64,
}

impl VoxelSpacing {
    /// 构建体素间距. 任一分量不是正的有限值时返回 `Err`.
    pub fn new(row_mm: f64, col_mm: f64, slice_mm: f64) -> PanoResult<Self> {
        let all = [row_mm, col_mm, slice_mm];
        if all.iter().all(|v| v.is_finite() && *v > 0.0) {
            Ok(Self {
                row_mm,
                col_mm,
                slice_mm,
            })
        } else {
            Err(PanoError::InvalidSpacing(all))
        }
    }

    /// 各向同性的 1 毫米间距. 缺少元信息时的默认值.
    #[inline]
    pub const fn unit() -> Self {
        Self {
            row_mm: 1.0,
            col_mm: 1.0,
            slice_mm: 1.0,
        }
    }

    /// 从 nifti header 的 `pixdim` 中读取. `pixdim` 按 `[_, W, H, z, ..]` 存储.
    fn from_header(header: &NiftiHeader) -> PanoResult<Self> {
        let [_, w, h, z, ..] = header.pixdim;
        Self::new(h as f64, w as f64, z as f64)
    }

    /// 行方向间距.
    #[inline]
    pub fn row_mm(&self) -> f64 {
        self.row_mm
    }

    /// 列方向间距.
    #[inline]
    pub fn col_mm(&self) -> f64 {
        self.col_mm
    }

    /// 切片方向间距.
    #[inline]
    pub fn slice_mm(&self) -> f64 {
        self.slice_mm
    }

    /// 水平切片内的像素间距 `[行, 列]`.
    #[inline]
    pub fn pixel_spacing(&self) -> [f64; 2] {
        [self.row_mm, self.col_mm]
    }

    /// 体素的实际体积值, 以立方毫米为单位.
    #[inline]
    pub fn voxel(&self) -> f64 {
        self.row_mm * self.col_mm * self.slice_mm
    }
}

impl Default for VoxelSpacing {
    #[inline]
    fn default() -> Self {
        Self::unit()
    }
}

/// 3D CBCT 体数据, 体素值以 `f32` 保存.
///
/// 内部按 `(z, h, w)` 即 `(切片, 行, 列)` 组织, 这样水平切片是连续的视图.
/// 构建成功的体数据三个维度都不为 0, 且之后不可修改.
#[derive(Debug, Clone)]
pub struct CbctVolume {
    data: Array3<f32>,
    spacing: VoxelSpacing,
}

impl Index<Idx3d> for CbctVolume {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl CbctVolume {
    /// 从 `(z, h, w)` 组织的数据直接构建. 任一维度为 0 时返回 `Err`.
    pub fn new(data: Array3<f32>, spacing: VoxelSpacing) -> PanoResult<Self> {
        let (depth, rows, cols) = data.dim();
        if depth == 0 || rows == 0 || cols == 0 {
            return Err(PanoError::EmptyVolume { rows, cols, depth });
        }
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok(Self { data, spacing })
    }

    /// 从 `[row, col, depth]` 组织的数据构建. 这是逐张叠放 DICOM 切片时
    /// 最常见的布局.
    pub fn from_rows_cols_depth(data: Array3<f32>, spacing: VoxelSpacing) -> PanoResult<Self> {
        // [h, w, z] -> [z, h, w]
        Self::new(data.permuted_axes([2, 0, 1]), spacing)
    }

    /// 打开 nii 文件格式的 3D 扫描. 间距取自 header 的 `pixdim`.
    pub fn open_nifti<P: AsRef<Path>>(path: P) -> PanoResult<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let spacing = VoxelSpacing::from_header(obj.header())?;

        // [W, H, z] -> [z, H, W].
        // hint: 原第一维向右增长, 原第二维向下增长.
        let data = obj
            .into_volume()
            .into_ndarray::<f32>()?
            .into_dimensionality::<Ix3>()
            .map_err(|e| PanoError::invalid_params(format!("expected a 3D volume: {e}")))?
            .permuted_axes([2, 1, 0]);

        Self::new(data, spacing)
    }

    /// 打开 npy 文件格式的 3D 扫描. 数据必须是 `[row, col, depth]` 布局的 `f32`.
    /// npy 文件不携带间距信息, 因此需要由调用方给出.
    pub fn open_npy<P: AsRef<Path>>(path: P, spacing: VoxelSpacing) -> PanoResult<Self> {
        let data: Array3<f32> = ndarray_npy::read_npy(path.as_ref())?;
        Self::from_rows_cols_depth(data, spacing)
    }

    /// 获取数据形状 `(z, h, w)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取水平切片形状 `(h, w)`.
    #[inline]
    pub fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 切片个数.
    #[inline]
    pub fn depth(&self) -> usize {
        self.shape().0
    }

    /// 切片的行数 (高).
    #[inline]
    pub fn rows(&self) -> usize {
        self.shape().1
    }

    /// 切片的列数 (宽).
    #[inline]
    pub fn cols(&self) -> usize {
        self.shape().2
    }

    /// 体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 检查索引是否合法.
    #[inline]
    pub fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 体素间距.
    #[inline]
    pub fn spacing(&self) -> VoxelSpacing {
        self.spacing
    }

    /// 获取第 `z_index` 层水平切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ScanSlice<'_> {
        ScanSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代水平切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ScanSlice<'_>> {
        self.data.axis_iter(Axis(0)).map(ScanSlice::new)
    }

    /// 获取固定 `(h, w)` 处沿切片方向的全部体素.
    ///
    /// 越界时 panic.
    #[inline]
    pub fn depth_profile(&self, (h, w): Idx2d) -> ArrayView1<'_, f32> {
        self.data.slice(ndarray::s![.., h, w])
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }

    /// 沿切片方向的最大密度投影 (MIP).
    pub fn mip_axial(&self) -> OwnedScanSlice {
        let mip = self
            .data
            .fold_axis(Axis(0), f32::NEG_INFINITY, |acc, &v| acc.max(v));
        OwnedScanSlice::from_nonempty(mip)
    }
}
