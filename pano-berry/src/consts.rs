//! 通用常量.
//!
//! 这里的数值是各参数结构 (如 [`crate::arch::ArchParams`]) 的默认值来源.

/// 牙弓曲线提取相关.
pub mod arch {
    /// 自适应阈值 `mean + k * std` 中的 `k`.
    pub const THRESHOLD_SIGMA: f64 = 1.5;

    /// 8-邻域膨胀次数.
    pub const DILATION_ITERATIONS: u32 = 3;

    /// 膨胀后高斯平滑的标准差.
    pub const SMOOTHING_SIGMA: f32 = 2.0;

    /// 平滑后重新二值化的阈值 (以 `[0, 1]` 为尺度).
    pub const SMOOTHING_CUTOFF: f32 = 0.3;

    /// 迭代腐蚀的最大次数.
    pub const MAX_THINNING_ITERATIONS: u32 = 50;

    /// 迭代腐蚀后剩余像素数低于该值时停止.
    pub const MIN_SKELETON_PIXELS: usize = 20;

    /// 拟合所需的最少 (不同) 列数. 骨架和质心两种方法共用.
    pub const MIN_COLUMNS: usize = 5;

    /// 骨架法拟合曲线时, 向两侧额外外推的宽度 (占切片宽度的比例).
    pub const EXTRAPOLATION: f64 = 0.1;

    /// 输出曲线的采样点数.
    pub const CURVE_POINTS: usize = 100;

    /// 质心法中, 一列至少需要多少个阈值以上的像素才被采纳.
    pub const CENTROID_MIN_COLUMN_PIXELS: usize = 4;

    /// 质心法的列采样步长为 `max(1, cols / CENTROID_SAMPLE_COLUMNS)`.
    pub const CENTROID_SAMPLE_COLUMNS: usize = 100;

    /// 默认 U 形曲线覆盖的横向区间 (占切片宽度的比例).
    pub const SYNTHETIC_SPAN: (f64, f64) = (0.15, 0.85);

    /// 默认 U 形曲线顶点所在的纵向位置 (占切片高度的比例).
    pub const SYNTHETIC_APEX_Y: f64 = 0.35;

    /// 默认 U 形曲线的曲率.
    pub const SYNTHETIC_CURVATURE: f64 = 0.0005;
}

/// 切片选择相关.
pub mod select {
    /// 亮像素计数所用的百分位.
    pub const BRIGHT_PERCENTILE: f64 = 90.0;
}

/// 全景投影相关.
pub mod panoramic {
    /// 默认投影半高 (单位: 切片个数).
    ///
    /// 同时用于换算 [`crate::arch::ArchCurve::thickness_mm`].
    pub const SLAB_HALF_HEIGHT: usize = 25;
}
