//! 三级牙弓曲线提取.

use super::{ArchCurve, ArchFit, ArchParams, ArchSource};
use crate::fitting::{polynomial_f64, x_range, Polynomial};
use crate::pipeline::{Checkpoint, Stage, Uninterrupted};
use crate::{PanoError, PanoResult, ScanSlice};
use ndarray::arr1;

/// 从水平切片中提取牙弓曲线.
///
/// 依次尝试 [`ArchSource::TIERS`] 中的方法, 返回第一个成功的结果.
///
/// # 返回值
///
/// 只有 `params` 非法时返回 `Err`; 数据不足只会导致降级.
pub fn extract_arch(
    slice: ScanSlice<'_>,
    slice_index: usize,
    thickness_mm: f64,
    params: &ArchParams,
) -> PanoResult<ArchCurve> {
    params.validate()?;
    match run_tiers(slice, slice_index, thickness_mm, params, &Uninterrupted) {
        Ok(curve) => Ok(curve),
        Err(never) => match never {},
    }
}

/// 同 [`extract_arch`], 但每个阶段之前都会询问 `cp`.
pub fn extract_arch_with<C>(
    slice: ScanSlice<'_>,
    slice_index: usize,
    thickness_mm: f64,
    params: &ArchParams,
    cp: &C,
) -> Result<ArchCurve, C::Error>
where
    C: Checkpoint,
    C::Error: From<PanoError>,
{
    params.validate()?;
    run_tiers(slice, slice_index, thickness_mm, params, cp)
}

/// 逐级提取. 调用方保证 `params` 已通过检查.
pub(crate) fn run_tiers<C: Checkpoint>(
    slice: ScanSlice<'_>,
    slice_index: usize,
    thickness_mm: f64,
    params: &ArchParams,
    cp: &C,
) -> Result<ArchCurve, C::Error> {
    for tier in ArchSource::TIERS {
        if let Some(fit) = tier.run(slice, params, cp)? {
            log::info!(
                "arch detected by {tier} tier on slice {slice_index} ({} points)",
                fit.points.len()
            );
            return Ok(ArchCurve::from_fit(fit, slice_index, thickness_mm, tier));
        }
        log::warn!("{tier} tier found too little structure on slice {slice_index}, falling back");
    }

    // 默认曲线不依赖数据, 不会走到这里.
    Ok(ArchCurve::from_fit(
        synthetic_fit(slice, params),
        slice_index,
        thickness_mm,
        ArchSource::Synthetic,
    ))
}

/// 骨架法: 阈值, 膨胀, 平滑, 细化, 按列取点, 二次拟合并向两侧外推.
pub(super) fn skeleton_fit<C: Checkpoint>(
    slice: ScanSlice<'_>,
    params: &ArchParams,
    cp: &C,
) -> Result<Option<ArchFit>, C::Error> {
    let (rows, cols) = slice.shape();

    cp.check(Stage::Threshold)?;
    let threshold = params.threshold_of(&slice);
    let mask = slice.mask_above(threshold);
    log::debug!("threshold={threshold:.1}, binary pixels={}", mask.count());

    cp.check(Stage::Dilate)?;
    let mask = mask.dilate_n(params.dilation_iterations);

    cp.check(Stage::Smooth)?;
    let mask = mask.smooth(params.smoothing_sigma, params.smoothing_cutoff);

    cp.check(Stage::Skeletonize)?;
    let thinned = params.thinning().run(&mask);
    log::debug!(
        "thinning stopped ({:?}) after {} iterations, {} pixels left",
        thinned.stop,
        thinned.iterations,
        thinned.skeleton.count()
    );

    cp.check(Stage::ExtractPoints)?;
    let samples = thinned.skeleton.column_means();
    if samples.len() < params.min_columns {
        log::debug!("skeleton covers {} columns only", samples.len());
        return Ok(None);
    }

    cp.check(Stage::FitCurve)?;
    let (x, y): (Vec<f64>, Vec<f64>) = samples.into_iter().unzip();
    let (Some(poly), Some((x0, x1))) = (polynomial_f64(&x, &y, 2), x_range(&x)) else {
        log::debug!("skeleton polynomial fit failed");
        return Ok(None);
    };

    let pad = params.extrapolation * cols as f64;
    let max_x = (cols - 1) as f64;
    let (x0, x1) = ((x0 - pad).clamp(0.0, max_x), (x1 + pad).clamp(0.0, max_x));
    Ok(Some(ArchFit::sample(&poly, x0, x1, params.curve_points, rows)))
}

/// 质心法: 按步长采样列, 以亮度加权求亮像素的行质心, 在观测到的 `x` 区间内拟合.
pub(super) fn centroid_fit<C: Checkpoint>(
    slice: ScanSlice<'_>,
    params: &ArchParams,
    cp: &C,
) -> Result<Option<ArchFit>, C::Error> {
    cp.check(Stage::Centroid)?;

    let (rows, cols) = slice.shape();
    let threshold = params.threshold_of(&slice);
    let stride = (cols / params.centroid_sample_columns).max(1);

    let (x, y): (Vec<f64>, Vec<f64>) = (0..cols)
        .step_by(stride)
        .filter_map(|w| {
            let bright: Vec<(usize, f32)> = slice
                .column(w)
                .iter()
                .copied()
                .enumerate()
                .filter(|&(_, v)| v as f64 > threshold)
                .collect();
            if bright.len() < params.centroid_min_column_pixels {
                return None;
            }
            weighted_row(&bright).map(|y| (w as f64, y))
        })
        .unzip();

    if x.len() < params.min_columns {
        log::debug!("centroid covers {} columns only", x.len());
        return Ok(None);
    }
    let (Some(poly), Some((x0, x1))) = (polynomial_f64(&x, &y, 2), x_range(&x)) else {
        log::debug!("centroid polynomial fit failed");
        return Ok(None);
    };
    Ok(Some(ArchFit::sample(&poly, x0, x1, params.curve_points, rows)))
}

/// 权重为 `v - min(v) + 1` 的加权平均行号.
fn weighted_row(bright: &[(usize, f32)]) -> Option<f64> {
    let min = bright
        .iter()
        .map(|&(_, v)| v as f64)
        .fold(f64::INFINITY, f64::min);
    let (num, den) = bright.iter().fold((0.0, 0.0), |(num, den), &(h, v)| {
        let weight = v as f64 - min + 1.0;
        (num + weight * h as f64, den + weight)
    });
    let y = num / den;
    y.is_finite().then_some(y)
}

/// 默认 U 形曲线 `y = a * (x - cx)^2 + cy`. 总是成功.
pub(super) fn synthetic_fit(slice: ScanSlice<'_>, params: &ArchParams) -> ArchFit {
    let (rows, cols) = slice.shape();
    let a = params.synthetic_curvature;
    let cx = cols as f64 / 2.0;
    let cy = params.synthetic_apex_y * rows as f64;
    let (lo, hi) = params.synthetic_span;

    let poly = Polynomial::new(arr1(&[a * cx * cx + cy, -2.0 * a * cx, a]));
    let max_x = cols.saturating_sub(1) as f64;
    let mut fit = ArchFit::sample(
        &poly,
        lo * cols as f64,
        hi * cols as f64,
        params.curve_points,
        rows,
    );
    for p in fit.points.iter_mut() {
        p.0 = p.0.clamp(0.0, max_x);
    }
    fit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OwnedScanSlice;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn slice_of<F: FnMut((usize, usize)) -> f32>(shape: (usize, usize), f: F) -> OwnedScanSlice {
        OwnedScanSlice::from_array(Array2::from_shape_fn(shape, f)).unwrap()
    }

    fn assert_well_formed(curve: &ArchCurve, (rows, cols): (usize, usize)) {
        assert!(curve.validate().is_ok());
        for &(x, y) in curve.points() {
            assert!((0.0..=(cols - 1) as f64).contains(&x), "x = {x}");
            assert!((0.0..=(rows - 1) as f64).contains(&y), "y = {y}");
        }
    }

    #[test]
    fn test_weighted_row() {
        assert_relative_eq!(weighted_row(&[(2, 5.0), (4, 5.0)]).unwrap(), 3.0);
        // 权重 1 和 3.
        assert_relative_eq!(weighted_row(&[(0, 10.0), (8, 12.0)]).unwrap(), 6.0);
    }

    #[test]
    fn test_blank_slice_is_synthetic() {
        let s = slice_of((64, 64), |_| 0.0);
        let curve = extract_arch(s.as_immutable(), 7, 12.5, &ArchParams::default()).unwrap();

        assert_eq!(curve.source(), ArchSource::Synthetic);
        assert!(curve.is_fallback());
        assert_eq!(curve.slice_index(), 7);
        assert_eq!(curve.len(), 100);
        assert_well_formed(&curve, (64, 64));

        let pts = curve.points();
        assert_relative_eq!(pts[0].0, 0.15 * 64.0, epsilon = 1e-9);
        assert_relative_eq!(pts[99].0, 0.85 * 64.0, epsilon = 1e-9);
        let [c0, c1, c2] = curve.coefficients();
        assert_relative_eq!(c2, 0.0005);
        assert_relative_eq!(c1, -2.0 * 0.0005 * 32.0);
        assert_relative_eq!(c0, 0.0005 * 32.0 * 32.0 + 0.35 * 64.0);
        // 顶点在中间.
        assert_relative_eq!(curve.polynomial().eval(32.0), 0.35 * 64.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tiny_slice_is_synthetic() {
        let s = slice_of((1, 1), |_| 3.0);
        let curve = extract_arch(s.as_immutable(), 0, 1.0, &ArchParams::default()).unwrap();
        assert_eq!(curve.source(), ArchSource::Synthetic);
        assert!(curve.points().iter().all(|&p| p == (0.0, 0.0)));
    }

    #[test]
    fn test_thin_band_is_centroid() {
        // 5 行高的横带: 骨架被腐蚀殆尽, 但每列都有足够的亮像素.
        let s = slice_of((64, 64), |(h, _)| if (30..35).contains(&h) { 1000.0 } else { 0.0 });
        let slice = s.as_immutable();
        let params = ArchParams::default();

        assert_eq!(skeleton_fit(slice, &params, &Uninterrupted), Ok(None));

        let curve = extract_arch(slice, 2, 5.0, &params).unwrap();
        assert_eq!(curve.source(), ArchSource::Centroid);
        assert_eq!(curve.len(), 100);
        assert_well_formed(&curve, (64, 64));
        // 观测区间内不外推.
        assert_relative_eq!(curve.points()[0].0, 0.0);
        assert_relative_eq!(curve.points()[99].0, 63.0);
        for &(_, y) in curve.points() {
            assert_relative_eq!(y, 32.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_large_blob_is_skeleton() {
        // 130x130 的亮块在 50 次腐蚀后仍有剩余.
        let s = slice_of((256, 256), |(h, w)| {
            if (60..190).contains(&h) && (40..170).contains(&w) {
                500.0
            } else {
                10.0
            }
        });
        let curve = extract_arch(s.as_immutable(), 11, 25.0, &ArchParams::default()).unwrap();
        assert_eq!(curve.source(), ArchSource::Skeleton);
        assert!(!curve.is_fallback());
        assert_eq!(curve.len(), 100);
        assert_well_formed(&curve, (256, 256));

        // 亮块关于 y = 124.5 对称, 拟合结果近似水平.
        for &(_, y) in curve.points() {
            assert!((y - 124.5).abs() < 1.0, "y = {y}");
        }
        // 两侧各外推 25.6 列.
        let (first, last) = (curve.points()[0].0, curve.points()[99].0);
        assert!(first < 100.0 && last > 110.0);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let s = slice_of((96, 96), |(h, w)| ((h * 31 + w * 17) % 23) as f32);
        let params = ArchParams::default();
        let a = extract_arch(s.as_immutable(), 0, 1.0, &params).unwrap();
        let b = extract_arch(s.as_immutable(), 0, 1.0, &params).unwrap();
        assert_eq!(a, b);
        assert_well_formed(&a, (96, 96));
    }

    #[test]
    fn test_invalid_params_rejected() {
        use crate::pipeline::CancelToken;

        let s = slice_of((32, 32), |_| 0.0);
        let bad = [
            ArchParams {
                curve_points: 0,
                ..Default::default()
            },
            ArchParams {
                centroid_sample_columns: 0,
                ..Default::default()
            },
            ArchParams {
                smoothing_sigma: 0.0,
                ..Default::default()
            },
        ];
        for params in bad {
            let err = extract_arch(s.as_immutable(), 0, 1.0, &params).unwrap_err();
            assert!(matches!(err, PanoError::InvalidParams(_)));

            let token = CancelToken::new();
            let err = extract_arch_with(s.as_immutable(), 0, 1.0, &params, &token).unwrap_err();
            assert!(matches!(err, PanoError::InvalidParams(_)));
        }
    }
}
