//! 选出最可能包含牙弓的水平切片.

use crate::consts::select::BRIGHT_PERCENTILE;
use crate::{CbctVolume, ScanSlice};
use std::ops::Range;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 候选切片范围 `[depth / 3, 2 * depth / 3)`.
#[inline]
pub fn candidate_range(depth: usize) -> Range<usize> {
    depth / 3..2 * depth / 3
}

/// 切片得分: 严格大于该切片自身 90 百分位的像素个数.
#[inline]
pub fn bright_count(slice: &ScanSlice<'_>) -> usize {
    slice.count_above(slice.percentile(BRIGHT_PERCENTILE))
}

/// 返回被选中切片的索引.
///
/// 在候选范围内得分最高者胜出, 得分相同时取索引最小者 (因此全为 0 时取第一个候选).
/// 深度不足 3 时直接返回 `depth / 2`, 即便 `depth == 2` 时 `[0, 1)` 非空也不打分,
/// 因此两层的体数据总是选第 1 层. 结果总在 `[0, depth)` 之内.
pub fn select_slice(volume: &CbctVolume) -> usize {
    let depth = volume.depth();
    let range = candidate_range(depth);
    if depth < 3 || range.is_empty() {
        return depth / 2;
    }

    let start = range.start;
    let scores = candidate_scores(volume, range);

    // 不用 `max_by_key`, 它在相等时返回最后一个.
    let mut best = (start, scores[0]);
    for (offset, &score) in scores.iter().enumerate().skip(1) {
        if score > best.1 {
            best = (start + offset, score);
        }
    }
    log::debug!(
        "selected slice {} of {depth} ({} bright pixels)",
        best.0,
        best.1
    );
    best.0
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        fn candidate_scores(volume: &CbctVolume, range: Range<usize>) -> Vec<usize> {
            range
                .into_par_iter()
                .map(|z| bright_count(&volume.slice_at(z)))
                .collect()
        }
    } else {
        fn candidate_scores(volume: &CbctVolume, range: Range<usize>) -> Vec<usize> {
            range.map(|z| bright_count(&volume.slice_at(z))).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VoxelSpacing;
    use ndarray::Array3;

    fn volume<F: FnMut((usize, usize, usize)) -> f32>(shape: (usize, usize, usize), f: F) -> CbctVolume {
        CbctVolume::new(Array3::from_shape_fn(shape, f), VoxelSpacing::unit()).unwrap()
    }

    #[test]
    fn test_candidate_range() {
        assert_eq!(candidate_range(40), 13..26);
        assert_eq!(candidate_range(3), 1..2);
        assert!(candidate_range(1).is_empty());
    }

    #[test]
    fn test_shallow_volume() {
        assert_eq!(select_slice(&volume((1, 4, 4), |_| 1.0)), 0);
        assert_eq!(select_slice(&volume((2, 4, 4), |_| 1.0)), 1);
        // 两层时不打分, 即使亮像素都在第 0 层.
        let vol = volume((2, 4, 4), |(z, h, w)| if (z, h, w) == (0, 1, 1) { 900.0 } else { 1.0 });
        assert_eq!(select_slice(&vol), 1);
    }

    #[test]
    fn test_flat_volume_picks_first_candidate() {
        assert_eq!(select_slice(&volume((30, 8, 8), |_| 7.0)), 10);
    }

    #[test]
    fn test_brightest_population_wins() {
        // 第 z 层有 z 个亮像素 (在 64 个像素中, 只要少于 10% 就全部高于 90 百分位).
        let vol = volume((9, 8, 8), |(z, h, w)| {
            let bright = match z {
                3 => 2,
                4 => 5,
                5 => 3,
                _ => 6,
            };
            if h * 8 + w < bright {
                100.0
            } else {
                0.0
            }
        });
        assert_eq!(candidate_range(9), 3..6);
        assert_eq!(select_slice(&vol), 4);
    }

    #[test]
    fn test_ties_go_to_smallest_index() {
        let vol = volume((9, 8, 8), |(z, h, w)| {
            if (z == 4 || z == 5) && h * 8 + w < 3 {
                100.0
            } else {
                0.0
            }
        });
        assert_eq!(select_slice(&vol), 4);
    }
}
