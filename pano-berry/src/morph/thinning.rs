//! 基于迭代腐蚀的简化细化.

use super::BinaryMask;
use crate::consts::arch::{MAX_THINNING_ITERATIONS, MIN_SKELETON_PIXELS};

/// 细化停止的原因.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ThinningStop {
    /// 腐蚀不再删除任何像素.
    Stable,

    /// 达到最大迭代次数.
    BudgetExhausted,

    /// 剩余像素数低于下限.
    TooThin,
}

/// 细化结果.
#[derive(Clone, Debug)]
pub struct ThinningOutcome {
    /// 细化后的二值图.
    pub skeleton: BinaryMask,

    /// 停止原因.
    pub stop: ThinningStop,

    /// 实际执行 (并生效) 的腐蚀次数.
    pub iterations: u32,
}

/// "腐蚀到稳定" 的细化策略.
///
/// 每一步先求出腐蚀将删除的像素: 若为空则停止; 否则接受这次腐蚀,
/// 并在剩余像素数低于 `min_pixels` 时停止. 最多执行 `max_iterations` 步.
///
/// # 注意
///
/// 这不是拓扑保持的细化. 足够细的形状可能被腐蚀到只剩极少像素 (甚至为空),
/// 调用方应当对结果做列数检查.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Thinning {
    /// 最大迭代次数.
    pub max_iterations: u32,

    /// 剩余像素下限.
    pub min_pixels: usize,
}

impl Default for Thinning {
    fn default() -> Self {
        Self {
            max_iterations: MAX_THINNING_ITERATIONS,
            min_pixels: MIN_SKELETON_PIXELS,
        }
    }
}

impl Thinning {
    /// 对 `mask` 执行细化.
    pub fn run(&self, mask: &BinaryMask) -> ThinningOutcome {
        let mut cur = mask.clone();
        for iterations in 0..self.max_iterations {
            let eroded = cur.erode();
            if cur.and_not(&eroded).is_empty() {
                return ThinningOutcome {
                    skeleton: cur,
                    stop: ThinningStop::Stable,
                    iterations,
                };
            }
            cur = eroded;
            if cur.count() < self.min_pixels {
                return ThinningOutcome {
                    skeleton: cur,
                    stop: ThinningStop::TooThin,
                    iterations: iterations + 1,
                };
            }
        }
        ThinningOutcome {
            skeleton: cur,
            stop: ThinningStop::BudgetExhausted,
            iterations: self.max_iterations,
        }
    }
}
