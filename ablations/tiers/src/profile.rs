//! 检测运行统计.

use pano_berry::ArchSource;
use std::time::{Duration, Instant};

/// ablation/benchmark 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时.
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    #[inline]
    fn total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// 一组扫描上的统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 无法加载的扫描个数.
    failed: u64,

    /// 按 [`ArchSource::TIERS`] 顺序, 各级方法生效的次数.
    tiers: [u64; 3],

    /// 检测 + 投影花费的总时间.
    work_time: AccTimer,

    /// 包括 I/O 在内的总时间.
    real_time: AccTimer,

    /// 最耗时的一次检测 + 投影.
    most: Option<Duration>,
}

impl Profile {
    /// 初始化, 同时开始总计时.
    pub fn new() -> Self {
        Self {
            failed: 0,
            tiers: [0; 3],
            work_time: AccTimer::new(),
            real_time: AccTimer::new(),
            most: None,
        }
    }

    /// 记录一次加载失败.
    #[inline]
    pub fn count_failed(&mut self) {
        self.failed += 1;
    }

    /// 开始一次检测计时.
    #[inline]
    pub fn work_start(&mut self) {
        self.work_time.start();
    }

    /// 结束一次检测计时, 并记录生效的方法.
    pub fn work_done(&mut self, source: ArchSource) {
        let d = self.work_time.elapsed();
        self.most = Some(self.most.map_or(d, |m| m.max(d)));
        if let Some(i) = ArchSource::TIERS.iter().position(|&t| t == source) {
            self.tiers[i] += 1;
        }
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    /// 合并另一个线程的统计. 总时间取较大者.
    pub fn merge(mut self, other: Profile) -> Self {
        self.failed += other.failed;
        for (a, b) in self.tiers.iter_mut().zip(other.tiers) {
            *a += b;
        }
        self.work_time.consumed += other.work_time.consumed;
        self.real_time.consumed = self.real_time.consumed.max(other.real_time.consumed);
        self.most = match (self.most, other.most) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// `source` 生效的次数.
    #[inline]
    pub fn tier_count(&self, source: ArchSource) -> u64 {
        ArchSource::TIERS
            .iter()
            .position(|&t| t == source)
            .map_or(0, |i| self.tiers[i])
    }

    /// 成功处理的扫描个数.
    #[inline]
    pub fn processed(&self) -> u64 {
        self.tiers.iter().sum()
    }

    /// 降级方法所占比例.
    pub fn fallback_rate(&self) -> Option<f64> {
        match self.processed() {
            0 => None,
            n => Some((n - self.tier_count(ArchSource::Skeleton)) as f64 / n as f64),
        }
    }

    #[inline]
    pub fn work_time_us(&self) -> u64 {
        self.work_time.total_us()
    }

    #[inline]
    pub fn real_time_us(&self) -> u64 {
        self.real_time.total_us()
    }

    /// 以微秒为单位获得单次检测的平均时间.
    pub fn avg_work_time_us(&self) -> Option<f64> {
        match self.processed() {
            0 => None,
            n => Some(self.work_time_us() as f64 / n as f64),
        }
    }

    #[inline]
    pub fn most_time_consuming(&self) -> Option<Duration> {
        self.most
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
