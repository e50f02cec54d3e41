use crate::Idx2d;

/// 行优先索引迭代器.
///
/// 与 `(0..h).flat_map(move |a| (0..w).map(move |b| (a, b)))` 等价,
/// 但迭代器本身更小, 且能给出精确长度.
#[derive(Debug, Clone)]
pub struct PosIter {
    cur: Idx2d,
    shape: Idx2d,
}

impl PosIter {
    #[inline]
    pub fn new(shape: Idx2d) -> Self {
        Self { cur: (0, 0), shape }
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    fn next(&mut self) -> Option<Self::Item> {
        let (h, w) = self.shape;
        if h == 0 || w == 0 || self.cur.0 == h {
            return None;
        }
        let ret = self.cur;
        self.cur = if ret.1 + 1 == w {
            (ret.0 + 1, 0)
        } else {
            (ret.0, ret.1 + 1)
        };
        Some(ret)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (h, w) = self.shape;
        let done = self.cur.0 * w + self.cur.1;
        let left = (h * w).saturating_sub(done);
        (left, Some(left))
    }
}

impl ExactSizeIterator for PosIter {}
