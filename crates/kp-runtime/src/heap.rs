//! Bump-allocation watermark over the cell store's byte space.

use kp_contracts::MEM_BYTES;

#[inline]
pub fn clamp_heap(addr: i64) -> i32 {
    if addr < 0 {
        tracing::trace!(addr, "heap watermark clamped to 0");
        0
    } else if addr > i64::from(MEM_BYTES) {
        tracing::trace!(addr, "heap watermark clamped to capacity");
        MEM_BYTES
    } else {
        addr as i32
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    top: i32,
}

impl Watermark {
    pub fn new() -> Self {
        Watermark { top: 0 }
    }

    pub fn reset(&mut self, base: i32) {
        self.top = clamp_heap(i64::from(base));
    }

    pub fn here(&self) -> i32 {
        self.top
    }

    pub fn allot(&mut self, n: i32) {
        self.top = clamp_heap(i64::from(self.top) + i64::from(n));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allot_moves_the_watermark() {
        let mut heap = Watermark::new();
        assert_eq!(heap.here(), 0);
        heap.allot(16);
        heap.allot(8);
        assert_eq!(heap.here(), 24);
        heap.allot(-4);
        assert_eq!(heap.here(), 20);
    }

    #[test]
    fn allot_saturates_at_both_ends() {
        let mut heap = Watermark::new();
        heap.allot(-1);
        assert_eq!(heap.here(), 0);
        heap.allot(i32::MAX);
        assert_eq!(heap.here(), MEM_BYTES);
        heap.allot(i32::MAX);
        assert_eq!(heap.here(), MEM_BYTES);
        heap.allot(i32::MIN);
        assert_eq!(heap.here(), 0);
    }

    #[test]
    fn reset_clamps_base() {
        let mut heap = Watermark::new();
        heap.reset(1024);
        assert_eq!(heap.here(), 1024);
        heap.reset(-7);
        assert_eq!(heap.here(), 0);
        heap.reset(MEM_BYTES + 1);
        assert_eq!(heap.here(), MEM_BYTES);
    }
}
