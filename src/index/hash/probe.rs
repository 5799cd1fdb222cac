//! Probe sequence
//!
//! `j = hash`; each step yields `j mod size`, then
//! `j = 5 * j + 1 + perturb` and `perturb >>= shift`.
//!
//! Once `perturb` has been shifted down to zero the recurrence is the
//! full-period LCG `j -> 5j + 1` over a power-of-two modulus, so the
//! remaining `size` steps visit every slot. The sequence is therefore bounded
//! to `size + ceil(64 / shift)` steps.

/// Iterator over the slot indices probed for one hash
pub(super) struct ProbeSeq {
    j: u64,
    perturb: u64,
    shift: u32,
    size: u64,
    remaining: usize,
}

impl ProbeSeq {
    pub(super) fn new(hash: u64, size: usize, shift: u32) -> Self {
        let shift_bits = shift as usize;
        let warmup = (u64::BITS as usize + shift_bits - 1) / shift_bits;
        Self {
            j: hash,
            perturb: hash,
            shift,
            size: size as u64,
            remaining: size + warmup,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 || self.size == 0 {
            return None;
        }
        self.remaining -= 1;

        let index = self.j % self.size;
        self.j = index
            .wrapping_mul(5)
            .wrapping_add(1)
            .wrapping_add(self.perturb);
        self.perturb >>= self.shift;

        Some(index as usize)
    }
}
