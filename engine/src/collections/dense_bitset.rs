use bitvec::prelude::{BitBox, bitbox};

/// A fixed-capacity set of small integers, one bit per element.
#[derive(Clone, Debug)]
pub struct DenseBitset {
    bits: BitBox,
}

impl DenseBitset {
    pub fn new(capacity: usize) -> Self {
        DenseBitset {
            bits: bitbox![0; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    fn check(&self, index: usize) {
        assert!(
            index < self.bits.len(),
            "Bitset index {} out of bounds (capacity {})",
            index,
            self.bits.len()
        );
    }

    /// Sets the bit, returning true if it was previously clear.
    pub fn set(&mut self, index: usize) -> bool {
        self.check(index);
        !self.bits.replace(index, true)
    }

    /// Clears the bit, returning true if it was previously set.
    pub fn clear(&mut self, index: usize) -> bool {
        self.check(index);
        self.bits.replace(index, false)
    }

    pub fn test(&self, index: usize) -> bool {
        self.check(index);
        self.bits[index]
    }

    pub fn clear_all(&mut self) {
        self.bits.fill(false);
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_clear_test() {
        let mut bits = DenseBitset::new(130);
        assert!(!bits.test(0));
        assert!(bits.set(0));
        assert!(!bits.set(0));
        assert!(bits.set(64));
        assert!(bits.set(129));

        assert!(bits.test(0) && bits.test(64) && bits.test(129));
        assert!(!bits.test(63) && !bits.test(65));
        assert_eq!(bits.count_ones(), 3);

        assert!(bits.clear(64));
        assert!(!bits.clear(64));
        assert!(!bits.test(64));
        assert_eq!(bits.count_ones(), 2);
    }

    #[test]
    fn test_iter_ones_ascending() {
        let mut bits = DenseBitset::new(200);
        for index in [199, 3, 64, 65, 127] {
            bits.set(index);
        }
        let collected: Vec<usize> = bits.iter_ones().collect();
        assert_eq!(collected, vec![3, 64, 65, 127, 199]);

        bits.clear_all();
        assert_eq!(bits.iter_ones().count(), 0);
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_panics() {
        let bits = DenseBitset::new(10);
        bits.test(10);
    }
}
