use crate::collections::dense_bitset::DenseBitset;

/// A pool allocator for fixed-size objects, handing out dense slot indices.
pub struct Pool {
    free_indices: Vec<u32>,
    // Mirrors `free_indices` for constant-time double free detection
    free_set: DenseBitset,
    next_free_index: u32,
    capacity: u32,
}

impl Pool {
    pub fn new(capacity: u32) -> Self {
        Pool {
            free_indices: Vec::new(),
            free_set: DenseBitset::new(capacity as usize),
            next_free_index: 0,
            capacity,
        }
    }

    pub fn allocate(&mut self) -> Option<u32> {
        // If there are any free indices, reuse one
        if let Some(index) = self.free_indices.pop() {
            self.free_set.clear(index as usize);
            return Some(index);
        }

        // Otherwise, allocate a new index if we have capacity
        if self.next_free_index < self.capacity {
            let index = self.next_free_index;
            self.next_free_index += 1;
            Some(index)
        } else {
            None
        }
    }

    pub fn free(&mut self, index: u32) {
        assert!(
            index < self.next_free_index,
            "Invalid index to free: {}",
            index
        );
        assert!(
            self.free_set.set(index as usize),
            "Double free of index {}",
            index
        );
        self.free_indices.push(index);
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn allocated(&self) -> u32 {
        self.next_free_index - self.free_indices.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reuses_freed_indices() {
        let mut pool = Pool::new(3);
        assert_eq!(pool.allocate(), Some(0));
        assert_eq!(pool.allocate(), Some(1));
        assert_eq!(pool.allocate(), Some(2));
        assert_eq!(pool.allocate(), None);
        assert_eq!(pool.allocated(), 3);

        pool.free(1);
        assert_eq!(pool.allocated(), 2);
        assert_eq!(pool.allocate(), Some(1));
        assert_eq!(pool.allocate(), None);
    }

    #[test]
    #[should_panic]
    fn test_free_of_unallocated_index_panics() {
        let mut pool = Pool::new(4);
        pool.allocate();
        pool.free(2);
    }

    #[test]
    #[should_panic(expected = "Double free")]
    fn test_double_free_panics() {
        let mut pool = Pool::new(4);
        pool.allocate();
        pool.allocate();
        pool.free(1);
        pool.free(1);
    }

    // A slot freed, reallocated and freed again is not a double free
    #[test]
    fn test_free_after_reuse() {
        let mut pool = Pool::new(2048);
        let slots: Vec<u32> = (0..2048).map(|_| pool.allocate().unwrap()).collect();
        for &slot in &slots {
            pool.free(slot);
        }
        assert_eq!(pool.allocated(), 0);

        for _ in 0..2048 {
            pool.allocate().unwrap();
        }
        for &slot in slots.iter().rev() {
            pool.free(slot);
        }
        assert_eq!(pool.allocated(), 0);
    }
}
