/// A sparse set keyed by small integers in `0..capacity`.
///
/// Insert, remove and lookup are O(1). Present entries live contiguously in a dense array,
/// so iteration only touches what is actually in the set. Removal swaps the last dense entry
/// into the hole, so iteration order is not stable across removals.
pub struct SparseMembershipSet<T> {
    // key -> index into dense. Only meaningful when dense[sparse[key]] == key.
    sparse: Box<[u32]>,
    dense_keys: Vec<u32>,
    dense_values: Vec<T>,
}

impl<T> SparseMembershipSet<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity <= u32::MAX as usize,
            "SparseMembershipSet capacity {} does not fit in u32",
            capacity
        );

        SparseMembershipSet {
            sparse: vec![0u32; capacity].into_boxed_slice(),
            dense_keys: Vec::new(),
            dense_values: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.sparse.len()
    }

    pub fn len(&self) -> usize {
        self.dense_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense_keys.is_empty()
    }

    fn dense_index(&self, key: usize) -> Option<usize> {
        let index = *self.sparse.get(key)? as usize;
        match self.dense_keys.get(index) {
            Some(&dense_key) if dense_key as usize == key => Some(index),
            _ => None,
        }
    }

    pub fn contains(&self, key: usize) -> bool {
        self.dense_index(key).is_some()
    }

    pub fn get(&self, key: usize) -> Option<&T> {
        self.dense_index(key).map(|index| &self.dense_values[index])
    }

    pub fn get_mut(&mut self, key: usize) -> Option<&mut T> {
        let index = self.dense_index(key)?;
        Some(&mut self.dense_values[index])
    }

    /// Inserts or replaces the value for `key`, returning the previous value.
    pub fn insert(&mut self, key: usize, value: T) -> Option<T> {
        assert!(
            key < self.sparse.len(),
            "Key {} out of bounds (capacity {})",
            key,
            self.sparse.len()
        );

        if let Some(index) = self.dense_index(key) {
            return Some(std::mem::replace(&mut self.dense_values[index], value));
        }

        self.sparse[key] = self.dense_keys.len() as u32;
        self.dense_keys.push(key as u32);
        self.dense_values.push(value);
        None
    }

    pub fn remove(&mut self, key: usize) -> Option<T> {
        let index = self.dense_index(key)?;
        let last_key = *self.dense_keys.last()? as usize;

        self.dense_keys.swap_remove(index);
        let value = self.dense_values.swap_remove(index);

        if last_key != key {
            self.sparse[last_key] = index as u32;
        }

        Some(value)
    }

    pub fn clear(&mut self) {
        self.dense_keys.clear();
        self.dense_values.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.dense_keys
            .iter()
            .map(|&key| key as usize)
            .zip(self.dense_values.iter())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.dense_values.iter_mut()
    }

    /// Removes every entry for which `keep` returns false, passing removed entries to `removed`.
    pub fn retain_or_else(
        &mut self,
        mut keep: impl FnMut(usize, &mut T) -> bool,
        mut removed: impl FnMut(usize, T),
    ) {
        let mut index = 0;
        while index < self.dense_keys.len() {
            let key = self.dense_keys[index] as usize;
            if keep(key, &mut self.dense_values[index]) {
                index += 1;
                continue;
            }

            // Swap-remove brings an unvisited entry into `index`, so don't advance
            if let Some(value) = self.remove(key) {
                removed(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove_contains() {
        let mut set = SparseMembershipSet::new(16);
        assert!(set.is_empty());

        assert_eq!(set.insert(3, "a"), None);
        assert_eq!(set.insert(9, "b"), None);
        assert_eq!(set.insert(15, "c"), None);
        assert_eq!(set.insert(9, "B"), Some("b"));
        assert_eq!(set.len(), 3);

        assert!(set.contains(3) && set.contains(9) && set.contains(15));
        assert!(!set.contains(0) && !set.contains(4));
        assert_eq!(set.get(9), Some(&"B"));

        assert_eq!(set.remove(3), Some("a"));
        assert_eq!(set.remove(3), None);
        assert!(!set.contains(3));
        // The moved entry is still reachable
        assert_eq!(set.get(15), Some(&"c"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_stale_sparse_entries_are_not_members() {
        let mut set = SparseMembershipSet::new(8);
        set.insert(1, ());
        set.insert(2, ());
        set.remove(1);
        set.remove(2);
        // sparse[1] and sparse[2] still point into dense, but dense is empty
        assert!(!set.contains(1));
        assert!(!set.contains(2));

        set.insert(5, ());
        // sparse[1] == 0 == position of key 5, must not alias
        assert!(!set.contains(1));
        assert!(set.contains(5));
    }

    #[test]
    fn test_iteration_is_dense() {
        let mut set = SparseMembershipSet::new(1000);
        for key in (0..1000).step_by(100) {
            set.insert(key, key * 2);
        }
        set.remove(500);

        let mut collected: Vec<(usize, usize)> = set.iter().map(|(k, v)| (k, *v)).collect();
        collected.sort();
        assert_eq!(collected.len(), 9);
        assert!(collected.iter().all(|(k, v)| *v == k * 2 && *k != 500));
    }

    #[test]
    fn test_retain_or_else_visits_every_entry() {
        let mut set = SparseMembershipSet::new(32);
        for key in 0..32 {
            set.insert(key, key);
        }

        let mut removed = Vec::new();
        set.retain_or_else(|key, _| key % 3 == 0, |key, value| removed.push((key, value)));

        assert_eq!(set.len(), 11);
        assert_eq!(removed.len(), 21);
        assert!(set.iter().all(|(key, _)| key % 3 == 0));
        assert!(removed.iter().all(|(key, value)| key % 3 != 0 && key == value));
    }
}
