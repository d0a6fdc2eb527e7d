// SPDX-License-Identifier: GPL-2.0-only

//
// Generic hash table with separate chaining
//

/// Distance from each power of two to the largest prime below it
const DELTA: [usize; 32] = [
    0,  0, 1, 1, 3, 1, 3, 1,  5, 3,  3, 9,  3,  1, 3,  19,
    15, 1, 5, 1, 3, 9, 3, 15, 3, 39, 5, 39, 57, 3, 35, 1,
];

const INITIAL_DELTA_INDEX: usize = 4;

/// Size of the table at a position in the capacity sequence
fn capacity_at(idx: usize) -> usize {
    (1usize << idx) - DELTA[idx]
}

pub struct HashTab<K, V> {
    // Every bucket keeps its entries in insertion order
    buckets: Vec<Vec<(K, V)>>,
    len: usize,
    max_load: f32,
    idx: usize,
    hash: fn(&K, usize) -> usize,
    eq: fn(&K, &K) -> bool,
}

impl<K, V> HashTab<K, V> {
    /// Create an empty table that grows once `len / capacity` exceeds `max_load`
    pub fn new(max_load: f32, hash: fn(&K, usize) -> usize, eq: fn(&K, &K) -> bool) -> HashTab<K, V> {
        assert!(max_load > 0.0);
        let idx = INITIAL_DELTA_INDEX + 1;
        HashTab {
            buckets: (0..capacity_at(idx)).map(|_| Vec::new()).collect(),
            len: 0,
            max_load: max_load,
            idx: idx,
            hash: hash,
            eq: eq,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn bucket(&self, key: &K) -> usize {
        (self.hash)(key, self.buckets.len()) % self.buckets.len()
    }

    /// Append an entry to the tail of its bucket, growing the table if needed
    pub fn insert(&mut self, key: K, value: V) {
        let i = self.bucket(&key);
        self.buckets[i].push((key, value));
        self.len += 1;
        while self.len as f32 > self.max_load * self.buckets.len() as f32 && self.idx + 1 < DELTA.len() {
            self.rehash();
        }
    }

    /// Find the first entry matching key
    pub fn search(&self, key: &K) -> Option<&V> {
        self.buckets[self.bucket(key)]
            .iter()
            .find(|(k, _)| (self.eq)(key, k))
            .map(|(_, v)| v)
    }

    fn rehash(&mut self) {
        if self.idx + 1 >= DELTA.len() {
            // Largest capacity reached
            return;
        }
        self.idx += 1;
        let size = capacity_at(self.idx);
        let mut buckets: Vec<Vec<(K, V)>> = (0..size).map(|_| Vec::new()).collect();

        // Walking the old buckets in order keeps each chain's relative order
        for (key, value) in self.buckets.drain(..).flatten() {
            let i = (self.hash)(&key, size) % size;
            buckets[i].push((key, value));
        }
        self.buckets = buckets;
    }

    /// Iterate over all entries in bucket order
    pub fn iter(&self) -> impl Iterator<Item = &(K, V)> {
        self.buckets.iter().flatten()
    }

    /// Tear down the table, handing every key and value to the callbacks
    pub fn free<FK, FV>(self, mut freekey: FK, mut freeval: FV)
        where FK: FnMut(K), FV: FnMut(V)
    {
        for (key, value) in self.buckets.into_iter().flatten() {
            freekey(key);
            freeval(value);
        }
    }

    /// Render one line per bucket, chaining the entries with arrows
    pub fn dump<F>(&self, keyval2str: F) -> String
        where F: Fn(&K, &V) -> String
    {
        let mut out = String::new();
        for (i, bucket) in self.buckets.iter().enumerate() {
            out.push_str(&format!("bucket[{:2}]", i));
            for (key, value) in bucket {
                out.push_str(" --> ");
                out.push_str(&keyval2str(key, value));
            }
            out.push_str(" --> NULL\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(key: &u32, _: usize) -> usize {
        *key as usize
    }

    // Everything in one bucket
    fn constant(_: &u32, _: usize) -> usize {
        0
    }

    fn same(a: &u32, b: &u32) -> bool {
        a == b
    }

    #[test]
    fn capacity_sequence() {
        let sizes: Vec<usize> = (5..12).map(capacity_at).collect();
        assert_eq!(sizes, vec![31, 61, 127, 251, 509, 1021, 2039]);

        let tab: HashTab<u32, u32> = HashTab::new(0.75, ident, same);
        assert_eq!(tab.capacity(), 31);
        assert!(tab.is_empty());
    }

    #[test]
    fn load_factor_holds_after_every_insert() {
        let mut tab = HashTab::new(0.75, ident, same);
        let mut last = tab.capacity();
        for key in 0..5000u32 {
            tab.insert(key, key * 2);
            assert!(tab.len() as f32 <= 0.75 * tab.capacity() as f32);
            assert!(tab.capacity() >= last);
            last = tab.capacity();
        }
        assert_eq!(tab.len(), 5000);
    }

    #[test]
    fn small_load_factor_grows_several_steps() {
        let mut tab = HashTab::new(0.01, ident, same);
        for key in 0..20u32 {
            tab.insert(key, ());
            assert!(tab.len() as f32 <= 0.01 * tab.capacity() as f32, "after {}", key);
        }
        // 20 entries at 1% need at least 2000 buckets
        assert_eq!(tab.capacity(), 2039);
    }

    #[test]
    fn rehash_preserves_contents() {
        let mut tab = HashTab::new(0.5, ident, same);
        for key in 0..1000u32 {
            tab.insert(key * 7, format!("v{}", key));
        }
        assert!(tab.capacity() > 1000);
        for key in 0..1000u32 {
            assert_eq!(tab.search(&(key * 7)), Some(&format!("v{}", key)));
        }
        assert_eq!(tab.search(&1), None);
        assert_eq!(tab.iter().count(), 1000);
    }

    #[test]
    fn chain_order_survives_rehash() {
        let mut tab = HashTab::new(0.75, constant, same);
        for key in 0..100u32 {
            tab.insert(key, ());
        }
        let keys: Vec<u32> = tab.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, (0..100).collect::<Vec<u32>>());
    }

    #[test]
    fn first_match_wins() {
        let mut tab = HashTab::new(0.75, ident, same);
        tab.insert(3, "first");
        tab.insert(3, "second");
        assert_eq!(tab.search(&3), Some(&"first"));
        assert_eq!(tab.len(), 2);
    }

    #[test]
    fn free_visits_every_entry() {
        let mut tab = HashTab::new(0.75, ident, same);
        for key in 0..40u32 {
            tab.insert(key, key + 100);
        }
        let mut keys = Vec::new();
        let mut vals = Vec::new();
        tab.free(|k| keys.push(k), |v| vals.push(v));
        keys.sort();
        vals.sort();
        assert_eq!(keys, (0..40).collect::<Vec<u32>>());
        assert_eq!(vals, (100..140).collect::<Vec<u32>>());
    }

    #[test]
    fn dump_format() {
        let mut tab = HashTab::new(0.75, constant, same);
        tab.insert(1, 'a');
        tab.insert(2, 'b');
        let dump = tab.dump(|k, v| format!("{}={}", k, v));
        let mut lines = dump.lines();
        assert_eq!(lines.next(), Some("bucket[ 0] --> 1=a --> 2=b --> NULL"));
        assert_eq!(lines.next(), Some("bucket[ 1] --> NULL"));
        assert_eq!(dump.lines().count(), 31);
    }
}
