//! RAM-only bond table behind the link's security handler.
//!
//! Nothing here survives a power cycle.  Re-bonding an identity that is
//! already stored refreshes it in place; a new identity arriving at a
//! full table evicts the one stored earliest.

use heapless::Vec;

pub struct BondTable<K, V, const N: usize> {
    entries: Vec<(K, V), N>,
}

impl<K: PartialEq, V, const N: usize> Default for BondTable<K, V, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq, V, const N: usize> BondTable<K, V, N> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store `value` under `key`.  Returns `true` if an older bond had to
    /// be evicted to make room.
    pub fn store(&mut self, key: K, value: V) -> bool {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            *existing = value;
            return false;
        }

        let evicted = self.entries.is_full();
        if evicted {
            self.entries.remove(0);
        }
        let _ = self.entries.push((key, value));
        evicted
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// First bond whose value satisfies `pred`, with its key.
    pub fn find<P>(&self, mut pred: P) -> Option<(&K, &V)>
    where
        P: FnMut(&V) -> bool,
    {
        self.entries
            .iter()
            .find(|(_, v)| pred(v))
            .map(|(k, v)| (k, v))
    }
}
