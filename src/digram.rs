use crate::symbol::SymbolKey;
use ahash::AHashMap;
use std::collections::hash_map::Entry;

/// Maps a digram's string fingerprint to the left symbol of its single
/// recorded occurrence. Because the fingerprint already encodes the
/// digram's full value (it isn't a truncated hash), a lookup hit is
/// always a genuine match — there is no collision to re-verify.
#[derive(Debug, Default)]
pub(crate) struct DigramIndex {
    map: AHashMap<String, SymbolKey>,
}

impl DigramIndex {
    pub(crate) fn new() -> Self {
        Self {
            map: AHashMap::new(),
        }
    }

    pub(crate) fn lookup(&self, key: &str) -> Option<SymbolKey> {
        self.map.get(key).copied()
    }

    /// Records (or overwrites) the occurrence of `key` at `left`.
    pub(crate) fn insert(&mut self, key: String, left: SymbolKey) {
        self.map.insert(key, left);
    }

    /// Removes the entry for `key` only if it still points at `left`,
    /// so a digram recorded at a different location is left untouched.
    pub(crate) fn remove_if(&mut self, key: &str, left: SymbolKey) {
        if let Entry::Occupied(e) = self.map.entry(key.to_string()) {
            if *e.get() == left {
                e.remove();
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, SymbolKey)> {
        self.map.iter().map(|(k, &v)| (k.as_str(), v))
    }
}
