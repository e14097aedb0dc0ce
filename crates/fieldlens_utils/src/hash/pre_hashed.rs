use core::fmt::Debug;
use core::hash::{BuildHasher, Hash, Hasher};
use core::ops::Deref;

use hashbrown::hash_map::RawEntryMut;

use crate::hash::{FixedHashState, NoOpHashMap};

// -----------------------------------------------------------------------------
// Hashed

/// A value paired with its [`FixedHashState`] hash, computed once.
///
/// Besides memoizing a hash that may be expensive to recompute, `Hashed`
/// short-circuits [`PartialEq`] on hash inequality. [`PreHashMap`] is a map
/// pre-configured for `Hashed` keys.
pub struct Hashed<V> {
    hash: u64,
    value: V,
}

impl<V: Hash> Hashed<V> {
    /// Pre-hashes `value` with the [`FixedHashState`].
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldlens_utils::hash::Hashed;
    ///
    /// let name = Hashed::new("velocity");
    /// assert_eq!(*name, "velocity");
    /// ```
    #[inline]
    pub fn new(value: V) -> Self {
        Self {
            hash: FixedHashState.hash_one(&value),
            value,
        }
    }
}

impl<V> Hashed<V> {
    /// Return the pre-computed hash.
    #[inline(always)]
    pub const fn hash(&self) -> u64 {
        self.hash
    }

    /// Extract the inner value.
    #[inline(always)]
    pub fn into_inner(self) -> V {
        self.value
    }
}

impl<V> Hash for Hashed<V> {
    #[inline]
    fn hash<R: Hasher>(&self, state: &mut R) {
        state.write_u64(self.hash);
    }
}

impl<V> Deref for Hashed<V> {
    type Target = V;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<V: PartialEq> PartialEq for Hashed<V> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.value.eq(&other.value)
    }
}

impl<V: Eq> Eq for Hashed<V> {}

impl<V: Debug> Debug for Hashed<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hashed")
            .field("hash", &self.hash)
            .field("value", &self.value)
            .finish()
    }
}

impl<V: Clone> Clone for Hashed<V> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            hash: self.hash,
            value: self.value.clone(),
        }
    }
}

impl<V: Copy> Copy for Hashed<V> {}

// -----------------------------------------------------------------------------
// PreHashMap

/// A [`NoOpHashMap`] pre-configured to use [`Hashed`] keys.
pub type PreHashMap<K, V> = NoOpHashMap<Hashed<K>, V>;

/// Extension methods on [`PreHashMap`] that take advantage of the
/// pre-computed hash.
pub trait PreHashMapExt<K, V> {
    /// Get or insert the value for the given pre-hashed `key`.
    ///
    /// The stored hash is handed to the table verbatim; the key is only
    /// cloned when a new entry has to be created.
    fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: &Hashed<K>, func: F) -> &mut V;
}

impl<K: Hash + Eq + Clone, V> PreHashMapExt<K, V> for PreHashMap<K, V> {
    #[inline]
    fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: &Hashed<K>, func: F) -> &mut V {
        let entry = self
            .raw_entry_mut()
            .from_key_hashed_nocheck(key.hash(), key);

        match entry {
            RawEntryMut::Occupied(entry) => entry.into_mut(),
            RawEntryMut::Vacant(entry) => {
                let (_, value) = entry.insert_hashed_nocheck(key.hash(), key.clone(), func());
                value
            }
        }
    }
}
