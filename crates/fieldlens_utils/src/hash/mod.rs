//! Hash states and containers, re-exports *hashbrown* and *foldhash*.

// -----------------------------------------------------------------------------
// Modules

mod hasher;
mod pre_hashed;

// -----------------------------------------------------------------------------
// Exports

pub use hasher::{FixedHashState, FixedHasher};
pub use hasher::{NoOpHashState, NoOpHasher};

pub use pre_hashed::{Hashed, PreHashMap, PreHashMapExt};

/// A [`hashbrown::HashMap`] using the deterministic [`FixedHashState`].
pub type HashMap<K, V> = hashbrown::HashMap<K, V, FixedHashState>;

/// A [`hashbrown::HashSet`] using the deterministic [`FixedHashState`].
pub type HashSet<V> = hashbrown::HashSet<V, FixedHashState>;

/// A [`hashbrown::HashMap`] whose keys carry their own hash, see [`NoOpHashState`].
pub type NoOpHashMap<K, V> = hashbrown::HashMap<K, V, NoOpHashState>;

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;
