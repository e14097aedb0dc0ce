//! Provide `FixedHasher` and `NoOpHasher`.
//!
//! `FixedHasher` is the `foldhash` hasher behind a fixed seed, so the same
//! input hashes to the same value in every process and on every thread.
//!
//! `NoOpHasher` passes a `u64` through unchanged, for keys that already are
//! (or carry) their own hash.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHasher

/// The crate-wide fixed hash seed.
const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x8D44_9F21_C07B_3A65);

/// A hasher whose results depend only on the input.
///
/// A type alias for [`foldhash::fast::FoldHasher`], created through
/// [`FixedHashState::build_hasher`].
pub type FixedHasher = FoldHasher<'static>;

/// Hash state with a random but fixed seed.
///
/// Every member-name map in the project uses this state, which is what allows
/// a hash computed once (see [`Hashed`](crate::hash::Hashed)) to be reused by
/// any other map in the process.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use fieldlens_utils::hash::FixedHashState;
///
/// let a = FixedHashState.hash_one("speed");
/// let b = FixedHashState.hash_one("speed");
/// assert_eq!(a, b);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// NoOpHasher

/// A pass-through hasher, see [`NoOpHashState`].
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHasher {
    hash: u64,
}

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        // Reverse byte order so that a single `write_u32(n)` and a single
        // `write_u64(n)` produce the same value.
        for byte in bytes.iter().rev() {
            self.hash = self.hash.rotate_left(8).wrapping_add(*byte as u64);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.hash = i;
    }
}

/// Hash state for keys that already are a hash.
///
/// `write_u64` stores the input unchanged; this is the right state for
/// [`TypeId`](core::any::TypeId) keys and for
/// [`Hashed`](crate::hash::Hashed) keys, both of which hash themselves with a
/// single `write_u64`.
///
/// # Examples
///
/// ```
/// use core::hash::{BuildHasher, Hash, Hasher};
/// use fieldlens_utils::hash::NoOpHashState;
///
/// let mut hasher = NoOpHashState.build_hasher();
/// 7_u64.hash(&mut hasher);
/// assert_eq!(hasher.finish(), 7);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        NoOpHasher { hash: 0 }
    }
}
