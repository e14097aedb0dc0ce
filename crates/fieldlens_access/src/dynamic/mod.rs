//! The fallback for targets whose members only exist at runtime.
//!
//! Typed accessors need a blueprint; a [`DynamicMembers`] target instead
//! answers reads and writes itself, one name at a time. The process-wide
//! [`DynamicAccessor`] keeps one interned [`CallSite`] per accessed name and
//! direction, so the name's hash is computed once per process and every
//! target-side lookup can reuse it. [`DynamicRecord`] is the ready-made
//! name-value implementation.

// -----------------------------------------------------------------------------
// Modules

mod record;

// -----------------------------------------------------------------------------
// Exports

pub use record::{DynamicRecord, RecordValue};

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;
use core::hash::BuildHasher;
use std::sync::{PoisonError, RwLock};

use fieldlens_utils::hash::{FixedHashState, Hashed, NoOpHashState, PreHashMap, PreHashMapExt};

use crate::accessor::AccessError;

/// A target that resolves member names itself, at call time.
///
/// Implementations receive the interned [`CallSite`] of the access, which
/// carries the member name together with its pre-computed hash.
pub trait DynamicMembers: Any + Send + Sync {
    /// Reads the member the site names, or `None` if the target has no such
    /// member.
    fn dyn_get(&self, site: &CallSite) -> Option<Box<dyn RecordValue>>;

    /// Writes the member the site names.
    ///
    /// Targets decide themselves how to treat unknown names; a
    /// [`DynamicRecord`] appends, a stricter target can refuse.
    fn dyn_set(&mut self, site: &CallSite, value: Box<dyn RecordValue>)
    -> Result<(), AccessError>;

    /// A display path for error messages.
    fn type_path(&self) -> &'static str {
        "dynamic object"
    }
}

/// Whether a call site reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Get,
    Set,
}

/// One interned access point: a member name, its hash and its direction.
pub struct CallSite {
    name: Cow<'static, str>,
    hash: u64,
    direction: Direction,
}

impl CallSite {
    /// Returns the member name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pre-computed [`FixedHashState`] hash of the name.
    ///
    /// Targets that key their storage with the same state (for example
    /// through [`Hashed`]) can look members up without hashing again.
    #[inline]
    pub const fn hash(&self) -> u64 {
        self.hash
    }

    /// Returns the site's direction.
    #[inline]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub(crate) fn name_cow(&self) -> &Cow<'static, str> {
        &self.name
    }
}

impl fmt::Debug for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSite")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

type SiteMap = RwLock<PreHashMap<Cow<'static, str>, Arc<CallSite>>>;

/// The accessor for [`DynamicMembers`] targets.
///
/// There is no compilation step; what gets cached are the call sites.
/// The process-wide instance lives behind [`dynamic_accessor`], separate
/// instances only make sense for keeping site caches apart, e.g. in tests.
///
/// # Examples
///
/// ```
/// use fieldlens_access::{DynamicRecord, dynamic_accessor};
///
/// let accessor = dynamic_accessor();
/// let mut record = DynamicRecord::new();
///
/// accessor.set_with(&mut record, "speed", 3.5_f64)?;
/// let speed = accessor.get(&record, "speed")?;
/// assert_eq!(speed.downcast_ref::<f64>(), Some(&3.5));
/// # Ok::<(), fieldlens_access::AccessError>(())
/// ```
pub struct DynamicAccessor {
    get_sites: SiteMap,
    set_sites: SiteMap,
}

impl DynamicAccessor {
    /// Create an accessor with empty site caches.
    #[inline]
    pub const fn new() -> Self {
        Self {
            get_sites: RwLock::new(PreHashMap::with_hasher(NoOpHashState)),
            set_sites: RwLock::new(PreHashMap::with_hasher(NoOpHashState)),
        }
    }

    /// Returns the interned site for `name` in `direction`.
    ///
    /// The fast path probes with the name's hash and allocates nothing;
    /// only the first access of a name copies it to owned storage.
    pub fn site(&self, name: &str, direction: Direction) -> Arc<CallSite> {
        let sites = self.sites_for(direction);
        let hash = FixedHashState.hash_one(name);
        {
            let map = sites.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((_, site)) = map.raw_entry().from_hash(hash, |key| {
                let key: &str = key;
                key == name
            }) {
                return Arc::clone(site);
            }
        }
        let key = Hashed::new(Cow::Owned(name.to_owned()));
        let mut map = sites.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.get_or_insert_with(&key, || {
            Arc::new(CallSite {
                name: Cow::Owned(name.to_owned()),
                hash,
                direction,
            })
        }))
    }

    /// Reads the member named `name` from a dynamic target.
    pub fn get(
        &self,
        target: &dyn DynamicMembers,
        name: &str,
    ) -> Result<Box<dyn RecordValue>, AccessError> {
        let site = self.site(name, Direction::Get);
        target.dyn_get(&site).ok_or_else(|| AccessError::UnknownMember {
            type_path: Cow::Borrowed(target.type_path()),
            member: site.name_cow().clone(),
        })
    }

    /// Writes the member named `name` on a dynamic target.
    pub fn set(
        &self,
        target: &mut dyn DynamicMembers,
        name: &str,
        value: Box<dyn RecordValue>,
    ) -> Result<(), AccessError> {
        let site = self.site(name, Direction::Set);
        target.dyn_set(&site, value)
    }

    /// Writes the member named `name`, boxing the value.
    #[inline]
    pub fn set_with<V: RecordValue>(
        &self,
        target: &mut dyn DynamicMembers,
        name: &str,
        value: V,
    ) -> Result<(), AccessError> {
        self.set(target, name, Box::new(value))
    }

    /// Unsupported for dynamic targets.
    ///
    /// # Panics
    ///
    /// Always; a dynamic target cannot distinguish "no such member" from
    /// "member not set yet", which is what the `try` contract needs.
    pub fn try_get(&self, _target: &dyn DynamicMembers, _name: &str) -> Option<Box<dyn RecordValue>> {
        panic!("`try_get` is not supported for dynamic targets")
    }

    /// Unsupported for dynamic targets.
    ///
    /// # Panics
    ///
    /// Always, see [`try_get`](Self::try_get).
    pub fn try_set(
        &self,
        _target: &mut dyn DynamicMembers,
        _name: &str,
        _value: Box<dyn RecordValue>,
    ) -> bool {
        panic!("`try_set` is not supported for dynamic targets")
    }

    /// Number of interned sites in `direction`.
    pub fn cached_sites(&self, direction: Direction) -> usize {
        self.sites_for(direction)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn sites_for(&self, direction: Direction) -> &SiteMap {
        match direction {
            Direction::Get => &self.get_sites,
            Direction::Set => &self.set_sites,
        }
    }
}

impl Default for DynamicAccessor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DynamicAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicAccessor")
            .field("get_sites", &self.cached_sites(Direction::Get))
            .field("set_sites", &self.cached_sites(Direction::Set))
            .finish()
    }
}

/// Returns the process-wide [`DynamicAccessor`].
pub fn dynamic_accessor() -> &'static DynamicAccessor {
    static INSTANCE: DynamicAccessor = DynamicAccessor::new();
    &INSTANCE
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sites_are_interned_per_name_and_direction() {
        let accessor = DynamicAccessor::new();

        let first = accessor.site("speed", Direction::Get);
        let second = accessor.site("speed", Direction::Get);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "speed");
        assert_eq!(first.hash(), FixedHashState.hash_one("speed"));

        let write = accessor.site("speed", Direction::Set);
        assert!(!Arc::ptr_eq(&first, &write));
        assert_eq!(write.direction(), Direction::Set);

        accessor.site("mass", Direction::Get);
        assert_eq!(accessor.cached_sites(Direction::Get), 2);
        assert_eq!(accessor.cached_sites(Direction::Set), 1);
    }

    #[test]
    fn get_and_set_through_a_record() {
        let accessor = DynamicAccessor::new();
        let mut record = DynamicRecord::new();

        accessor.set_with(&mut record, "name", "pump-4".to_owned()).unwrap();
        accessor.set_with(&mut record, "rate", 12.5_f64).unwrap();

        let rate = accessor.get(&record, "rate").unwrap();
        assert_eq!(rate.downcast_ref::<f64>(), Some(&12.5));

        let err = accessor.get(&record, "pressure").unwrap_err();
        assert_eq!(
            err.to_string(),
            "type `dynamic record` has no accessible member `pressure`"
        );
    }

    #[test]
    #[should_panic(expected = "not supported for dynamic targets")]
    fn try_get_panics() {
        let accessor = DynamicAccessor::new();
        let record = DynamicRecord::new();
        let _ = accessor.try_get(&record, "speed");
    }

    #[test]
    fn the_shared_instance_is_stable() {
        assert!(core::ptr::eq(dynamic_accessor(), dynamic_accessor()));
    }
}
