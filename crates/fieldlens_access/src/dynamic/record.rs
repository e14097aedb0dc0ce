use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;
use core::hash::BuildHasher;

use fieldlens_utils::hash::{FixedHashState, Hashed, NoOpHashState, PreHashMap, PreHashMapExt};

use crate::accessor::AccessError;
use crate::dynamic::{CallSite, DynamicMembers};

/// A value a dynamic member can hold.
///
/// Implemented for every `Any + Clone + Send + Sync` type, so plain values
/// can be stored without wrapper types. The trait exists because
/// `Box<dyn Any>` cannot be cloned; record reads hand out clones.
pub trait RecordValue: Any + Send + Sync {
    /// Clones the value behind the trait object.
    fn clone_value(&self) -> Box<dyn RecordValue>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any + Clone + Send + Sync> RecordValue for T {
    #[inline]
    fn clone_value(&self) -> Box<dyn RecordValue> {
        Box::new(self.clone())
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl dyn RecordValue {
    /// Returns `true` if the stored value is a `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrows the stored value as a `T`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably borrows the stored value as a `T`.
    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Takes the stored value as a `T`, or gives the box back.
    pub fn downcast<T: Any>(self: Box<Self>) -> Result<Box<T>, Box<dyn RecordValue>> {
        if self.is::<T>() {
            Ok(self.into_any().downcast().unwrap()) // type was just checked
        } else {
            Err(self)
        }
    }
}

impl Clone for Box<dyn RecordValue> {
    fn clone(&self) -> Self {
        // Deref past the box: `Box<dyn RecordValue>` satisfies the blanket
        // impl itself, so an unqualified call would recurse through this
        // `Clone` impl instead of dispatching to the boxed value.
        (**self).clone_value()
    }
}

impl fmt::Debug for dyn RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordValue({:?})", self.as_any().type_id())
    }
}

/// An insertion-ordered bag of named values, the stock [`DynamicMembers`]
/// target.
///
/// Lookups go through a side index keyed by pre-hashed names, so reads by
/// interned [`CallSite`] never hash the name again. Writes through a site
/// overwrite the member in place or append it, keeping insertion order.
///
/// # Examples
///
/// ```
/// use fieldlens_access::DynamicRecord;
///
/// let mut record = DynamicRecord::new();
/// record.insert("label", "axle".to_owned());
/// record.insert("count", 4_u32);
///
/// assert_eq!(record.index_of("count"), Some(1));
/// assert_eq!(record.get("count").and_then(|v| v.downcast_ref::<u32>()), Some(&4));
///
/// record.insert("count", 6_u32);
/// assert_eq!(record.len(), 2);
/// ```
#[derive(Default, Clone)]
pub struct DynamicRecord {
    names: Vec<Cow<'static, str>>,
    values: Vec<Box<dyn RecordValue>>,
    indices: PreHashMap<Cow<'static, str>, usize>,
}

impl DynamicRecord {
    /// Creates an empty record.
    #[inline]
    pub const fn new() -> Self {
        Self {
            names: Vec::new(),
            values: Vec::new(),
            indices: PreHashMap::with_hasher(NoOpHashState),
        }
    }

    /// Stores `value` under `name`, overwriting an existing member in place.
    #[inline]
    pub fn insert<V: RecordValue>(&mut self, name: impl Into<Cow<'static, str>>, value: V) {
        self.insert_boxed(name, Box::new(value));
    }

    /// Boxed form of [`insert`](Self::insert).
    pub fn insert_boxed(&mut self, name: impl Into<Cow<'static, str>>, value: Box<dyn RecordValue>) {
        let key = Hashed::new(name.into());
        let next = self.values.len();
        let index = *self.indices.get_or_insert_with(&key, || next);
        if index == next {
            self.names.push(key.into_inner());
            self.values.push(value);
        } else {
            self.values[index] = value;
        }
    }

    /// Reads the member named `name`.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&dyn RecordValue> {
        self.index_of(name).map(|index| &*self.values[index])
    }

    /// Mutably reads the member named `name`.
    #[inline]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut dyn RecordValue> {
        let index = self.index_of(name)?;
        Some(&mut *self.values[index])
    }

    /// Returns the insertion position of `name`.
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index_with_hash(name, FixedHashState.hash_one(name))
    }

    /// Returns the name at `index`.
    #[inline]
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|name| &**name)
    }

    /// Returns the value at `index`.
    #[inline]
    pub fn value_at(&self, index: usize) -> Option<&dyn RecordValue> {
        self.values.get(index).map(|value| &**value)
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the record holds no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates members in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &dyn RecordValue)> {
        self.names
            .iter()
            .map(|name| &**name)
            .zip(self.values.iter().map(|value| &**value))
    }

    /// Removes the member named `name` and returns its value.
    ///
    /// Later members shift down one position, like [`Vec::remove`].
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn RecordValue>> {
        use fieldlens_utils::hash::hashbrown::hash_map::RawEntryMut;

        let hash = FixedHashState.hash_one(name);
        let index = self.index_with_hash(name, hash)?;
        match self.indices.raw_entry_mut().from_hash(hash, |key| {
            let key: &str = key;
            key == name
        }) {
            RawEntryMut::Occupied(entry) => {
                entry.remove();
            }
            RawEntryMut::Vacant(_) => {}
        }
        self.names.remove(index);
        let value = self.values.remove(index);
        for slot in self.indices.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        Some(value)
    }

    fn index_with_hash(&self, name: &str, hash: u64) -> Option<usize> {
        self.indices
            .raw_entry()
            .from_hash(hash, |key| {
                let key: &str = key;
                key == name
            })
            .map(|(_, index)| *index)
    }
}

impl DynamicMembers for DynamicRecord {
    fn dyn_get(&self, site: &CallSite) -> Option<Box<dyn RecordValue>> {
        let index = self.index_with_hash(site.name(), site.hash())?;
        // Deref past the box so the clone is not wrapped in a second box
        // (see `Clone for Box<dyn RecordValue>`).
        Some((*self.values[index]).clone_value())
    }

    fn dyn_set(&mut self, site: &CallSite, value: Box<dyn RecordValue>) -> Result<(), AccessError> {
        match self.index_with_hash(site.name(), site.hash()) {
            Some(index) => self.values[index] = value,
            None => self.insert_boxed(site.name_cow().clone(), value),
        }
        Ok(())
    }

    fn type_path(&self) -> &'static str {
        "dynamic record"
    }
}

impl fmt::Debug for DynamicRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicRecord")
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::{Direction, DynamicAccessor};

    #[test]
    fn insert_overwrites_in_place() {
        let mut record = DynamicRecord::new();
        record.insert("a", 1_u32);
        record.insert("b", 2_u32);
        record.insert("a", 10_u32);

        assert_eq!(record.len(), 2);
        assert_eq!(record.index_of("a"), Some(0));
        assert_eq!(record.get("a").and_then(|v| v.downcast_ref::<u32>()), Some(&10));

        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn remove_shifts_later_members_down() {
        let mut record = DynamicRecord::new();
        record.insert("a", 1_u32);
        record.insert("b", 2_u32);
        record.insert("c", 3_u32);

        let removed = record.remove("b").unwrap();
        assert_eq!(removed.downcast_ref::<u32>(), Some(&2));
        assert!(record.remove("b").is_none());

        assert_eq!(record.len(), 2);
        assert_eq!(record.index_of("c"), Some(1));
        assert_eq!(record.name_at(1), Some("c"));
        assert_eq!(record.value_at(1).and_then(|v| v.downcast_ref::<u32>()), Some(&3));
    }

    #[test]
    fn boxed_values_clone_and_downcast() {
        let value: Box<dyn RecordValue> = Box::new("gear".to_owned());
        let copy = value.clone();

        assert!(copy.is::<String>());
        assert_eq!(copy.downcast_ref::<String>().map(String::as_str), Some("gear"));

        let back = copy.downcast::<String>().unwrap();
        assert_eq!(*back, "gear");

        let wrong: Box<dyn RecordValue> = Box::new(7_u8);
        assert!(wrong.downcast::<String>().is_err());
    }

    #[test]
    fn sites_write_through_without_rehashing() {
        let accessor = DynamicAccessor::new();
        let mut record = DynamicRecord::new();
        record.insert("rate", 1.0_f64);

        let site = accessor.site("rate", Direction::Set);
        record.dyn_set(&site, Box::new(2.0_f64)).unwrap();
        assert_eq!(record.get("rate").and_then(|v| v.downcast_ref::<f64>()), Some(&2.0));

        let fresh = accessor.site("extra", Direction::Set);
        record.dyn_set(&fresh, Box::new(9_u32)).unwrap();
        assert_eq!(record.index_of("extra"), Some(1));

        let read = accessor.site("extra", Direction::Get);
        let value = record.dyn_get(&read).unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&9));
        assert!(record.dyn_get(&accessor.site("missing", Direction::Get)).is_none());
    }

    #[test]
    fn whole_records_clone_deeply() {
        let mut record = DynamicRecord::new();
        record.insert("label", "axle".to_owned());

        let mut copy = record.clone();
        copy.insert("label", "shaft".to_owned());

        assert_eq!(
            record.get("label").and_then(|v| v.downcast_ref::<String>()).map(String::as_str),
            Some("axle")
        );
        assert_eq!(
            copy.get("label").and_then(|v| v.downcast_ref::<String>()).map(String::as_str),
            Some("shaft")
        );
    }
}
