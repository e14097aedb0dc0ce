//! Containers for static storage of blueprints.
//!
//! These back the [`Accessible::blueprint`](super::Accessible::blueprint)
//! implementations the derive emits.
//!
//! For non-generic types, [`BlueprintCell`] wraps an [`OnceLock`] with almost
//! no additional expense. If the type is generic, the `static CELL` inside
//! the function may be shared by different instantiations, so
//! [`GenericBlueprintCell`] keys the storage by [`TypeId`] behind an
//! [`RwLock`].

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use std::sync::{OnceLock, PoisonError, RwLock};

use fieldlens_utils::TypeIdMap;

use super::Blueprint;

/// Static blueprint storage for a non-generic type.
///
/// ## Example
///
/// ```
/// use fieldlens_access::describe::{
///     Accessible, Blueprint, BlueprintCell, MemberDecl, Vis,
/// };
///
/// struct Plain {
///     size: u32,
/// }
///
/// impl Accessible for Plain {
///     fn blueprint() -> &'static Blueprint {
///         static CELL: BlueprintCell = BlueprintCell::new();
///         CELL.get_or_init(|| {
///             Blueprint::new::<Plain>(Vis::Public)
///                 .with_members([MemberDecl::field::<u32>("size", Vis::Public)])
///         })
///     }
/// }
///
/// assert_eq!(Plain::blueprint().members().len(), 1);
/// ```
pub struct BlueprintCell(OnceLock<Blueprint>);

impl BlueprintCell {
    /// Create an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns a reference to the blueprint stored in the cell.
    ///
    /// If there is no entry found, a new one will be generated from the given
    /// function.
    #[inline]
    pub fn get_or_init<F>(&self, f: F) -> &Blueprint
    where
        F: FnOnce() -> Blueprint,
    {
        self.0.get_or_init(f)
    }
}

impl Default for BlueprintCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Static blueprint storage for a generic type.
///
/// One `static CELL` in a generic `blueprint` body is shared by every
/// instantiation, so entries are kept per [`TypeId`].
///
/// ## Example
///
/// ```
/// use fieldlens_access::describe::{
///     Accessible, Blueprint, GenericBlueprintCell, MemberDecl, Vis,
/// };
/// use core::any::Any;
///
/// struct Holder<T> {
///     inner: T,
/// }
///
/// impl<T: Any + Clone> Accessible for Holder<T> {
///     fn blueprint() -> &'static Blueprint {
///         static CELL: GenericBlueprintCell = GenericBlueprintCell::new();
///         CELL.get_or_insert::<Self>(|| {
///             Blueprint::new::<Self>(Vis::Public)
///                 .with_members([MemberDecl::field::<T>("inner", Vis::Public)])
///         })
///     }
/// }
///
/// assert!(Holder::<u8>::blueprint().members()[0].type_is::<u8>());
/// assert!(Holder::<String>::blueprint().members()[0].type_is::<String>());
/// ```
pub struct GenericBlueprintCell(RwLock<TypeIdMap<&'static Blueprint>>);

impl GenericBlueprintCell {
    /// Create an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(TypeIdMap::new()))
    }

    /// Returns a reference to the blueprint stored for the instantiation `G`.
    ///
    /// If there is no entry found, a new one will be generated from the given
    /// function.
    #[inline(always)]
    pub fn get_or_insert<G: Any + ?Sized>(&self, f: impl FnOnce() -> Blueprint) -> &Blueprint {
        // Separate to reduce code compilation times
        self.get_or_insert_by_type_id(TypeId::of::<G>(), f)
    }

    // Separate to reduce code compilation times
    #[inline(never)]
    fn get_or_insert_by_type_id(
        &self,
        type_id: TypeId,
        f: impl FnOnce() -> Blueprint,
    ) -> &Blueprint {
        match self.get_by_type_id(type_id) {
            Some(blueprint) => blueprint,
            None => self.insert_by_type_id(type_id, f()),
        }
    }

    // Separate to reduce code compilation times
    #[inline(never)]
    fn get_by_type_id(&self, type_id: TypeId) -> Option<&Blueprint> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied()
    }

    // Separate to reduce code compilation times
    #[inline(never)]
    fn insert_by_type_id(&self, type_id: TypeId, value: Blueprint) -> &Blueprint {
        // Copy the leaked reference out so nothing borrows past the guard.
        *self
            .0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(type_id, || Box::leak(Box::new(value)))
    }
}

impl Default for GenericBlueprintCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::Vis;

    #[test]
    fn generic_cell_keeps_one_entry_per_instantiation() {
        struct Wrapper<T>(#[allow(dead_code)] T);

        static CELL: GenericBlueprintCell = GenericBlueprintCell::new();

        let for_u8 = CELL.get_or_insert::<Wrapper<u8>>(|| {
            Blueprint::new::<Wrapper<u8>>(Vis::Public)
        });
        let for_u16 = CELL.get_or_insert::<Wrapper<u16>>(|| {
            Blueprint::new::<Wrapper<u16>>(Vis::Public)
        });

        assert!(for_u8.ty().is::<Wrapper<u8>>());
        assert!(for_u16.ty().is::<Wrapper<u16>>());

        let again = CELL.get_or_insert::<Wrapper<u8>>(|| {
            unreachable!("entry was initialized above")
        });
        assert!(core::ptr::eq(for_u8, again));
    }
}
