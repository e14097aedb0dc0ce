//! Static descriptions of member-accessible types.
//!
//! A [`Blueprint`] records, per type, which members exist, how each one can
//! be reached (field slot, accessor methods, reference accessors), the
//! declared visibility of every accessor side, and an optional parameterless
//! constructor. Blueprints carry no policy decisions; admission and
//! capability filtering happen later, when a
//! [`TypeAccessor`](crate::accessor::TypeAccessor) is compiled for one
//! [`AccessPolicy`].
//!
//! Blueprints come from two sources:
//!
//! - `#[derive(Accessible)]` emits a blueprint plus a static
//!   [`DispatchTable`] of jump-table functions, stored in a
//!   [`BlueprintCell`] (or [`GenericBlueprintCell`] for generic types).
//! - [`BlueprintBuilder`] assembles a blueprint at runtime from closures,
//!   for types that cannot carry the derive.

use core::any::{Any, TypeId};

// -----------------------------------------------------------------------------
// Modules

mod blueprint;
mod builder;
mod cell;
mod table;

// -----------------------------------------------------------------------------
// Exports

pub use blueprint::{Blueprint, Constructor, MemberDecl, MemberKind};
pub use builder::BlueprintBuilder;
pub use cell::{BlueprintCell, GenericBlueprintCell};
pub use table::{DispatchTable, TableError};

pub(crate) use blueprint::{
    CreateThunk, GetThunk, MutThunk, RefThunk, SetThunk, ThunkSet, mut_thunk, ref_thunk,
};

// -----------------------------------------------------------------------------
// Accessible

/// A type with a static member description.
///
/// Usually implemented through `#[derive(Accessible)]`; the derive also emits
/// the dispatch table that makes the fast
/// [`FullyCompiled`](crate::accessor::Strategy::FullyCompiled) strategy
/// possible. Hand-written implementations are rare but valid, typically
/// delegating to a [`BlueprintBuilder`] inside a [`BlueprintCell`].
///
/// # Examples
///
/// ```
/// use fieldlens_access::derive::Accessible;
///
/// #[derive(Accessible, Default)]
/// pub struct Probe {
///     pub id: u32,
/// }
///
/// let blueprint = <Probe as fieldlens_access::Accessible>::blueprint();
/// assert_eq!(blueprint.members().len(), 1);
/// ```
pub trait Accessible: Any {
    /// Returns the description of `Self`.
    ///
    /// The first call builds the blueprint; every later call returns the same
    /// reference.
    fn blueprint() -> &'static Blueprint;
}

// -----------------------------------------------------------------------------
// Ty

/// Identity of a described type: its [`TypeId`] plus display names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ty {
    id: TypeId,
    path: &'static str,
    ident: &'static str,
}

impl Ty {
    /// Creates the identity of `T` with names taken from
    /// [`core::any::type_name`].
    ///
    /// `type_name` output is not stable across compiler versions; blueprints
    /// for non-generic derive types use [`Ty::with_path`] with the real
    /// module path instead.
    pub fn of<T: Any + ?Sized>() -> Self {
        let path = core::any::type_name::<T>();
        Self {
            id: TypeId::of::<T>(),
            path,
            ident: short_ident(path),
        }
    }

    /// Creates the identity of `T` with an explicit path and ident.
    #[inline]
    pub fn with_path<T: Any + ?Sized>(path: &'static str, ident: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            path,
            ident,
        }
    }

    /// Returns the `TypeId`.
    #[inline]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the full path, e.g. `my_crate::telemetry::Probe`.
    #[inline]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Returns the bare type name, e.g. `Probe`.
    #[inline]
    pub const fn ident(&self) -> &'static str {
        self.ident
    }

    /// Check if the given type matches this one.
    #[inline]
    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

/// Trailing path segment with any generic arguments cut off.
fn short_ident(path: &'static str) -> &'static str {
    let head = match path.find('<') {
        Some(end) => &path[..end],
        None => path,
    };
    match head.rfind("::") {
        Some(pos) => &head[pos + 2..],
        None => head,
    }
}

// -----------------------------------------------------------------------------
// Vis

/// Declared visibility of a type, member, or accessor side.
///
/// Everything that is not `pub` (private, `pub(crate)`, `pub(super)`, ...)
/// collapses to [`Vis::NonPublic`]; access control below crate granularity is
/// not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vis {
    /// Reachable from outside the declaring crate.
    Public,
    /// Restricted in any way.
    NonPublic,
}

// -----------------------------------------------------------------------------
// AccessPolicy

/// Which accessor sides a compiled dispatcher may use.
///
/// The policy is part of the cache key: one type can have two independent
/// accessors, one per policy, and both remain valid forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessPolicy {
    /// Only public members and public accessor sides participate.
    PublicOnly,
    /// Non-public members and accessor sides participate as well.
    AllowNonPublic,
}

impl AccessPolicy {
    /// Returns `true` if a side with visibility `vis` is usable under `self`.
    #[inline]
    pub const fn admits(self, vis: Vis) -> bool {
        match self {
            Self::PublicOnly => matches!(vis, Vis::Public),
            Self::AllowNonPublic => true,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::Accessible;
    use alloc::string::String;
    use alloc::vec::Vec;

    #[test]
    fn ty_identity() {
        let ty = Ty::of::<alloc::string::String>();
        assert!(ty.is::<alloc::string::String>());
        assert!(!ty.is::<u32>());
        assert_eq!(ty.ident(), "String");
    }

    #[test]
    fn ty_short_ident_cuts_generics() {
        let ty = Ty::of::<alloc::vec::Vec<u32>>();
        assert_eq!(ty.ident(), "Vec");
    }

    #[test]
    fn policy_admission() {
        assert!(AccessPolicy::PublicOnly.admits(Vis::Public));
        assert!(!AccessPolicy::PublicOnly.admits(Vis::NonPublic));
        assert!(AccessPolicy::AllowNonPublic.admits(Vis::Public));
        assert!(AccessPolicy::AllowNonPublic.admits(Vis::NonPublic));
    }

    // ---------------------------------------------------------------------
    // Derive output.

    #[test]
    fn derive_describes_fields_and_attributes() {
        #[derive(Accessible)]
        pub struct Mix {
            #[access(ordinal_hint = 2)]
            pub water: u32,
            #[access(rename = "powder")]
            pub cement: u32,
            #[access(skip)]
            pub scratch: u64,
            #[access(readonly)]
            pub batch: u16,
        }

        let blueprint = <Mix as Accessible>::blueprint();
        let names: Vec<_> = blueprint.members().iter().map(MemberDecl::name).collect();
        assert_eq!(names, ["water", "powder", "batch"]);

        // Skipped fields stay plain fields, they just have no member.
        let mix = Mix {
            water: 1,
            cement: 2,
            scratch: 9,
            batch: 3,
        };
        assert_eq!(mix.scratch, 9);

        assert_eq!(blueprint.ty().ident(), "Mix");
        assert!(blueprint.type_path().ends_with("::Mix"));
        assert!(blueprint.table().is_some());
        assert!(blueprint.constructor().is_none());

        let water = &blueprint.members()[0];
        assert_eq!(water.ordinal_hint(), Some(2));
        assert!(water.type_is::<u32>());

        let batch = &blueprint.members()[2];
        assert_eq!(batch.get_vis(), Some(Vis::Public));
        assert_eq!(batch.set_vis(), None);

        // The cell builds once; later calls return the same description.
        assert!(core::ptr::eq(blueprint, <Mix as Accessible>::blueprint()));
    }

    #[test]
    fn derive_routes_properties_through_methods() {
        #[derive(Accessible)]
        #[access(
            property(name = "level", ty = f32, get = level, set = set_level,
                     set_vis = non_public, backing = "level_raw"),
            property(name = "tag", ty = String, borrow = tag, borrow_mut = tag_mut),
        )]
        pub struct Tank {
            pub level_raw: f32,
            #[access(skip)]
            pub tag_cell: String,
        }

        impl Tank {
            fn level(&self) -> f32 {
                self.level_raw
            }
            fn set_level(&mut self, level: f32) {
                self.level_raw = level;
            }
            fn tag(&self) -> &String {
                &self.tag_cell
            }
            fn tag_mut(&mut self) -> &mut String {
                &mut self.tag_cell
            }
        }

        let blueprint = <Tank as Accessible>::blueprint();
        let names: Vec<_> = blueprint.members().iter().map(MemberDecl::name).collect();
        assert_eq!(names, ["level", "tag", "level_raw"]);

        let level = &blueprint.members()[0];
        assert_eq!(level.kind(), MemberKind::Property);
        assert!(level.type_is::<f32>());
        assert!(!level.is_by_ref());
        assert_eq!(level.get_vis(), Some(Vis::Public));
        assert_eq!(level.set_vis(), Some(Vis::NonPublic));
        assert_eq!(level.backing(), Some("level_raw"));

        let tag = &blueprint.members()[1];
        assert!(tag.is_by_ref());
        assert_eq!(tag.get_vis(), Some(Vis::Public));
        assert_eq!(tag.set_vis(), Some(Vis::Public));

        assert_eq!(blueprint.members()[2].kind(), MemberKind::Field);
    }

    #[test]
    fn derive_names_tuple_members_by_position() {
        #[derive(Accessible, Default)]
        #[access(default)]
        pub struct Span(pub u32, pub u32);

        let blueprint = <Span as Accessible>::blueprint();
        let names: Vec<_> = blueprint.members().iter().map(MemberDecl::name).collect();
        assert_eq!(names, ["0", "1"]);

        let constructor = blueprint.constructor().expect("declared through `default`");
        assert_eq!(constructor.vis(), Vis::Public);
        assert!(constructor.create().downcast_ref::<Span>().is_some());
    }

    #[test]
    fn derive_keeps_generic_instantiations_apart() {
        #[derive(Accessible)]
        pub struct Holder<T> {
            pub item: T,
        }

        let ints = <Holder<u32> as Accessible>::blueprint();
        let texts = <Holder<String> as Accessible>::blueprint();
        assert!(ints.type_id() != texts.type_id());
        assert!(ints.members()[0].type_is::<u32>());
        assert!(texts.members()[0].type_is::<String>());
        assert!(ints.table().is_some());

        // Repeat lookups land on the instantiation's own entry.
        assert!(core::ptr::eq(ints, <Holder<u32> as Accessible>::blueprint()));
    }
}
