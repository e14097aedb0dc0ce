//! Ordinal catalogs: the policy-filtered member view of one type.
//!
//! A [`MemberCatalog`] is built from a blueprint and an
//! [`AccessPolicy`](crate::describe::AccessPolicy). Declarations the policy
//! does not admit are dropped; the survivors get dense ordinals in
//! declaration order, properties first. The catalog is what accessors answer
//! introspection questions from, and ordinals index straight into the
//! accessor's dispatch slots.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId};

use bitflags::bitflags;
use fieldlens_utils::hash::HashMap;

use crate::describe::{AccessPolicy, Blueprint, MemberDecl, MemberKind};

bitflags! {
    /// Bitflags describing how a catalog member can be used.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u8 {
        /// Set if the member can be read under the catalog's policy.
        const READABLE          = 1 << 0;
        /// Set if the member can be written under the catalog's policy.
        const WRITABLE          = 1 << 1;
        /// Set if the member is reached through reference accessors.
        const BY_REF            = 1 << 2;
        /// Set if the member is by-ref and declares no write side at all.
        const READONLY_REF      = 1 << 3;
        /// Set if writes are rescued through the declared backing field.
        const WRITE_VIA_BACKING = 1 << 4;
        /// Set if the member is a stored field rather than a property.
        const FIELD             = 1 << 5;
    }
}

/// One member of a catalog.
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    name: Cow<'static, str>,
    ty_id: TypeId,
    type_path: &'static str,
    ordinal: u32,
    decl_index: u32,
    flags: MemberFlags,
    ordinal_hint: Option<u32>,
}

impl MemberDescriptor {
    /// Returns the member name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the `TypeId` of the member's value type.
    #[inline]
    pub const fn ty_id(&self) -> TypeId {
        self.ty_id
    }

    /// Returns the path of the member's value type.
    #[inline]
    pub const fn type_path(&self) -> &'static str {
        self.type_path
    }

    /// Check if the member's value type matches the given type.
    #[inline]
    pub fn type_is<V: Any>(&self) -> bool {
        self.ty_id == TypeId::of::<V>()
    }

    /// Returns the member's ordinal within its catalog.
    #[inline]
    pub const fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Returns the usage flags.
    #[inline]
    pub const fn flags(&self) -> MemberFlags {
        self.flags
    }

    /// Returns `true` if the member can be read.
    #[inline]
    pub const fn readable(&self) -> bool {
        self.flags.contains(MemberFlags::READABLE)
    }

    /// Returns `true` if the member can be written through its own setter.
    #[inline]
    pub const fn writable(&self) -> bool {
        self.flags.contains(MemberFlags::WRITABLE)
    }

    /// Returns `true` if the member is reached through reference accessors.
    #[inline]
    pub const fn is_by_ref(&self) -> bool {
        self.flags.contains(MemberFlags::BY_REF)
    }

    /// Returns `true` if the member is by-ref without any write side.
    #[inline]
    pub const fn readonly_ref(&self) -> bool {
        self.flags.contains(MemberFlags::READONLY_REF)
    }

    /// Returns `true` if writes go through the declared backing field.
    #[inline]
    pub const fn write_via_backing(&self) -> bool {
        self.flags.contains(MemberFlags::WRITE_VIA_BACKING)
    }

    /// Returns `true` if the member is a stored field.
    #[inline]
    pub const fn is_field(&self) -> bool {
        self.flags.contains(MemberFlags::FIELD)
    }

    /// Returns the declared row-cursor position hint, if any.
    #[inline]
    pub const fn ordinal_hint(&self) -> Option<u32> {
        self.ordinal_hint
    }

    /// Index of the declaration in the blueprint this catalog was built
    /// from; dispatch tables are keyed by it.
    #[inline]
    pub(crate) const fn decl_index(&self) -> u32 {
        self.decl_index
    }

    #[inline]
    pub(crate) fn name_cow(&self) -> &Cow<'static, str> {
        &self.name
    }
}

/// The members of one type admitted under one policy, with dense ordinals.
#[derive(Debug)]
pub struct MemberCatalog {
    members: Box<[MemberDescriptor]>,
    ordinals: HashMap<Cow<'static, str>, u32>,
}

impl MemberCatalog {
    pub(crate) fn build(blueprint: &Blueprint, policy: AccessPolicy) -> Self {
        let decls = blueprint.members();
        let mut members = Vec::with_capacity(decls.len());
        let mut ordinals = HashMap::with_capacity_and_hasher(decls.len(), Default::default());
        for (decl_index, decl) in decls.iter().enumerate() {
            let Some(flags) = admit(decl, policy) else {
                continue;
            };
            if ordinals.contains_key(decl.name()) {
                log::trace!(
                    "member `{}` on `{}` is shadowed by an earlier declaration",
                    decl.name(),
                    blueprint.type_path(),
                );
                continue;
            }
            let ordinal = members.len() as u32;
            ordinals.insert(decl.name_cow().clone(), ordinal);
            members.push(MemberDescriptor {
                name: decl.name_cow().clone(),
                ty_id: decl.ty_id(),
                type_path: decl.type_path(),
                ordinal,
                decl_index: decl_index as u32,
                flags,
                ordinal_hint: decl.ordinal_hint(),
            });
        }
        Self {
            members: members.into_boxed_slice(),
            ordinals,
        }
    }

    /// Returns the ordinal of the member named `name`.
    #[inline]
    pub fn ordinal_of(&self, name: &str) -> Option<u32> {
        self.ordinals.get(name).copied()
    }

    /// Returns the member at `ordinal`.
    #[inline]
    pub fn get(&self, ordinal: u32) -> Option<&MemberDescriptor> {
        self.members.get(ordinal as usize)
    }

    /// Returns every member in ordinal order.
    #[inline]
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// Returns the member count.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no member was admitted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Decides whether a declaration enters the catalog and with which flags.
///
/// A member is admitted when at least one accessor side is visible under the
/// policy; a declared backing field alone admits nothing, it only rescues
/// writes of members that are already in.
fn admit(decl: &MemberDecl, policy: AccessPolicy) -> Option<MemberFlags> {
    let readable = decl.get_vis().is_some_and(|vis| policy.admits(vis));
    let writable = decl.set_vis().is_some_and(|vis| policy.admits(vis));
    if !readable && !writable {
        return None;
    }
    let mut flags = MemberFlags::empty();
    flags.set(MemberFlags::READABLE, readable);
    flags.set(MemberFlags::WRITABLE, writable);
    flags.set(MemberFlags::BY_REF, decl.is_by_ref());
    flags.set(
        MemberFlags::READONLY_REF,
        decl.is_by_ref() && decl.set_vis().is_none(),
    );
    flags.set(
        MemberFlags::WRITE_VIA_BACKING,
        !writable && decl.kind() == MemberKind::Property && decl.backing().is_some(),
    );
    flags.set(MemberFlags::FIELD, decl.kind() == MemberKind::Field);
    Some(flags)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::{BlueprintBuilder, Vis};

    struct Body {
        mass: f64,
        tag: u32,
    }

    #[test]
    fn ordinals_are_dense_and_properties_come_first() {
        let blueprint = BlueprintBuilder::<Body>::new()
            .field("mass", |b| &b.mass, |b| &mut b.mass)
            .field("tag", |b| &b.tag, |b| &mut b.tag)
            .property("heavy", |b: &Body| b.mass > 100.0)
            .finish();
        let catalog = MemberCatalog::build(&blueprint, AccessPolicy::PublicOnly);

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.ordinal_of("heavy"), Some(0));
        assert_eq!(catalog.ordinal_of("mass"), Some(1));
        assert_eq!(catalog.ordinal_of("tag"), Some(2));
        for (index, member) in catalog.members().iter().enumerate() {
            assert_eq!(member.ordinal(), index as u32);
        }
        assert!(catalog.get(0).is_some_and(|m| !m.is_field()));
        assert!(catalog.get(2).is_some_and(MemberDescriptor::is_field));
        assert!(catalog.get(3).is_none());
    }

    #[test]
    fn policy_filters_non_public_members() {
        let blueprint = BlueprintBuilder::<Body>::new()
            .field("mass", |b| &b.mass, |b| &mut b.mass)
            .field("tag", |b| &b.tag, |b| &mut b.tag)
            .member_vis(Vis::NonPublic)
            .finish();

        let public = MemberCatalog::build(&blueprint, AccessPolicy::PublicOnly);
        assert_eq!(public.len(), 1);
        assert_eq!(public.ordinal_of("tag"), None);

        let all = MemberCatalog::build(&blueprint, AccessPolicy::AllowNonPublic);
        assert_eq!(all.len(), 2);
        assert_eq!(all.ordinal_of("tag"), Some(1));
    }

    #[test]
    fn split_visibility_drops_one_side() {
        let blueprint = BlueprintBuilder::<Body>::new()
            .field("mass", |b| &b.mass, |b| &mut b.mass)
            .setter_vis(Vis::NonPublic)
            .finish();
        let catalog = MemberCatalog::build(&blueprint, AccessPolicy::PublicOnly);
        let mass = &catalog.members()[0];
        assert!(mass.readable());
        assert!(!mass.writable());
    }

    #[test]
    fn backing_rescues_writes_of_filtered_setters() {
        let blueprint = BlueprintBuilder::<Body>::new()
            .property("mass", |b: &Body| b.mass)
            .backing("mass", |b| &mut b.mass)
            .finish();
        let catalog = MemberCatalog::build(&blueprint, AccessPolicy::PublicOnly);
        let mass = &catalog.members()[0];
        assert!(!mass.writable());
        assert!(mass.write_via_backing());
    }

    #[test]
    fn readonly_ref_is_structural() {
        let blueprint = BlueprintBuilder::<Body>::new()
            .ref_property("mass", |b| &b.mass)
            .ref_property_mut("tag", |b| &b.tag, |b| &mut b.tag)
            .finish();
        let catalog = MemberCatalog::build(&blueprint, AccessPolicy::PublicOnly);

        let mass = &catalog.members()[0];
        assert!(mass.is_by_ref());
        assert!(mass.readonly_ref());
        let tag = &catalog.members()[1];
        assert!(tag.is_by_ref());
        assert!(!tag.readonly_ref());
    }

    #[test]
    fn duplicate_names_keep_the_first_declaration() {
        let base = BlueprintBuilder::<Body>::new()
            .field("mass", |b| &b.mass, |b| &mut b.mass)
            .finish();
        let blueprint = BlueprintBuilder::<Body>::new()
            .property("mass", |b: &Body| b.mass)
            .inherit(&base)
            .finish();
        let catalog = MemberCatalog::build(&blueprint, AccessPolicy::PublicOnly);

        assert_eq!(catalog.len(), 1);
        let mass = &catalog.members()[0];
        assert!(!mass.is_field());
        assert_eq!(mass.decl_index(), 0);
    }
}
