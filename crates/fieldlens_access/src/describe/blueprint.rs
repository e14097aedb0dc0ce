use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;

use super::{DispatchTable, TableError, Ty, Vis};

// -----------------------------------------------------------------------------
// Thunks

/// Read a member's value, boxed.
pub(crate) type GetThunk =
    Arc<dyn Fn(&dyn Any) -> Result<Box<dyn Any>, TableError> + Send + Sync>;

/// Write a member's value.
pub(crate) type SetThunk =
    Arc<dyn Fn(&mut dyn Any, Box<dyn Any>) -> Result<(), TableError> + Send + Sync>;

/// Borrow a member's place.
pub(crate) type RefThunk =
    Arc<dyn for<'a> Fn(&'a dyn Any) -> Result<&'a dyn Any, TableError> + Send + Sync>;

/// Mutably borrow a member's place.
pub(crate) type MutThunk =
    Arc<dyn for<'a> Fn(&'a mut dyn Any) -> Result<&'a mut dyn Any, TableError> + Send + Sync>;

/// Construct a fresh boxed instance.
pub(crate) type CreateThunk = Arc<dyn Fn() -> Box<dyn Any> + Send + Sync>;

/// Per-member closure bundle, the dispatch mechanism of builder blueprints.
///
/// Derive blueprints leave this empty; their mechanism is the shared
/// [`DispatchTable`]. All closures are behind [`Arc`] so member sets can be
/// shared between blueprints and cloned into compiled accessors.
#[derive(Clone, Default)]
pub(crate) struct ThunkSet {
    pub(crate) get: Option<GetThunk>,
    pub(crate) set: Option<SetThunk>,
    pub(crate) set_backing: Option<SetThunk>,
    pub(crate) get_ref: Option<RefThunk>,
    pub(crate) get_mut: Option<MutThunk>,
    pub(crate) backing_mut: Option<MutThunk>,
}

impl ThunkSet {
    /// Thunks that forward to one declaration slot of a dispatch table.
    ///
    /// The table's `get_mut` already projects backing slots itself, so
    /// `backing_mut` stays empty here.
    pub(crate) fn from_table(table: &'static DispatchTable, decl_index: u32) -> Self {
        Self {
            get: Some(Arc::new(move |instance: &dyn Any| (table.get)(instance, decl_index))),
            set: Some(Arc::new(
                move |instance: &mut dyn Any, value: Box<dyn Any>| {
                    (table.set)(instance, decl_index, value)
                },
            )),
            set_backing: Some(Arc::new(
                move |instance: &mut dyn Any, value: Box<dyn Any>| {
                    (table.set_backing)(instance, decl_index, value)
                },
            )),
            get_ref: Some(ref_thunk(move |instance| (table.get_ref)(instance, decl_index))),
            get_mut: Some(mut_thunk(move |instance| (table.get_mut)(instance, decl_index))),
            backing_mut: None,
        }
    }
}

// The funnels force closures that return borrows of their argument into the
// higher-ranked signatures the thunk aliases need.
pub(crate) fn ref_thunk<F>(f: F) -> RefThunk
where
    F: for<'a> Fn(&'a dyn Any) -> Result<&'a dyn Any, TableError> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) fn mut_thunk<F>(f: F) -> MutThunk
where
    F: for<'a> Fn(&'a mut dyn Any) -> Result<&'a mut dyn Any, TableError> + Send + Sync + 'static,
{
    Arc::new(f)
}

// -----------------------------------------------------------------------------
// MemberDecl

/// Whether a member is a stored field or an accessor-backed property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Reached through accessor methods (getter/setter or reference pair).
    Property,
    /// A stored slot, read by clone and written by direct store.
    Field,
}

/// One declared member of a blueprint.
///
/// A declaration records name, value type, kind, the presence and visibility
/// of each accessor side, and optional extras (ordinal hint, backing field).
/// It makes no policy decision; a member that is declared here may still be
/// absent from a compiled catalog.
///
/// For fields the read side is the field itself (both sides share the field's
/// visibility); `with_readonly` removes the write side. For properties the
/// sides are declared one by one: `with_get`/`with_set` for value accessors,
/// `with_borrow`/`with_borrow_mut` for reference accessors.
#[derive(Clone)]
pub struct MemberDecl {
    name: Cow<'static, str>,
    ty_id: TypeId,
    type_path: &'static str,
    kind: MemberKind,
    get: Option<Vis>,
    set: Option<Vis>,
    by_ref: bool,
    backing: Option<Cow<'static, str>>,
    ordinal_hint: Option<u32>,
    thunks: Option<ThunkSet>,
}

impl MemberDecl {
    /// Declares a field member of value type `V` with visibility `vis`.
    pub fn field<V: Any>(name: impl Into<Cow<'static, str>>, vis: Vis) -> Self {
        Self {
            name: name.into(),
            ty_id: TypeId::of::<V>(),
            type_path: core::any::type_name::<V>(),
            kind: MemberKind::Field,
            get: Some(vis),
            set: Some(vis),
            by_ref: false,
            backing: None,
            ordinal_hint: None,
            thunks: None,
        }
    }

    /// Declares a property member of value type `V` with no sides yet.
    ///
    /// A property without any side is never admitted to a catalog; add at
    /// least one of `with_get`, `with_set`, `with_borrow`, `with_borrow_mut`.
    pub fn property<V: Any>(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ty_id: TypeId::of::<V>(),
            type_path: core::any::type_name::<V>(),
            kind: MemberKind::Property,
            get: None,
            set: None,
            by_ref: false,
            backing: None,
            ordinal_hint: None,
            thunks: None,
        }
    }

    /// Declares a value getter with visibility `vis`.
    pub fn with_get(mut self, vis: Vis) -> Self {
        self.get = Some(vis);
        self
    }

    /// Declares a value setter with visibility `vis`.
    pub fn with_set(mut self, vis: Vis) -> Self {
        self.set = Some(vis);
        self
    }

    /// Declares a shared reference accessor with visibility `vis`.
    pub fn with_borrow(mut self, vis: Vis) -> Self {
        self.get = Some(vis);
        self.by_ref = true;
        self
    }

    /// Declares a mutable reference accessor with visibility `vis`.
    pub fn with_borrow_mut(mut self, vis: Vis) -> Self {
        self.set = Some(vis);
        self.by_ref = true;
        self
    }

    /// Names the backing field behind this property.
    ///
    /// When the write side is missing or not admitted under the active
    /// policy, writes are rescued through the backing field instead. The
    /// rescue deliberately ignores the backing field's own visibility.
    pub fn with_backing(mut self, field: impl Into<Cow<'static, str>>) -> Self {
        self.backing = Some(field.into());
        self
    }

    /// Removes the write side. Only meaningful for fields.
    pub fn with_readonly(mut self) -> Self {
        self.set = None;
        self
    }

    /// Suggests a position for row-oriented reading, see
    /// [`RowCursor`](crate::RowCursor).
    pub fn with_ordinal_hint(mut self, hint: u32) -> Self {
        self.ordinal_hint = Some(hint);
        self
    }

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

    /// Returns the member kind.
    #[inline]
    pub const fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Returns the visibility of the read side, if one is declared.
    #[inline]
    pub const fn get_vis(&self) -> Option<Vis> {
        self.get
    }

    /// Returns the visibility of the write side, if one is declared.
    #[inline]
    pub const fn set_vis(&self) -> Option<Vis> {
        self.set
    }

    /// Returns `true` if the member is reached through reference accessors.
    #[inline]
    pub const fn is_by_ref(&self) -> bool {
        self.by_ref
    }

    /// Returns the declared backing field name, if any.
    #[inline]
    pub fn backing(&self) -> Option<&str> {
        self.backing.as_deref()
    }

    /// Returns the declared ordinal hint, if any.
    #[inline]
    pub const fn ordinal_hint(&self) -> Option<u32> {
        self.ordinal_hint
    }

    #[inline]
    pub(crate) fn name_cow(&self) -> &Cow<'static, str> {
        &self.name
    }

    #[inline]
    pub(crate) fn with_thunks(mut self, thunks: ThunkSet) -> Self {
        self.thunks = Some(thunks);
        self
    }

    #[inline]
    pub(crate) fn thunks(&self) -> Option<&ThunkSet> {
        self.thunks.as_ref()
    }

    #[inline]
    pub(crate) fn thunks_mut(&mut self) -> Option<&mut ThunkSet> {
        self.thunks.as_mut()
    }
}

impl fmt::Debug for MemberDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDecl")
            .field("name", &self.name)
            .field("type_path", &self.type_path)
            .field("kind", &self.kind)
            .field("get", &self.get)
            .field("set", &self.set)
            .field("by_ref", &self.by_ref)
            .field("backing", &self.backing)
            .field("ordinal_hint", &self.ordinal_hint)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Constructor

/// A parameterless constructor with a declared visibility.
#[derive(Clone)]
pub struct Constructor {
    func: CreateThunk,
    vis: Vis,
}

impl Constructor {
    /// Creates a constructor from a closure producing a boxed instance.
    pub fn new(func: impl Fn() -> Box<dyn Any> + Send + Sync + 'static, vis: Vis) -> Self {
        Self {
            func: Arc::new(func),
            vis,
        }
    }

    /// Returns the declared visibility.
    #[inline]
    pub const fn vis(&self) -> Vis {
        self.vis
    }

    /// Constructs a fresh boxed instance.
    #[inline]
    pub fn create(&self) -> Box<dyn Any> {
        (self.func)()
    }

    #[inline]
    pub(crate) fn thunk(&self) -> &CreateThunk {
        &self.func
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("vis", &self.vis)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Blueprint

/// The member description of one type.
///
/// Members are stored in declaration order with all properties listed before
/// all fields; catalog ordinals, duplicate-name resolution and declaration
/// indices all build on that order.
///
/// # Examples
///
/// ```
/// use fieldlens_access::describe::{Blueprint, MemberDecl, Vis};
///
/// struct Probe {
///     id: u32,
/// }
///
/// let blueprint = Blueprint::new::<Probe>(Vis::Public)
///     .with_members([MemberDecl::field::<u32>("id", Vis::Public)]);
/// assert!(blueprint.ty().is::<Probe>());
/// assert_eq!(blueprint.members()[0].name(), "id");
/// ```
#[derive(Debug)]
pub struct Blueprint {
    ty: Ty,
    vis: Vis,
    members: Box<[MemberDecl]>,
    table: Option<&'static DispatchTable>,
    constructor: Option<Constructor>,
}

impl Blueprint {
    /// Creates an empty blueprint for `T`, named through
    /// [`core::any::type_name`].
    ///
    /// This is the path for builder blueprints and generic derive types; the
    /// derive uses [`Blueprint::with_path`] with the real module path for
    /// non-generic types.
    pub fn new<T: Any + ?Sized>(vis: Vis) -> Self {
        Self::from_ty(Ty::of::<T>(), vis)
    }

    /// Creates an empty blueprint for `T` with an explicit path and ident.
    pub fn with_path<T: Any + ?Sized>(path: &'static str, ident: &'static str, vis: Vis) -> Self {
        Self::from_ty(Ty::with_path::<T>(path, ident), vis)
    }

    fn from_ty(ty: Ty, vis: Vis) -> Self {
        Self {
            ty,
            vis,
            members: Box::new([]),
            table: None,
            constructor: None,
        }
    }

    /// Sets the member declarations.
    ///
    /// # Panics
    ///
    /// Panics if a property is declared after a field; blueprints keep the
    /// property segment in front of the field segment.
    pub fn with_members(mut self, members: impl IntoIterator<Item = MemberDecl>) -> Self {
        let members: Box<[MemberDecl]> = members.into_iter().collect();
        let first_field = members
            .iter()
            .position(|decl| decl.kind() == MemberKind::Field)
            .unwrap_or(members.len());
        assert!(
            members[first_field..]
                .iter()
                .all(|decl| decl.kind() == MemberKind::Field),
            "blueprint members must list all properties before all fields"
        );
        self.members = members;
        self
    }

    /// Attaches the static dispatch table emitted by the derive.
    pub fn with_table(mut self, table: &'static DispatchTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Attaches a parameterless constructor.
    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Returns the identity of the described type.
    #[inline]
    pub const fn ty(&self) -> Ty {
        self.ty
    }

    /// Returns the `TypeId` of the described type.
    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.ty.id()
    }

    /// Returns the full path of the described type.
    #[inline]
    pub const fn type_path(&self) -> &'static str {
        self.ty.path()
    }

    /// Returns the declared visibility of the described type.
    #[inline]
    pub const fn vis(&self) -> Vis {
        self.vis
    }

    /// Returns the declared members, properties first.
    #[inline]
    pub fn members(&self) -> &[MemberDecl] {
        &self.members
    }

    /// Returns the dispatch table, present only for derive blueprints.
    #[inline]
    pub const fn table(&self) -> Option<&'static DispatchTable> {
        self.table
    }

    /// Returns the parameterless constructor, if one is declared.
    #[inline]
    pub const fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        #[allow(dead_code)]
        value: i64,
    }

    #[test]
    fn member_decl_sides() {
        let field = MemberDecl::field::<i64>("value", Vis::Public);
        assert_eq!(field.kind(), MemberKind::Field);
        assert_eq!(field.get_vis(), Some(Vis::Public));
        assert_eq!(field.set_vis(), Some(Vis::Public));
        assert!(field.type_is::<i64>());

        let readonly = MemberDecl::field::<i64>("value", Vis::Public).with_readonly();
        assert_eq!(readonly.set_vis(), None);

        let property = MemberDecl::property::<i64>("speed")
            .with_get(Vis::Public)
            .with_set(Vis::NonPublic);
        assert_eq!(property.kind(), MemberKind::Property);
        assert_eq!(property.get_vis(), Some(Vis::Public));
        assert_eq!(property.set_vis(), Some(Vis::NonPublic));
        assert!(!property.is_by_ref());

        let by_ref = MemberDecl::property::<i64>("view").with_borrow(Vis::Public);
        assert!(by_ref.is_by_ref());
        assert_eq!(by_ref.set_vis(), None);
    }

    #[test]
    fn blueprint_member_order_is_enforced() {
        let result = std::panic::catch_unwind(|| {
            Blueprint::new::<Sample>(Vis::Public).with_members([
                MemberDecl::field::<i64>("value", Vis::Public),
                MemberDecl::property::<i64>("late").with_get(Vis::Public),
            ])
        });
        assert!(result.is_err());
    }

    #[test]
    fn constructor_creates_boxed_values() {
        let constructor = Constructor::new(|| Box::new(7_u16), Vis::Public);
        let value = constructor.create();
        assert_eq!(value.downcast_ref::<u16>(), Some(&7));
    }
}
