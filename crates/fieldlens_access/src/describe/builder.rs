//! A fluent builder for blueprints of types the derive cannot touch.
//!
//! Members declared here dispatch through per-member closures instead of a
//! shared [`DispatchTable`](super::DispatchTable); accessors compiled from a
//! builder blueprint therefore always run delegate-based.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId, type_name};
use core::marker::PhantomData;

use super::blueprint::{GetThunk, MutThunk, RefThunk, SetThunk, ThunkSet, mut_thunk, ref_thunk};
use super::{Blueprint, Constructor, MemberDecl, MemberKind, TableError, Vis};

/// Builds a [`Blueprint`] for `T` out of accessor closures.
///
/// This is the path for foreign types (no derive possible) and for
/// hand-curated member sets. Each member method appends one declaration;
/// the modifier methods ([`member_vis`](Self::member_vis),
/// [`ordinal_hint`](Self::ordinal_hint), [`backing`](Self::backing), ...)
/// adjust the most recently added one.
///
/// # Examples
///
/// ```
/// use fieldlens_access::describe::{BlueprintBuilder, Vis};
///
/// struct Extent {
///     width: u32,
///     height: u32,
/// }
///
/// let blueprint = BlueprintBuilder::<Extent>::new()
///     .field("width", |e| &e.width, |e| &mut e.width)
///     .field("height", |e| &e.height, |e| &mut e.height)
///     .property("area", |e: &Extent| e.width * e.height)
///     .constructor(Vis::Public, || Extent { width: 0, height: 0 })
///     .finish();
///
/// // Properties come first in the finished blueprint.
/// assert_eq!(blueprint.members()[0].name(), "area");
/// assert_eq!(blueprint.members().len(), 3);
/// ```
pub struct BlueprintBuilder<T: Any> {
    vis: Vis,
    members: Vec<MemberDecl>,
    constructor: Option<Constructor>,
    marker: PhantomData<fn() -> T>,
}

impl<T: Any> BlueprintBuilder<T> {
    /// Creates an empty builder; the type is treated as public.
    pub fn new() -> Self {
        Self {
            vis: Vis::Public,
            members: Vec::new(),
            constructor: None,
            marker: PhantomData,
        }
    }

    /// Declares the visibility of `T` itself.
    pub fn with_vis(mut self, vis: Vis) -> Self {
        self.vis = vis;
        self
    }

    /// Declares a read-write field reached through a borrow pair.
    ///
    /// Reads clone through `get`, writes store through `get_mut`, and both
    /// reference accessors project the same place.
    pub fn field<V: Any + Clone>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        get: impl Fn(&T) -> &V + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut V + Send + Sync + 'static,
    ) -> Self {
        let get = Arc::new(get);
        let get_mut = Arc::new(get_mut);
        let thunks = ThunkSet {
            get: Some(read_value::<T, V, _>(Arc::clone(&get))),
            set: Some(store_place::<T, V, _>(Arc::clone(&get_mut))),
            get_ref: Some(borrow_place::<T, V, _>(get)),
            get_mut: Some(borrow_place_mut::<T, V, _>(get_mut)),
            ..ThunkSet::default()
        };
        self.members.push(
            MemberDecl::field::<V>(name, Vis::Public).with_thunks(thunks),
        );
        self
    }

    /// Declares a field without a write side.
    pub fn readonly_field<V: Any + Clone>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        get: impl Fn(&T) -> &V + Send + Sync + 'static,
    ) -> Self {
        let get = Arc::new(get);
        let thunks = ThunkSet {
            get: Some(read_value::<T, V, _>(Arc::clone(&get))),
            get_ref: Some(borrow_place::<T, V, _>(get)),
            ..ThunkSet::default()
        };
        self.members.push(
            MemberDecl::field::<V>(name, Vis::Public)
                .with_readonly()
                .with_thunks(thunks),
        );
        self
    }

    /// Declares a read-only property whose getter computes a value.
    pub fn property<V: Any>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        get: impl Fn(&T) -> V + Send + Sync + 'static,
    ) -> Self {
        let thunks = ThunkSet {
            get: Some(compute_value(get)),
            ..ThunkSet::default()
        };
        self.members.push(
            MemberDecl::property::<V>(name)
                .with_get(Vis::Public)
                .with_thunks(thunks),
        );
        self
    }

    /// Declares a property with a value getter and a value setter.
    pub fn property_with_set<V: Any>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        get: impl Fn(&T) -> V + Send + Sync + 'static,
        set: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self {
        let thunks = ThunkSet {
            get: Some(compute_value(get)),
            set: Some(write_value(set)),
            ..ThunkSet::default()
        };
        self.members.push(
            MemberDecl::property::<V>(name)
                .with_get(Vis::Public)
                .with_set(Vis::Public)
                .with_thunks(thunks),
        );
        self
    }

    /// Declares a property reached through a shared borrow only.
    ///
    /// Value reads clone through the borrow; writes report the member as a
    /// read-only reference.
    pub fn ref_property<V: Any + Clone>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        borrow: impl Fn(&T) -> &V + Send + Sync + 'static,
    ) -> Self {
        let borrow = Arc::new(borrow);
        let thunks = ThunkSet {
            get: Some(read_value::<T, V, _>(Arc::clone(&borrow))),
            get_ref: Some(borrow_place::<T, V, _>(borrow)),
            ..ThunkSet::default()
        };
        self.members.push(
            MemberDecl::property::<V>(name)
                .with_borrow(Vis::Public)
                .with_thunks(thunks),
        );
        self
    }

    /// Declares a property reached through a borrow pair.
    pub fn ref_property_mut<V: Any + Clone>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        borrow: impl Fn(&T) -> &V + Send + Sync + 'static,
        borrow_mut: impl Fn(&mut T) -> &mut V + Send + Sync + 'static,
    ) -> Self {
        let borrow = Arc::new(borrow);
        let borrow_mut = Arc::new(borrow_mut);
        let thunks = ThunkSet {
            get: Some(read_value::<T, V, _>(Arc::clone(&borrow))),
            set: Some(store_place::<T, V, _>(Arc::clone(&borrow_mut))),
            get_ref: Some(borrow_place::<T, V, _>(borrow)),
            get_mut: Some(borrow_place_mut::<T, V, _>(borrow_mut)),
            ..ThunkSet::default()
        };
        self.members.push(
            MemberDecl::property::<V>(name)
                .with_borrow(Vis::Public)
                .with_borrow_mut(Vis::Public)
                .with_thunks(thunks),
        );
        self
    }

    /// Declares the backing field of the last added member.
    ///
    /// Only meaningful for properties: when the property's own write side is
    /// missing or filtered out by the active policy, writes are rescued
    /// through `project` instead.
    ///
    /// # Panics
    ///
    /// Panics if no member was added yet.
    pub fn backing<V: Any>(
        self,
        field: impl Into<Cow<'static, str>>,
        project: impl Fn(&mut T) -> &mut V + Send + Sync + 'static,
    ) -> Self {
        let project = Arc::new(project);
        self.map_last(move |decl| {
            let mut thunks = decl.thunks().cloned().unwrap_or_default();
            thunks.set_backing = Some(store_place::<T, V, _>(Arc::clone(&project)));
            thunks.backing_mut = Some(borrow_place_mut::<T, V, _>(project));
            decl.with_backing(field).with_thunks(thunks)
        })
    }

    /// Declares the visibility of every present side of the last added
    /// member.
    ///
    /// # Panics
    ///
    /// Panics if no member was added yet.
    pub fn member_vis(self, vis: Vis) -> Self {
        self.map_last(|mut decl| {
            if decl.get_vis().is_some() {
                decl = decl.with_get(vis);
            }
            if decl.set_vis().is_some() {
                decl = decl.with_set(vis);
            }
            decl
        })
    }

    /// Declares the visibility of the last added member's read side.
    /// Has no effect if the member has no read side.
    ///
    /// # Panics
    ///
    /// Panics if no member was added yet.
    pub fn getter_vis(self, vis: Vis) -> Self {
        self.map_last(|decl| {
            if decl.get_vis().is_some() {
                decl.with_get(vis)
            } else {
                decl
            }
        })
    }

    /// Declares the visibility of the last added member's write side.
    /// Has no effect if the member has no write side.
    ///
    /// # Panics
    ///
    /// Panics if no member was added yet.
    pub fn setter_vis(self, vis: Vis) -> Self {
        self.map_last(|decl| {
            if decl.set_vis().is_some() {
                decl.with_set(vis)
            } else {
                decl
            }
        })
    }

    /// Suggests a row-cursor position for the last added member.
    ///
    /// # Panics
    ///
    /// Panics if no member was added yet.
    pub fn ordinal_hint(self, hint: u32) -> Self {
        self.map_last(|decl| decl.with_ordinal_hint(hint))
    }

    /// Declares a parameterless constructor.
    pub fn constructor(mut self, vis: Vis, create: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.constructor = Some(Constructor::new(move || Box::new(create()), vis));
        self
    }

    /// Appends every member of `source`, which must describe `T` as well.
    ///
    /// Members of a derive blueprint keep dispatching through its table.
    /// When this builder has no constructor yet, the source's one is taken
    /// over too. Duplicate names are resolved later by the catalog in favor
    /// of the earliest declaration per segment order.
    ///
    /// # Panics
    ///
    /// Panics if `source` describes a different type.
    pub fn inherit(mut self, source: &Blueprint) -> Self {
        assert!(
            source.type_id() == TypeId::of::<T>(),
            "cannot compose members of `{}` into a blueprint for `{}`",
            source.type_path(),
            type_name::<T>(),
        );
        for (index, decl) in source.members().iter().enumerate() {
            let mut decl = decl.clone();
            if decl.thunks().is_none()
                && let Some(table) = source.table()
            {
                decl = decl.with_thunks(ThunkSet::from_table(table, index as u32));
            }
            self.members.push(decl);
        }
        if self.constructor.is_none()
            && let Some(constructor) = source.constructor()
        {
            self.constructor = Some(constructor.clone());
        }
        self
    }

    /// Finishes the blueprint, moving properties in front of fields while
    /// keeping the relative order inside each segment.
    pub fn finish(self) -> Blueprint {
        let (properties, fields): (Vec<_>, Vec<_>) = self
            .members
            .into_iter()
            .partition(|decl| decl.kind() == MemberKind::Property);
        let mut blueprint =
            Blueprint::new::<T>(self.vis).with_members(properties.into_iter().chain(fields));
        if let Some(constructor) = self.constructor {
            blueprint = blueprint.with_constructor(constructor);
        }
        blueprint
    }

    fn map_last(mut self, f: impl FnOnce(MemberDecl) -> MemberDecl) -> Self {
        let decl = self
            .members
            .pop()
            .expect("no member added to the builder yet");
        self.members.push(f(decl));
        self
    }
}

impl<T: Any> Default for BlueprintBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------
// Thunk synthesis

fn downcast<T: Any>(instance: &dyn Any) -> Result<&T, TableError> {
    instance.downcast_ref::<T>().ok_or(TableError::InstanceType {
        expected: type_name::<T>(),
    })
}

fn downcast_mut<T: Any>(instance: &mut dyn Any) -> Result<&mut T, TableError> {
    instance.downcast_mut::<T>().ok_or(TableError::InstanceType {
        expected: type_name::<T>(),
    })
}

fn take_value<V: Any>(value: Box<dyn Any>) -> Result<V, TableError> {
    match value.downcast::<V>() {
        Ok(value) => Ok(*value),
        Err(_) => Err(TableError::ValueType {
            expected: type_name::<V>(),
        }),
    }
}

fn read_value<T: Any, V: Any + Clone, F>(get: Arc<F>) -> GetThunk
where
    F: Fn(&T) -> &V + Send + Sync + 'static,
{
    Arc::new(move |instance: &dyn Any| -> Result<Box<dyn Any>, TableError> {
        let instance = downcast::<T>(instance)?;
        Ok(Box::new((*get)(instance).clone()))
    })
}

fn compute_value<T: Any, V: Any>(get: impl Fn(&T) -> V + Send + Sync + 'static) -> GetThunk {
    Arc::new(move |instance: &dyn Any| -> Result<Box<dyn Any>, TableError> {
        let instance = downcast::<T>(instance)?;
        Ok(Box::new(get(instance)))
    })
}

fn write_value<T: Any, V: Any>(set: impl Fn(&mut T, V) + Send + Sync + 'static) -> SetThunk {
    Arc::new(
        move |instance: &mut dyn Any, value: Box<dyn Any>| -> Result<(), TableError> {
            let instance = downcast_mut::<T>(instance)?;
            set(instance, take_value::<V>(value)?);
            Ok(())
        },
    )
}

fn store_place<T: Any, V: Any, F>(place: Arc<F>) -> SetThunk
where
    F: Fn(&mut T) -> &mut V + Send + Sync + 'static,
{
    Arc::new(
        move |instance: &mut dyn Any, value: Box<dyn Any>| -> Result<(), TableError> {
            let instance = downcast_mut::<T>(instance)?;
            *(*place)(instance) = take_value::<V>(value)?;
            Ok(())
        },
    )
}

fn borrow_place<T: Any, V: Any, F>(borrow: Arc<F>) -> RefThunk
where
    F: Fn(&T) -> &V + Send + Sync + 'static,
{
    ref_thunk(move |instance| {
        let instance = downcast::<T>(instance)?;
        let place: &dyn Any = (*borrow)(instance);
        Ok(place)
    })
}

fn borrow_place_mut<T: Any, V: Any, F>(borrow_mut: Arc<F>) -> MutThunk
where
    F: Fn(&mut T) -> &mut V + Send + Sync + 'static,
{
    mut_thunk(move |instance| {
        let instance = downcast_mut::<T>(instance)?;
        let place: &mut dyn Any = (*borrow_mut)(instance);
        Ok(place)
    })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    struct Extent {
        width: u32,
        height: u32,
    }

    fn extent_blueprint() -> Blueprint {
        BlueprintBuilder::<Extent>::new()
            .field("width", |e| &e.width, |e| &mut e.width)
            .field("height", |e| &e.height, |e| &mut e.height)
            .property("area", |e: &Extent| e.width * e.height)
            .constructor(Vis::Public, || Extent {
                width: 0,
                height: 0,
            })
            .finish()
    }

    #[test]
    fn properties_precede_fields() {
        let blueprint = extent_blueprint();
        let names: Vec<_> = blueprint.members().iter().map(MemberDecl::name).collect();
        assert_eq!(names, ["area", "width", "height"]);
        assert_eq!(blueprint.members()[0].kind(), MemberKind::Property);
    }

    #[test]
    fn thunks_read_and_write() {
        let blueprint = extent_blueprint();
        let width = &blueprint.members()[1];
        assert_eq!(width.name(), "width");
        let thunks = width.thunks().unwrap();

        let mut extent = Extent {
            width: 4,
            height: 3,
        };
        let read = (thunks.get.as_ref().unwrap())(&extent).unwrap();
        assert_eq!(read.downcast_ref::<u32>(), Some(&4));

        (thunks.set.as_ref().unwrap())(&mut extent, Box::new(9_u32)).unwrap();
        assert_eq!(extent.width, 9);

        let err = (thunks.set.as_ref().unwrap())(&mut extent, Box::new("nine")).unwrap_err();
        assert_eq!(
            err,
            TableError::ValueType {
                expected: type_name::<u32>(),
            }
        );
    }

    #[test]
    fn thunks_reject_foreign_instances() {
        let blueprint = extent_blueprint();
        let thunks = blueprint.members()[1].thunks().unwrap();
        let err = (thunks.get.as_ref().unwrap())(&0_i32).unwrap_err();
        assert_eq!(
            err,
            TableError::InstanceType {
                expected: type_name::<Extent>(),
            }
        );
    }

    #[test]
    fn backing_attaches_to_last_member() {
        let blueprint = BlueprintBuilder::<Extent>::new()
            .property("width", |e: &Extent| e.width)
            .backing("width", |e| &mut e.width)
            .finish();
        let decl = &blueprint.members()[0];
        assert_eq!(decl.backing(), Some("width"));

        let thunks = decl.thunks().unwrap();
        let mut extent = Extent {
            width: 1,
            height: 1,
        };
        (thunks.set_backing.as_ref().unwrap())(&mut extent, Box::new(8_u32)).unwrap();
        assert_eq!(extent.width, 8);
    }

    #[test]
    fn inherit_appends_and_takes_constructor() {
        let base = extent_blueprint();
        let blueprint = BlueprintBuilder::<Extent>::new()
            .property("aspect", |e: &Extent| f64::from(e.width) / f64::from(e.height))
            .inherit(&base)
            .finish();

        let names: Vec<_> = blueprint.members().iter().map(MemberDecl::name).collect();
        assert_eq!(names, ["aspect", "area", "width", "height"]);
        assert!(blueprint.constructor().is_some());
    }

    #[test]
    #[should_panic(expected = "cannot compose")]
    fn inherit_rejects_other_types() {
        let other = BlueprintBuilder::<u32>::new().finish();
        let _ = BlueprintBuilder::<Extent>::new().inherit(&other);
    }

    #[test]
    fn side_vis_modifiers() {
        let blueprint = BlueprintBuilder::<Extent>::new()
            .field("width", |e| &e.width, |e| &mut e.width)
            .setter_vis(Vis::NonPublic)
            .finish();
        let decl = &blueprint.members()[0];
        assert_eq!(decl.get_vis(), Some(Vis::Public));
        assert_eq!(decl.set_vis(), Some(Vis::NonPublic));
    }
}
