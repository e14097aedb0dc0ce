//! Compiled accessors: by-name member access without per-call discovery.
//!
//! A [`TypeAccessor`] is the compilation artifact for one `(type, policy)`
//! pair: an ordinal [catalog](crate::catalog) plus a dispatch engine. Derive
//! blueprints run [fully compiled](Strategy::FullyCompiled) through their
//! static table; builder blueprints and demoted types run through per-member
//! [delegates](Strategy::DelegateBased). Either way a member access is one
//! hash lookup to resolve the ordinal (or none, for the `_at` forms) and one
//! indexed dispatch.

// -----------------------------------------------------------------------------
// Modules

mod classify;
mod compile;
mod error;

// -----------------------------------------------------------------------------
// Exports

pub use classify::Strategy;
pub use compile::compile_count;
pub use error::AccessError;

pub(crate) use compile::{Engine, compile};

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use core::any::{Any, TypeId};
use core::fmt;

use crate::catalog::{MemberCatalog, MemberDescriptor};
use crate::describe::{AccessPolicy, CreateThunk, TableError, Ty};

/// Compiled member access for one type under one policy.
///
/// Accessors are obtained from the process-wide registry (see
/// [`accessor_of`](crate::accessor_of) and friends) and shared behind `Arc`;
/// all operations take `&self` and are safe to call from any thread.
///
/// Values move in and out as `Box<dyn Any>`: reads clone (or compute) the
/// member value, writes consume a boxed value of the member's exact type.
/// The `_ref`/`_mut` forms borrow the member's place instead, when it has
/// one.
///
/// # Examples
///
/// ```
/// use fieldlens_access::derive::Accessible;
/// use fieldlens_access::{AccessPolicy, accessor_of};
///
/// #[derive(Accessible)]
/// pub struct Boiler {
///     pub pressure: f64,
///     pub rated: f64,
/// }
///
/// let accessor = accessor_of::<Boiler>(AccessPolicy::PublicOnly);
/// let mut boiler = Boiler { pressure: 1.8, rated: 16.0 };
///
/// accessor.set(&mut boiler, "pressure", Box::new(2.5_f64))?;
/// let read = accessor.get(&boiler, "pressure")?;
/// assert_eq!(read.downcast_ref::<f64>(), Some(&2.5));
///
/// // Ordinals skip the name lookup on repeated access.
/// let ordinal = accessor.ordinal_of("rated").unwrap();
/// assert!(accessor.get_at(&boiler, ordinal)?.downcast_ref::<f64>() == Some(&16.0));
/// # Ok::<(), fieldlens_access::AccessError>(())
/// ```
pub struct TypeAccessor {
    ty: Ty,
    policy: AccessPolicy,
    strategy: Strategy,
    catalog: MemberCatalog,
    engine: Engine,
    create: Option<CreateThunk>,
}

impl TypeAccessor {
    pub(crate) fn new(
        ty: Ty,
        policy: AccessPolicy,
        strategy: Strategy,
        catalog: MemberCatalog,
        engine: Engine,
        create: Option<CreateThunk>,
    ) -> Self {
        Self {
            ty,
            policy,
            strategy,
            catalog,
            engine,
            create,
        }
    }

    // -------------------------------------------------------------------------
    // Value access

    /// Reads the member named `name`, boxed.
    pub fn get(&self, instance: &dyn Any, name: &str) -> Result<Box<dyn Any>, AccessError> {
        let member = self.resolve(name)?;
        self.read(instance, member)
    }

    /// Reads the member at `ordinal`, boxed.
    pub fn get_at(&self, instance: &dyn Any, ordinal: u32) -> Result<Box<dyn Any>, AccessError> {
        let member = self.resolve_at(ordinal)?;
        self.read(instance, member)
    }

    /// Writes the member named `name`.
    ///
    /// `value` must hold exactly the member's value type.
    pub fn set(
        &self,
        instance: &mut dyn Any,
        name: &str,
        value: Box<dyn Any>,
    ) -> Result<(), AccessError> {
        let member = self.resolve(name)?;
        self.write(instance, member, value)
    }

    /// Writes the member at `ordinal`.
    pub fn set_at(
        &self,
        instance: &mut dyn Any,
        ordinal: u32,
        value: Box<dyn Any>,
    ) -> Result<(), AccessError> {
        let member = self.resolve_at(ordinal)?;
        self.write(instance, member, value)
    }

    /// Reads the member named `name`, or `None` if there is no such member.
    ///
    /// # Panics
    ///
    /// Panics on every other failure, e.g. when `instance` is not a value of
    /// the accessor's type.
    pub fn try_get(&self, instance: &dyn Any, name: &str) -> Option<Box<dyn Any>> {
        match self.resolve(name) {
            Ok(member) => match self.read(instance, member) {
                Ok(value) => Some(value),
                Err(error) => panic!("{error}"),
            },
            Err(_) => None,
        }
    }

    /// Writes the member named `name`, reporting whether a write happened.
    ///
    /// Returns `false` when there is no such member or the member only
    /// exposes a read-only reference.
    ///
    /// # Panics
    ///
    /// Panics on every other failure, e.g. on a value of the wrong type.
    pub fn try_set(&self, instance: &mut dyn Any, name: &str, value: Box<dyn Any>) -> bool {
        let Ok(member) = self.resolve(name) else {
            return false;
        };
        match self.write(instance, member, value) {
            Ok(()) => true,
            Err(AccessError::UnknownMember { .. } | AccessError::ReadOnlyReference { .. }) => false,
            Err(error) => panic!("{error}"),
        }
    }

    // -------------------------------------------------------------------------
    // Reference access

    /// Borrows the place of the member named `name`.
    ///
    /// Fails with [`AccessError::NotSupport`] for members that have no place,
    /// e.g. properties whose getter computes a value.
    pub fn get_ref<'a>(
        &self,
        instance: &'a dyn Any,
        name: &str,
    ) -> Result<&'a dyn Any, AccessError> {
        let member = self.resolve(name)?;
        self.borrow(instance, member)
    }

    /// Borrows the place of the member at `ordinal`.
    pub fn get_ref_at<'a>(
        &self,
        instance: &'a dyn Any,
        ordinal: u32,
    ) -> Result<&'a dyn Any, AccessError> {
        let member = self.resolve_at(ordinal)?;
        self.borrow(instance, member)
    }

    /// Mutably borrows the place of the member named `name`.
    ///
    /// For members whose writes are rescued through a backing field this
    /// projects the backing slot, which is the same storage the member's own
    /// accessors use.
    pub fn get_mut<'a>(
        &self,
        instance: &'a mut dyn Any,
        name: &str,
    ) -> Result<&'a mut dyn Any, AccessError> {
        let member = self.resolve(name)?;
        self.borrow_mut(instance, member)
    }

    /// Mutably borrows the place of the member at `ordinal`.
    pub fn get_mut_at<'a>(
        &self,
        instance: &'a mut dyn Any,
        ordinal: u32,
    ) -> Result<&'a mut dyn Any, AccessError> {
        let member = self.resolve_at(ordinal)?;
        self.borrow_mut(instance, member)
    }

    // -------------------------------------------------------------------------
    // Construction

    /// Returns `true` if [`create_new`](Self::create_new) can succeed.
    #[inline]
    pub fn create_supported(&self) -> bool {
        self.create.is_some()
    }

    /// Constructs a fresh boxed instance of the accessor's type.
    pub fn create_new(&self) -> Result<Box<dyn Any>, AccessError> {
        match &self.create {
            Some(create) => Ok(create()),
            None => Err(AccessError::NotSupport {
                type_path: Cow::Borrowed(self.ty.path()),
                operation: Cow::Borrowed("`create_new`"),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Introspection

    /// Returns every accessible member in ordinal order.
    #[inline]
    pub fn members(&self) -> &[MemberDescriptor] {
        self.catalog.members()
    }

    /// Returns the member named `name`.
    #[inline]
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.catalog
            .ordinal_of(name)
            .and_then(|ordinal| self.catalog.get(ordinal))
    }

    /// Returns the member at `ordinal`.
    #[inline]
    pub fn member_at(&self, ordinal: u32) -> Option<&MemberDescriptor> {
        self.catalog.get(ordinal)
    }

    /// Returns the number of accessible members.
    #[inline]
    pub fn member_len(&self) -> usize {
        self.catalog.len()
    }

    /// Returns the ordinal of the member named `name`.
    #[inline]
    pub fn ordinal_of(&self, name: &str) -> Option<u32> {
        self.catalog.ordinal_of(name)
    }

    /// Returns the identity of the accessed type.
    #[inline]
    pub const fn ty(&self) -> Ty {
        self.ty
    }

    /// Returns the `TypeId` of the accessed type.
    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.ty.id()
    }

    /// Returns the full path of the accessed type.
    #[inline]
    pub const fn type_path(&self) -> &'static str {
        self.ty.path()
    }

    /// Returns the policy the accessor was compiled under.
    #[inline]
    pub const fn policy(&self) -> AccessPolicy {
        self.policy
    }

    /// Returns the dispatch strategy.
    #[inline]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    // -------------------------------------------------------------------------
    // Dispatch

    fn resolve(&self, name: &str) -> Result<&MemberDescriptor, AccessError> {
        self.catalog
            .ordinal_of(name)
            .and_then(|ordinal| self.catalog.get(ordinal))
            .ok_or_else(|| self.unknown_member(name))
    }

    fn resolve_at(&self, ordinal: u32) -> Result<&MemberDescriptor, AccessError> {
        self.catalog
            .get(ordinal)
            .ok_or_else(|| AccessError::UnknownMember {
                type_path: Cow::Borrowed(self.ty.path()),
                member: Cow::Owned(format!("#{ordinal}")),
            })
    }

    fn read(
        &self,
        instance: &dyn Any,
        member: &MemberDescriptor,
    ) -> Result<Box<dyn Any>, AccessError> {
        if !member.readable() {
            return Err(self.unknown_member(member.name()));
        }
        match &self.engine {
            Engine::Table(table) => {
                (table.get)(instance, member.decl_index()).map_err(|error| self.lift(member, error))
            }
            Engine::Delegates(slots) => match &slots[member.ordinal() as usize].get {
                Some(get) => get(instance).map_err(|error| self.lift(member, error)),
                None => Err(self.no_dispatch(member, "reading")),
            },
        }
    }

    fn write(
        &self,
        instance: &mut dyn Any,
        member: &MemberDescriptor,
        value: Box<dyn Any>,
    ) -> Result<(), AccessError> {
        if !member.writable() && !member.write_via_backing() {
            return Err(if member.readonly_ref() {
                AccessError::ReadOnlyReference {
                    member: member.name_cow().clone(),
                }
            } else {
                self.unknown_member(member.name())
            });
        }
        match &self.engine {
            Engine::Table(table) => {
                let set = if member.write_via_backing() {
                    table.set_backing
                } else {
                    table.set
                };
                set(instance, member.decl_index(), value)
                    .map_err(|error| self.lift(member, error))
            }
            Engine::Delegates(slots) => match &slots[member.ordinal() as usize].set {
                Some(set) => set(instance, value).map_err(|error| self.lift(member, error)),
                None => Err(self.no_dispatch(member, "writing")),
            },
        }
    }

    fn borrow<'a>(
        &self,
        instance: &'a dyn Any,
        member: &MemberDescriptor,
    ) -> Result<&'a dyn Any, AccessError> {
        if !member.readable() {
            return Err(self.unknown_member(member.name()));
        }
        match &self.engine {
            Engine::Table(table) => (table.get_ref)(instance, member.decl_index())
                .map_err(|error| self.lift(member, error)),
            Engine::Delegates(slots) => match &slots[member.ordinal() as usize].get_ref {
                Some(get_ref) => get_ref(instance).map_err(|error| self.lift(member, error)),
                None => Err(self.no_dispatch(member, "borrowing")),
            },
        }
    }

    fn borrow_mut<'a>(
        &self,
        instance: &'a mut dyn Any,
        member: &MemberDescriptor,
    ) -> Result<&'a mut dyn Any, AccessError> {
        if !member.writable() && !member.write_via_backing() {
            return Err(if member.readonly_ref() {
                AccessError::ReadOnlyReference {
                    member: member.name_cow().clone(),
                }
            } else {
                self.unknown_member(member.name())
            });
        }
        match &self.engine {
            Engine::Table(table) => (table.get_mut)(instance, member.decl_index())
                .map_err(|error| self.lift(member, error)),
            Engine::Delegates(slots) => match &slots[member.ordinal() as usize].get_mut {
                Some(get_mut) => get_mut(instance).map_err(|error| self.lift(member, error)),
                None => Err(self.no_dispatch(member, "borrowing")),
            },
        }
    }

    fn unknown_member(&self, name: &str) -> AccessError {
        AccessError::UnknownMember {
            type_path: Cow::Borrowed(self.ty.path()),
            member: Cow::Owned(name.to_owned()),
        }
    }

    fn no_dispatch(&self, member: &MemberDescriptor, action: &str) -> AccessError {
        AccessError::NotSupport {
            type_path: Cow::Borrowed(self.ty.path()),
            operation: Cow::Owned(format!("{action} member `{}`", member.name())),
        }
    }

    fn lift(&self, member: &MemberDescriptor, error: TableError) -> AccessError {
        match error {
            TableError::NoSuchPath => self.unknown_member(member.name()),
            TableError::ReadOnlyRef => AccessError::ReadOnlyReference {
                member: member.name_cow().clone(),
            },
            TableError::NotProjectable => self.no_dispatch(member, "borrowing"),
            TableError::ValueType { expected } => AccessError::MismatchedValueType {
                member: member.name_cow().clone(),
                expected: Cow::Borrowed(expected),
            },
            TableError::InstanceType { expected } => AccessError::MismatchedInstanceType {
                expected: Cow::Borrowed(expected),
            },
        }
    }
}

impl fmt::Debug for TypeAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeAccessor")
            .field("type_path", &self.ty.path())
            .field("policy", &self.policy)
            .field("strategy", &self.strategy)
            .field("members", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::{
        Blueprint, BlueprintBuilder, Constructor, DispatchTable, MemberDecl, Vis,
    };
    use alloc::string::String;
    use core::any::type_name;

    // ---------------------------------------------------------------------
    // A hand-written dispatch table, shaped like derive output.

    struct Gauge {
        value: f32,
        peak: f32,
    }

    impl Gauge {
        fn level(&self) -> f32 {
            self.value / self.peak
        }
    }

    fn gauge_get(instance: &dyn Any, decl: u32) -> Result<Box<dyn Any>, TableError> {
        let instance = instance
            .downcast_ref::<Gauge>()
            .ok_or(TableError::InstanceType {
                expected: type_name::<Gauge>(),
            })?;
        match decl {
            0 => Ok(Box::new(Gauge::level(instance))),
            1 => Ok(Box::new(Clone::clone(&instance.value))),
            2 => Ok(Box::new(Clone::clone(&instance.peak))),
            _ => Err(TableError::NoSuchPath),
        }
    }

    fn gauge_set(instance: &mut dyn Any, decl: u32, value: Box<dyn Any>) -> Result<(), TableError> {
        let instance = instance
            .downcast_mut::<Gauge>()
            .ok_or(TableError::InstanceType {
                expected: type_name::<Gauge>(),
            })?;
        match decl {
            0 => Err(TableError::NoSuchPath),
            1 => {
                instance.value = *value.downcast::<f32>().map_err(|_| TableError::ValueType {
                    expected: type_name::<f32>(),
                })?;
                Ok(())
            }
            2 => {
                instance.peak = *value.downcast::<f32>().map_err(|_| TableError::ValueType {
                    expected: type_name::<f32>(),
                })?;
                Ok(())
            }
            _ => Err(TableError::NoSuchPath),
        }
    }

    fn gauge_set_backing(
        _instance: &mut dyn Any,
        _decl: u32,
        _value: Box<dyn Any>,
    ) -> Result<(), TableError> {
        Err(TableError::NoSuchPath)
    }

    fn gauge_get_ref(instance: &dyn Any, decl: u32) -> Result<&dyn Any, TableError> {
        let instance = instance
            .downcast_ref::<Gauge>()
            .ok_or(TableError::InstanceType {
                expected: type_name::<Gauge>(),
            })?;
        match decl {
            0 => Err(TableError::NotProjectable),
            1 => Ok(&instance.value),
            2 => Ok(&instance.peak),
            _ => Err(TableError::NoSuchPath),
        }
    }

    fn gauge_get_mut(instance: &mut dyn Any, decl: u32) -> Result<&mut dyn Any, TableError> {
        let instance = instance
            .downcast_mut::<Gauge>()
            .ok_or(TableError::InstanceType {
                expected: type_name::<Gauge>(),
            })?;
        match decl {
            0 => Err(TableError::NotProjectable),
            1 => Ok(&mut instance.value),
            2 => Ok(&mut instance.peak),
            _ => Err(TableError::NoSuchPath),
        }
    }

    static GAUGE_TABLE: DispatchTable = DispatchTable {
        get: gauge_get,
        set: gauge_set,
        set_backing: gauge_set_backing,
        get_ref: gauge_get_ref,
        get_mut: gauge_get_mut,
    };

    fn gauge_blueprint() -> Blueprint {
        Blueprint::with_path::<Gauge>("accessor::tests::Gauge", "Gauge", Vis::Public)
            .with_members([
                MemberDecl::property::<f32>("level").with_get(Vis::Public),
                MemberDecl::field::<f32>("value", Vis::Public),
                MemberDecl::field::<f32>("peak", Vis::Public),
            ])
            .with_table(&GAUGE_TABLE)
            .with_constructor(Constructor::new(
                || {
                    Box::new(Gauge {
                        value: 0.0,
                        peak: 1.0,
                    })
                },
                Vis::Public,
            ))
    }

    #[test]
    fn table_engine_reads_and_writes() {
        let accessor = compile(&gauge_blueprint(), AccessPolicy::PublicOnly);
        assert_eq!(accessor.strategy(), Strategy::FullyCompiled);

        let mut gauge = Gauge {
            value: 2.0,
            peak: 8.0,
        };
        let level = accessor.get(&gauge, "level").unwrap();
        assert_eq!(level.downcast_ref::<f32>(), Some(&0.25));

        accessor.set(&mut gauge, "value", Box::new(4.0_f32)).unwrap();
        assert_eq!(gauge.value, 4.0);

        let place = accessor.get_mut(&mut gauge, "peak").unwrap();
        *place.downcast_mut::<f32>().unwrap() = 16.0;
        assert_eq!(gauge.peak, 16.0);
    }

    #[test]
    fn table_engine_resolves_ordinals() {
        let accessor = compile(&gauge_blueprint(), AccessPolicy::PublicOnly);
        let gauge = Gauge {
            value: 3.0,
            peak: 6.0,
        };

        assert_eq!(accessor.ordinal_of("level"), Some(0));
        assert_eq!(accessor.ordinal_of("value"), Some(1));
        let read = accessor.get_at(&gauge, 1).unwrap();
        assert_eq!(read.downcast_ref::<f32>(), Some(&3.0));

        let err = accessor.get_at(&gauge, 9).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type `accessor::tests::Gauge` has no accessible member `#9`"
        );
    }

    #[test]
    fn computed_properties_reject_writes_and_borrows() {
        let accessor = compile(&gauge_blueprint(), AccessPolicy::PublicOnly);
        let mut gauge = Gauge {
            value: 1.0,
            peak: 2.0,
        };

        let err = accessor
            .set(&mut gauge, "level", Box::new(0.5_f32))
            .unwrap_err();
        assert!(matches!(err, AccessError::UnknownMember { .. }));

        let err = accessor.get_ref(&gauge, "level").unwrap_err();
        assert_eq!(
            err.to_string(),
            "type `accessor::tests::Gauge` does not support borrowing member `level`"
        );
    }

    #[test]
    fn wrong_instance_and_value_types_are_reported() {
        let accessor = compile(&gauge_blueprint(), AccessPolicy::PublicOnly);

        let err = accessor.get(&0_u8, "value").unwrap_err();
        assert!(matches!(err, AccessError::MismatchedInstanceType { .. }));

        let mut gauge = Gauge {
            value: 1.0,
            peak: 2.0,
        };
        let err = accessor
            .set(&mut gauge, "value", Box::new("fast"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "value written to member `value` is not a `f32`"
        );
    }

    #[test]
    fn unknown_members_are_reported_by_name() {
        let accessor = compile(&gauge_blueprint(), AccessPolicy::PublicOnly);
        let gauge = Gauge {
            value: 1.0,
            peak: 2.0,
        };
        let err = accessor.get(&gauge, "pressure").unwrap_err();
        assert_eq!(
            err.to_string(),
            "type `accessor::tests::Gauge` has no accessible member `pressure`"
        );
    }

    #[test]
    fn create_new_goes_through_the_constructor() {
        let accessor = compile(&gauge_blueprint(), AccessPolicy::PublicOnly);
        assert!(accessor.create_supported());
        let fresh = accessor.create_new().unwrap();
        let gauge = fresh.downcast_ref::<Gauge>().unwrap();
        assert_eq!(gauge.peak, 1.0);
    }

    #[test]
    fn derived_tables_run_fully_compiled() {
        use crate::derive::Accessible;

        #[derive(Accessible, Default)]
        #[access(default, property(name = "halved", ty = u32, get = halved))]
        pub struct Meter {
            pub raw: u32,
            #[access(readonly)]
            pub unit: char,
        }

        impl Meter {
            fn halved(&self) -> u32 {
                self.raw / 2
            }
        }

        let blueprint = <Meter as crate::Accessible>::blueprint();
        let accessor = compile(blueprint, AccessPolicy::PublicOnly);
        assert_eq!(accessor.strategy(), Strategy::FullyCompiled);

        let mut meter = Meter { raw: 8, unit: 'm' };
        let read = accessor.get(&meter, "halved").unwrap();
        assert_eq!(read.downcast_ref::<u32>(), Some(&4));

        accessor.set(&mut meter, "raw", Box::new(20_u32)).unwrap();
        assert_eq!(meter.raw, 20);

        // Readonly fields have no write side at all.
        let err = accessor.set(&mut meter, "unit", Box::new('k')).unwrap_err();
        assert!(matches!(err, AccessError::UnknownMember { .. }));

        assert!(accessor.create_supported());
        assert!(accessor.create_new().unwrap().downcast_ref::<Meter>().is_some());
    }

    // ---------------------------------------------------------------------
    // Delegate engine, via builder blueprints.

    struct Pair(u32, u32);

    struct Motor {
        rpm: u32,
        serial: String,
    }

    fn motor_blueprint() -> Blueprint {
        BlueprintBuilder::<Motor>::new()
            .field("rpm", |m| &m.rpm, |m| &mut m.rpm)
            .ref_property("serial", |m| &m.serial)
            .constructor(Vis::NonPublic, || Motor {
                rpm: 0,
                serial: String::new(),
            })
            .finish()
    }

    #[test]
    fn delegate_engine_reads_and_writes() {
        let accessor = compile(&motor_blueprint(), AccessPolicy::PublicOnly);
        assert_eq!(accessor.strategy(), Strategy::DelegateBased);

        let mut motor = Motor {
            rpm: 800,
            serial: String::from("M-11"),
        };
        accessor.set(&mut motor, "rpm", Box::new(1_200_u32)).unwrap();
        let read = accessor.get(&motor, "rpm").unwrap();
        assert_eq!(read.downcast_ref::<u32>(), Some(&1_200));

        let place = accessor.get_ref(&motor, "serial").unwrap();
        assert_eq!(place.downcast_ref::<String>().map(String::as_str), Some("M-11"));
    }

    #[test]
    fn set_then_get_round_trips_every_member() {
        struct Record {
            a: u32,
            b: String,
        }
        let blueprint = BlueprintBuilder::<Record>::new()
            .field("a", |r| &r.a, |r| &mut r.a)
            .field("b", |r| &r.b, |r| &mut r.b)
            .finish();
        let accessor = compile(&blueprint, AccessPolicy::PublicOnly);

        let mut record = Record {
            a: 0,
            b: String::new(),
        };
        accessor.set(&mut record, "a", Box::new(123_u32)).unwrap();
        accessor
            .set(&mut record, "b", Box::new(String::from("def")))
            .unwrap();

        let a = accessor.get(&record, "a").unwrap();
        assert_eq!(a.downcast_ref::<u32>(), Some(&123));
        let b = accessor.get(&record, "b").unwrap();
        assert_eq!(b.downcast_ref::<String>().map(String::as_str), Some("def"));
    }

    #[test]
    fn readonly_references_reject_writes() {
        let accessor = compile(&motor_blueprint(), AccessPolicy::PublicOnly);
        let mut motor = Motor {
            rpm: 800,
            serial: String::from("M-11"),
        };

        let err = accessor
            .set(&mut motor, "serial", Box::new(String::from("M-12")))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "member `serial` only exposes a read-only reference"
        );
        let err = accessor.get_mut(&mut motor, "serial").unwrap_err();
        assert!(matches!(err, AccessError::ReadOnlyReference { .. }));

        // A value read still works, it clones through the borrow.
        let read = accessor.get(&motor, "serial").unwrap();
        assert!(read.downcast_ref::<String>().is_some());
    }

    #[test]
    fn try_forms_swallow_only_membership_failures() {
        let accessor = compile(&motor_blueprint(), AccessPolicy::PublicOnly);
        let mut motor = Motor {
            rpm: 800,
            serial: String::from("M-11"),
        };

        assert!(accessor.try_get(&motor, "torque").is_none());
        assert!(accessor.try_get(&motor, "rpm").is_some());

        assert!(!accessor.try_set(&mut motor, "torque", Box::new(1_u32)));
        assert!(!accessor.try_set(&mut motor, "serial", Box::new(String::from("M-12"))));
        assert!(accessor.try_set(&mut motor, "rpm", Box::new(900_u32)));
        assert_eq!(motor.rpm, 900);
    }

    #[test]
    #[should_panic(expected = "value written to member")]
    fn try_set_panics_on_value_mismatch() {
        let accessor = compile(&motor_blueprint(), AccessPolicy::PublicOnly);
        let mut motor = Motor {
            rpm: 800,
            serial: String::from("M-11"),
        };
        let _ = accessor.try_set(&mut motor, "rpm", Box::new("fast"));
    }

    #[test]
    #[should_panic(expected = "target instance is not a")]
    fn try_get_panics_on_instance_mismatch() {
        let accessor = compile(&motor_blueprint(), AccessPolicy::PublicOnly);
        let _ = accessor.try_get(&0_u8, "rpm");
    }

    #[test]
    fn constructor_visibility_follows_the_policy() {
        let public = compile(&motor_blueprint(), AccessPolicy::PublicOnly);
        assert!(!public.create_supported());
        let err = public.create_new().unwrap_err();
        assert!(err.to_string().ends_with("does not support `create_new`"));

        let all = compile(&motor_blueprint(), AccessPolicy::AllowNonPublic);
        assert!(all.create_supported());
        assert!(all.create_new().unwrap().downcast_ref::<Motor>().is_some());
    }

    #[test]
    fn positional_names_address_tuple_members() {
        let blueprint = BlueprintBuilder::<Pair>::new()
            .field("0", |p| &p.0, |p| &mut p.0)
            .field("1", |p| &p.1, |p| &mut p.1)
            .finish();
        let accessor = compile(&blueprint, AccessPolicy::PublicOnly);

        let mut pair = Pair(1, 2);
        accessor.set(&mut pair, "1", Box::new(20_u32)).unwrap();
        assert_eq!(pair.1, 20);
        let read = accessor.get(&pair, "0").unwrap();
        assert_eq!(read.downcast_ref::<u32>(), Some(&1));

        // No constructor was declared.
        assert!(!accessor.create_supported());
    }

    #[test]
    fn backing_rescue_writes_the_backing_slot() {
        struct Tank {
            fill: f64,
        }
        let blueprint = BlueprintBuilder::<Tank>::new()
            .property("fill", |t: &Tank| t.fill)
            .backing("fill", |t| &mut t.fill)
            .finish();
        let accessor = compile(&blueprint, AccessPolicy::PublicOnly);

        let mut tank = Tank { fill: 0.1 };
        accessor.set(&mut tank, "fill", Box::new(0.7_f64)).unwrap();
        assert_eq!(tank.fill, 0.7);

        // The mutable borrow projects the same storage.
        let place = accessor.get_mut(&mut tank, "fill").unwrap();
        *place.downcast_mut::<f64>().unwrap() = 0.9;
        assert_eq!(tank.fill, 0.9);
    }

    #[test]
    fn reference_members_alias_the_same_slot() {
        struct Slot {
            val: i32,
        }
        let blueprint = BlueprintBuilder::<Slot>::new()
            .field("val", |s| &s.val, |s| &mut s.val)
            .ref_property_mut("by_ref", |s| &s.val, |s| &mut s.val)
            .ref_property("view", |s| &s.val)
            .finish();
        let accessor = compile(&blueprint, AccessPolicy::PublicOnly);

        let mut slot = Slot { val: 7 };
        for name in ["val", "by_ref", "view"] {
            let read = accessor.get(&slot, name).unwrap();
            assert_eq!(read.downcast_ref::<i32>(), Some(&7), "member `{name}`");
        }

        // Writing through the mutable reference moves the field.
        accessor.set(&mut slot, "by_ref", Box::new(40_i32)).unwrap();
        let read = accessor.get(&slot, "val").unwrap();
        assert_eq!(read.downcast_ref::<i32>(), Some(&40));

        // The read-only view rejects the write and the slot keeps its value.
        let err = accessor.set(&mut slot, "view", Box::new(0_i32)).unwrap_err();
        assert!(matches!(err, AccessError::ReadOnlyReference { .. }));
        assert_eq!(slot.val, 40);
    }

    #[test]
    fn non_public_members_need_the_wider_policy() {
        struct Sealed {
            inner: u8,
        }
        let blueprint = BlueprintBuilder::<Sealed>::new()
            .field("inner", |s| &s.inner, |s| &mut s.inner)
            .member_vis(Vis::NonPublic)
            .finish();

        let public = compile(&blueprint, AccessPolicy::PublicOnly);
        assert_eq!(public.member_len(), 0);
        let sealed = Sealed { inner: 3 };
        assert!(public.get(&sealed, "inner").is_err());

        let all = compile(&blueprint, AccessPolicy::AllowNonPublic);
        let read = all.get(&sealed, "inner").unwrap();
        assert_eq!(read.downcast_ref::<u8>(), Some(&3));
    }
}
