//! The process-wide accessor cache and blueprint registry.
//!
//! Accessors are compiled once per `(type, policy)` pair and shared behind
//! `Arc`; repeated lookups are a read-lock, a `TypeId` hash and a clone.
//! Separately, blueprints can be registered by type so that accessors can be
//! found without compile-time knowledge of the type: by [`TypeId`], by full
//! path or by bare ident.

// -----------------------------------------------------------------------------
// Modules

#[cfg(feature = "auto_register")]
pub(crate) mod auto;
mod blueprints;
mod cache;

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::TypeId;
use std::sync::{PoisonError, RwLock};

use crate::accessor::TypeAccessor;
use crate::describe::{AccessPolicy, Accessible, Blueprint};

use blueprints::BlueprintRegistry;

static REGISTRY: RwLock<BlueprintRegistry> = RwLock::new(BlueprintRegistry::empty());

// -----------------------------------------------------------------------------
// Accessors

/// Returns the process-wide accessor for `T` under `policy`.
///
/// The first call per `(type, policy)` pair compiles the accessor; every
/// later call is a cache hit.
///
/// # Examples
///
/// ```
/// use fieldlens_access::derive::Accessible;
/// use fieldlens_access::{AccessPolicy, accessor_of};
///
/// #[derive(Accessible)]
/// pub struct Wheel {
///     pub radius: f32,
/// }
///
/// let first = accessor_of::<Wheel>(AccessPolicy::PublicOnly);
/// let second = accessor_of::<Wheel>(AccessPolicy::PublicOnly);
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// ```
pub fn accessor_of<T: Accessible>(policy: AccessPolicy) -> Arc<TypeAccessor> {
    match cache::lookup(TypeId::of::<T>(), policy) {
        Some(accessor) => accessor,
        None => cache::get_or_compile(T::blueprint(), policy),
    }
}

/// Returns the process-wide accessor for the blueprint's type under
/// `policy`.
///
/// The cache is keyed by type: if an accessor for the same type was already
/// compiled from another blueprint, that one is returned unchanged.
pub fn accessor_for(blueprint: &Blueprint, policy: AccessPolicy) -> Arc<TypeAccessor> {
    cache::get_or_compile(blueprint, policy)
}

/// Returns the accessor for the type with the given [`TypeId`].
///
/// Resolves through the accessor cache first and the blueprint registry
/// second; `None` means the type is known to neither.
pub fn accessor_by_id(type_id: TypeId, policy: AccessPolicy) -> Option<Arc<TypeAccessor>> {
    if let Some(accessor) = cache::lookup(type_id, policy) {
        return Some(accessor);
    }
    let blueprint = with_registry(|registry| registry.get(type_id))?;
    Some(cache::get_or_compile(blueprint, policy))
}

/// Returns the accessor for the registered type with the given full path,
/// e.g. `"my_app::units::Boiler"`.
pub fn accessor_by_path(type_path: &str, policy: AccessPolicy) -> Option<Arc<TypeAccessor>> {
    let blueprint = with_registry(|registry| registry.get_by_path(type_path))?;
    Some(cache::get_or_compile(blueprint, policy))
}

/// Returns the accessor for the registered type with the given bare ident,
/// e.g. `"Boiler"`.
///
/// An ident carried by more than one registered type resolves to nothing;
/// see [`is_ambiguous`].
pub fn accessor_by_name(name: &str, policy: AccessPolicy) -> Option<Arc<TypeAccessor>> {
    let blueprint = with_registry(|registry| registry.get_by_ident(name))?;
    Some(cache::get_or_compile(blueprint, policy))
}

/// Returns `true` if the given bare ident matches more than one registered
/// type.
pub fn is_ambiguous(name: &str) -> bool {
    with_registry(|registry| registry.is_ambiguous(name))
}

// -----------------------------------------------------------------------------
// Registration

/// Registers `T`'s blueprint for by-id, by-path and by-ident lookup.
///
/// Returns `true` if the type was not registered before.
pub fn register<T: Accessible>() -> bool {
    let blueprint = T::blueprint();
    REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(blueprint)
}

/// Registers a built blueprint, returning the registered one.
///
/// The blueprint is leaked into the process-wide registry. If the type
/// already has a registered blueprint, the new one is dropped and the
/// existing one is returned.
pub fn register_blueprint(blueprint: Blueprint) -> &'static Blueprint {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = registry.get(blueprint.type_id()) {
        log::warn!(
            "a different blueprint for `{}` is already registered; keeping the first one",
            existing.type_path(),
        );
        return existing;
    }
    let leaked: &'static Blueprint = Box::leak(Box::new(blueprint));
    registry.register(leaked);
    leaked
}

// -----------------------------------------------------------------------------
// Internals

fn with_registry<R>(f: impl FnOnce(&BlueprintRegistry) -> R) -> R {
    #[cfg(feature = "auto_register")]
    ensure_auto_registered();
    let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    f(&registry)
}

/// Drains the inventory of `#[access(auto_register)]` submissions into the
/// registry, once.
#[cfg(feature = "auto_register")]
fn ensure_auto_registered() {
    use std::sync::Once;
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
        for entry in inventory::iter::<auto::BlueprintEntry> {
            registry.register(entry.blueprint());
        }
    });
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::BlueprintBuilder;
    use alloc::vec::Vec;
    use core::any::type_name;
    use std::thread;

    #[test]
    fn concurrent_lookups_share_one_accessor() {
        struct SharedCachePart {
            mass: f64,
        }
        let blueprint = register_blueprint(
            BlueprintBuilder::<SharedCachePart>::new()
                .field("mass", |p| &p.mass, |p| &mut p.mass)
                .finish(),
        );
        let id = blueprint.type_id();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                thread::spawn(move || {
                    accessor_by_id(id, AccessPolicy::PublicOnly)
                        .expect("the blueprint was registered above")
                })
            })
            .collect();
        let accessors: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        for accessor in &accessors[1..] {
            assert!(Arc::ptr_eq(&accessors[0], accessor));
        }
    }

    #[test]
    fn policies_are_cached_independently() {
        struct TwoPolicyPart {
            seen: u8,
            hidden: u8,
        }
        let blueprint = BlueprintBuilder::<TwoPolicyPart>::new()
            .field("seen", |p| &p.seen, |p| &mut p.seen)
            .field("hidden", |p| &p.hidden, |p| &mut p.hidden)
            .member_vis(crate::describe::Vis::NonPublic)
            .finish();

        let public = accessor_for(&blueprint, AccessPolicy::PublicOnly);
        let all = accessor_for(&blueprint, AccessPolicy::AllowNonPublic);
        assert!(!Arc::ptr_eq(&public, &all));
        assert_eq!(public.member_len(), 1);
        assert_eq!(all.member_len(), 2);

        // Each policy hits its own cache entry on repeat.
        assert!(Arc::ptr_eq(
            &public,
            &accessor_for(&blueprint, AccessPolicy::PublicOnly)
        ));
    }

    #[test]
    fn lookup_by_path_and_ident() {
        struct RegisteredTurbine {
            rpm: u32,
        }
        register_blueprint(
            BlueprintBuilder::<RegisteredTurbine>::new()
                .field("rpm", |t| &t.rpm, |t| &mut t.rpm)
                .finish(),
        );

        let by_path = accessor_by_path(
            type_name::<RegisteredTurbine>(),
            AccessPolicy::PublicOnly,
        );
        assert!(by_path.is_some());

        let by_name = accessor_by_name("RegisteredTurbine", AccessPolicy::PublicOnly);
        assert!(by_name.is_some());
        assert!(Arc::ptr_eq(&by_path.unwrap(), &by_name.unwrap()));

        assert!(accessor_by_name("NeverRegistered", AccessPolicy::PublicOnly).is_none());
    }

    #[test]
    fn ambiguous_idents_stop_resolving() {
        mod alpha {
            pub struct DuplicateIdent {
                pub n: u8,
            }
        }
        mod beta {
            pub struct DuplicateIdent {
                pub n: u8,
            }
        }

        register_blueprint(
            BlueprintBuilder::<alpha::DuplicateIdent>::new()
                .field("n", |d| &d.n, |d| &mut d.n)
                .finish(),
        );
        register_blueprint(
            BlueprintBuilder::<beta::DuplicateIdent>::new()
                .field("n", |d| &d.n, |d| &mut d.n)
                .finish(),
        );

        assert!(is_ambiguous("DuplicateIdent"));
        assert!(accessor_by_name("DuplicateIdent", AccessPolicy::PublicOnly).is_none());
        // Full paths keep working.
        assert!(
            accessor_by_path(type_name::<alpha::DuplicateIdent>(), AccessPolicy::PublicOnly)
                .is_some()
        );
        assert!(
            accessor_by_path(type_name::<beta::DuplicateIdent>(), AccessPolicy::PublicOnly)
                .is_some()
        );
    }

    #[test]
    fn conflicting_registrations_keep_the_first() {
        struct ReRegistered {
            a: u8,
            b: u8,
        }
        let first = register_blueprint(
            BlueprintBuilder::<ReRegistered>::new()
                .field("a", |r| &r.a, |r| &mut r.a)
                .finish(),
        );
        let second = register_blueprint(
            BlueprintBuilder::<ReRegistered>::new()
                .field("a", |r| &r.a, |r| &mut r.a)
                .field("b", |r| &r.b, |r| &mut r.b)
                .finish(),
        );

        assert!(core::ptr::eq(first, second));
        assert_eq!(second.members().len(), 1);
    }

    #[test]
    fn register_makes_derived_types_findable() {
        use crate::derive::Accessible;

        #[derive(Accessible)]
        pub struct Beacon {
            pub code: u32,
        }

        assert!(register::<Beacon>());
        assert!(!register::<Beacon>());

        let accessor =
            accessor_by_name("Beacon", AccessPolicy::PublicOnly).expect("registered above");
        assert!(accessor.ty().is::<Beacon>());
    }

    #[cfg(feature = "auto_register")]
    #[test]
    fn auto_registered_types_resolve_before_first_use() {
        use crate::derive::Accessible;

        #[derive(Accessible)]
        #[access(auto_register)]
        pub struct AutoBeacon {
            pub code: u32,
        }

        let accessor = accessor_by_name("AutoBeacon", AccessPolicy::PublicOnly)
            .expect("collected at startup");
        assert!(accessor.ty().is::<AutoBeacon>());
        assert!(!is_ambiguous("AutoBeacon"));
    }
}
