use alloc::sync::Arc;
use core::any::TypeId;
use std::sync::{PoisonError, RwLock};

use fieldlens_utils::TypeIdMap;

use crate::accessor::{TypeAccessor, compile};
use crate::describe::{AccessPolicy, Blueprint};

// One cache per policy, so the policy never has to take part in the hash.
static PUBLIC_CACHE: RwLock<TypeIdMap<Arc<TypeAccessor>>> = RwLock::new(TypeIdMap::new());
static NON_PUBLIC_CACHE: RwLock<TypeIdMap<Arc<TypeAccessor>>> = RwLock::new(TypeIdMap::new());

fn cache_for(policy: AccessPolicy) -> &'static RwLock<TypeIdMap<Arc<TypeAccessor>>> {
    match policy {
        AccessPolicy::PublicOnly => &PUBLIC_CACHE,
        AccessPolicy::AllowNonPublic => &NON_PUBLIC_CACHE,
    }
}

/// The hot path: one read lock, one hash, one `Arc` clone.
pub(crate) fn lookup(type_id: TypeId, policy: AccessPolicy) -> Option<Arc<TypeAccessor>> {
    cache_for(policy)
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
        .cloned()
}

/// Returns the cached accessor for the blueprint's type, compiling it first
/// if nothing is cached yet.
pub(crate) fn get_or_compile(blueprint: &Blueprint, policy: AccessPolicy) -> Arc<TypeAccessor> {
    match lookup(blueprint.type_id(), policy) {
        Some(accessor) => accessor,
        // Compilation runs outside the lock; racing threads may compile the
        // same accessor twice and the first one published wins.
        None => publish(Arc::new(compile(blueprint, policy)), policy),
    }
}

// Cold path, kept out of the lookup's inlining.
#[inline(never)]
fn publish(accessor: Arc<TypeAccessor>, policy: AccessPolicy) -> Arc<TypeAccessor> {
    let mut cache = cache_for(policy)
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    cache
        .get_or_insert(accessor.type_id(), || accessor)
        .clone()
}
