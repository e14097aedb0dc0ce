use alloc::boxed::Box;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::catalog::{MemberCatalog, MemberDescriptor};
use crate::describe::{
    AccessPolicy, Blueprint, DispatchTable, GetThunk, MutThunk, RefThunk, SetThunk, ThunkSet,
};

use super::TypeAccessor;
use super::classify::{Strategy, classify};

static COMPILE_COUNT: AtomicU64 = AtomicU64::new(0);

/// Number of accessor compilations since process start.
///
/// The registry cache keeps this at one per `(type, policy)` pair; tests use
/// it to prove that cache hits do not recompile.
///
/// ```rust,standalone_crate
/// use fieldlens_access::derive::Accessible;
/// use fieldlens_access::{AccessPolicy, accessor_of, compile_count};
///
/// #[derive(Accessible)]
/// pub struct Probe {
///     pub depth: u32,
/// }
///
/// let first = accessor_of::<Probe>(AccessPolicy::PublicOnly);
/// let compiled = compile_count();
///
/// let second = accessor_of::<Probe>(AccessPolicy::PublicOnly);
/// assert_eq!(compile_count(), compiled);
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// ```
pub fn compile_count() -> u64 {
    COMPILE_COUNT.load(Ordering::Relaxed)
}

/// The dispatch mechanism of one compiled accessor.
pub(crate) enum Engine {
    /// Ordinals are mapped to declaration indices and dispatched through the
    /// type's static table.
    Table(&'static DispatchTable),
    /// Ordinals index into per-member delegate slots.
    Delegates(Box<[DelegateSlot]>),
}

/// Policy-gated delegates of one catalog member.
///
/// A missing closure means the operation is not available for this member;
/// the accessor turns that into the matching error.
#[derive(Default)]
pub(crate) struct DelegateSlot {
    pub(crate) get: Option<GetThunk>,
    pub(crate) set: Option<SetThunk>,
    pub(crate) get_ref: Option<RefThunk>,
    pub(crate) get_mut: Option<MutThunk>,
}

/// Builds the accessor for `blueprint` under `policy`.
///
/// This is the slow path; callers go through the registry cache.
pub(crate) fn compile(blueprint: &Blueprint, policy: AccessPolicy) -> TypeAccessor {
    COMPILE_COUNT.fetch_add(1, Ordering::Relaxed);
    let catalog = MemberCatalog::build(blueprint, policy);
    let strategy = classify(blueprint, policy);
    let engine = match (strategy, blueprint.table()) {
        (Strategy::FullyCompiled, Some(table)) => Engine::Table(table),
        _ => Engine::Delegates(delegate_slots(blueprint, &catalog)),
    };
    let create = blueprint
        .constructor()
        .filter(|constructor| policy.admits(constructor.vis()))
        .map(|constructor| constructor.thunk().clone());
    log::trace!(
        "compiled accessor for `{}` under {:?} ({:?})",
        blueprint.type_path(),
        policy,
        strategy,
    );
    TypeAccessor::new(blueprint.ty(), policy, strategy, catalog, engine, create)
}

fn delegate_slots(blueprint: &Blueprint, catalog: &MemberCatalog) -> Box<[DelegateSlot]> {
    catalog
        .members()
        .iter()
        .map(|member| {
            let decl = &blueprint.members()[member.decl_index() as usize];
            match decl.thunks() {
                Some(thunks) => thunk_slot(member, thunks),
                None => match blueprint.table() {
                    Some(table) => {
                        let thunks = ThunkSet::from_table(table, member.decl_index());
                        thunk_slot(member, &thunks)
                    }
                    // A declaration without thunks or table has no dispatch
                    // mechanism at all.
                    None => DelegateSlot::default(),
                },
            }
        })
        .collect()
}

fn thunk_slot(member: &MemberDescriptor, thunks: &ThunkSet) -> DelegateSlot {
    let get = if member.readable() {
        thunks.get.clone()
    } else {
        None
    };
    let set = if member.write_via_backing() {
        thunks.set_backing.clone()
    } else if member.writable() {
        thunks.set.clone()
    } else {
        None
    };
    let get_ref = if member.readable() {
        thunks.get_ref.clone()
    } else {
        None
    };
    // Backing rescue projects the backing slot; table thunks project it
    // inside `get_mut` instead, so fall through when `backing_mut` is empty.
    let get_mut = if member.write_via_backing() {
        thunks.backing_mut.clone().or_else(|| thunks.get_mut.clone())
    } else if member.writable() {
        thunks.get_mut.clone()
    } else {
        None
    };
    DelegateSlot {
        get,
        set,
        get_ref,
        get_mut,
    }
}
