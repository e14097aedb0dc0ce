use core::any::TypeId;

use fieldlens_utils::TypeIdMap;
use fieldlens_utils::hash::{FixedHashState, HashMap, HashSet};

use crate::describe::Blueprint;

/// The store behind the process-wide registry: blueprints by `TypeId` plus
/// name indices for by-path and by-ident lookup.
pub(crate) struct BlueprintRegistry {
    blueprints: TypeIdMap<&'static Blueprint>,
    type_path_to_id: HashMap<&'static str, TypeId>,
    type_ident_to_id: HashMap<&'static str, TypeId>,
    ambiguous_idents: HashSet<&'static str>,
}

impl BlueprintRegistry {
    /// Create an empty registry.
    pub(crate) const fn empty() -> Self {
        Self {
            blueprints: TypeIdMap::new(),
            type_path_to_id: HashMap::with_hasher(FixedHashState),
            type_ident_to_id: HashMap::with_hasher(FixedHashState),
            ambiguous_idents: HashSet::with_hasher(FixedHashState),
        }
    }

    // # Validity
    // The type must **not** already exist.
    fn add_new_indices(
        blueprint: &'static Blueprint,
        type_path_to_id: &mut HashMap<&'static str, TypeId>,
        type_ident_to_id: &mut HashMap<&'static str, TypeId>,
        ambiguous_idents: &mut HashSet<&'static str>,
    ) {
        let ty = blueprint.ty();
        let ident = ty.ident();

        // A repeated ident necessarily belongs to a different type here, so
        // the ident stops resolving and both types keep their full path.
        if !ambiguous_idents.contains(ident) {
            if type_ident_to_id.contains_key(ident) {
                type_ident_to_id.remove(ident);
                ambiguous_idents.insert(ident);
            } else {
                type_ident_to_id.insert(ident, ty.id());
            }
        }

        // For a new type, the full path cannot be duplicated.
        type_path_to_id.insert(ty.path(), ty.id());
    }

    /// Registers `blueprint` unless its type already has one.
    ///
    /// Returns `true` if the blueprint was inserted. Re-registering the same
    /// blueprint is a silent no-op; a different blueprint for an already
    /// registered type is kept out and logged.
    pub(crate) fn register(&mut self, blueprint: &'static Blueprint) -> bool {
        if let Some(existing) = self.blueprints.get(&blueprint.type_id()) {
            if !core::ptr::eq(*existing, blueprint) {
                log::warn!(
                    "a different blueprint for `{}` is already registered; keeping the first one",
                    blueprint.type_path(),
                );
            }
            return false;
        }
        Self::add_new_indices(
            blueprint,
            &mut self.type_path_to_id,
            &mut self.type_ident_to_id,
            &mut self.ambiguous_idents,
        );
        self.blueprints.insert(blueprint.type_id(), blueprint);
        true
    }

    #[inline]
    pub(crate) fn get(&self, type_id: TypeId) -> Option<&'static Blueprint> {
        self.blueprints.get(&type_id).copied()
    }

    pub(crate) fn get_by_path(&self, type_path: &str) -> Option<&'static Blueprint> {
        match self.type_path_to_id.get(type_path) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    /// By-ident lookup; ambiguous idents resolve to nothing.
    pub(crate) fn get_by_ident(&self, ident: &str) -> Option<&'static Blueprint> {
        match self.type_ident_to_id.get(ident) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    #[inline]
    pub(crate) fn is_ambiguous(&self, ident: &str) -> bool {
        self.ambiguous_idents.contains(ident)
    }
}
