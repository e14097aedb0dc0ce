use crate::describe::{AccessPolicy, Blueprint, Vis};

/// How a compiled accessor dispatches member access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Every operation runs through the type's static dispatch table.
    FullyCompiled,
    /// Every operation runs through per-member delegates.
    DelegateBased,
}

/// Picks the dispatch strategy for a blueprint under a policy.
///
/// Builder blueprints have no table and always run on delegates. Derive
/// blueprints are demoted when the type itself is not public, or when the
/// policy admits non-public sides and a member declares its two sides with
/// different visibility; such members need per-side gating that the shared
/// table cannot express.
pub(crate) fn classify(blueprint: &Blueprint, policy: AccessPolicy) -> Strategy {
    if blueprint.table().is_none() {
        return Strategy::DelegateBased;
    }
    if blueprint.vis() != Vis::Public {
        log::debug!(
            "accessor for `{}` falls back to delegates: the type itself is not public",
            blueprint.type_path(),
        );
        return Strategy::DelegateBased;
    }
    if policy == AccessPolicy::AllowNonPublic && has_split_visibility(blueprint) {
        log::debug!(
            "accessor for `{}` falls back to delegates: members mix public and non-public sides",
            blueprint.type_path(),
        );
        return Strategy::DelegateBased;
    }
    Strategy::FullyCompiled
}

fn has_split_visibility(blueprint: &Blueprint) -> bool {
    blueprint.members().iter().any(|decl| {
        matches!(
            (decl.get_vis(), decl.set_vis()),
            (Some(get), Some(set)) if get != set
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::BlueprintBuilder;

    struct Point {
        x: f32,
    }

    #[test]
    fn builder_blueprints_use_delegates() {
        let blueprint = BlueprintBuilder::<Point>::new()
            .field("x", |p| &p.x, |p| &mut p.x)
            .finish();
        assert_eq!(
            classify(&blueprint, AccessPolicy::PublicOnly),
            Strategy::DelegateBased
        );
        assert_eq!(
            classify(&blueprint, AccessPolicy::AllowNonPublic),
            Strategy::DelegateBased
        );
    }
}
