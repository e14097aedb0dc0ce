//! An accessor bound to one instance.
//!
//! [`TypeAccessor`] and [`DynamicAccessor`] are instance-free; every call
//! passes the target in. [`ObjectAccessor`] pairs an accessor with one
//! borrowed target, so call sites that work on a single object do not carry
//! the pair around themselves. It also papers over the typed/dynamic split:
//! both kinds of target answer the same `get`/`set` surface.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use crate::accessor::{AccessError, TypeAccessor};
use crate::catalog::MemberDescriptor;
use crate::describe::{AccessPolicy, Accessible};
use crate::dynamic::{DynamicAccessor, DynamicMembers, RecordValue, dynamic_accessor};
use crate::registry;

enum Target<'a> {
    Typed {
        accessor: Arc<TypeAccessor>,
        instance: &'a mut dyn Any,
    },
    Dynamic {
        accessor: &'static DynamicAccessor,
        instance: &'a mut dyn DynamicMembers,
    },
}

/// Member access for one borrowed instance.
///
/// # Examples
///
/// ```
/// use fieldlens_access::derive::Accessible;
/// use fieldlens_access::{AccessPolicy, ObjectAccessor};
///
/// #[derive(Accessible)]
/// pub struct Valve {
///     pub open: bool,
/// }
///
/// let mut valve = Valve { open: false };
/// let mut access = ObjectAccessor::bind(&mut valve, AccessPolicy::PublicOnly);
///
/// access.set("open", true)?;
/// assert_eq!(access.get("open")?.downcast_ref::<bool>(), Some(&true));
/// # Ok::<(), fieldlens_access::AccessError>(())
/// ```
pub struct ObjectAccessor<'a> {
    target: Target<'a>,
}

impl<'a> ObjectAccessor<'a> {
    /// Binds `instance` to the compiled accessor of its type.
    pub fn bind<T: Accessible>(instance: &'a mut T, policy: AccessPolicy) -> Self {
        Self {
            target: Target::Typed {
                accessor: registry::accessor_of::<T>(policy),
                instance,
            },
        }
    }

    /// Binds an instance whose concrete type is only known at runtime.
    ///
    /// Resolves the accessor through the registry by the instance's
    /// [`TypeId`](core::any::TypeId); returns `None` when no blueprint for
    /// that type has been registered yet.
    pub fn bind_any(instance: &'a mut dyn Any, policy: AccessPolicy) -> Option<Self> {
        let accessor = registry::accessor_by_id((*instance).type_id(), policy)?;
        Some(Self {
            target: Target::Typed { accessor, instance },
        })
    }

    /// Binds a dynamic target to the process-wide [`DynamicAccessor`].
    pub fn bind_dynamic(instance: &'a mut dyn DynamicMembers) -> Self {
        Self {
            target: Target::Dynamic {
                accessor: dynamic_accessor(),
                instance,
            },
        }
    }

    /// Reads the member named `name`, boxed.
    pub fn get(&self, name: &str) -> Result<Box<dyn Any>, AccessError> {
        match &self.target {
            Target::Typed { accessor, instance } => accessor.get(&**instance, name),
            Target::Dynamic { accessor, instance } => {
                accessor.get(&**instance, name).map(|value| value.into_any())
            }
        }
    }

    /// Writes the member named `name`.
    ///
    /// Typed targets require `value` to hold exactly the member's value type;
    /// dynamic targets take any value.
    pub fn set<V: RecordValue>(&mut self, name: &str, value: V) -> Result<(), AccessError> {
        match &mut self.target {
            Target::Typed { accessor, instance } => {
                accessor.set(&mut **instance, name, Box::new(value))
            }
            Target::Dynamic { accessor, instance } => {
                accessor.set_with(&mut **instance, name, value)
            }
        }
    }

    /// Reads the member named `name`, or `None` if there is no such member.
    ///
    /// # Panics
    ///
    /// Panics on non-membership failures, and always for dynamic targets,
    /// which do not support the `try` forms.
    pub fn try_get(&self, name: &str) -> Option<Box<dyn Any>> {
        match &self.target {
            Target::Typed { accessor, instance } => accessor.try_get(&**instance, name),
            Target::Dynamic { accessor, instance } => {
                accessor.try_get(&**instance, name).map(|value| value.into_any())
            }
        }
    }

    /// Writes the member named `name`, reporting whether a write happened.
    ///
    /// # Panics
    ///
    /// Panics on non-membership failures, and always for dynamic targets,
    /// which do not support the `try` forms.
    pub fn try_set<V: RecordValue>(&mut self, name: &str, value: V) -> bool {
        match &mut self.target {
            Target::Typed { accessor, instance } => {
                accessor.try_set(&mut **instance, name, Box::new(value))
            }
            Target::Dynamic { accessor, instance } => {
                accessor.try_set(&mut **instance, name, Box::new(value))
            }
        }
    }

    /// Borrows the place of the member named `name`.
    ///
    /// Dynamic targets store values behind their own indirection and cannot
    /// hand out places; they fail with [`AccessError::NotSupport`].
    pub fn get_ref(&self, name: &str) -> Result<&dyn Any, AccessError> {
        match &self.target {
            Target::Typed { accessor, instance } => accessor.get_ref(&**instance, name),
            Target::Dynamic { instance, .. } => Err(no_places(instance.type_path(), name)),
        }
    }

    /// Mutably borrows the place of the member named `name`.
    ///
    /// Same restrictions as [`get_ref`](Self::get_ref).
    pub fn get_mut(&mut self, name: &str) -> Result<&mut dyn Any, AccessError> {
        match &mut self.target {
            Target::Typed { accessor, instance } => accessor.get_mut(&mut **instance, name),
            Target::Dynamic { instance, .. } => Err(no_places(instance.type_path(), name)),
        }
    }

    /// The member catalog of a typed target, `None` for dynamic targets.
    pub fn members(&self) -> Option<&[MemberDescriptor]> {
        match &self.target {
            Target::Typed { accessor, .. } => Some(accessor.members()),
            Target::Dynamic { .. } => None,
        }
    }

    /// Returns `true` if [`create_new`](Self::create_new) can succeed.
    pub fn create_supported(&self) -> bool {
        match &self.target {
            Target::Typed { accessor, .. } => accessor.create_supported(),
            Target::Dynamic { .. } => false,
        }
    }

    /// Constructs a fresh boxed instance of the bound type.
    pub fn create_new(&self) -> Result<Box<dyn Any>, AccessError> {
        match &self.target {
            Target::Typed { accessor, .. } => accessor.create_new(),
            Target::Dynamic { instance, .. } => Err(AccessError::NotSupport {
                type_path: Cow::Borrowed(instance.type_path()),
                operation: Cow::Borrowed("`create_new`"),
            }),
        }
    }

    /// A display path for the bound target's type.
    pub fn type_path(&self) -> &str {
        match &self.target {
            Target::Typed { accessor, .. } => accessor.type_path(),
            Target::Dynamic { instance, .. } => instance.type_path(),
        }
    }
}

fn no_places(type_path: &'static str, name: &str) -> AccessError {
    AccessError::NotSupport {
        type_path: Cow::Borrowed(type_path),
        operation: Cow::Owned(format!("borrowing member `{name}`")),
    }
}

impl fmt::Debug for ObjectAccessor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.target {
            Target::Typed { .. } => "typed",
            Target::Dynamic { .. } => "dynamic",
        };
        f.debug_struct("ObjectAccessor")
            .field("type_path", &self.type_path())
            .field("kind", &kind)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::{BlueprintBuilder, Vis};
    use crate::dynamic::DynamicRecord;

    struct Probe {
        depth: u32,
        label: String,
    }

    impl Accessible for Probe {
        fn blueprint() -> &'static crate::describe::Blueprint {
            static CELL: crate::describe::BlueprintCell = crate::describe::BlueprintCell::new();
            CELL.get_or_init(|| {
                BlueprintBuilder::<Probe>::new()
                    .field("depth", |p| &p.depth, |p| &mut p.depth)
                    .field("label", |p| &p.label, |p| &mut p.label)
                    .constructor(Vis::Public, || Probe {
                        depth: 0,
                        label: String::new(),
                    })
                    .finish()
            })
        }
    }

    #[test]
    fn typed_targets_read_and_write() {
        let mut probe = Probe {
            depth: 3,
            label: "north".to_owned(),
        };
        let mut access = ObjectAccessor::bind(&mut probe, AccessPolicy::PublicOnly);

        access.set("depth", 9_u32).unwrap();
        assert_eq!(access.get("depth").unwrap().downcast_ref::<u32>(), Some(&9));
        assert_eq!(
            access.get_ref("label").unwrap().downcast_ref::<String>().map(String::as_str),
            Some("north")
        );

        let place = access.get_mut("depth").unwrap();
        *place.downcast_mut::<u32>().unwrap() = 12;
        drop(access);
        assert_eq!(probe.depth, 12);
    }

    #[test]
    fn runtime_bound_targets_resolve_by_type_id() {
        crate::registry::register::<Probe>();

        let mut probe = Probe {
            depth: 1,
            label: String::new(),
        };
        let erased: &mut dyn Any = &mut probe;
        let access = ObjectAccessor::bind_any(erased, AccessPolicy::PublicOnly).unwrap();
        assert_eq!(access.get("depth").unwrap().downcast_ref::<u32>(), Some(&1));

        let mut stray = 5_u8;
        assert!(ObjectAccessor::bind_any(&mut stray, AccessPolicy::PublicOnly).is_none());
    }

    #[test]
    fn dynamic_targets_share_the_surface() {
        let mut record = DynamicRecord::new();
        let mut access = ObjectAccessor::bind_dynamic(&mut record);

        access.set("mode", "auto".to_owned()).unwrap();
        let mode = access.get("mode").unwrap();
        assert_eq!(mode.downcast_ref::<String>().map(String::as_str), Some("auto"));

        let err = access.get_ref("mode").unwrap_err();
        assert_eq!(
            err.to_string(),
            "type `dynamic record` does not support borrowing member `mode`"
        );
        assert!(access.members().is_none());
        assert!(!access.create_supported());
    }

    #[test]
    fn creation_follows_the_bound_accessor() {
        let mut probe = Probe {
            depth: 0,
            label: String::new(),
        };
        let access = ObjectAccessor::bind(&mut probe, AccessPolicy::PublicOnly);
        assert!(access.create_supported());

        let fresh = access.create_new().unwrap();
        let fresh = fresh.downcast::<Probe>().unwrap();
        assert_eq!(fresh.depth, 0);
    }
}
