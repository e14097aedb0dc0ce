use alloc::boxed::Box;
use core::any::Any;
use core::{error, fmt};

// -----------------------------------------------------------------------------
// DispatchTable

/// Jump-table dispatch functions for one described type.
///
/// A derive invocation emits five free functions, each downcasting the erased
/// instance once and then matching on the dense declaration index, and
/// collects them into a static `DispatchTable`. Because the functions are
/// expanded inside the declaring module they can reach non-public fields and
/// methods; whether a non-public path is actually *used* is decided by the
/// [`AccessPolicy`](super::AccessPolicy) at the accessor layer, never here.
///
/// The declaration index covers every declared member (properties first, then
/// fields) regardless of policy. A compiled accessor maps its dense ordinals
/// onto declaration indices, so admission filtering costs nothing at dispatch
/// time.
pub struct DispatchTable {
    /// Read a member's value, boxed. Field members are read by clone.
    pub get: for<'a> fn(&'a dyn Any, u32) -> Result<Box<dyn Any>, TableError>,
    /// Write a member through its declared write side.
    pub set: for<'a> fn(&'a mut dyn Any, u32, Box<dyn Any>) -> Result<(), TableError>,
    /// Write a member by storing directly into its declared backing field,
    /// bypassing the setter.
    pub set_backing: for<'a> fn(&'a mut dyn Any, u32, Box<dyn Any>) -> Result<(), TableError>,
    /// Borrow a member's place. Computed properties have no place and fail
    /// with [`TableError::NotProjectable`].
    pub get_ref: for<'a> fn(&'a dyn Any, u32) -> Result<&'a dyn Any, TableError>,
    /// Mutably borrow a member's place.
    pub get_mut: for<'a> fn(&'a mut dyn Any, u32) -> Result<&'a mut dyn Any, TableError>,
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("DispatchTable")
    }
}

// -----------------------------------------------------------------------------
// TableError

/// Failure raised from inside dispatch code.
///
/// Dispatch functions and member thunks know nothing about member names or
/// policies; the accessor layer converts these into
/// [`AccessError`](crate::accessor::AccessError) values with full context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// The declaration index is out of range, or the member has no wired
    /// path in the requested direction.
    NoSuchPath,
    /// A write was attempted through a member that only exposes a read-only
    /// reference.
    ReadOnlyRef,
    /// The member computes its value; there is no place to borrow.
    NotProjectable,
    /// The boxed value is not of the member's declared type.
    ValueType { expected: &'static str },
    /// The erased instance is not of the described type.
    InstanceType { expected: &'static str },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchPath => write!(f, "no dispatch path"),
            Self::ReadOnlyRef => write!(f, "member only exposes a read-only reference"),
            Self::NotProjectable => write!(f, "member computes its value and has no place"),
            Self::ValueType { expected } => {
                write!(f, "value is not a `{expected}`")
            }
            Self::InstanceType { expected } => {
                write!(f, "instance is not a `{expected}`")
            }
        }
    }
}

impl error::Error for TableError {}
