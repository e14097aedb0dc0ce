use alloc::borrow::Cow;
use core::{error, fmt};

/// An enumeration of all error outcomes of by-name member access.
#[derive(Debug)]
pub enum AccessError {
    /// The target type has no member of that name under the active policy.
    UnknownMember {
        type_path: Cow<'static, str>,
        member: Cow<'static, str>,
    },
    /// The target type cannot perform the requested operation at all.
    NotSupport {
        type_path: Cow<'static, str>,
        operation: Cow<'static, str>,
    },
    /// The written value has a different type than the member.
    MismatchedValueType {
        member: Cow<'static, str>,
        expected: Cow<'static, str>,
    },
    /// The passed instance is not the type the accessor was compiled for.
    MismatchedInstanceType { expected: Cow<'static, str> },
    /// Attempted to write a member that only exposes a read-only reference.
    ReadOnlyReference { member: Cow<'static, str> },
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMember { type_path, member } => {
                write!(f, "type `{type_path}` has no accessible member `{member}`")
            }
            Self::NotSupport {
                type_path,
                operation,
            } => {
                write!(f, "type `{type_path}` does not support {operation}")
            }
            Self::MismatchedValueType { member, expected } => {
                write!(
                    f,
                    "value written to member `{member}` is not a `{expected}`"
                )
            }
            Self::MismatchedInstanceType { expected } => {
                write!(f, "target instance is not a `{expected}`")
            }
            Self::ReadOnlyReference { member } => {
                write!(f, "member `{member}` only exposes a read-only reference")
            }
        }
    }
}

impl error::Error for AccessError {}
