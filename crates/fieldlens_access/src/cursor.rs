//! Bulk reads over homogeneous rows.
//!
//! A [`RowCursor`] walks any iterator of `&T` and yields [`Row`]s of boxed
//! member values. Name resolution happens once, when the schema is built;
//! the per-row reads go through ordinals only.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;
use core::iter::FusedIterator;

use crate::accessor::{AccessError, TypeAccessor};
use crate::catalog::MemberDescriptor;
use crate::describe::{AccessPolicy, Accessible};
use crate::registry;

/// The column layout shared by every row of one cursor.
pub struct RowSchema {
    accessor: Arc<TypeAccessor>,
    ordinals: Box<[u32]>,
}

impl RowSchema {
    fn readable(accessor: Arc<TypeAccessor>) -> Self {
        let ordinals = {
            let mut columns: Vec<&MemberDescriptor> =
                accessor.members().iter().filter(|member| member.readable()).collect();
            // Hinted members first, in hint order; the rest keep catalog order.
            columns.sort_by_key(|member| {
                (member.ordinal_hint().is_none(), member.ordinal_hint().unwrap_or(0))
            });
            columns.iter().map(|member| member.ordinal()).collect()
        };
        Self { accessor, ordinals }
    }

    fn select(accessor: &Arc<TypeAccessor>, columns: &[&str]) -> Result<Self, AccessError> {
        let mut ordinals = Vec::with_capacity(columns.len());
        for name in columns {
            let member = accessor
                .member(name)
                .filter(|member| member.readable())
                .ok_or_else(|| AccessError::UnknownMember {
                    type_path: Cow::Borrowed(accessor.type_path()),
                    member: Cow::Owned((*name).to_owned()),
                })?;
            ordinals.push(member.ordinal());
        }
        Ok(Self {
            accessor: Arc::clone(accessor),
            ordinals: ordinals.into_boxed_slice(),
        })
    }

    /// Number of columns.
    #[inline]
    pub fn column_len(&self) -> usize {
        self.ordinals.len()
    }

    /// Returns the descriptor of the column at `index`.
    pub fn column(&self, index: usize) -> Option<&MemberDescriptor> {
        self.ordinals.get(index).and_then(|&ordinal| self.accessor.member_at(ordinal))
    }

    /// Returns the position of the column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.ordinals.iter().position(|&ordinal| {
            self.accessor.member_at(ordinal).is_some_and(|member| member.name() == name)
        })
    }

    /// The accessor the schema reads through.
    #[inline]
    pub fn accessor(&self) -> &TypeAccessor {
        &self.accessor
    }
}

impl fmt::Debug for RowSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for index in 0..self.column_len() {
            if let Some(member) = self.column(index) {
                list.entry(&member.name());
            }
        }
        list.finish()
    }
}

/// One row of boxed member values, in schema order.
pub struct Row {
    schema: Arc<RowSchema>,
    values: Box<[Box<dyn Any>]>,
}

impl Row {
    /// Number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the row has no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the value at `index`.
    pub fn get(&self, index: usize) -> Option<&dyn Any> {
        self.values.get(index).map(|value| &**value)
    }

    /// Returns the value of the column named `name`.
    pub fn get_named(&self, name: &str) -> Option<&dyn Any> {
        self.get(self.schema.column_index(name)?)
    }

    /// Returns the value at `index` downcast to `V`.
    pub fn get_as<V: Any>(&self, index: usize) -> Option<&V> {
        self.get(index)?.downcast_ref::<V>()
    }

    /// Returns the descriptor of the column at `index`.
    pub fn column(&self, index: usize) -> Option<&MemberDescriptor> {
        self.schema.column(index)
    }

    /// The schema the row was read under.
    #[inline]
    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row").field("schema", &self.schema).finish_non_exhaustive()
    }
}

/// An iterator adapter reading member values row by row.
///
/// # Panics
///
/// Iteration panics when a column read fails. Schema columns are always
/// readable, so this only happens for blueprints whose declarations carry no
/// dispatch mechanism.
///
/// # Examples
///
/// ```
/// use fieldlens_access::derive::Accessible;
/// use fieldlens_access::{AccessPolicy, RowCursor};
///
/// #[derive(Accessible)]
/// pub struct Sample {
///     pub label: String,
///     pub value: f64,
/// }
///
/// let samples = vec![
///     Sample { label: "a".into(), value: 0.5 },
///     Sample { label: "b".into(), value: 1.5 },
/// ];
///
/// let cursor = RowCursor::over(&samples, AccessPolicy::PublicOnly)
///     .with_columns(&["value"])?;
/// let total: f64 = cursor.filter_map(|row| row.get_as::<f64>(0).copied()).sum();
/// assert_eq!(total, 2.0);
/// # Ok::<(), fieldlens_access::AccessError>(())
/// ```
pub struct RowCursor<I> {
    schema: Arc<RowSchema>,
    rows: I,
}

impl<I> RowCursor<I> {
    /// Builds a cursor over `rows` with every readable member as a column.
    ///
    /// Members carrying an ordinal hint come first, in hint order.
    pub fn over<'a, T>(rows: impl IntoIterator<IntoIter = I>, policy: AccessPolicy) -> Self
    where
        T: Accessible,
        I: Iterator<Item = &'a T>,
    {
        Self {
            schema: Arc::new(RowSchema::readable(registry::accessor_of::<T>(policy))),
            rows: rows.into_iter(),
        }
    }

    /// Restricts the cursor to the named columns, in the given order.
    ///
    /// Fails with [`AccessError::UnknownMember`] when a name does not resolve
    /// to a readable member.
    pub fn with_columns(mut self, columns: &[&str]) -> Result<Self, AccessError> {
        self.schema = Arc::new(RowSchema::select(&self.schema.accessor, columns)?);
        Ok(self)
    }

    /// The schema rows will be read under.
    #[inline]
    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }
}

impl<'a, T, I> Iterator for RowCursor<I>
where
    T: Accessible,
    I: Iterator<Item = &'a T>,
{
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let instance = self.rows.next()?;
        let values = self
            .schema
            .ordinals
            .iter()
            .map(|&ordinal| {
                // Schema columns are pre-checked readable; failing here takes
                // a blueprint declaration with no dispatch mechanism at all.
                self.schema
                    .accessor
                    .get_at(instance, ordinal)
                    .unwrap_or_else(|error| panic!("{error}"))
            })
            .collect();
        Some(Row {
            schema: Arc::clone(&self.schema),
            values,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<'a, T, I> ExactSizeIterator for RowCursor<I>
where
    T: Accessible,
    I: ExactSizeIterator<Item = &'a T>,
{
}

impl<'a, T, I> FusedIterator for RowCursor<I>
where
    T: Accessible,
    I: FusedIterator<Item = &'a T>,
{
}

impl<I> fmt::Debug for RowCursor<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowCursor").field("schema", &self.schema).finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::{BlueprintBuilder, BlueprintCell, Vis};

    struct Reading {
        note: String,
        id: u32,
        celsius: f64,
    }

    impl Accessible for Reading {
        fn blueprint() -> &'static crate::describe::Blueprint {
            static CELL: BlueprintCell = BlueprintCell::new();
            CELL.get_or_init(|| {
                BlueprintBuilder::<Reading>::new()
                    .field("note", |r| &r.note, |r| &mut r.note)
                    .field("id", |r| &r.id, |r| &mut r.id)
                    .ordinal_hint(0)
                    .field("celsius", |r| &r.celsius, |r| &mut r.celsius)
                    .ordinal_hint(1)
                    .constructor(Vis::Public, || Reading {
                        note: String::new(),
                        id: 0,
                        celsius: 0.0,
                    })
                    .finish()
            })
        }
    }

    fn readings() -> Vec<Reading> {
        vec![
            Reading { note: "calm".to_owned(), id: 1, celsius: 20.5 },
            Reading { note: "windy".to_owned(), id: 2, celsius: 18.0 },
            Reading { note: "storm".to_owned(), id: 3, celsius: 11.25 },
        ]
    }

    #[test]
    fn hinted_members_lead_the_default_schema() {
        let rows = readings();
        let cursor = RowCursor::over(&rows, AccessPolicy::PublicOnly);

        let schema = cursor.schema();
        assert_eq!(schema.column_len(), 3);
        assert_eq!(schema.column(0).map(|m| m.name()), Some("id"));
        assert_eq!(schema.column(1).map(|m| m.name()), Some("celsius"));
        assert_eq!(schema.column(2).map(|m| m.name()), Some("note"));
    }

    #[test]
    fn rows_carry_values_in_schema_order() {
        let rows = readings();
        let cursor = RowCursor::over(&rows, AccessPolicy::PublicOnly)
            .with_columns(&["celsius", "id"])
            .unwrap();
        assert_eq!(cursor.len(), 3);

        let collected: Vec<Row> = cursor.collect();
        assert_eq!(collected[0].get_as::<f64>(0), Some(&20.5));
        assert_eq!(collected[0].get_as::<u32>(1), Some(&1));
        assert_eq!(collected[2].get_named("celsius").and_then(|v| v.downcast_ref::<f64>()), Some(&11.25));
        assert_eq!(collected[1].column(1).map(|m| m.name()), Some("id"));
        assert!(collected[0].get(2).is_none());
    }

    #[test]
    fn unknown_columns_fail_at_selection_time() {
        let rows = readings();
        let err = RowCursor::over(&rows, AccessPolicy::PublicOnly)
            .with_columns(&["id", "fahrenheit"])
            .unwrap_err();
        assert!(matches!(err, AccessError::UnknownMember { .. }));
    }
}
