//! Inventory-backed automatic blueprint registration.
//!
//! The derive submits one [`BlueprintEntry`] per type annotated with
//! `#[access(auto_register)]`; the registry drains the collected entries the
//! first time a by-name or by-path lookup runs.

use crate::describe::Blueprint;

/// One automatically registered blueprint source.
pub struct BlueprintEntry(pub fn() -> &'static Blueprint);

impl BlueprintEntry {
    #[inline]
    pub(crate) fn blueprint(&self) -> &'static Blueprint {
        (self.0)()
    }
}

inventory::collect!(BlueprintEntry);
