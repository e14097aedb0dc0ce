//! Emission of the generated items.

// -----------------------------------------------------------------------------
// Modules

mod accessible;
mod auto_register;
mod blueprint;
mod table;

// -----------------------------------------------------------------------------
// Internal API

pub(crate) use accessible::accessible_impls;

use auto_register::get_auto_register_impl;
use blueprint::impl_trait_accessible;
use table::{get_table_expr, get_table_fns_impl};
