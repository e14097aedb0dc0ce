//! See the [`Accessible`] derive macro.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static ACCESS_ATTRIBUTE_NAME: &str = "access";

// -----------------------------------------------------------------------------
// Modules

mod derive_data;
mod impls;
mod path;
mod utils;

// -----------------------------------------------------------------------------
// Macros

/// # Member Access Derivation
///
/// `#[derive(Accessible)]` describes a struct for by-name member access and
/// compiles its dispatch table. The generated blueprint lists every member
/// with its declared type and visibility, and the table routes reads, writes
/// and borrows by declaration index without touching strings again.
///
/// ```rust, ignore
/// use fieldlens::access::describe::Accessible;
///
/// #[derive(Accessible)]
/// struct Probe {
///     label: String,
///     value: f64,
/// }
/// ```
///
/// Tuple structs work the same way; their members are named by position
/// (`"0"`, `"1"`, ...).
///
/// ## Field Attributes
///
/// ```rust, ignore
/// #[derive(Accessible)]
/// struct Probe {
///     label: String,
///     #[access(readonly)]
///     serial: u32,
///     #[access(rename = "reading")]
///     value: f64,
///     #[access(skip)]
///     scratch: Vec<u8>,
/// }
/// ```
///
/// - `skip`: the field is no member at all; it never shows up in the
///   blueprint.
/// - `rename = "..."`: the member is exposed under the given name instead of
///   the field name.
/// - `readonly`: the member has no write side. Writes report an unknown
///   member, the same as for a name that never existed.
/// - `ordinal_hint = N`: suggested column position for row-oriented reads.
///
/// ## Properties
///
/// Members may also be routed through accessor methods declared at the type
/// level:
///
/// ```rust, ignore
/// #[derive(Accessible)]
/// #[access(
///     property(name = "level", ty = f32, get = level, set = set_level),
///     property(name = "tag", ty = String, borrow = tag, borrow_mut = tag_mut),
/// )]
/// struct Tank {
///     level_raw: u16,
///     tag: String,
/// }
///
/// impl Tank {
///     fn level(&self) -> f32 {
///         f32::from(self.level_raw) / 100.0
///     }
///     fn set_level(&mut self, level: f32) {
///         self.level_raw = (level * 100.0) as u16;
///     }
///     fn tag(&self) -> &String {
///         &self.tag
///     }
///     fn tag_mut(&mut self) -> &mut String {
///         &mut self.tag
///     }
/// }
/// ```
///
/// `name` and `ty` are required. The remaining keys pick the sides:
///
/// - `get = method`: value reads through `fn(&Self) -> V`.
/// - `set = method`: value writes through `fn(&mut Self, V)`.
/// - `borrow = method`: reference reads through `fn(&Self) -> &V`. Without
///   `get`, value reads clone through this method, which requires `V: Clone`.
/// - `borrow_mut = method`: mutable borrows through `fn(&mut Self) -> &mut V`.
///   Value writes store through it when no `set` is declared.
/// - `backing = "field"`: the field the property stores into. Lets policies
///   that rescue writes through backing fields reach the storage directly.
/// - `get_vis = public | non_public`, `set_vis = ...`: visibility recorded
///   for each side; `public` when omitted.
/// - `ordinal_hint = N`: same as on fields.
///
/// Properties are listed before fields in the blueprint, in declaration
/// order.
///
/// ## Constructor
///
/// `#[access(default)]` attaches a constructor going through the type's
/// [`Default`] impl, so accessors can create instances by type:
///
/// ```rust, ignore
/// #[derive(Accessible, Default)]
/// #[access(default)]
/// struct Probe {
///     value: f64,
/// }
/// ```
///
/// ## Auto Registration
///
/// `#[access(auto_register)]` submits the blueprint for startup collection,
/// so the type can be found by name before any accessor touched it.
///
/// Note: This attribute has no effect on generic types, as there is no way
/// to know which instantiations will exist. It is also a no-op when the
/// `auto_register` feature is disabled.
///
/// ## Generics
///
/// Type and const parameters are supported; each instantiation gets its own
/// blueprint and dispatch table. Lifetime parameters are rejected, because
/// members travel as [`Any`] and that requires `'static`.
///
/// [`Any`]: core::any::Any
#[proc_macro_derive(Accessible, attributes(access))]
pub fn derive_accessible(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    impls::accessible_impls(ast)
}
