//! This independent module is used to provide the required paths.
//! So as to minimize changes when the `fieldlens_access` structure is modified.
//!
//! The only special feature is the path of `fieldlens_access` itself,
//! see the [`fieldlens_access`] function doc.

use proc_macro2::TokenStream;
use quote::quote;

// -----------------------------------------------------------------------------
// Crate Path

/// Get the correct access path to the `fieldlens_access` crate.
///
/// Not every crate can reach the access crate under the name `fieldlens_access`,
/// we have to scan the builder's `Cargo.toml`.
///
/// 1. For crates that depend on `fieldlens_access`, `::fieldlens_access` is returned here.
/// 2. For crates that depend on `fieldlens`, `::fieldlens::access` is returned here.
/// 3. For other situations, `::fieldlens_access` is returned here, but this may be incorrect.
///
/// The cost of this function is relatively high (accessing files, obtaining read-write
/// lock permissions, querying content...), so the crate path is mainly obtained through
/// parameter passing rather than reacquiring.
pub(crate) fn fieldlens_access() -> syn::Path {
    fieldlens_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("fieldlens_access"))
}

// -----------------------------------------------------------------------------
// Modules

pub(crate) mod fp;

// -----------------------------------------------------------------------------
// Internal API

#[inline(always)]
pub(crate) fn accessible_(access_path: &syn::Path) -> TokenStream {
    quote! {
        #access_path::Accessible
    }
}

#[inline(always)]
pub(crate) fn blueprint_(access_path: &syn::Path) -> TokenStream {
    quote! {
        #access_path::describe::Blueprint
    }
}

#[inline(always)]
pub(crate) fn blueprint_cell_(access_path: &syn::Path) -> TokenStream {
    quote! {
        #access_path::describe::BlueprintCell
    }
}

#[inline(always)]
pub(crate) fn generic_blueprint_cell_(access_path: &syn::Path) -> TokenStream {
    quote! {
        #access_path::describe::GenericBlueprintCell
    }
}

#[inline(always)]
pub(crate) fn member_decl_(access_path: &syn::Path) -> TokenStream {
    quote! {
        #access_path::describe::MemberDecl
    }
}

#[inline(always)]
pub(crate) fn constructor_(access_path: &syn::Path) -> TokenStream {
    quote! {
        #access_path::describe::Constructor
    }
}

#[inline(always)]
pub(crate) fn dispatch_table_(access_path: &syn::Path) -> TokenStream {
    quote! {
        #access_path::describe::DispatchTable
    }
}

#[inline(always)]
pub(crate) fn table_error_(access_path: &syn::Path) -> TokenStream {
    quote! {
        #access_path::describe::TableError
    }
}

#[inline(always)]
pub(crate) fn vis_(access_path: &syn::Path) -> TokenStream {
    quote! {
        #access_path::describe::Vis
    }
}

#[inline(always)]
pub(crate) fn alloc_(access_path: &syn::Path) -> TokenStream {
    quote! {
        #access_path::__macro_exports::alloc_utils
    }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn auto_register_(access_path: &syn::Path) -> TokenStream {
    quote! {
        #access_path::__macro_exports::auto_register
    }
}
