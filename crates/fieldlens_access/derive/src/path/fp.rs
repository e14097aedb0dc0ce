//! Fully qualified paths for standard items the generated code relies on.
//!
//! Each `{Name}FP` unit struct renders as the absolute path of the item, so
//! the output stays correct even when the deriving crate shadows `Option`,
//! `Clone` and friends with its own definitions.

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};

/// `::core::any::Any`
pub(crate) struct AnyFP;

impl ToTokens for AnyFP {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(quote! { ::core::any::Any });
    }
}

/// `::core::clone::Clone`
pub(crate) struct CloneFP;

impl ToTokens for CloneFP {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(quote! { ::core::clone::Clone });
    }
}

/// `::core::default::Default`
pub(crate) struct DefaultFP;

impl ToTokens for DefaultFP {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(quote! { ::core::default::Default });
    }
}

/// `::core::result::Result`
pub(crate) struct ResultFP;

impl ToTokens for ResultFP {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(quote! { ::core::result::Result });
    }
}
