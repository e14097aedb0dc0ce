use proc_macro::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::derive_data::AccessStruct;

/// Provided for `#[derive(Accessible)]`.
pub(crate) fn accessible_impls(ast: DeriveInput) -> TokenStream {
    // Parse type kind, attribute and field information.
    let info = match AccessStruct::from_input(&ast) {
        Ok(val) => val,
        Err(err) => return err.into_compile_error().into(),
    };

    let table_tokens = super::get_table_fns_impl(&info);
    let accessible_trait_tokens = super::impl_trait_accessible(&info);
    let auto_register_tokens = super::get_auto_register_impl(&info);

    TokenStream::from(quote! {
        const _: () = {
            #table_tokens

            #accessible_trait_tokens

            #auto_register_tokens
        };
    })
}
