//! Emission of the startup registration entry.

use proc_macro2::TokenStream;

use crate::derive_data::AccessStruct;

/// Emits the inventory submission for `#[access(auto_register)]`.
#[cfg(feature = "auto_register")]
pub(crate) fn get_auto_register_impl(info: &AccessStruct) -> TokenStream {
    use quote::quote_spanned;

    let Some(span) = info.attrs().auto_register else {
        return crate::utils::empty();
    };

    // Invalid for generic types; which instantiations exist is not known
    // ahead of time.
    if info.impl_with_generic() {
        return crate::utils::empty();
    }

    let access_path = info.access_path();
    let accessible_ = crate::path::accessible_(access_path);
    let auto_register_ = crate::path::auto_register_(access_path);
    let real_ident = info.ident();

    quote_spanned! { span =>
        #auto_register_::inventory::submit! {
            #auto_register_::BlueprintEntry(<#real_ident as #accessible_>::blueprint)
        }
    }
}

/// The attribute is a no-op when the `auto_register` feature is disabled, so
/// deriving crates do not have to mirror the feature in their own code.
#[cfg(not(feature = "auto_register"))]
pub(crate) fn get_auto_register_impl(_info: &AccessStruct) -> TokenStream {
    crate::utils::empty()
}
