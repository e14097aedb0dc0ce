//! Emission of the `Accessible` impl and the blueprint expression.

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};

use crate::derive_data::{AccessMember, AccessStruct, PropertyDecl, StructField};
use crate::path::fp::DefaultFP;

use super::get_table_expr;

/// Emits the `Accessible` impl, with the blueprint held in the matching cell
/// kind.
pub(crate) fn impl_trait_accessible(info: &AccessStruct) -> TokenStream {
    let access_path = info.access_path();
    let accessible_ = crate::path::accessible_(access_path);
    let blueprint_ = crate::path::blueprint_(access_path);
    let real_ident = info.ident();
    let (impl_generics, ty_generics, where_clause) = info.split_generics();

    let blueprint_expr = get_blueprint_expr(info);
    let inner_cell_tokens = if info.impl_with_generic() {
        // A function static would be shared across every instantiation.
        let generic_cell = crate::path::generic_blueprint_cell_(access_path);
        quote! {
            static CELL: #generic_cell = #generic_cell::new();
            CELL.get_or_insert::<Self>(|| {
                #blueprint_expr
            })
        }
    } else {
        let cell = crate::path::blueprint_cell_(access_path);
        quote! {
            static CELL: #cell = #cell::new();
            CELL.get_or_init(|| {
                #blueprint_expr
            })
        }
    };

    quote! {
        impl #impl_generics #accessible_ for #real_ident #ty_generics #where_clause {
            fn blueprint() -> &'static #blueprint_ {
                #inner_cell_tokens
            }
        }
    }
}

fn get_blueprint_expr(info: &AccessStruct) -> TokenStream {
    let access_path = info.access_path();
    let blueprint_ = crate::path::blueprint_(access_path);
    let vis_ = crate::path::vis_(access_path);
    let type_vis = info.vis().to_tokens_with(&vis_);

    let init = if info.impl_with_generic() {
        // The stable path machinery has no way to name the applied
        // parameters, so instantiations fall back to `type_name` formatting.
        quote! { #blueprint_::new::<Self>(#type_vis) }
    } else {
        let ident_str = info.ident().to_string();
        quote! {
            #blueprint_::with_path::<Self>(
                ::core::concat!(::core::module_path!(), "::", #ident_str),
                #ident_str,
                #type_vis,
            )
        }
    };

    let member_decls = info.members().map(|member| match member {
        AccessMember::Property(property) => property_decl_expr(info, property),
        AccessMember::Field(field) => field_decl_expr(info, field),
    });
    let table_expr = get_table_expr(info);
    let constructor_tokens = get_constructor_expr(info);

    quote! {
        #init
            .with_members([#(#member_decls,)*])
            .with_table(#table_expr)
            #constructor_tokens
    }
}

fn property_decl_expr(info: &AccessStruct, property: &PropertyDecl) -> TokenStream {
    let access_path = info.access_path();
    let member_decl_ = crate::path::member_decl_(access_path);
    let vis_ = crate::path::vis_(access_path);
    let name = &property.name;
    let ty = &property.ty;

    let mut expr = quote! { #member_decl_::property::<#ty>(#name) };
    if property.borrow.is_some() {
        let get_vis = property.get_vis.to_tokens_with(&vis_);
        expr.extend(quote! { .with_borrow(#get_vis) });
    } else if property.get.is_some() {
        let get_vis = property.get_vis.to_tokens_with(&vis_);
        expr.extend(quote! { .with_get(#get_vis) });
    }
    if property.borrow_mut.is_some() {
        let set_vis = property.set_vis.to_tokens_with(&vis_);
        expr.extend(quote! { .with_borrow_mut(#set_vis) });
    } else if property.set.is_some() {
        let set_vis = property.set_vis.to_tokens_with(&vis_);
        expr.extend(quote! { .with_set(#set_vis) });
    }
    if let Some(backing) = &property.backing {
        let backing_name = member_name(backing);
        expr.extend(quote! { .with_backing(#backing_name) });
    }
    if let Some(hint) = property.ordinal_hint {
        expr.extend(quote! { .with_ordinal_hint(#hint) });
    }
    expr
}

fn field_decl_expr(info: &AccessStruct, field: &StructField) -> TokenStream {
    let access_path = info.access_path();
    let member_decl_ = crate::path::member_decl_(access_path);
    let vis_ = crate::path::vis_(access_path);
    let name = &field.name;
    let ty = &field.ty;
    let field_vis = field.vis.to_tokens_with(&vis_);

    let mut expr = quote! { #member_decl_::field::<#ty>(#name, #field_vis) };
    if field.readonly {
        expr.extend(quote! { .with_readonly() });
    }
    if let Some(hint) = field.ordinal_hint {
        expr.extend(quote! { .with_ordinal_hint(#hint) });
    }
    expr
}

fn member_name(member: &syn::Member) -> String {
    match member {
        syn::Member::Named(ident) => ident.to_string(),
        syn::Member::Unnamed(index) => index.index.to_string(),
    }
}

fn get_constructor_expr(info: &AccessStruct) -> TokenStream {
    let Some(span) = info.attrs().default else {
        return crate::utils::empty();
    };

    let access_path = info.access_path();
    let alloc_ = crate::path::alloc_(access_path);
    let constructor_ = crate::path::constructor_(access_path);
    let vis_ = crate::path::vis_(access_path);
    let type_vis = info.vis().to_tokens_with(&vis_);

    // The spanned quote points missing `Default` impls at the attribute.
    quote_spanned! { span =>
        .with_constructor(#constructor_::new(
            || #alloc_::Box::new(<Self as #DefaultFP>::default()),
            #type_vis,
        ))
    }
}
