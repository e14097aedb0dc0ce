//! Emission of the dispatch table and its five member functions.
//!
//! The functions are free items inside the `const _` block. Each one
//! downcasts the erased instance, then matches on the declaration index;
//! members without the requested side fall through to `NoSuchPath`.

use proc_macro2::{Literal, TokenStream};
use quote::quote;

use crate::derive_data::{AccessMember, AccessStruct};
use crate::path::fp::{AnyFP, CloneFP, ResultFP};

// -----------------------------------------------------------------------------
// Arm collection

/// What one member contributes to one table function.
enum Arm {
    /// The member has this side; the body touches the downcast instance.
    Dispatch(TokenStream),
    /// The member exists but refuses this side with a dedicated error.
    Refuse(TokenStream),
    /// No arm; the catch-all reports `NoSuchPath`.
    Absent,
}

struct TableFn {
    arms: Vec<TokenStream>,
    /// Whether any arm needs the downcast preamble.
    dispatches: bool,
}

fn collect(info: &AccessStruct, arm_of: fn(&AccessStruct, AccessMember<'_>) -> Arm) -> TableFn {
    let mut table_fn = TableFn { arms: Vec::new(), dispatches: false };
    for (decl, member) in info.members().enumerate() {
        let decl = Literal::u32_unsuffixed(decl as u32);
        let body = match arm_of(info, member) {
            Arm::Dispatch(body) => {
                table_fn.dispatches = true;
                body
            }
            Arm::Refuse(body) => body,
            Arm::Absent => continue,
        };
        table_fn.arms.push(quote! { #decl => #body, });
    }
    table_fn
}

fn decl_match(info: &AccessStruct, table_fn: &TableFn) -> TokenStream {
    let table_error_ = crate::path::table_error_(info.access_path());
    let arms = &table_fn.arms;
    quote! {
        match decl {
            #(#arms)*
            _ => #ResultFP::Err(#table_error_::NoSuchPath),
        }
    }
}

// -----------------------------------------------------------------------------
// Per-member arms

fn get_arm(info: &AccessStruct, member: AccessMember<'_>) -> Arm {
    let alloc_ = crate::path::alloc_(info.access_path());
    let call_path = info.call_path();

    match member {
        AccessMember::Property(property) => {
            if let Some(get) = &property.get {
                Arm::Dispatch(quote! {
                    #ResultFP::Ok(#alloc_::Box::new(#call_path::#get(instance)))
                })
            } else if let Some(borrow) = &property.borrow {
                Arm::Dispatch(quote! {
                    #ResultFP::Ok(#alloc_::Box::new(#CloneFP::clone(#call_path::#borrow(instance))))
                })
            } else {
                Arm::Absent
            }
        }
        AccessMember::Field(field) => {
            let member = &field.member;
            Arm::Dispatch(quote! {
                #ResultFP::Ok(#alloc_::Box::new(#CloneFP::clone(&instance.#member)))
            })
        }
    }
}

fn set_arm(info: &AccessStruct, member: AccessMember<'_>) -> Arm {
    let table_error_ = crate::path::table_error_(info.access_path());
    let call_path = info.call_path();

    match member {
        AccessMember::Property(property) => {
            if let Some(set) = &property.set {
                Arm::Dispatch(store_value(
                    info,
                    &property.ty,
                    quote! { #call_path::#set(instance, value); },
                ))
            } else if let Some(borrow_mut) = &property.borrow_mut {
                Arm::Dispatch(store_value(
                    info,
                    &property.ty,
                    quote! { *#call_path::#borrow_mut(instance) = value; },
                ))
            } else if property.borrow.is_some() {
                Arm::Refuse(quote! { #ResultFP::Err(#table_error_::ReadOnlyRef) })
            } else {
                Arm::Absent
            }
        }
        AccessMember::Field(field) => {
            if field.readonly {
                Arm::Absent
            } else {
                let member = &field.member;
                Arm::Dispatch(store_value(info, &field.ty, quote! { instance.#member = value; }))
            }
        }
    }
}

fn set_backing_arm(info: &AccessStruct, member: AccessMember<'_>) -> Arm {
    match member {
        AccessMember::Property(property) => match &property.backing {
            Some(backing) => Arm::Dispatch(store_value(
                info,
                &property.ty,
                quote! { instance.#backing = value; },
            )),
            None => Arm::Absent,
        },
        AccessMember::Field(_) => Arm::Absent,
    }
}

fn get_ref_arm(info: &AccessStruct, member: AccessMember<'_>) -> Arm {
    let table_error_ = crate::path::table_error_(info.access_path());
    let call_path = info.call_path();

    match member {
        AccessMember::Property(property) => {
            if let Some(borrow) = &property.borrow {
                Arm::Dispatch(quote! { #ResultFP::Ok(#call_path::#borrow(instance)) })
            } else if property.get.is_some() {
                // Computed values have no place to borrow from.
                Arm::Refuse(quote! { #ResultFP::Err(#table_error_::NotProjectable) })
            } else {
                Arm::Absent
            }
        }
        AccessMember::Field(field) => {
            let member = &field.member;
            Arm::Dispatch(quote! { #ResultFP::Ok(&instance.#member) })
        }
    }
}

fn get_mut_arm(info: &AccessStruct, member: AccessMember<'_>) -> Arm {
    let table_error_ = crate::path::table_error_(info.access_path());
    let call_path = info.call_path();

    match member {
        AccessMember::Property(property) => {
            if let Some(borrow_mut) = &property.borrow_mut {
                Arm::Dispatch(quote! { #ResultFP::Ok(#call_path::#borrow_mut(instance)) })
            } else if let Some(backing) = &property.backing {
                // Writes rescued through the backing field project the same
                // storage here.
                Arm::Dispatch(quote! { #ResultFP::Ok(&mut instance.#backing) })
            } else if property.borrow.is_some() && property.set.is_none() {
                Arm::Refuse(quote! { #ResultFP::Err(#table_error_::ReadOnlyRef) })
            } else {
                Arm::Refuse(quote! { #ResultFP::Err(#table_error_::NotProjectable) })
            }
        }
        AccessMember::Field(field) => {
            if field.readonly {
                Arm::Absent
            } else {
                let member = &field.member;
                Arm::Dispatch(quote! { #ResultFP::Ok(&mut instance.#member) })
            }
        }
    }
}

/// Downcasts the boxed value to `ty`, runs `store` with it bound to `value`,
/// and reports `Ok`.
fn store_value(info: &AccessStruct, ty: &syn::Type, store: TokenStream) -> TokenStream {
    let table_error_ = crate::path::table_error_(info.access_path());
    quote! {
        {
            let value = *value.downcast::<#ty>().map_err(|_| #table_error_::ValueType {
                expected: ::core::any::type_name::<#ty>(),
            })?;
            #store
            #ResultFP::Ok(())
        }
    }
}

// -----------------------------------------------------------------------------
// Function emission

fn downcast_ref_stmt(info: &AccessStruct) -> TokenStream {
    let table_error_ = crate::path::table_error_(info.access_path());
    let self_ty = info.self_ty();
    quote! {
        let instance = instance
            .downcast_ref::<#self_ty>()
            .ok_or(#table_error_::InstanceType {
                expected: ::core::any::type_name::<#self_ty>(),
            })?;
    }
}

fn downcast_mut_stmt(info: &AccessStruct) -> TokenStream {
    let table_error_ = crate::path::table_error_(info.access_path());
    let self_ty = info.self_ty();
    quote! {
        let instance = instance
            .downcast_mut::<#self_ty>()
            .ok_or(#table_error_::InstanceType {
                expected: ::core::any::type_name::<#self_ty>(),
            })?;
    }
}

fn emit_get(info: &AccessStruct) -> TokenStream {
    let access_path = info.access_path();
    let alloc_ = crate::path::alloc_(access_path);
    let table_error_ = crate::path::table_error_(access_path);
    let fn_generics = info.table_fn_generics();
    let where_clause = info.table_fn_where_clause();

    let table_fn = collect(info, get_arm);
    if table_fn.arms.is_empty() {
        return quote! {
            fn __get #fn_generics (
                _instance: &dyn #AnyFP,
                _decl: u32,
            ) -> #ResultFP<#alloc_::Box<dyn #AnyFP>, #table_error_> #where_clause {
                #ResultFP::Err(#table_error_::NoSuchPath)
            }
        };
    }

    let downcast = table_fn.dispatches.then(|| downcast_ref_stmt(info));
    let instance = param_name(table_fn.dispatches);
    let arm_match = decl_match(info, &table_fn);
    quote! {
        fn __get #fn_generics (
            #instance: &dyn #AnyFP,
            decl: u32,
        ) -> #ResultFP<#alloc_::Box<dyn #AnyFP>, #table_error_> #where_clause {
            #downcast
            #arm_match
        }
    }
}

fn emit_set(info: &AccessStruct) -> TokenStream {
    let access_path = info.access_path();
    let alloc_ = crate::path::alloc_(access_path);
    let table_error_ = crate::path::table_error_(access_path);
    let fn_generics = info.table_fn_generics();
    let where_clause = info.table_fn_where_clause();

    let table_fn = collect(info, set_arm);
    if table_fn.arms.is_empty() {
        return quote! {
            fn __set #fn_generics (
                _instance: &mut dyn #AnyFP,
                _decl: u32,
                _value: #alloc_::Box<dyn #AnyFP>,
            ) -> #ResultFP<(), #table_error_> #where_clause {
                #ResultFP::Err(#table_error_::NoSuchPath)
            }
        };
    }

    let downcast = table_fn.dispatches.then(|| downcast_mut_stmt(info));
    let instance = param_name(table_fn.dispatches);
    let value = value_param_name(table_fn.dispatches);
    let arm_match = decl_match(info, &table_fn);
    quote! {
        fn __set #fn_generics (
            #instance: &mut dyn #AnyFP,
            decl: u32,
            #value: #alloc_::Box<dyn #AnyFP>,
        ) -> #ResultFP<(), #table_error_> #where_clause {
            #downcast
            #arm_match
        }
    }
}

fn emit_set_backing(info: &AccessStruct) -> TokenStream {
    let access_path = info.access_path();
    let alloc_ = crate::path::alloc_(access_path);
    let table_error_ = crate::path::table_error_(access_path);
    let fn_generics = info.table_fn_generics();
    let where_clause = info.table_fn_where_clause();

    let table_fn = collect(info, set_backing_arm);
    if table_fn.arms.is_empty() {
        return quote! {
            fn __set_backing #fn_generics (
                _instance: &mut dyn #AnyFP,
                _decl: u32,
                _value: #alloc_::Box<dyn #AnyFP>,
            ) -> #ResultFP<(), #table_error_> #where_clause {
                #ResultFP::Err(#table_error_::NoSuchPath)
            }
        };
    }

    let downcast = table_fn.dispatches.then(|| downcast_mut_stmt(info));
    let instance = param_name(table_fn.dispatches);
    let value = value_param_name(table_fn.dispatches);
    let arm_match = decl_match(info, &table_fn);
    quote! {
        fn __set_backing #fn_generics (
            #instance: &mut dyn #AnyFP,
            decl: u32,
            #value: #alloc_::Box<dyn #AnyFP>,
        ) -> #ResultFP<(), #table_error_> #where_clause {
            #downcast
            #arm_match
        }
    }
}

fn emit_get_ref(info: &AccessStruct) -> TokenStream {
    let table_error_ = crate::path::table_error_(info.access_path());
    let fn_generics = info.table_fn_generics();
    let where_clause = info.table_fn_where_clause();

    let table_fn = collect(info, get_ref_arm);
    if table_fn.arms.is_empty() {
        return quote! {
            fn __get_ref #fn_generics (
                _instance: &dyn #AnyFP,
                _decl: u32,
            ) -> #ResultFP<&dyn #AnyFP, #table_error_> #where_clause {
                #ResultFP::Err(#table_error_::NoSuchPath)
            }
        };
    }

    let downcast = table_fn.dispatches.then(|| downcast_ref_stmt(info));
    let instance = param_name(table_fn.dispatches);
    let arm_match = decl_match(info, &table_fn);
    quote! {
        fn __get_ref #fn_generics (
            #instance: &dyn #AnyFP,
            decl: u32,
        ) -> #ResultFP<&dyn #AnyFP, #table_error_> #where_clause {
            #downcast
            #arm_match
        }
    }
}

fn emit_get_mut(info: &AccessStruct) -> TokenStream {
    let table_error_ = crate::path::table_error_(info.access_path());
    let fn_generics = info.table_fn_generics();
    let where_clause = info.table_fn_where_clause();

    let table_fn = collect(info, get_mut_arm);
    if table_fn.arms.is_empty() {
        return quote! {
            fn __get_mut #fn_generics (
                _instance: &mut dyn #AnyFP,
                _decl: u32,
            ) -> #ResultFP<&mut dyn #AnyFP, #table_error_> #where_clause {
                #ResultFP::Err(#table_error_::NoSuchPath)
            }
        };
    }

    let downcast = table_fn.dispatches.then(|| downcast_mut_stmt(info));
    let instance = param_name(table_fn.dispatches);
    let arm_match = decl_match(info, &table_fn);
    quote! {
        fn __get_mut #fn_generics (
            #instance: &mut dyn #AnyFP,
            decl: u32,
        ) -> #ResultFP<&mut dyn #AnyFP, #table_error_> #where_clause {
            #downcast
            #arm_match
        }
    }
}

fn param_name(dispatches: bool) -> TokenStream {
    if dispatches { quote! { instance } } else { quote! { _instance } }
}

fn value_param_name(dispatches: bool) -> TokenStream {
    if dispatches { quote! { value } } else { quote! { _value } }
}

// -----------------------------------------------------------------------------
// Assembly

/// The five table functions, plus the static table for non-generic types.
pub(crate) fn get_table_fns_impl(info: &AccessStruct) -> TokenStream {
    let emit_get_tokens = emit_get(info);
    let emit_set_tokens = emit_set(info);
    let emit_set_backing_tokens = emit_set_backing(info);
    let emit_get_ref_tokens = emit_get_ref(info);
    let emit_get_mut_tokens = emit_get_mut(info);
    let table_static_tokens = get_table_static(info);

    quote! {
        #emit_get_tokens
        #emit_set_tokens
        #emit_set_backing_tokens
        #emit_get_ref_tokens
        #emit_get_mut_tokens
        #table_static_tokens
    }
}

fn get_table_static(info: &AccessStruct) -> TokenStream {
    if info.impl_with_generic() {
        return crate::utils::empty();
    }
    let dispatch_table_ = crate::path::dispatch_table_(info.access_path());
    quote! {
        static __TABLE: #dispatch_table_ = #dispatch_table_ {
            get: __get,
            set: __set,
            set_backing: __set_backing,
            get_ref: __get_ref,
            get_mut: __get_mut,
        };
    }
}

/// Expression producing `&'static DispatchTable`.
///
/// Generic types get one leaked table per instantiation; function statics
/// would be shared across all of them.
pub(crate) fn get_table_expr(info: &AccessStruct) -> TokenStream {
    if !info.impl_with_generic() {
        return quote! { &__TABLE };
    }

    let access_path = info.access_path();
    let alloc_ = crate::path::alloc_(access_path);
    let dispatch_table_ = crate::path::dispatch_table_(access_path);
    let turbofish = info.table_fn_turbofish();
    quote! {
        #alloc_::Box::leak(#alloc_::Box::new(#dispatch_table_ {
            get: __get #turbofish,
            set: __set #turbofish,
            set_backing: __set_backing #turbofish,
            get_ref: __get_ref #turbofish,
            get_mut: __get_mut #turbofish,
        }))
    }
}
