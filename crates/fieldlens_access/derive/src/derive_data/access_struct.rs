use proc_macro2::{TokenStream, TokenTree};
use quote::{ToTokens, quote};
use syn::{DeriveInput, Generics, Ident};

use crate::path::fp::{AnyFP, CloneFP, DefaultFP};

use super::{FieldAttributes, PropertyDecl, TypeAttributes};

// -----------------------------------------------------------------------------
// Visibility

/// Declared visibility as the derive records it.
///
/// Everything that is not plain `pub` (`pub(crate)`, `pub(super)`, private)
/// counts as non-public.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclVis {
    Public,
    NonPublic,
}

impl DeclVis {
    pub(crate) fn from_syn(vis: &syn::Visibility) -> Self {
        match vis {
            syn::Visibility::Public(_) => Self::Public,
            _ => Self::NonPublic,
        }
    }

    /// Renders the matching variant, given the path of the visibility type.
    pub(crate) fn to_tokens_with(self, vis_: &TokenStream) -> TokenStream {
        match self {
            Self::Public => quote! { #vis_::Public },
            Self::NonPublic => quote! { #vis_::NonPublic },
        }
    }
}

// -----------------------------------------------------------------------------
// Members

/// One field taking part in member access.
pub(crate) struct StructField {
    /// How the field is reached on an instance, by name or by position.
    pub(crate) member: syn::Member,
    /// The exposed member name.
    pub(crate) name: String,
    pub(crate) ty: syn::Type,
    pub(crate) vis: DeclVis,
    pub(crate) readonly: bool,
    pub(crate) ordinal_hint: Option<u32>,
}

/// One declared member. Properties come before fields.
pub(crate) enum AccessMember<'a> {
    Property(&'a PropertyDecl),
    Field(&'a StructField),
}

// -----------------------------------------------------------------------------
// AccessStruct

/// Everything the derive knows about the deriving struct.
pub(crate) struct AccessStruct {
    ident: Ident,
    generics: Generics,
    vis: DeclVis,
    attrs: TypeAttributes,
    fields: Vec<StructField>,
    /// Resolved once up front; manifest scans are comparatively expensive.
    access_path: syn::Path,
}

impl AccessStruct {
    /// Parses type kind, attributes and field information.
    pub(crate) fn from_input(ast: &DeriveInput) -> syn::Result<Self> {
        let syn::Data::Struct(data) = &ast.data else {
            return Err(syn::Error::new_spanned(
                &ast.ident,
                "`Accessible` can only be derived for structs",
            ));
        };

        if let Some(lifetime) = ast.generics.lifetimes().next() {
            return Err(syn::Error::new_spanned(
                lifetime,
                "`Accessible` cannot be derived for types with lifetime parameters; members \
                 travel as `Any`, which requires `'static`",
            ));
        }

        let attrs = TypeAttributes::parse_attrs(&ast.attrs)?;

        let mut fields = Vec::new();
        for (index, field) in data.fields.iter().enumerate() {
            let field_attrs = FieldAttributes::parse_attrs(&field.attrs)?;
            if field_attrs.skip.is_some() {
                continue;
            }
            let member = match &field.ident {
                Some(ident) => syn::Member::Named(ident.clone()),
                None => syn::Member::Unnamed(syn::Index::from(index)),
            };
            let name = match (&field_attrs.rename, &field.ident) {
                (Some(rename), _) => rename.value(),
                (None, Some(ident)) => ident.to_string(),
                (None, None) => index.to_string(),
            };
            fields.push(StructField {
                member,
                name,
                ty: field.ty.clone(),
                vis: DeclVis::from_syn(&field.vis),
                readonly: field_attrs.readonly.is_some(),
                ordinal_hint: field_attrs.ordinal_hint,
            });
        }

        Ok(Self {
            ident: ast.ident.clone(),
            generics: ast.generics.clone(),
            vis: DeclVis::from_syn(&ast.vis),
            attrs,
            fields,
            access_path: crate::path::fieldlens_access(),
        })
    }

    pub(crate) fn ident(&self) -> &Ident {
        &self.ident
    }

    pub(crate) fn attrs(&self) -> &TypeAttributes {
        &self.attrs
    }

    pub(crate) fn vis(&self) -> DeclVis {
        self.vis
    }

    pub(crate) fn access_path(&self) -> &syn::Path {
        &self.access_path
    }

    /// Whether the blueprint differs per instantiation.
    pub(crate) fn impl_with_generic(&self) -> bool {
        !self.generics.params.is_empty()
    }

    /// Declared members, all properties before all fields.
    pub(crate) fn members(&self) -> impl Iterator<Item = AccessMember<'_>> {
        self.attrs
            .properties
            .iter()
            .map(AccessMember::Property)
            .chain(self.fields.iter().map(AccessMember::Field))
    }

    /// The type as written at the derive site, e.g. `Holder<T>`.
    pub(crate) fn self_ty(&self) -> TokenStream {
        let ident = &self.ident;
        let (_, ty_generics, _) = self.generics.split_for_impl();
        quote! { #ident #ty_generics }
    }

    /// Call prefix for the type's methods, e.g. `Holder::<T>`.
    pub(crate) fn call_path(&self) -> TokenStream {
        let ident = &self.ident;
        let (_, ty_generics, _) = self.generics.split_for_impl();
        let turbofish = ty_generics.as_turbofish();
        quote! { #ident #turbofish }
    }

    /// Generic parameters of the generated table functions.
    pub(crate) fn table_fn_generics(&self) -> TokenStream {
        let (impl_generics, _, _) = self.generics.split_for_impl();
        impl_generics.to_token_stream()
    }

    /// Turbofish applying the impl's parameters to a table function.
    pub(crate) fn table_fn_turbofish(&self) -> TokenStream {
        let (_, ty_generics, _) = self.generics.split_for_impl();
        ty_generics.as_turbofish().to_token_stream()
    }

    /// Returns the pieces of the generated impl header.
    ///
    /// The where clause keeps the struct's own predicates and adds what the
    /// generated code relies on: `Self` must be `Any` (and `Default` when a
    /// constructor is requested), and member types mentioning a generic
    /// parameter must be `Any`, plus `Clone` where reads clone.
    pub(crate) fn split_generics(
        &self,
    ) -> (syn::ImplGenerics<'_>, syn::TypeGenerics<'_>, TokenStream) {
        let (impl_generics, ty_generics, _) = self.generics.split_for_impl();
        let where_clause = self.where_clause_for(quote! { Self }, self.attrs.default.is_some());
        (impl_generics, ty_generics, where_clause)
    }

    /// Where clause of the free table functions. `Self` does not exist
    /// there, so the predicates name the concrete type.
    pub(crate) fn table_fn_where_clause(&self) -> TokenStream {
        if self.generics.params.is_empty() && self.generics.where_clause.is_none() {
            return crate::utils::empty();
        }
        self.where_clause_for(self.self_ty(), false)
    }

    fn where_clause_for(&self, self_ty: TokenStream, add_default: bool) -> TokenStream {
        let mut clause = quote! { where };

        if !self.generics.params.is_empty() {
            clause.extend(quote! { #self_ty: #AnyFP, });
            if add_default {
                clause.extend(quote! { #self_ty: #DefaultFP, });
            }
        }

        // Maintain the existing where clause bounds, if any.
        if let Some(where_clause) = &self.generics.where_clause {
            let predicates = where_clause.predicates.iter();
            clause.extend(quote! { #(#predicates,)* });
        }

        clause.extend(self.member_type_predicates());
        clause
    }

    /// Predicates for member types that mention a generic parameter. Inside a
    /// generic function each such type needs its bounds spelled out before
    /// the body may box or clone it.
    fn member_type_predicates(&self) -> TokenStream {
        let mut param_idents = self
            .generics
            .type_params()
            .map(|param| param.ident.clone())
            .collect::<Vec<Ident>>();
        param_idents.extend(self.generics.const_params().map(|param| param.ident.clone()));
        if param_idents.is_empty() {
            return crate::utils::empty();
        }

        let mut predicates = TokenStream::new();
        for member in self.members() {
            let (ty, read_clones) = match member {
                AccessMember::Property(property) => {
                    (&property.ty, property.clones_through_borrow())
                }
                AccessMember::Field(field) => (&field.ty, true),
            };
            if !mentions_any_ident(&param_idents, ty.to_token_stream()) {
                continue;
            }
            if read_clones {
                predicates.extend(quote! { #ty: #AnyFP + #CloneFP, });
            } else {
                predicates.extend(quote! { #ty: #AnyFP, });
            }
        }
        predicates
    }
}

// Does any of `idents` appear somewhere in `token_stream`?
fn mentions_any_ident(idents: &[Ident], token_stream: TokenStream) -> bool {
    for token_tree in token_stream {
        match token_tree {
            TokenTree::Ident(ident) => {
                if idents.contains(&ident) {
                    return true;
                }
            }
            TokenTree::Group(group) => {
                if mentions_any_ident(idents, group.stream()) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}
