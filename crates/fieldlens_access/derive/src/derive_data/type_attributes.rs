use proc_macro2::Span;
use syn::parse::ParseStream;
use syn::{Attribute, Ident, Token, parenthesized};

use super::DeclVis;

/// Parsed `#[access(...)]` attributes of the deriving type.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    /// `default`: attach a constructor going through the type's `Default`.
    pub(crate) default: Option<Span>,
    /// `auto_register`: submit the blueprint for startup collection.
    pub(crate) auto_register: Option<Span>,
    /// `property(...)` declarations, in source order.
    pub(crate) properties: Vec<PropertyDecl>,
}

impl TypeAttributes {
    /// Collects every `#[access(...)]` attribute of the type.
    pub(crate) fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in attrs {
            if attr.path().is_ident(crate::ACCESS_ATTRIBUTE_NAME) {
                attr.parse_args_with(|input: ParseStream| this.parse_stream(input))?;
            }
        }
        Ok(this)
    }

    fn parse_stream(&mut self, input: ParseStream) -> syn::Result<()> {
        loop {
            if input.is_empty() {
                break;
            }
            let key = input.parse::<Ident>()?;
            match key.to_string().as_str() {
                "default" => self.default = Some(key.span()),
                "auto_register" => self.auto_register = Some(key.span()),
                "property" => {
                    let content;
                    parenthesized!(content in input);
                    self.properties.push(PropertyDecl::parse(&content, key.span())?);
                }
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!(
                            "unknown type attribute `{other}`, expected `default`, \
                             `auto_register` or `property(...)`"
                        ),
                    ));
                }
            }
            if input.is_empty() {
                break;
            }
            input.parse::<Token![,]>()?;
        }
        Ok(())
    }
}

/// One `property(...)` declaration on the deriving type.
///
/// A property is a member routed through accessor methods instead of direct
/// field projection. `name` and `ty` are mandatory; the remaining keys pick
/// the methods of each side.
pub(crate) struct PropertyDecl {
    /// The exposed member name.
    pub(crate) name: String,
    /// The value type carried across the boundary.
    pub(crate) ty: syn::Type,
    /// Method returning the value, `fn(&Self) -> V`.
    pub(crate) get: Option<Ident>,
    /// Method storing a value, `fn(&mut Self, V)`.
    pub(crate) set: Option<Ident>,
    /// Method projecting a reference, `fn(&Self) -> &V`.
    pub(crate) borrow: Option<Ident>,
    /// Method projecting a mutable reference, `fn(&mut Self) -> &mut V`.
    pub(crate) borrow_mut: Option<Ident>,
    /// Field the property stores into, for backing writes.
    pub(crate) backing: Option<syn::Member>,
    pub(crate) get_vis: DeclVis,
    pub(crate) set_vis: DeclVis,
    pub(crate) ordinal_hint: Option<u32>,
}

impl PropertyDecl {
    /// Parses the parenthesized body of one `property(...)` declaration.
    fn parse(input: ParseStream, span: Span) -> syn::Result<Self> {
        let mut name: Option<syn::LitStr> = None;
        let mut ty: Option<syn::Type> = None;
        let mut get: Option<Ident> = None;
        let mut set: Option<Ident> = None;
        let mut borrow: Option<Ident> = None;
        let mut borrow_mut: Option<Ident> = None;
        let mut backing: Option<syn::LitStr> = None;
        let mut get_vis = DeclVis::Public;
        let mut set_vis = DeclVis::Public;
        let mut ordinal_hint: Option<u32> = None;

        loop {
            if input.is_empty() {
                break;
            }
            let key = input.parse::<Ident>()?;
            input.parse::<Token![=]>()?;
            match key.to_string().as_str() {
                "name" => name = Some(input.parse()?),
                "ty" => ty = Some(input.parse()?),
                "get" => get = Some(input.parse()?),
                "set" => set = Some(input.parse()?),
                "borrow" => borrow = Some(input.parse()?),
                "borrow_mut" => borrow_mut = Some(input.parse()?),
                "backing" => backing = Some(input.parse()?),
                "get_vis" => get_vis = parse_vis(input)?,
                "set_vis" => set_vis = parse_vis(input)?,
                "ordinal_hint" => {
                    ordinal_hint = Some(input.parse::<syn::LitInt>()?.base10_parse()?);
                }
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("unknown property key `{other}`"),
                    ));
                }
            }
            if input.is_empty() {
                break;
            }
            input.parse::<Token![,]>()?;
        }

        let name = name
            .ok_or_else(|| syn::Error::new(span, "property needs a `name = \"...\"` key"))?;
        let ty = ty.ok_or_else(|| syn::Error::new(span, "property needs a `ty = ...` key"))?;
        if get.is_none() && set.is_none() && borrow.is_none() && borrow_mut.is_none() {
            return Err(syn::Error::new(
                span,
                "property declares no accessor side; add one of `get`, `set`, `borrow` or \
                 `borrow_mut`",
            ));
        }

        Ok(Self {
            name: name.value(),
            ty,
            get,
            set,
            borrow,
            borrow_mut,
            backing: backing.as_ref().map(backing_member).transpose()?,
            get_vis,
            set_vis,
            ordinal_hint,
        })
    }

    /// Value reads go through `clone` when only the reference side exists.
    pub(crate) fn clones_through_borrow(&self) -> bool {
        self.get.is_none() && self.borrow.is_some()
    }
}

fn parse_vis(input: ParseStream) -> syn::Result<DeclVis> {
    let ident = input.parse::<Ident>()?;
    match ident.to_string().as_str() {
        "public" => Ok(DeclVis::Public),
        "non_public" => Ok(DeclVis::NonPublic),
        other => Err(syn::Error::new(
            ident.span(),
            format!("unknown visibility `{other}`, expected `public` or `non_public`"),
        )),
    }
}

/// Backing fields are named the way members are: an identifier, or a position
/// for tuple structs.
fn backing_member(lit: &syn::LitStr) -> syn::Result<syn::Member> {
    let value = lit.value();
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        let position: usize = value
            .parse()
            .map_err(|_| syn::Error::new(lit.span(), "backing position is out of range"))?;
        let mut index = syn::Index::from(position);
        index.span = lit.span();
        Ok(syn::Member::Unnamed(index))
    } else {
        match syn::parse_str::<Ident>(&value) {
            Ok(_) => Ok(syn::Member::Named(Ident::new(&value, lit.span()))),
            Err(_) => Err(syn::Error::new(lit.span(), "backing must name a field")),
        }
    }
}
