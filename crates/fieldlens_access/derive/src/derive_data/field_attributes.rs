use proc_macro2::Span;
use syn::parse::ParseStream;
use syn::{Attribute, Ident, Token};

/// Parsed `#[access(...)]` attributes of one field.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    /// `skip`: the field is not a member at all.
    pub(crate) skip: Option<Span>,
    /// `readonly`: the member has no write side.
    pub(crate) readonly: Option<Span>,
    /// `rename = "..."`: the exposed member name.
    pub(crate) rename: Option<syn::LitStr>,
    /// `ordinal_hint = N`: suggested column position for row-oriented reads.
    pub(crate) ordinal_hint: Option<u32>,
}

impl FieldAttributes {
    /// Collects every `#[access(...)]` attribute of one field.
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
                "skip" => self.skip = Some(key.span()),
                "readonly" => self.readonly = Some(key.span()),
                "rename" => {
                    input.parse::<Token![=]>()?;
                    self.rename = Some(input.parse()?);
                }
                "ordinal_hint" => {
                    input.parse::<Token![=]>()?;
                    self.ordinal_hint = Some(input.parse::<syn::LitInt>()?.base10_parse()?);
                }
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!(
                            "unknown field attribute `{other}`, expected `skip`, `readonly`, \
                             `rename` or `ordinal_hint`"
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
