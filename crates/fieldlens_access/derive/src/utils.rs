/// Returns an empty token stream.
#[inline(always)]
pub(crate) fn empty() -> proc_macro2::TokenStream {
    proc_macro2::TokenStream::new()
}
