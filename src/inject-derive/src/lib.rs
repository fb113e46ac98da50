mod codegen;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Generates `impl Injectable for` the annotated struct: one dependency
/// per named field, an owned value by default, a fresh unique value for
/// a `Box<T>` field, and a shared singleton for an `Arc<T>` field. Name a
/// dependency's binding with `#[inject(name = "...")]`.
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match codegen::expand_injectable(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}
