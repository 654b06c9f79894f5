//! Code generation for `#[derive(ColferEq)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

use crate::attr::StructInfo;

/// Generate `PartialEq`, `Eq` and `Hash` over the wire fields.
///
/// Floats compare and hash by bit pattern. The hash is seeded with the
/// sentinel byte.
pub fn derive_eq(input: &DeriveInput, info: &StructInfo) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let comparisons: Vec<_> = info
        .wire_fields()
        .map(|(field, _, shape)| {
            let ident = &field.ident;
            if shape.is_float() {
                quote! { self.#ident.to_bits() == other.#ident.to_bits() }
            } else {
                quote! { self.#ident == other.#ident }
            }
        })
        .collect();

    let hashes = info.wire_fields().map(|(field, _, shape)| {
        let ident = &field.ident;
        if shape.is_float() {
            quote! { ::core::hash::Hash::hash(&self.#ident.to_bits(), state); }
        } else {
            quote! { ::core::hash::Hash::hash(&self.#ident, state); }
        }
    });

    let eq_body = if comparisons.is_empty() {
        quote! { true }
    } else {
        quote! { #(#comparisons)&&* }
    };

    Ok(quote! {
        impl #impl_generics ::core::cmp::PartialEq for #name #ty_generics #where_clause {
            fn eq(&self, other: &Self) -> bool {
                #eq_body
            }
        }

        impl #impl_generics ::core::cmp::Eq for #name #ty_generics #where_clause {}

        impl #impl_generics ::core::hash::Hash for #name #ty_generics #where_clause {
            fn hash<__H: ::core::hash::Hasher>(&self, state: &mut __H) {
                ::core::hash::Hash::hash(&::colfer::codec::wire::SENTINEL, state);
                #(#hashes)*
            }
        }
    })
}
