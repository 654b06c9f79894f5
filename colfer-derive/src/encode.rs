//! Code generation for the `ColferMarshal` half of `#[derive(Colfer)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

use crate::attr::{Shape, StructInfo};

/// Generate the ColferMarshal implementation for a struct.
pub fn derive_encode(input: &DeriveInput, info: &StructInfo) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let field_writes = info.wire_fields().map(|(field, index, shape)| {
        let ident = &field.ident;
        let label = &field.label;
        match shape {
            Shape::Bool => quote! { enc::put_bool(w, #index, self.#ident)?; },
            Shape::Uint32 => quote! { enc::put_uint32(w, #index, self.#ident)?; },
            Shape::Int32 => quote! { enc::put_int32(w, #index, self.#ident)?; },
            Shape::Uint64 => quote! { enc::put_uint64(w, #index, self.#ident)?; },
            Shape::Int64 => quote! { enc::put_int64(w, #index, self.#ident)?; },
            Shape::Float32 => quote! { enc::put_float32(w, #index, self.#ident)?; },
            Shape::Float64 => quote! { enc::put_float64(w, #index, self.#ident)?; },
            Shape::Timestamp => quote! { enc::put_timestamp(w, #index, &self.#ident)?; },
            Shape::Text => quote! { enc::put_text(w, #index, &self.#ident, #label)?; },
            Shape::Binary => quote! { enc::put_binary(w, #index, &self.#ident, #label)?; },
            Shape::Record { .. } => quote! {
                if let ::core::option::Option::Some(v) = self.#ident.as_mut() {
                    w.put_header(#index, false)?;
                    w.nested(|w| v.marshal_into(w))?;
                }
            },
            Shape::List { nullable: true, .. } => quote! {
                if !self.#ident.is_empty() {
                    enc::put_list_header(w, #index, self.#ident.len(), #label)?;
                    for slot in self.#ident.iter_mut() {
                        let item = slot.get_or_insert_with(::core::default::Default::default);
                        w.nested(|w| item.marshal_into(w))?;
                    }
                }
            },
            Shape::List { nullable: false, .. } => quote! {
                if !self.#ident.is_empty() {
                    enc::put_list_header(w, #index, self.#ident.len(), #label)?;
                    for item in self.#ident.iter_mut() {
                        w.nested(|w| item.marshal_into(w))?;
                    }
                }
            },
        }
    });

    Ok(quote! {
        impl #impl_generics ::colfer::ColferMarshal for #name #ty_generics #where_clause {
            fn marshal_into(
                &mut self,
                w: &mut ::colfer::codec::Writer<'_>,
            ) -> ::core::result::Result<(), ::colfer::error::EncodeError> {
                #[allow(unused_imports)]
                use ::colfer::ColferMarshal as _;
                #[allow(unused_imports)]
                use ::colfer::codec::encoder as enc;

                #(#field_writes)*
                w.put_sentinel()
            }
        }
    })
}
