//! Code generation for the `ColferUnmarshal` half of `#[derive(Colfer)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

use crate::attr::{Shape, StructInfo};

/// Generate the ColferUnmarshal implementation for a struct.
///
/// Decoding starts from `Default::default()`, so absent and skipped fields
/// keep their default values.
pub fn derive_decode(input: &DeriveInput, info: &StructInfo) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let field_reads = info.wire_fields().map(|(field, index, shape)| {
        let ident = &field.ident;
        let label = &field.label;
        let read = match shape {
            Shape::Bool => quote! { dec::get_bool(r, &mut header, #index)? },
            Shape::Uint32 => quote! { dec::get_uint32(r, &mut header, #index)? },
            Shape::Int32 => quote! { dec::get_int32(r, &mut header, #index)? },
            Shape::Uint64 => quote! { dec::get_uint64(r, &mut header, #index)? },
            Shape::Int64 => quote! { dec::get_int64(r, &mut header, #index)? },
            Shape::Float32 => quote! { dec::get_float32(r, &mut header, #index)? },
            Shape::Float64 => quote! { dec::get_float64(r, &mut header, #index)? },
            Shape::Timestamp => quote! { dec::get_timestamp(r, &mut header, #index)? },
            Shape::Text => quote! { dec::get_text(r, &mut header, #index, #label)? },
            Shape::Binary => quote! { dec::get_binary(r, &mut header, #index, #label)? },
            Shape::Record { inner, boxed } => {
                let wrap = if *boxed {
                    quote! { ::std::boxed::Box::new(v) }
                } else {
                    quote! { v }
                };
                quote! {
                    dec::get_nested(r, &mut header, #index, |r| {
                        <#inner as ::colfer::ColferUnmarshal>::unmarshal_from(r)
                    })?
                    .map(|v| ::core::option::Option::Some(#wrap))
                }
            }
            Shape::List { inner, nullable } => {
                let wrap = if *nullable {
                    quote! { .map(::core::option::Option::Some) }
                } else {
                    quote! {}
                };
                quote! {
                    dec::get_list(r, &mut header, #index, #label, |r| {
                        <#inner as ::colfer::ColferUnmarshal>::unmarshal_from(r) #wrap
                    })?
                }
            }
        };
        quote! {
            if let ::core::option::Option::Some(v) = #read {
                out.#ident = v;
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::colfer::ColferUnmarshal for #name #ty_generics #where_clause {
            fn unmarshal_from(
                r: &mut ::colfer::codec::Reader<'_>,
            ) -> ::core::result::Result<Self, ::colfer::error::DecodeError> {
                #[allow(unused_imports)]
                use ::colfer::codec::decoder as dec;

                #[allow(unused_mut)]
                let mut out: Self = ::core::default::Default::default();
                #[allow(unused_mut)]
                let mut header = r.get_u8()?;
                #(#field_reads)*
                dec::expect_sentinel(r, header)?;
                ::core::result::Result::Ok(out)
            }
        }
    })
}
