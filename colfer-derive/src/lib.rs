//! Derive macros for colfer serialization.
//!
//! `#[derive(Colfer)]` implements `ColferMarshal` and `ColferUnmarshal` by
//! writing and reading each field directly, without a runtime schema. Wire
//! indices follow declaration order.
//!
//! # Example
//!
//! ```rust,ignore
//! use colfer::{Colfer, ColferEq, ColferMarshal, ColferUnmarshal};
//!
//! #[derive(Colfer, ColferEq, Debug, Default)]
//! struct Course {
//!     code: u64,
//!     name: String,
//!     prerequisite: Option<Box<Course>>,
//! }
//!
//! let mut course = Course { code: 7, name: "Algebra".into(), ..Default::default() };
//! let bytes = course.colfer_encode().unwrap();
//! let decoded = Course::colfer_decode(&bytes).unwrap();
//! assert_eq!(course, decoded);
//! ```

mod attr;
mod decode;
mod encode;
mod eq;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

use crate::attr::StructInfo;

/// Derive macro for generating `ColferMarshal` and `ColferUnmarshal`.
///
/// # Field types
///
/// | Rust | colfer |
/// |------|--------|
/// | `bool`, `u32`, `i32`, `u64`, `i64`, `f32`, `f64` | same-named scalar |
/// | `Timestamp` | timestamp |
/// | `String` | text |
/// | `Vec<u8>` | binary |
/// | `Option<Box<T>>`, `Option<T>` | record reference |
/// | `Vec<Option<T>>`, `Vec<T>` | list of records |
///
/// The struct must implement `Default`; decoding starts from it.
///
/// # Attributes
///
/// - `#[colfer(skip)]` - Optional, leave this field out of the wire format.
/// - `#[colfer(name = "pkg.Type")]` - Optional on the struct, name used in errors.
#[proc_macro_derive(Colfer, attributes(colfer))]
pub fn derive_colfer(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = StructInfo::from_input(&input, "Colfer").and_then(|info| {
        let encode = encode::derive_encode(&input, &info)?;
        let decode = decode::derive_decode(&input, &info)?;
        Ok(quote::quote! { #encode #decode })
    });

    expanded.unwrap_or_else(|e| e.to_compile_error()).into()
}

/// Derive macro for structural `PartialEq`, `Eq` and `Hash`.
///
/// Floats compare by bit pattern. Skipped fields are ignored.
#[proc_macro_derive(ColferEq, attributes(colfer))]
pub fn derive_colfer_eq(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    StructInfo::from_input(&input, "ColferEq")
        .and_then(|info| eq::derive_eq(&input, &info))
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
