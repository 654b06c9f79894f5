//! Attribute parsing and field classification for colfer derive macros.

use proc_macro2::Span;
use syn::{
    Attribute, DeriveInput, Expr, ExprLit, Fields, GenericArgument, Ident, Lit, PathArguments,
    Result, Type,
};

/// Index 127 is the end-of-record sentinel.
const MAX_FIELDS: usize = 127;

/// Parsed field attributes from #[colfer(...)]
#[derive(Default)]
pub struct FieldAttrs {
    /// Whether to leave this field out of the wire format.
    pub skip: bool,
}

impl FieldAttrs {
    /// Parse attributes from a field.
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut result = FieldAttrs::default();

        for attr in attrs {
            if attr.path().is_ident("colfer") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("skip") {
                        result.skip = true;
                        Ok(())
                    } else {
                        Err(syn::Error::new_spanned(meta.path, "unknown colfer attribute"))
                    }
                })?;
            }
        }

        Ok(result)
    }
}

/// Parsed struct-level attributes.
#[derive(Default)]
pub struct StructAttrs {
    /// Name used in error messages (defaults to struct name).
    pub name: Option<String>,
}

impl StructAttrs {
    /// Parse attributes from a struct.
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut result = StructAttrs::default();

        for attr in attrs {
            if attr.path().is_ident("colfer") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        let value: Expr = meta.value()?.parse()?;
                        if let Expr::Lit(ExprLit {
                            lit: Lit::Str(lit), ..
                        }) = value
                        {
                            result.name = Some(lit.value());
                            Ok(())
                        } else {
                            Err(syn::Error::new_spanned(value, "expected string literal"))
                        }
                    } else {
                        Err(syn::Error::new_spanned(meta.path, "unknown colfer attribute"))
                    }
                })?;
            }
        }

        Ok(result)
    }
}

/// Wire shape of a field, derived from its Rust type.
#[derive(Clone)]
pub enum Shape {
    Bool,
    Uint32,
    Int32,
    Uint64,
    Int64,
    Float32,
    Float64,
    Timestamp,
    Text,
    Binary,
    /// `Option<Box<T>>` or `Option<T>`.
    Record { inner: Type, boxed: bool },
    /// `Vec<Option<T>>` or `Vec<T>`.
    List { inner: Type, nullable: bool },
}

impl Shape {
    pub fn is_float(&self) -> bool {
        matches!(self, Shape::Float32 | Shape::Float64)
    }
}

/// Field information collected from the struct definition.
pub struct FieldInfo {
    pub ident: Ident,
    /// Wire index, or `None` when skipped.
    pub index: Option<u8>,
    pub shape: Option<Shape>,
    /// `"Type.field"`, for error messages.
    pub label: String,
}

/// Parsed struct with its wire fields in declaration order.
pub struct StructInfo {
    pub fields: Vec<FieldInfo>,
}

impl StructInfo {
    pub fn from_input(input: &DeriveInput, derive: &str) -> Result<Self> {
        let struct_attrs = StructAttrs::from_attrs(&input.attrs)?;
        let type_name = struct_attrs
            .name
            .unwrap_or_else(|| input.ident.to_string());

        let fields = match &input.data {
            syn::Data::Struct(data) => match &data.fields {
                Fields::Named(fields) => &fields.named,
                _ => {
                    return Err(syn::Error::new_spanned(
                        input,
                        format!("{} only supports structs with named fields", derive),
                    ))
                }
            },
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    format!("{} only supports structs", derive),
                ))
            }
        };

        let mut infos = Vec::new();
        let mut next_index = 0usize;
        for field in fields {
            let ident = match &field.ident {
                Some(ident) => ident.clone(),
                None => return Err(syn::Error::new_spanned(field, "expected named field")),
            };
            let attrs = FieldAttrs::from_attrs(&field.attrs)?;
            let label = format!("{}.{}", type_name, ident);

            if attrs.skip {
                infos.push(FieldInfo {
                    ident,
                    index: None,
                    shape: None,
                    label,
                });
                continue;
            }

            if next_index >= MAX_FIELDS {
                return Err(syn::Error::new(
                    ident.span(),
                    format!("{} has more than {} fields", type_name, MAX_FIELDS),
                ));
            }
            let shape = classify(&field.ty, ident.span())?;
            infos.push(FieldInfo {
                ident,
                index: Some(next_index as u8),
                shape: Some(shape),
                label,
            });
            next_index += 1;
        }

        Ok(StructInfo { fields: infos })
    }

    /// Fields that appear on the wire, with their index and shape.
    pub fn wire_fields(&self) -> impl Iterator<Item = (&FieldInfo, u8, &Shape)> {
        self.fields
            .iter()
            .filter_map(|f| Some((f, f.index?, f.shape.as_ref()?)))
    }
}

/// The last path segment of `ty` and its first generic argument, if any.
fn split_path(ty: &Type) -> Option<(String, Option<&Type>)> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            let inner = match &segment.arguments {
                PathArguments::AngleBracketed(args) => match args.args.first() {
                    Some(GenericArgument::Type(inner)) => Some(inner),
                    _ => None,
                },
                _ => None,
            };
            return Some((segment.ident.to_string(), inner));
        }
    }
    None
}

/// Map a Rust field type to its wire shape.
fn classify(ty: &Type, span: Span) -> Result<Shape> {
    let unsupported = || {
        syn::Error::new(
            span,
            "unsupported colfer field type; expected bool, u32, i32, u64, i64, f32, f64, \
             Timestamp, String, Vec<u8>, Option<Box<T>>, Vec<T> or Vec<Option<T>>",
        )
    };

    let (ident, inner) = split_path(ty).ok_or_else(unsupported)?;
    let shape = match (ident.as_str(), inner) {
        ("bool", None) => Shape::Bool,
        ("u32", None) => Shape::Uint32,
        ("i32", None) => Shape::Int32,
        ("u64", None) => Shape::Uint64,
        ("i64", None) => Shape::Int64,
        ("f32", None) => Shape::Float32,
        ("f64", None) => Shape::Float64,
        ("Timestamp", None) => Shape::Timestamp,
        ("String", None) => Shape::Text,
        ("Option", Some(inner)) => match split_path(inner) {
            Some((ref wrapper, Some(boxed))) if wrapper == "Box" => Shape::Record {
                inner: boxed.clone(),
                boxed: true,
            },
            _ => Shape::Record {
                inner: inner.clone(),
                boxed: false,
            },
        },
        ("Vec", Some(inner)) => match split_path(inner) {
            Some((ref elem, None)) if elem == "u8" => Shape::Binary,
            Some((ref wrapper, Some(elem))) if wrapper == "Option" => Shape::List {
                inner: elem.clone(),
                nullable: true,
            },
            _ => Shape::List {
                inner: inner.clone(),
                nullable: false,
            },
        },
        _ => return Err(unsupported()),
    };
    Ok(shape)
}
