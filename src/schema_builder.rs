//! Programmatic schema construction.
//!
//! The textual schema language lives outside this crate. Front ends hand the
//! declarations they parsed to a [`SchemaBuilder`], which validates them and
//! resolves type references (including references across packages) into an
//! immutable [`Schema`].
//!
//! ```rust
//! use colfer::schema_builder::{FieldDef, SchemaBuilder};
//!
//! let schema = SchemaBuilder::new()
//!     .add_struct("demo", "Course", vec![
//!         FieldDef::new("id", "uint64"),
//!         FieldDef::new("name", "text"),
//!         FieldDef::list("lessons", "Lesson"),
//!     ])
//!     .add_struct("demo", "Lesson", vec![FieldDef::new("title", "text")])
//!     .build()
//!     .unwrap();
//!
//! let course = schema.get_type("demo.Course").unwrap();
//! assert_eq!(course.fields[2].index, 2);
//! ```

use std::collections::{HashMap, HashSet};

use crate::error::SchemaError;
use crate::types::*;

/// A field declaration with an unresolved type name.
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    type_name: String,
    list: bool,
}

impl FieldDef {
    /// Declare a field of a builtin kind (`"uint32"`, `"text"`, ...) or a
    /// reference to a struct (`"Lesson"` or `"other/pkg.Lesson"`).
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        FieldDef {
            name: name.into(),
            type_name: type_name.into(),
            list: false,
        }
    }

    /// Declare a list of references to a struct.
    pub fn list(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        FieldDef {
            name: name.into(),
            type_name: type_name.into(),
            list: true,
        }
    }
}

struct RawStruct {
    package: String,
    name: String,
    fields: Vec<FieldDef>,
}

/// Collects struct declarations and builds a validated [`Schema`].
#[derive(Default)]
pub struct SchemaBuilder {
    structs: Vec<RawStruct>,
}

impl SchemaBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a struct in `package`. Field order is the wire index order.
    pub fn add_struct(
        mut self,
        package: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<FieldDef>,
    ) -> Self {
        self.structs.push(RawStruct {
            package: package.into(),
            name: name.into(),
            fields,
        });
        self
    }

    /// Validate all declarations and resolve type references.
    pub fn build(self) -> Result<Schema, SchemaError> {
        // Phase 1: Assign type indices in declaration order.
        let mut types_by_name: HashMap<String, usize> = HashMap::new();
        let mut packages: Vec<Package> = Vec::new();

        for (idx, raw) in self.structs.iter().enumerate() {
            if !is_package_name(&raw.package) {
                return Err(SchemaError::InvalidName(raw.package.clone()));
            }
            if !is_identifier(&raw.name) {
                return Err(SchemaError::InvalidName(raw.name.clone()));
            }

            let full_name = format!("{}.{}", raw.package, raw.name);
            if types_by_name.contains_key(&full_name) {
                return Err(SchemaError::DuplicateType { name: full_name });
            }
            types_by_name.insert(full_name, idx);

            match packages.iter_mut().find(|p| p.name == raw.package) {
                Some(p) => p.types.push(idx),
                None => packages.push(Package {
                    name: raw.package.clone(),
                    types: vec![idx],
                }),
            }
        }

        // Phase 2: Resolve fields.
        let mut types_list: Vec<StructType> = Vec::with_capacity(self.structs.len());

        for raw in &self.structs {
            let full_name = format!("{}.{}", raw.package, raw.name);
            if raw.fields.len() > MAX_FIELDS {
                return Err(SchemaError::TooManyFields {
                    type_name: full_name,
                    count: raw.fields.len(),
                });
            }

            let mut seen: HashSet<&str> = HashSet::new();
            let mut fields = Vec::with_capacity(raw.fields.len());

            for (index, def) in raw.fields.iter().enumerate() {
                if !is_identifier(&def.name) {
                    return Err(SchemaError::InvalidName(def.name.clone()));
                }
                if !seen.insert(def.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        type_name: full_name,
                        field_name: def.name.clone(),
                    });
                }

                let kind = resolve_field_kind(&raw.package, &full_name, def, &types_by_name)?;
                fields.push(Field {
                    name: def.name.clone(),
                    index: index as u8,
                    kind,
                });
            }

            types_list.push(StructType {
                package: raw.package.clone(),
                name: raw.name.clone(),
                fields,
            });
        }

        Ok(Schema {
            packages,
            types_list,
            types_by_name,
        })
    }
}

/// Resolve a field's type name to a FieldKind.
fn resolve_field_kind(
    package: &str,
    parent_type: &str,
    def: &FieldDef,
    types_by_name: &HashMap<String, usize>,
) -> Result<FieldKind, SchemaError> {
    if let Some(kind) = FieldKind::builtin(&def.type_name) {
        if def.list {
            return Err(SchemaError::KindMismatch {
                field: format!("{}.{}", parent_type, def.name),
                expected: "record",
                actual: kind.name(),
            });
        }
        return Ok(kind);
    }

    // A dot separates the package from the type name; bare names resolve
    // within the declaring package.
    let candidate = if def.type_name.contains('.') {
        def.type_name.clone()
    } else {
        format!("{}.{}", package, def.type_name)
    };

    match types_by_name.get(&candidate) {
        Some(&idx) if def.list => Ok(FieldKind::List(idx)),
        Some(&idx) => Ok(FieldKind::Record(idx)),
        None => Err(SchemaError::UndefinedType {
            type_name: def.type_name.clone(),
            referenced_by: format!("{}.{}", parent_type, def.name),
        }),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_package_name(s: &str) -> bool {
    s.split('/').all(is_identifier)
}
