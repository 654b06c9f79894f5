use std::collections::HashMap;

/// Maximum number of fields in one struct. Index 127 is the end-of-record sentinel.
pub const MAX_FIELDS: usize = 127;

/// The kind of a field in a colfer schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
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
    /// A reference to another struct. The value is the index into `Schema.types_list`.
    Record(usize),
    /// A list of struct references. The value is the index into `Schema.types_list`.
    List(usize),
}

impl FieldKind {
    /// Resolve a builtin type name as written in colfer schemas.
    pub fn builtin(name: &str) -> Option<FieldKind> {
        match name {
            "bool" => Some(FieldKind::Bool),
            "uint32" => Some(FieldKind::Uint32),
            "int32" => Some(FieldKind::Int32),
            "uint64" => Some(FieldKind::Uint64),
            "int64" => Some(FieldKind::Int64),
            "float32" => Some(FieldKind::Float32),
            "float64" => Some(FieldKind::Float64),
            "timestamp" => Some(FieldKind::Timestamp),
            "text" => Some(FieldKind::Text),
            "binary" => Some(FieldKind::Binary),
            _ => None,
        }
    }

    /// Returns a short kind description string.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Uint32 => "uint32",
            FieldKind::Int32 => "int32",
            FieldKind::Uint64 => "uint64",
            FieldKind::Int64 => "int64",
            FieldKind::Float32 => "float32",
            FieldKind::Float64 => "float64",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Text => "text",
            FieldKind::Binary => "binary",
            FieldKind::Record(_) => "record",
            FieldKind::List(_) => "list",
        }
    }

    /// The struct this kind refers to, if any.
    pub fn type_ref(&self) -> Option<usize> {
        match self {
            FieldKind::Record(idx) | FieldKind::List(idx) => Some(*idx),
            _ => None,
        }
    }
}

/// A field definition within a struct.
#[derive(Debug, Clone)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Zero-based declaration position, doubling as the wire tag (0..=126).
    pub index: u8,
    /// The kind of this field.
    pub kind: FieldKind,
}

/// A record type in the schema.
#[derive(Debug, Clone)]
pub struct StructType {
    /// Package that declares the type.
    pub package: String,
    /// Type name, unqualified.
    pub name: String,
    /// Fields in declaration order; `fields[i].index == i`.
    pub fields: Vec<Field>,
}

impl StructType {
    /// The package-qualified name, e.g. `"gen/demo.Course"`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }

    /// Whether `qualified` names this type, without allocating.
    pub fn is_named(&self, qualified: &str) -> bool {
        qualified.len() == self.package.len() + 1 + self.name.len()
            && qualified.starts_with(self.package.as_str())
            && qualified.ends_with(self.name.as_str())
            && qualified.as_bytes()[self.package.len()] == b'.'
    }

    /// Find a field by wire index.
    pub fn field(&self, index: u8) -> Option<&Field> {
        self.fields.get(index as usize)
    }

    /// Find a field by name.
    pub fn find_field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A named group of struct definitions.
#[derive(Debug, Clone)]
pub struct Package {
    /// Package name; may contain `/` separators.
    pub name: String,
    /// Indices into `Schema.types_list`, in declaration order.
    pub types: Vec<usize>,
}

/// The top-level schema container, holding all packages and their types.
///
/// Built once by [`SchemaBuilder`](crate::schema_builder::SchemaBuilder) and
/// read-only thereafter. Every record and list kind in it refers to a type of
/// the same schema.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// All packages in definition order.
    pub(crate) packages: Vec<Package>,
    /// All types in definition order, across packages.
    pub(crate) types_list: Vec<StructType>,
    /// Map from qualified type name to index in `types_list`.
    pub(crate) types_by_name: HashMap<String, usize>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a type by qualified name (`"pkg.Type"`), or by bare name when
    /// exactly one package declares it.
    pub fn get_type(&self, name: &str) -> Option<&StructType> {
        self.get_type_index(name).map(|idx| &self.types_list[idx])
    }

    /// Get a type index by qualified name, or by bare name when unambiguous.
    pub fn get_type_index(&self, name: &str) -> Option<usize> {
        if let Some(&idx) = self.types_by_name.get(name) {
            return Some(idx);
        }
        let mut found = self
            .types_list
            .iter()
            .enumerate()
            .filter(|(_, t)| t.name == name)
            .map(|(idx, _)| idx);
        match (found.next(), found.next()) {
            (Some(idx), None) => Some(idx),
            _ => None,
        }
    }

    /// Get a type by its index.
    pub fn type_at(&self, idx: usize) -> Option<&StructType> {
        self.types_list.get(idx)
    }

    /// The type a record or list kind of this schema refers to.
    pub(crate) fn target(&self, idx: usize) -> &StructType {
        &self.types_list[idx]
    }

    /// Whether `ty` is one of this schema's own types, rather than an equal
    /// looking type from another schema or a clone.
    pub fn contains(&self, ty: &StructType) -> bool {
        self.types_list
            .as_ptr_range()
            .contains(&(ty as *const StructType))
    }

    /// All types in definition order.
    pub fn types(&self) -> &[StructType] {
        &self.types_list
    }

    /// All packages in definition order.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Get a package by name.
    pub fn get_package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }
}
