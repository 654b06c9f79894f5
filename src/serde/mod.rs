//! Serde integration for colfer serialization.
//!
//! Maps `#[derive(Serialize, Deserialize)]` types onto schema records by field
//! name. Integers are range-checked into the declared field width, `None`
//! becomes the zero value, and zero values read back as `None`. Maps and enum
//! variants with data are not supported.
//!
//! # Example
//!
//! ```rust
//! use colfer::schema_builder::{FieldDef, SchemaBuilder};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! let schema = SchemaBuilder::new()
//!     .add_struct("demo", "Person", vec![
//!         FieldDef::new("name", "text"),
//!         FieldDef::new("age", "uint32"),
//!     ])
//!     .build()
//!     .unwrap();
//!
//! let person_type = schema.get_type("demo.Person").unwrap();
//! let person = Person { name: "Alice".into(), age: 30 };
//!
//! let bytes = colfer::serde::to_bytes(&schema, person_type, &person).unwrap();
//! let decoded: Person = colfer::serde::from_bytes(&schema, person_type, &bytes).unwrap();
//! assert_eq!(person, decoded);
//! ```

mod de;
mod error;
mod ser;

pub use error::SerdeError;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::SchemaError;
use crate::types::{FieldKind, Schema, StructType};
use crate::value::{ColferValue, Record};

/// Convert a value to a [`Record`] of type `ty`.
///
/// Struct fields are matched to schema fields by name; schema fields the value
/// does not mention stay zero.
pub fn to_record<T: Serialize + ?Sized>(
    schema: &Schema,
    ty: &StructType,
    value: &T,
) -> Result<Record, SerdeError> {
    let qualified = ty.qualified_name();
    let idx = schema
        .get_type_index(&qualified)
        .ok_or(SchemaError::UnknownType(qualified))?;
    let serializer = ser::ValueSerializer::new(schema, FieldKind::Record(idx), &ty.name);
    match value.serialize(serializer)? {
        ColferValue::Record(Some(record)) => Ok(*record),
        ColferValue::Record(None) => Ok(Record::new(ty)),
        other => Err(SerdeError::TypeMismatch {
            field: ty.name.clone(),
            expected: "record",
            actual: other.kind_name(),
        }),
    }
}

/// Convert a [`Record`] to a Rust value. Strings and bytes may be borrowed.
pub fn from_record<'de, T: Deserialize<'de>>(record: &'de Record) -> Result<T, SerdeError> {
    T::deserialize(de::RecordDeserializer::new(Some(record)))
}

/// Serialize a value to colfer binary format as type `ty`.
///
/// # Example
///
/// ```rust,ignore
/// let bytes = colfer::serde::to_bytes(&schema, person_type, &person)?;
/// ```
pub fn to_bytes<T: Serialize + ?Sized>(
    schema: &Schema,
    ty: &StructType,
    value: &T,
) -> Result<Vec<u8>, SerdeError> {
    let mut record = to_record(schema, ty, value)?;
    Ok(codec::encode(schema, ty, &mut record)?)
}

/// Deserialize a value from colfer binary format as type `ty`.
pub fn from_bytes<T: DeserializeOwned>(
    schema: &Schema,
    ty: &StructType,
    data: &[u8],
) -> Result<T, SerdeError> {
    let record = codec::decode(schema, ty, data)?;
    from_record(&record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_builder::{FieldDef, SchemaBuilder};
    use crate::value::Timestamp;
    use serde::{Deserialize, Serialize};

    fn test_schema() -> Schema {
        SchemaBuilder::new()
            .add_struct(
                "demo",
                "Person",
                vec![
                    FieldDef::new("name", "text"),
                    FieldDef::new("age", "uint32"),
                    FieldDef::new("active", "bool"),
                    FieldDef::new("born", "timestamp"),
                ],
            )
            .add_struct(
                "demo",
                "Team",
                vec![
                    FieldDef::new("lead", "Person"),
                    FieldDef::list("members", "Person"),
                    FieldDef::new("logo", "binary"),
                    FieldDef::new("score", "float32"),
                ],
            )
            .build()
            .unwrap()
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq, Default, Clone)]
    struct Person {
        name: String,
        age: u32,
        active: bool,
        born: Timestamp,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Team {
        lead: Option<Box<Person>>,
        members: Vec<Person>,
        logo: Vec<u8>,
        score: f32,
    }

    fn alice() -> Person {
        Person {
            name: "Alice".into(),
            age: 30,
            active: true,
            born: Timestamp::new(631_152_000, 5),
        }
    }

    #[test]
    fn test_serialize_primitives() {
        let schema = test_schema();
        let ty = schema.get_type("Person").unwrap();

        let person = alice();
        let bytes = to_bytes(&schema, ty, &person).unwrap();
        let decoded: Person = from_bytes(&schema, ty, &bytes).unwrap();
        assert_eq!(person, decoded);
    }

    #[test]
    fn test_to_record() {
        let schema = test_schema();
        let ty = schema.get_type("Person").unwrap();

        let record = to_record(&schema, ty, &alice()).unwrap();
        assert_eq!(record.get("name").and_then(|v| v.as_str()), Some("Alice"));
        assert_eq!(record.get("age"), Some(&ColferValue::Uint32(30)));
        assert_eq!(
            record.get("born").and_then(|v| v.as_timestamp()),
            Some(Timestamp::new(631_152_000, 5))
        );
    }

    #[test]
    fn test_nested_and_lists() {
        let schema = test_schema();
        let ty = schema.get_type("Team").unwrap();

        let team = Team {
            lead: Some(Box::new(alice())),
            members: vec![alice(), Person::default()],
            logo: vec![1, 2, 3],
            score: 9.5,
        };
        let bytes = to_bytes(&schema, ty, &team).unwrap();
        let decoded: Team = from_bytes(&schema, ty, &bytes).unwrap();
        assert_eq!(team, decoded);

        let empty = Team {
            lead: None,
            members: vec![],
            logo: vec![],
            score: 0.0,
        };
        let bytes = to_bytes(&schema, ty, &empty).unwrap();
        assert_eq!(bytes, [0x7f]);
        let decoded: Team = from_bytes(&schema, ty, &bytes).unwrap();
        assert_eq!(empty, decoded);
    }

    #[test]
    fn test_out_of_range() {
        #[derive(Serialize)]
        struct Wide {
            age: i64,
        }

        let schema = test_schema();
        let ty = schema.get_type("Person").unwrap();
        let err = to_record(&schema, ty, &Wide { age: -1 }).unwrap_err();
        assert!(matches!(err, SerdeError::OutOfRange { value: -1, .. }));
    }

    #[test]
    fn test_unknown_field() {
        #[derive(Serialize)]
        struct Extra {
            nickname: String,
        }

        let schema = test_schema();
        let ty = schema.get_type("Person").unwrap();
        let err = to_record(&schema, ty, &Extra { nickname: "al".into() }).unwrap_err();
        assert!(matches!(err, SerdeError::Schema(SchemaError::UnknownField { .. })));
    }

    #[test]
    fn test_borrowed_from_record() {
        #[derive(Deserialize)]
        struct Name<'a> {
            name: &'a str,
        }

        let schema = test_schema();
        let ty = schema.get_type("Person").unwrap();
        let record = to_record(&schema, ty, &alice()).unwrap();
        let borrowed: Name<'_> = from_record(&record).unwrap();
        assert_eq!(borrowed.name, "Alice");
    }

    #[test]
    fn test_serde_bytes_binary() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Logo {
            #[serde(with = "serde_bytes")]
            logo: Vec<u8>,
        }

        #[derive(Deserialize)]
        struct LogoRef<'a> {
            #[serde(with = "serde_bytes")]
            logo: &'a [u8],
        }

        let schema = test_schema();
        let ty = schema.get_type("Team").unwrap();
        let logo = Logo {
            logo: vec![0x89, b'P', b'N', b'G'],
        };

        let bytes = to_bytes(&schema, ty, &logo).unwrap();
        assert_eq!(bytes, [0x02, 0x04, 0x89, b'P', b'N', b'G', 0x7f]);
        let decoded: Logo = from_bytes(&schema, ty, &bytes).unwrap();
        assert_eq!(decoded, logo);

        let record = to_record(&schema, ty, &logo).unwrap();
        let borrowed: LogoRef<'_> = from_record(&record).unwrap();
        assert_eq!(borrowed.logo, &logo.logo[..]);
    }
}
