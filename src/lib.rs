//! Colfer: a schema-driven binary serialization format.
//!
//! A record is a sequence of present fields followed by the sentinel byte
//! `0x7f`. Each field starts with a header byte holding its index, with the top
//! bit selecting an alternative payload encoding. Zero values are omitted, so
//! an all-zero record encodes to the single sentinel byte.
//!
//! Records can be handled dynamically through [`Schema`] and [`Record`], with
//! `#[derive(Colfer)]` on plain structs, or through serde.
//!
//! # Quick Start
//!
//! ```rust
//! use colfer::codec;
//! use colfer::schema_builder::{FieldDef, SchemaBuilder};
//! use colfer::value::Record;
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
//! let mut value = Record::from_fields(person_type, vec![
//!     ("name", "Alice".into()),
//!     ("age", 30u32.into()),
//! ]).unwrap();
//!
//! let encoded = codec::encode(&schema, person_type, &mut value).unwrap();
//! assert_eq!(encoded, b"\x00\x05Alice\x01\x1e\x7f");
//! let decoded = codec::decode(&schema, person_type, &encoded).unwrap();
//! assert_eq!(value, decoded);
//! ```

extern crate self as colfer;

pub mod error;
pub mod value;
pub mod types;
pub mod limits;
pub mod schema_builder;
pub mod codec;
pub mod derive_traits;

#[cfg(feature = "serde")]
pub mod serde;

pub use codec::Codec;
pub use derive_traits::{ColferMarshal, ColferUnmarshal};
pub use error::{ColferError, ErrorKind};
pub use limits::Limits;
pub use types::Schema;
pub use value::{ColferValue, Record, Timestamp};

// Re-export derive macros when the feature is enabled
#[cfg(feature = "derive")]
pub use colfer_derive::{Colfer, ColferEq};
