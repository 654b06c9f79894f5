use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::codec::wire::SENTINEL;
use crate::error::SchemaError;
use crate::types::{FieldKind, StructType};

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// An instant with nanosecond precision, relative to the Unix epoch.
///
/// Normalised so that `nanos` is always below one second; negative instants
/// carry a negative `seconds` and a positive `nanos` offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "TimestampParts")
)]
pub struct Timestamp {
    seconds: i64,
    nanos: u32,
}

/// Deserialized form of [`Timestamp`], normalised on conversion.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(rename = "Timestamp")]
struct TimestampParts {
    seconds: i64,
    nanos: u32,
}

#[cfg(feature = "serde")]
impl From<TimestampParts> for Timestamp {
    fn from(parts: TimestampParts) -> Self {
        Timestamp::new(parts.seconds, parts.nanos)
    }
}

impl Timestamp {
    /// The Unix epoch, which is also the zero value.
    pub const EPOCH: Timestamp = Timestamp {
        seconds: 0,
        nanos: 0,
    };

    /// Create a timestamp, carrying whole seconds out of `nanos`.
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Timestamp {
            seconds: seconds.wrapping_add((nanos / NANOS_PER_SEC) as i64),
            nanos: nanos % NANOS_PER_SEC,
        }
    }

    /// Whole seconds since the epoch; negative before it.
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Nanoseconds past `seconds`, always below one second.
    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0 && self.nanos == 0
    }

    /// Convert to a `SystemTime`, or `None` when out of the platform's range.
    pub fn to_system_time(&self) -> Option<SystemTime> {
        let base = if self.seconds >= 0 {
            UNIX_EPOCH.checked_add(Duration::from_secs(self.seconds as u64))?
        } else {
            UNIX_EPOCH.checked_sub(Duration::from_secs(self.seconds.unsigned_abs()))?
        };
        base.checked_add(Duration::from_nanos(self.nanos as u64))
    }
}

impl From<SystemTime> for Timestamp {
    fn from(t: SystemTime) -> Self {
        match t.duration_since(UNIX_EPOCH) {
            Ok(d) => Timestamp::new(d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                let seconds = -(d.as_secs() as i64);
                match d.subsec_nanos() {
                    0 => Timestamp::new(seconds, 0),
                    n => Timestamp::new(seconds - 1, NANOS_PER_SEC - n),
                }
            }
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

/// Dynamic value of one field, similar to `serde_json::Value`.
///
/// Absence is modelled as the kind's zero value: `false`, `0`, `0.0`, the
/// epoch, an empty string or byte sequence, a `None` reference, an empty list.
#[derive(Clone, Debug)]
pub enum ColferValue {
    Bool(bool),
    Uint32(u32),
    Int32(i32),
    Uint64(u64),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Timestamp(Timestamp),
    Text(String),
    Binary(Vec<u8>),
    /// A reference to a nested record.
    Record(Option<Box<Record>>),
    /// A list of records. `None` slots are replaced with default records on encode.
    List(Vec<Option<Record>>),
}

impl ColferValue {
    /// The zero value for a field kind.
    pub fn zero(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Bool => ColferValue::Bool(false),
            FieldKind::Uint32 => ColferValue::Uint32(0),
            FieldKind::Int32 => ColferValue::Int32(0),
            FieldKind::Uint64 => ColferValue::Uint64(0),
            FieldKind::Int64 => ColferValue::Int64(0),
            FieldKind::Float32 => ColferValue::Float32(0.0),
            FieldKind::Float64 => ColferValue::Float64(0.0),
            FieldKind::Timestamp => ColferValue::Timestamp(Timestamp::EPOCH),
            FieldKind::Text => ColferValue::Text(String::new()),
            FieldKind::Binary => ColferValue::Binary(Vec::new()),
            FieldKind::Record(_) => ColferValue::Record(None),
            FieldKind::List(_) => ColferValue::List(Vec::new()),
        }
    }

    /// Whether the encoder would omit this value.
    pub fn is_zero(&self) -> bool {
        match self {
            ColferValue::Bool(v) => !*v,
            ColferValue::Uint32(v) => *v == 0,
            ColferValue::Int32(v) => *v == 0,
            ColferValue::Uint64(v) => *v == 0,
            ColferValue::Int64(v) => *v == 0,
            ColferValue::Float32(v) => *v == 0.0,
            ColferValue::Float64(v) => *v == 0.0,
            ColferValue::Timestamp(v) => v.is_zero(),
            ColferValue::Text(v) => v.is_empty(),
            ColferValue::Binary(v) => v.is_empty(),
            ColferValue::Record(v) => v.is_none(),
            ColferValue::List(v) => v.is_empty(),
        }
    }

    /// Whether this value has the shape of `kind`. Record targets are not checked.
    pub fn matches(&self, kind: FieldKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(&ColferValue::zero(kind))
    }

    /// Returns a short kind description string.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ColferValue::Bool(_) => "bool",
            ColferValue::Uint32(_) => "uint32",
            ColferValue::Int32(_) => "int32",
            ColferValue::Uint64(_) => "uint64",
            ColferValue::Int64(_) => "int64",
            ColferValue::Float32(_) => "float32",
            ColferValue::Float64(_) => "float64",
            ColferValue::Timestamp(_) => "timestamp",
            ColferValue::Text(_) => "text",
            ColferValue::Binary(_) => "binary",
            ColferValue::Record(_) => "record",
            ColferValue::List(_) => "list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ColferValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ColferValue::Uint32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ColferValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ColferValue::Uint64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColferValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ColferValue::Float32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColferValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            ColferValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ColferValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            ColferValue::Binary(v) => Some(v),
            _ => None,
        }
    }

    /// Get the nested record, if this is a present reference.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            ColferValue::Record(Some(r)) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Option<Record>]> {
        match self {
            ColferValue::List(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for ColferValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ColferValue::Bool(a), ColferValue::Bool(b)) => a == b,
            (ColferValue::Uint32(a), ColferValue::Uint32(b)) => a == b,
            (ColferValue::Int32(a), ColferValue::Int32(b)) => a == b,
            (ColferValue::Uint64(a), ColferValue::Uint64(b)) => a == b,
            (ColferValue::Int64(a), ColferValue::Int64(b)) => a == b,
            (ColferValue::Float32(a), ColferValue::Float32(b)) => a.to_bits() == b.to_bits(),
            (ColferValue::Float64(a), ColferValue::Float64(b)) => a.to_bits() == b.to_bits(),
            (ColferValue::Timestamp(a), ColferValue::Timestamp(b)) => a == b,
            (ColferValue::Text(a), ColferValue::Text(b)) => a == b,
            (ColferValue::Binary(a), ColferValue::Binary(b)) => a == b,
            (ColferValue::Record(a), ColferValue::Record(b)) => a == b,
            (ColferValue::List(a), ColferValue::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ColferValue {}

impl Hash for ColferValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ColferValue::Bool(v) => v.hash(state),
            ColferValue::Uint32(v) => v.hash(state),
            ColferValue::Int32(v) => v.hash(state),
            ColferValue::Uint64(v) => v.hash(state),
            ColferValue::Int64(v) => v.hash(state),
            ColferValue::Float32(v) => v.to_bits().hash(state),
            ColferValue::Float64(v) => v.to_bits().hash(state),
            ColferValue::Timestamp(v) => v.hash(state),
            ColferValue::Text(v) => v.hash(state),
            ColferValue::Binary(v) => v.hash(state),
            ColferValue::Record(v) => v.hash(state),
            ColferValue::List(v) => v.hash(state),
        }
    }
}

impl fmt::Display for ColferValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColferValue::Bool(v) => write!(f, "{}", v),
            ColferValue::Uint32(v) => write!(f, "{}", v),
            ColferValue::Int32(v) => write!(f, "{}", v),
            ColferValue::Uint64(v) => write!(f, "{}", v),
            ColferValue::Int64(v) => write!(f, "{}", v),
            ColferValue::Float32(v) => write!(f, "{}", v),
            ColferValue::Float64(v) => write!(f, "{}", v),
            ColferValue::Timestamp(v) => write!(f, "{}", v),
            ColferValue::Text(v) => write!(f, "\"{}\"", v),
            ColferValue::Binary(v) => write!(f, "<binary {} bytes>", v.len()),
            ColferValue::Record(None) => write!(f, "null"),
            ColferValue::Record(Some(r)) => write!(f, "{}", r),
            ColferValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Some(r) => write!(f, "{}", r)?,
                        None => write!(f, "null")?,
                    }
                }
                write!(f, "]")
            }
        }
    }
}

/// One value of a schema struct: every declared field, in index order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    type_name: String,
    fields: Vec<(String, ColferValue)>,
}

impl Record {
    /// Create a record with every field set to its zero value.
    pub fn new(ty: &StructType) -> Self {
        Record {
            type_name: ty.qualified_name(),
            fields: ty
                .fields
                .iter()
                .map(|f| (f.name.clone(), ColferValue::zero(f.kind)))
                .collect(),
        }
    }

    /// Helper to build a record from name-value pairs; unnamed fields stay zero.
    pub fn from_fields(
        ty: &StructType,
        fields: Vec<(&str, ColferValue)>,
    ) -> Result<Self, SchemaError> {
        let mut record = Record::new(ty);
        for (name, value) in fields {
            record.set(name, value)?;
        }
        Ok(record)
    }

    /// The qualified name of the struct this record belongs to.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether every field holds its zero value.
    pub fn is_zero(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_zero())
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&ColferValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get a mutable field value by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ColferValue> {
        self.fields.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get a field value by wire index.
    pub fn value_at(&self, index: usize) -> Option<&ColferValue> {
        self.fields.get(index).map(|(_, v)| v)
    }

    /// Get a field name and value by wire index.
    pub fn field_at(&self, index: usize) -> Option<(&str, &ColferValue)> {
        self.fields.get(index).map(|(n, v)| (n.as_str(), v))
    }

    /// Replace a field value, returning the previous one.
    ///
    /// Fails when the record has no such field or the value has another kind.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<ColferValue>,
    ) -> Result<ColferValue, SchemaError> {
        let value = value.into();
        let type_name = &self.type_name;
        let slot = self
            .fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| SchemaError::UnknownField {
                type_name: type_name.clone(),
                field_name: name.to_string(),
            })?;

        if std::mem::discriminant(slot) != std::mem::discriminant(&value) {
            return Err(SchemaError::KindMismatch {
                field: format!("{}.{}", type_name, name),
                expected: slot.kind_name(),
                actual: value.kind_name(),
            });
        }
        Ok(std::mem::replace(slot, value))
    }

    /// Field names in index order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Name-value pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColferValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut ColferValue> {
        self.fields.iter_mut().map(|(_, v)| v)
    }
}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        SENTINEL.hash(state);
        for (_, v) in &self.fields {
            v.hash(state);
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ ", self.type_name)?;
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        write!(f, " }}")
    }
}

// Conversion traits
impl From<bool> for ColferValue {
    fn from(v: bool) -> Self {
        ColferValue::Bool(v)
    }
}

impl From<u32> for ColferValue {
    fn from(v: u32) -> Self {
        ColferValue::Uint32(v)
    }
}

impl From<i32> for ColferValue {
    fn from(v: i32) -> Self {
        ColferValue::Int32(v)
    }
}

impl From<u64> for ColferValue {
    fn from(v: u64) -> Self {
        ColferValue::Uint64(v)
    }
}

impl From<i64> for ColferValue {
    fn from(v: i64) -> Self {
        ColferValue::Int64(v)
    }
}

impl From<f32> for ColferValue {
    fn from(v: f32) -> Self {
        ColferValue::Float32(v)
    }
}

impl From<f64> for ColferValue {
    fn from(v: f64) -> Self {
        ColferValue::Float64(v)
    }
}

impl From<Timestamp> for ColferValue {
    fn from(v: Timestamp) -> Self {
        ColferValue::Timestamp(v)
    }
}

impl From<String> for ColferValue {
    fn from(v: String) -> Self {
        ColferValue::Text(v)
    }
}

impl From<&str> for ColferValue {
    fn from(v: &str) -> Self {
        ColferValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for ColferValue {
    fn from(v: Vec<u8>) -> Self {
        ColferValue::Binary(v)
    }
}

impl From<&[u8]> for ColferValue {
    fn from(v: &[u8]) -> Self {
        ColferValue::Binary(v.to_vec())
    }
}

impl From<Record> for ColferValue {
    fn from(v: Record) -> Self {
        ColferValue::Record(Some(Box::new(v)))
    }
}

impl From<Vec<Record>> for ColferValue {
    fn from(v: Vec<Record>) -> Self {
        ColferValue::List(v.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<Record>>> for ColferValue {
    fn from(v: Vec<Option<Record>>) -> Self {
        ColferValue::List(v)
    }
}

// TryFrom implementations for extracting values from ColferValue
macro_rules! impl_try_from_value {
    ($($variant:ident => $ty:ty, $msg:literal;)*) => {
        $(
            impl TryFrom<ColferValue> for $ty {
                type Error = &'static str;
                fn try_from(v: ColferValue) -> Result<Self, Self::Error> {
                    match v {
                        ColferValue::$variant(x) => Ok(x),
                        _ => Err($msg),
                    }
                }
            }
        )*
    };
}

impl_try_from_value! {
    Bool => bool, "expected bool";
    Uint32 => u32, "expected uint32";
    Int32 => i32, "expected int32";
    Uint64 => u64, "expected uint64";
    Int64 => i64, "expected int64";
    Float32 => f32, "expected float32";
    Float64 => f64, "expected float64";
    Timestamp => Timestamp, "expected timestamp";
    Text => String, "expected text";
    Binary => Vec<u8>, "expected binary";
}
