use std::error::Error as StdError;
use std::fmt;
use std::iter;
use std::num;
use std::result;
use std::slice;
use std::str;

use serde::de::value::StringDeserializer;
use serde::de::{
    Deserialize, DeserializeSeed, Deserializer, Error as SerdeError,
    IntoDeserializer, MapAccess, SeqAccess, Visitor,
};

use crate::error::{Error, ErrorKind, Result};

/// Deserialize one row into `T`.
///
/// When headers are given, the row is presented as a map from header
/// name to field, so structs deserialize by field name; without headers
/// the row is a sequence and structs deserialize positionally.
pub fn deserialize_row<'de, T: Deserialize<'de>>(
    row: &[String],
    headers: Option<&[String]>,
) -> Result<T> {
    let mut de = DeRecord::new(row, headers);
    T::deserialize(&mut de).map_err(|err| {
        Error::new(ErrorKind::Deserialize { row: None, err })
    })
}

/// A deserializer over the fields of one row.
struct DeRecord<'r> {
    it: iter::Peekable<slice::Iter<'r, String>>,
    headers: Option<slice::Iter<'r, String>>,
    field: u64,
}

impl<'r> DeRecord<'r> {
    fn new(row: &'r [String], headers: Option<&'r [String]>) -> DeRecord<'r> {
        DeRecord {
            it: row.iter().peekable(),
            headers: headers.map(|h| h.iter()),
            field: 0,
        }
    }

    /// Returns an error corresponding to the most recently extracted
    /// field.
    fn error(&self, kind: DeserializeErrorKind) -> DeserializeError {
        DeserializeError { field: Some(self.field.saturating_sub(1)), kind }
    }

    /// Extracts the next field from the underlying row.
    fn next_field(&mut self) -> result::Result<&'r str, DeserializeError> {
        match self.it.next() {
            Some(field) => {
                self.field += 1;
                Ok(field)
            }
            None => Err(DeserializeError {
                field: None,
                kind: DeserializeErrorKind::UnexpectedEndOfRow,
            }),
        }
    }

    /// Extracts the next header name.
    fn next_header(&mut self) -> Option<&'r str> {
        self.headers.as_mut().and_then(|it| it.next()).map(|h| h.as_str())
    }

    /// Peeks at the next field.
    fn peek_field(&mut self) -> Option<&'r str> {
        self.it.peek().map(|s| s.as_str())
    }

    fn has_headers(&self) -> bool {
        self.headers.is_some()
    }
}

macro_rules! deserialize_int {
    ($method:ident, $visit:ident) => {
        fn $method<V: Visitor<'de>>(
            self,
            visitor: V,
        ) -> result::Result<V::Value, Self::Error> {
            let field = self.next_field()?;
            visitor.$visit(
                field
                    .parse()
                    .map_err(|err| {
                        self.error(DeserializeErrorKind::ParseInt(err))
                    })?,
            )
        }
    };
}

impl<'a, 'de, 'r> Deserializer<'de> for &'a mut DeRecord<'r> {
    type Error = DeserializeError;

    /// Infer the type from the field text: booleans, then integers, then
    /// floats, then strings.
    fn deserialize_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        let field = self.next_field()?;
        if field == "true" {
            visitor.visit_bool(true)
        } else if field == "false" {
            visitor.visit_bool(false)
        } else if let Ok(n) = field.parse::<u64>() {
            visitor.visit_u64(n)
        } else if let Ok(n) = field.parse::<i64>() {
            visitor.visit_i64(n)
        } else if let Ok(n) = field.parse::<f64>() {
            visitor.visit_f64(n)
        } else {
            visitor.visit_str(field)
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        let field = self.next_field()?;
        visitor.visit_bool(field.parse().map_err(|err| {
            self.error(DeserializeErrorKind::ParseBool(err))
        })?)
    }

    deserialize_int!(deserialize_i8, visit_i8);
    deserialize_int!(deserialize_i16, visit_i16);
    deserialize_int!(deserialize_i32, visit_i32);
    deserialize_int!(deserialize_i64, visit_i64);
    deserialize_int!(deserialize_u8, visit_u8);
    deserialize_int!(deserialize_u16, visit_u16);
    deserialize_int!(deserialize_u32, visit_u32);
    deserialize_int!(deserialize_u64, visit_u64);

    fn deserialize_f32<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        let field = self.next_field()?;
        visitor.visit_f32(field.parse().map_err(|err| {
            self.error(DeserializeErrorKind::ParseFloat(err))
        })?)
    }

    fn deserialize_f64<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        let field = self.next_field()?;
        visitor.visit_f64(field.parse().map_err(|err| {
            self.error(DeserializeErrorKind::ParseFloat(err))
        })?)
    }

    fn deserialize_char<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        let field = self.next_field()?;
        let mut chars = field.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(self.error(DeserializeErrorKind::Message(format!(
                "expected a single character, got {:?}",
                field
            )))),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        self.next_field().and_then(|f| visitor.visit_str(f))
    }

    fn deserialize_string<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        self.next_field().and_then(|f| visitor.visit_string(f.to_string()))
    }

    fn deserialize_bytes<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        self.next_field().and_then(|f| visitor.visit_bytes(f.as_bytes()))
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        self.next_field()
            .and_then(|f| visitor.visit_byte_buf(f.as_bytes().to_vec()))
    }

    fn deserialize_option<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        match self.peek_field() {
            None => visitor.visit_none(),
            Some(f) if f.is_empty() => {
                self.next_field()?;
                visitor.visit_none()
            }
            Some(_) => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        visitor.visit_seq(DeRecordAccess(self))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        visitor.visit_seq(DeRecordAccess(self))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        visitor.visit_seq(DeRecordAccess(self))
    }

    fn deserialize_map<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        if !self.has_headers() {
            return Err(DeserializeError {
                field: None,
                kind: DeserializeErrorKind::Message(
                    "cannot deserialize a map from a row without headers"
                        .to_string(),
                ),
            });
        }
        visitor.visit_map(DeRecordAccess(self))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        if self.has_headers() {
            visitor.visit_map(DeRecordAccess(self))
        } else {
            visitor.visit_seq(DeRecordAccess(self))
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        let field = self.next_field()?.to_string();
        visitor.visit_enum(field.into_deserializer())
    }

    fn deserialize_identifier<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> result::Result<V::Value, Self::Error> {
        self.next_field()?;
        visitor.visit_unit()
    }
}

/// Sequence and map access over the remaining fields of a row.
struct DeRecordAccess<'a, 'r>(&'a mut DeRecord<'r>);

impl<'a, 'de, 'r> SeqAccess<'de> for DeRecordAccess<'a, 'r> {
    type Error = DeserializeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> result::Result<Option<T::Value>, Self::Error> {
        if self.0.peek_field().is_none() {
            return Ok(None);
        }
        seed.deserialize(&mut *self.0).map(Some)
    }
}

impl<'a, 'de, 'r> MapAccess<'de> for DeRecordAccess<'a, 'r> {
    type Error = DeserializeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> result::Result<Option<K::Value>, Self::Error> {
        if self.0.peek_field().is_none() {
            return Ok(None);
        }
        let name = match self.0.next_header() {
            Some(name) => name.to_string(),
            None => {
                return Err(DeserializeError {
                    field: None,
                    kind: DeserializeErrorKind::UnexpectedEndOfRow,
                });
            }
        };
        let de: StringDeserializer<DeserializeError> =
            name.into_deserializer();
        seed.deserialize(de).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> result::Result<V::Value, Self::Error> {
        seed.deserialize(&mut *self.0)
    }
}

/// An error that occurred while deserializing a row into a value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeserializeError {
    field: Option<u64>,
    kind: DeserializeErrorKind,
}

/// The specific type of a deserialization error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeserializeErrorKind {
    /// A catch-all for any other kind of error.
    Message(String),
    /// The row ended before every requested field was read.
    UnexpectedEndOfRow,
    /// A field could not be parsed as a boolean.
    ParseBool(str::ParseBoolError),
    /// A field could not be parsed as an integer.
    ParseInt(num::ParseIntError),
    /// A field could not be parsed as a float.
    ParseFloat(num::ParseFloatError),
}

impl DeserializeError {
    /// The index of the field in which the error occurred, if known.
    pub fn field(&self) -> Option<u64> {
        self.field
    }

    /// The specific type of this error.
    pub fn kind(&self) -> &DeserializeErrorKind {
        &self.kind
    }
}

impl SerdeError for DeserializeError {
    fn custom<T: fmt::Display>(msg: T) -> DeserializeError {
        DeserializeError {
            field: None,
            kind: DeserializeErrorKind::Message(msg.to_string()),
        }
    }
}

impl StdError for DeserializeError {}

impl fmt::Display for DeserializeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "field {}: {}", field, self.kind),
            None => self.kind.fmt(f),
        }
    }
}

impl fmt::Display for DeserializeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DeserializeErrorKind::Message(ref msg) => f.write_str(msg),
            DeserializeErrorKind::UnexpectedEndOfRow => {
                f.write_str("the row ended before every field was read")
            }
            DeserializeErrorKind::ParseBool(ref err) => err.fmt(f),
            DeserializeErrorKind::ParseInt(ref err) => err.fmt(f),
            DeserializeErrorKind::ParseFloat(ref err) => err.fmt(f),
        }
    }
}
