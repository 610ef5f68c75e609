use std::fmt;
use std::result;

use serde::ser::{
    Serialize, SerializeMap, SerializeSeq, SerializeStruct,
    SerializeStructVariant, SerializeTuple, SerializeTupleStruct,
    SerializeTupleVariant, Serializer,
};

use crate::error::{Error, ErrorKind, Result};

/// Serialize one value into a flat row of fields.
///
/// Structs and tuples flatten in declaration order; `None` becomes the
/// empty field; unit enum variants become their name. When the value is
/// a struct, the struct's field names are also returned, so a caller
/// can emit them as a header row.
pub fn serialize_row<T: Serialize>(
    value: &T,
) -> Result<(Vec<String>, Option<Vec<&'static str>>)> {
    let mut row = SerRecord { fields: Vec::new(), field_names: None };
    value
        .serialize(&mut row)
        .map_err(|err| Error::new(ErrorKind::Serialize(err.0)))?;
    Ok((row.fields, row.field_names))
}

/// Collects the fields of a single row.
struct SerRecord {
    fields: Vec<String>,
    field_names: Option<Vec<&'static str>>,
}

/// An error message raised during row serialization.
#[derive(Debug)]
pub(crate) struct SerializeError(String);

impl serde::ser::Error for SerializeError {
    fn custom<T: fmt::Display>(msg: T) -> SerializeError {
        SerializeError(msg.to_string())
    }
}

impl std::error::Error for SerializeError {}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type SerResult<T> = result::Result<T, SerializeError>;

impl SerRecord {
    fn push(&mut self, field: String) {
        self.fields.push(field);
    }

    fn unsupported<T>(&self, what: &str) -> SerResult<T> {
        Err(SerializeError(format!(
            "cannot serialize {} into a CSV row",
            what
        )))
    }
}

macro_rules! serialize_int {
    ($method:ident, $ty:ty) => {
        fn $method(self, value: $ty) -> SerResult<()> {
            let mut buf = itoa::Buffer::new();
            self.push(buf.format(value).to_string());
            Ok(())
        }
    };
}

impl<'a> Serializer for &'a mut SerRecord {
    type Ok = ();
    type Error = SerializeError;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, value: bool) -> SerResult<()> {
        self.push(if value { "true" } else { "false" }.to_string());
        Ok(())
    }

    serialize_int!(serialize_i8, i8);
    serialize_int!(serialize_i16, i16);
    serialize_int!(serialize_i32, i32);
    serialize_int!(serialize_i64, i64);
    serialize_int!(serialize_u8, u8);
    serialize_int!(serialize_u16, u16);
    serialize_int!(serialize_u32, u32);
    serialize_int!(serialize_u64, u64);

    fn serialize_f32(self, value: f32) -> SerResult<()> {
        let mut buf = ryu::Buffer::new();
        self.push(buf.format(value).to_string());
        Ok(())
    }

    fn serialize_f64(self, value: f64) -> SerResult<()> {
        let mut buf = ryu::Buffer::new();
        self.push(buf.format(value).to_string());
        Ok(())
    }

    fn serialize_char(self, value: char) -> SerResult<()> {
        self.push(value.to_string());
        Ok(())
    }

    fn serialize_str(self, value: &str) -> SerResult<()> {
        self.push(value.to_string());
        Ok(())
    }

    fn serialize_bytes(self, _value: &[u8]) -> SerResult<()> {
        self.unsupported("raw bytes")
    }

    fn serialize_none(self) -> SerResult<()> {
        self.push(String::new());
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(
        self,
        value: &T,
    ) -> SerResult<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> SerResult<()> {
        self.push(String::new());
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> SerResult<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> SerResult<()> {
        self.push(variant.to_string());
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> SerResult<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        value: &T,
    ) -> SerResult<()> {
        value.serialize(self)
    }

    fn serialize_seq(
        self,
        _len: Option<usize>,
    ) -> SerResult<Self::SerializeSeq> {
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> SerResult<Self::SerializeTuple> {
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> SerResult<Self::SerializeTupleStruct> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> SerResult<Self::SerializeTupleVariant> {
        Ok(self)
    }

    fn serialize_map(
        self,
        _len: Option<usize>,
    ) -> SerResult<Self::SerializeMap> {
        self.unsupported("a map")
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> SerResult<Self::SerializeStruct> {
        if self.field_names.is_none() {
            self.field_names = Some(Vec::with_capacity(len));
        }
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> SerResult<Self::SerializeStructVariant> {
        self.unsupported("a struct variant")
    }
}

impl<'a> SerializeSeq for &'a mut SerRecord {
    type Ok = ();
    type Error = SerializeError;

    fn serialize_element<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> SerResult<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> SerResult<()> {
        Ok(())
    }
}

impl<'a> SerializeTuple for &'a mut SerRecord {
    type Ok = ();
    type Error = SerializeError;

    fn serialize_element<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> SerResult<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> SerResult<()> {
        Ok(())
    }
}

impl<'a> SerializeTupleStruct for &'a mut SerRecord {
    type Ok = ();
    type Error = SerializeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> SerResult<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> SerResult<()> {
        Ok(())
    }
}

impl<'a> SerializeTupleVariant for &'a mut SerRecord {
    type Ok = ();
    type Error = SerializeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> SerResult<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> SerResult<()> {
        Ok(())
    }
}

impl<'a> SerializeMap for &'a mut SerRecord {
    type Ok = ();
    type Error = SerializeError;

    fn serialize_key<T: Serialize + ?Sized>(
        &mut self,
        _key: &T,
    ) -> SerResult<()> {
        self.unsupported("a map")
    }

    fn serialize_value<T: Serialize + ?Sized>(
        &mut self,
        _value: &T,
    ) -> SerResult<()> {
        self.unsupported("a map")
    }

    fn end(self) -> SerResult<()> {
        Ok(())
    }
}

impl<'a> SerializeStruct for &'a mut SerRecord {
    type Ok = ();
    type Error = SerializeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> SerResult<()> {
        if let Some(ref mut names) = self.field_names {
            names.push(key);
        }
        value.serialize(&mut **self)
    }

    fn end(self) -> SerResult<()> {
        Ok(())
    }
}

impl<'a> SerializeStructVariant for &'a mut SerRecord {
    type Ok = ();
    type Error = SerializeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        _value: &T,
    ) -> SerResult<()> {
        self.unsupported("a struct variant")
    }

    fn end(self) -> SerResult<()> {
        Ok(())
    }
}
