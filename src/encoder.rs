use std::io;

use crate::error::{Error, ErrorKind, Result};
use crate::key::{CodingPath, Key};
use crate::sink::Sink;

/// Where in the file → record → field hierarchy a container sits.
#[derive(Clone, Copy, Debug)]
enum Level {
    File,
    Record { row: u64 },
    Field { row: u64, field: u64 },
}

/// An encoding position in the CSV grid.
///
/// The write-side mirror of `Decoder`: a per-call value holding a borrow
/// of the sink, a coordinate prefix and the coding path. Values flow to
/// the sink's single `put` primitive; whether they are written through
/// or staged is the buffering strategy's concern.
#[derive(Debug)]
pub struct Encoder<'s, W: io::Write> {
    sink: &'s mut Sink<W>,
    level: Level,
    path: CodingPath,
}

/// Values that can be encoded to CSV through the container tree.
pub trait Encode {
    fn encode<W: io::Write>(&self, e: &mut Encoder<'_, W>) -> Result<()>;
}

impl<'s, W: io::Write> Encoder<'s, W> {
    pub(crate) fn file(sink: &'s mut Sink<W>) -> Encoder<'s, W> {
        Encoder { sink, level: Level::File, path: CodingPath::root() }
    }

    /// The coding path of this encoder.
    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }

    /// View this position as a keyed container.
    ///
    /// At file level, keys are integer row indices; at record level,
    /// keys are column indices or header names.
    pub fn keyed(&mut self) -> Result<KeyedEncoder<'_, W>> {
        match self.level {
            Level::Field { .. } => {
                Err(Error::new(ErrorKind::InvalidNestedContainer)
                    .at(&self.path))
            }
            level => Ok(KeyedEncoder {
                sink: &mut *self.sink,
                level,
                path: self.path.clone(),
            }),
        }
    }

    /// View this position as an ordered container with a cursor.
    pub fn unkeyed(&mut self) -> Result<UnkeyedEncoder<'_, W>> {
        match self.level {
            Level::Field { .. } => {
                Err(Error::new(ErrorKind::InvalidNestedContainer)
                    .at(&self.path))
            }
            level => Ok(UnkeyedEncoder {
                sink: &mut *self.sink,
                level,
                path: self.path.clone(),
                cursor: 0,
            }),
        }
    }

    /// View this position as a single value.
    ///
    /// At file or record level the single-column constraint is checked
    /// when the value is written, not here.
    pub fn single_value(&mut self) -> Result<SingleValueEncoder<'_, W>> {
        Ok(SingleValueEncoder {
            sink: &mut *self.sink,
            level: self.level,
            path: self.path.clone(),
        })
    }
}

/// A keyed view of the file (rows by index) or of a record (fields by
/// index or header name).
#[derive(Debug)]
pub struct KeyedEncoder<'a, W: io::Write> {
    sink: &'a mut Sink<W>,
    level: Level,
    path: CodingPath,
}

impl<'a, W: io::Write> KeyedEncoder<'a, W> {
    /// The encoder for the value under `key`.
    pub fn nested(&mut self, key: impl Into<Key>) -> Result<Encoder<'_, W>> {
        let key = key.into();
        let path = self.path.child(key.clone());
        let level = match self.level {
            Level::File => {
                let row = match key.index() {
                    Some(row) => row,
                    None => {
                        return Err(Error::new(ErrorKind::InvalidPath {
                            msg: "file-level keys must be integer row \
                                  indices"
                                .to_string(),
                        })
                        .at(&path));
                    }
                };
                Level::Record { row }
            }
            Level::Record { row } => {
                let field = self
                    .sink
                    .field_index_for(&key)
                    .map_err(|err| err.at(&path))?;
                Level::Field { row, field }
            }
            Level::Field { .. } => {
                return Err(Error::new(ErrorKind::InvalidNestedContainer)
                    .at(&path));
            }
        };
        Ok(Encoder { sink: &mut *self.sink, level, path })
    }
}

/// An ordered view over rows (at file level) or fields (at record
/// level).
#[derive(Debug)]
pub struct UnkeyedEncoder<'a, W: io::Write> {
    sink: &'a mut Sink<W>,
    level: Level,
    path: CodingPath,
    cursor: u64,
}

impl<'a, W: io::Write> UnkeyedEncoder<'a, W> {
    /// The index the next `next` call will encode.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// The encoder for the next value, advancing the cursor.
    ///
    /// At file level there is no end: every call allocates the next
    /// row. At record level the cursor is bounded by the row width once
    /// it is settled.
    pub fn next(&mut self) -> Result<Encoder<'_, W>> {
        let path = self.path.child(Key::Index(self.cursor));
        let level = match self.level {
            Level::File => Level::Record { row: self.cursor },
            Level::Record { row } => {
                if let Some(width) = self.sink.known_width() {
                    if self.cursor >= width {
                        return Err(
                            Error::new(ErrorKind::IsAtEnd).at(&path)
                        );
                    }
                }
                Level::Field { row, field: self.cursor }
            }
            Level::Field { .. } => {
                return Err(Error::new(ErrorKind::InvalidNestedContainer)
                    .at(&path));
            }
        };
        self.cursor += 1;
        Ok(Encoder { sink: &mut *self.sink, level, path })
    }
}

/// A single-value view of a coordinate.
#[derive(Debug)]
pub struct SingleValueEncoder<'a, W: io::Write> {
    sink: &'a mut Sink<W>,
    level: Level,
    path: CodingPath,
}

impl<'a, W: io::Write> SingleValueEncoder<'a, W> {
    /// Resolve this container to a concrete coordinate.
    ///
    /// At record and file level, a settled row width other than one is
    /// `IsNotSingleColumn`; an unsettled width is accepted and becomes
    /// one when the encoding completes.
    fn coordinate(&mut self) -> Result<(u64, u64)> {
        let single_column = match self.sink.known_width() {
            Some(width) => width == 1,
            None => true,
        };
        match self.level {
            Level::Field { row, field } => Ok((row, field)),
            Level::Record { row } => {
                if single_column {
                    Ok((row, 0))
                } else {
                    Err(Error::new(ErrorKind::IsNotSingleColumn)
                        .at(&self.path))
                }
            }
            Level::File => {
                if single_column {
                    Ok((0, 0))
                } else {
                    Err(Error::new(ErrorKind::IsNotSingleColumn)
                        .at(&self.path))
                }
            }
        }
    }

    /// Write the raw field text at this position.
    pub fn encode_str(&mut self, value: &str) -> Result<()> {
        let (row, field) = self.coordinate()?;
        self.sink
            .put(value.to_string(), row, field)
            .map_err(|err| err.at(&self.path))
    }

    pub fn encode_bool(&mut self, value: bool) -> Result<()> {
        self.encode_str(if value { "true" } else { "false" })
    }

    pub fn encode_i64(&mut self, value: i64) -> Result<()> {
        let mut buf = itoa::Buffer::new();
        self.encode_str(buf.format(value))
    }

    pub fn encode_u64(&mut self, value: u64) -> Result<()> {
        let mut buf = itoa::Buffer::new();
        self.encode_str(buf.format(value))
    }

    pub fn encode_f64(&mut self, value: f64) -> Result<()> {
        let mut buf = ryu::Buffer::new();
        self.encode_str(buf.format(value))
    }

    pub fn encode_char(&mut self, value: char) -> Result<()> {
        self.encode_str(value.encode_utf8(&mut [0u8; 4]))
    }

    /// Write the empty field, the representation of a missing value.
    pub fn encode_empty(&mut self) -> Result<()> {
        self.encode_str("")
    }
}

impl Encode for str {
    fn encode<W: io::Write>(&self, e: &mut Encoder<'_, W>) -> Result<()> {
        e.single_value()?.encode_str(self)
    }
}

impl Encode for String {
    fn encode<W: io::Write>(&self, e: &mut Encoder<'_, W>) -> Result<()> {
        e.single_value()?.encode_str(self)
    }
}

impl<'a, T: Encode + ?Sized> Encode for &'a T {
    fn encode<W: io::Write>(&self, e: &mut Encoder<'_, W>) -> Result<()> {
        (**self).encode(e)
    }
}

impl Encode for bool {
    fn encode<W: io::Write>(&self, e: &mut Encoder<'_, W>) -> Result<()> {
        e.single_value()?.encode_bool(*self)
    }
}

impl Encode for char {
    fn encode<W: io::Write>(&self, e: &mut Encoder<'_, W>) -> Result<()> {
        e.single_value()?.encode_char(*self)
    }
}

macro_rules! encode_signed {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode<W: io::Write>(
                    &self,
                    e: &mut Encoder<'_, W>,
                ) -> Result<()> {
                    e.single_value()?.encode_i64(*self as i64)
                }
            }
        )*
    }
}

macro_rules! encode_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode<W: io::Write>(
                    &self,
                    e: &mut Encoder<'_, W>,
                ) -> Result<()> {
                    e.single_value()?.encode_u64(*self as u64)
                }
            }
        )*
    }
}

encode_signed!(i8, i16, i32, i64);
encode_unsigned!(u8, u16, u32, u64);

impl Encode for f32 {
    fn encode<W: io::Write>(&self, e: &mut Encoder<'_, W>) -> Result<()> {
        let mut buf = ryu::Buffer::new();
        e.single_value()?.encode_str(buf.format(*self))
    }
}

impl Encode for f64 {
    fn encode<W: io::Write>(&self, e: &mut Encoder<'_, W>) -> Result<()> {
        e.single_value()?.encode_f64(*self)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode<W: io::Write>(&self, e: &mut Encoder<'_, W>) -> Result<()> {
        match *self {
            Some(ref value) => value.encode(e),
            None => e.single_value()?.encode_empty(),
        }
    }
}

impl<T: Encode> Encode for [T] {
    fn encode<W: io::Write>(&self, e: &mut Encoder<'_, W>) -> Result<()> {
        let mut seq = e.unkeyed()?;
        for value in self {
            let mut child = seq.next()?;
            value.encode(&mut child)?;
        }
        Ok(())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<W: io::Write>(&self, e: &mut Encoder<'_, W>) -> Result<()> {
        self.as_slice().encode(e)
    }
}
