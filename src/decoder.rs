use std::io;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};
use crate::key::{CodingPath, Key};
use crate::source::Source;

/// Where in the file → record → field hierarchy a container sits.
#[derive(Clone, Copy, Debug)]
enum Level {
    File,
    Record { row: u64 },
    Field { row: u64, field: u64 },
}

/// A decoding position in the CSV grid.
///
/// A decoder is a lightweight per-call value: it holds a borrow of the
/// source, a coordinate prefix, and the coding path that led here. User
/// types drive decoding by requesting one of the three container views
/// and reading values out of it.
#[derive(Debug)]
pub struct Decoder<'s, R> {
    source: &'s mut Source<R>,
    level: Level,
    path: CodingPath,
}

/// Values that can be decoded from CSV through the container tree.
pub trait Decode: Sized {
    fn decode<R: io::Read>(d: &mut Decoder<'_, R>) -> Result<Self>;
}

impl<'s, R: io::Read> Decoder<'s, R> {
    pub(crate) fn file(source: &'s mut Source<R>) -> Decoder<'s, R> {
        Decoder { source, level: Level::File, path: CodingPath::root() }
    }

    /// The coding path of this decoder.
    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }

    /// View this position as a keyed container.
    ///
    /// At file level, keys are integer row indices; at record level,
    /// keys are column indices or header names. Field level has no
    /// nested containers.
    pub fn keyed(&mut self) -> Result<KeyedDecoder<'_, R>> {
        match self.level {
            Level::Field { .. } => {
                Err(Error::new(ErrorKind::InvalidNestedContainer)
                    .at(&self.path))
            }
            level => Ok(KeyedDecoder {
                source: &mut *self.source,
                level,
                path: self.path.clone(),
            }),
        }
    }

    /// View this position as an ordered container with a cursor.
    pub fn unkeyed(&mut self) -> Result<UnkeyedDecoder<'_, R>> {
        match self.level {
            Level::Field { .. } => {
                Err(Error::new(ErrorKind::InvalidNestedContainer)
                    .at(&self.path))
            }
            level => Ok(UnkeyedDecoder {
                source: &mut *self.source,
                level,
                path: self.path.clone(),
                cursor: 0,
            }),
        }
    }

    /// View this position as a single value.
    ///
    /// Valid at any level; at file or record level, the single-column
    /// constraint is checked when the value is read, not here.
    pub fn single_value(&mut self) -> Result<SingleValueDecoder<'_, R>> {
        Ok(SingleValueDecoder {
            source: &mut *self.source,
            level: self.level,
            path: self.path.clone(),
        })
    }
}

/// A keyed view of the file (rows by index) or of a record (fields by
/// index or header name).
#[derive(Debug)]
pub struct KeyedDecoder<'a, R> {
    source: &'a mut Source<R>,
    level: Level,
    path: CodingPath,
}

impl<'a, R: io::Read> KeyedDecoder<'a, R> {
    /// The decoder for the value under `key`.
    pub fn nested(&mut self, key: impl Into<Key>) -> Result<Decoder<'_, R>> {
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
                    .source
                    .field_index_for(&key)
                    .map_err(|err| err.at(&path))?;
                Level::Field { row, field }
            }
            Level::Field { .. } => {
                return Err(Error::new(ErrorKind::InvalidNestedContainer)
                    .at(&path));
            }
        };
        Ok(Decoder { source: &mut *self.source, level, path })
    }

    /// Whether a value exists under `key`.
    ///
    /// Unmatched header names answer `false`; configuration and I/O
    /// failures still propagate.
    pub fn contains(&mut self, key: impl Into<Key>) -> Result<bool> {
        let key = key.into();
        match self.level {
            Level::File => match key.index() {
                Some(row) => Ok(!self.source.is_row_at_end(row)?),
                None => Ok(false),
            },
            Level::Record { .. } => match self.source.field_index_for(&key) {
                Ok(field) => {
                    let width = self.source.row_width()?.unwrap_or(0);
                    Ok(field < width)
                }
                Err(err) => match err.kind() {
                    ErrorKind::UnmatchedHeader { .. }
                    | ErrorKind::EmptyHeader => Ok(false),
                    _ => Err(err),
                },
            },
            Level::Field { .. } => Ok(false),
        }
    }

    /// The number of values in this container, when known.
    ///
    /// At file level, the row count is only known once the input has
    /// been exhausted.
    pub fn count(&mut self) -> Result<Option<u64>> {
        match self.level {
            Level::File => Ok(self.source.num_rows()),
            _ => self.source.row_width(),
        }
    }
}

/// An ordered view over rows (at file level) or fields (at record
/// level).
#[derive(Debug)]
pub struct UnkeyedDecoder<'a, R> {
    source: &'a mut Source<R>,
    level: Level,
    path: CodingPath,
    cursor: u64,
}

impl<'a, R: io::Read> UnkeyedDecoder<'a, R> {
    /// The index the next `next` call will decode.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Whether the cursor sits past the last value.
    pub fn is_at_end(&mut self) -> Result<bool> {
        match self.level {
            Level::File => self
                .source
                .is_row_at_end(self.cursor)
                .map_err(|err| err.at(&self.path)),
            _ => {
                let width = self.source.row_width()?.unwrap_or(0);
                Ok(self.cursor >= width)
            }
        }
    }

    /// The decoder for the next value, advancing the cursor.
    pub fn next(&mut self) -> Result<Decoder<'_, R>> {
        let path = self.path.child(Key::Index(self.cursor));
        if self.is_at_end()? {
            return Err(Error::new(ErrorKind::IsAtEnd).at(&path));
        }
        let level = match self.level {
            Level::File => Level::Record { row: self.cursor },
            Level::Record { row } => {
                Level::Field { row, field: self.cursor }
            }
            Level::Field { .. } => {
                return Err(Error::new(ErrorKind::InvalidNestedContainer)
                    .at(&path));
            }
        };
        self.cursor += 1;
        Ok(Decoder { source: &mut *self.source, level, path })
    }

    /// The number of values in this container, when known.
    pub fn count(&mut self) -> Result<Option<u64>> {
        match self.level {
            Level::File => Ok(self.source.num_rows()),
            _ => self.source.row_width(),
        }
    }
}

/// A single-value view of a coordinate.
#[derive(Debug)]
pub struct SingleValueDecoder<'a, R> {
    source: &'a mut Source<R>,
    level: Level,
    path: CodingPath,
}

impl<'a, R: io::Read> SingleValueDecoder<'a, R> {
    /// Resolve this container to a concrete coordinate, enforcing the
    /// single-column (and, at file level, single-row) constraint.
    fn coordinate(&mut self) -> Result<(u64, u64)> {
        match self.level {
            Level::Field { row, field } => Ok((row, field)),
            Level::Record { row } => {
                if self.source.row_width()? == Some(1) {
                    Ok((row, 0))
                } else {
                    Err(Error::new(ErrorKind::IsNotSingleColumn)
                        .at(&self.path))
                }
            }
            Level::File => {
                let single_column = self.source.row_width()? == Some(1);
                let single_row = !self.source.is_row_at_end(0)?
                    && self.source.is_row_at_end(1)?;
                if single_column && single_row {
                    Ok((0, 0))
                } else {
                    Err(Error::new(ErrorKind::IsNotSingleColumn)
                        .at(&self.path))
                }
            }
        }
    }

    /// The raw field text at this position.
    pub fn decode_string(&mut self) -> Result<String> {
        let (row, field) = self.coordinate()?;
        self.source.field(row, field).map_err(|err| err.at(&self.path))
    }

    /// Parse the field text as `T`, reporting a `Mismatch` with the
    /// offending text on failure.
    pub fn parse<T: FromStr>(&mut self, expected: &str) -> Result<T> {
        let text = self.decode_string()?;
        match text.parse() {
            Ok(value) => Ok(value),
            Err(_) => Err(Error::new(ErrorKind::Mismatch {
                expected: expected.to_string(),
                value: text,
            })
            .at(&self.path)),
        }
    }

    pub fn decode_bool(&mut self) -> Result<bool> {
        self.parse("bool")
    }

    pub fn decode_i64(&mut self) -> Result<i64> {
        self.parse("i64")
    }

    pub fn decode_u64(&mut self) -> Result<u64> {
        self.parse("u64")
    }

    pub fn decode_f64(&mut self) -> Result<f64> {
        self.parse("f64")
    }

    pub fn decode_char(&mut self) -> Result<char> {
        self.parse("char")
    }
}

impl Decode for String {
    fn decode<R: io::Read>(d: &mut Decoder<'_, R>) -> Result<String> {
        d.single_value()?.decode_string()
    }
}

macro_rules! decode_parsed {
    ($($ty:ty),*) => {
        $(
            impl Decode for $ty {
                fn decode<R: io::Read>(
                    d: &mut Decoder<'_, R>,
                ) -> Result<$ty> {
                    d.single_value()?.parse(stringify!($ty))
                }
            }
        )*
    }
}

decode_parsed!(bool, char, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl<T: Decode> Decode for Option<T> {
    /// An empty field is `None`; anything else decodes as `T`.
    fn decode<R: io::Read>(d: &mut Decoder<'_, R>) -> Result<Option<T>> {
        if d.single_value()?.decode_string()?.is_empty() {
            return Ok(None);
        }
        T::decode(d).map(Some)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode<R: io::Read>(d: &mut Decoder<'_, R>) -> Result<Vec<T>> {
        let mut seq = d.unkeyed()?;
        let mut out = Vec::new();
        while !seq.is_at_end()? {
            let mut child = seq.next()?;
            out.push(T::decode(&mut child)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use csvcodec_core::{HeaderPolicy, ReaderBuilder};

    use super::{Decode, Decoder};
    use crate::buffer::ReadBuffering;
    use crate::error::ErrorKind;
    use crate::source::Source;

    fn with_source<T>(
        data: &str,
        strategy: ReadBuffering,
        headers: bool,
        f: impl FnOnce(&mut Decoder<'_, &[u8]>) -> T,
    ) -> T {
        let mut builder = ReaderBuilder::new();
        if headers {
            builder.header(HeaderPolicy::FirstLine);
        }
        let rdr = builder.from_reader(data.as_bytes()).unwrap();
        let mut source = Source::new(rdr, strategy);
        let mut dec = Decoder::file(&mut source);
        f(&mut dec)
    }

    #[test]
    fn whole_file_as_nested_vectors() {
        let rows: Vec<Vec<String>> = with_source(
            "a,b\nc,d\n",
            ReadBuffering::KeepAll,
            false,
            |d| Decode::decode(d).unwrap(),
        );
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string(), "d".to_string()],
            ]
        );
    }

    #[test]
    fn typed_fields_through_containers() {
        with_source("1,true\n2,false\n", ReadBuffering::KeepAll, false, |d| {
            let mut file = d.unkeyed().unwrap();
            let mut row0 = file.next().unwrap();
            let mut rec = row0.unkeyed().unwrap();
            assert_eq!(i64::decode(&mut rec.next().unwrap()).unwrap(), 1);
            assert!(bool::decode(&mut rec.next().unwrap()).unwrap());
            assert!(rec.is_at_end().unwrap());
        });
    }

    #[test]
    fn keyed_access_by_header_name() {
        with_source(
            "name,age\nalice,39\nbob,25\n",
            ReadBuffering::KeepAll,
            true,
            |d| {
                let mut file = d.keyed().unwrap();
                let mut row1 = file.nested(1u64).unwrap();
                let mut rec = row1.keyed().unwrap();
                let mut age = rec.nested("age").unwrap();
                assert_eq!(u64::decode(&mut age).unwrap(), 25);
                assert!(rec.contains("name").unwrap());
                assert!(!rec.contains("height").unwrap());
            },
        );
    }

    #[test]
    fn file_level_name_key_is_rejected() {
        with_source("a\n", ReadBuffering::KeepAll, false, |d| {
            let mut file = d.keyed().unwrap();
            let err = file.nested("name").unwrap_err();
            match err.kind() {
                ErrorKind::InvalidPath { .. } => {}
                kind => panic!("bad kind: {:?}", kind),
            }
        });
    }

    #[test]
    fn nesting_below_field_level_is_rejected() {
        with_source("a\n", ReadBuffering::KeepAll, false, |d| {
            let mut file = d.unkeyed().unwrap();
            let mut rec_dec = file.next().unwrap();
            let mut rec = rec_dec.unkeyed().unwrap();
            let mut field = rec.next().unwrap();
            let err = field.unkeyed().unwrap_err();
            match err.kind() {
                ErrorKind::InvalidNestedContainer => {}
                kind => panic!("bad kind: {:?}", kind),
            }
            assert_eq!(err.coding_path().to_string(), "0/0");
        });
    }

    #[test]
    fn advancing_past_the_end_fails() {
        with_source("a\n", ReadBuffering::KeepAll, false, |d| {
            let mut file = d.unkeyed().unwrap();
            file.next().unwrap();
            assert!(file.is_at_end().unwrap());
            let err = file.next().unwrap_err();
            match err.kind() {
                ErrorKind::IsAtEnd => {}
                kind => panic!("bad kind: {:?}", kind),
            }
        });
    }

    #[test]
    fn file_single_value_requires_one_by_one() {
        with_source("lone\n", ReadBuffering::KeepAll, false, |d| {
            let mut sv = d.single_value().unwrap();
            assert_eq!(sv.decode_string().unwrap(), "lone");
        });
        with_source("a,b\n", ReadBuffering::KeepAll, false, |d| {
            let mut sv = d.single_value().unwrap();
            let err = sv.decode_string().unwrap_err();
            match err.kind() {
                ErrorKind::IsNotSingleColumn => {}
                kind => panic!("bad kind: {:?}", kind),
            }
        });
        with_source("a\nb\n", ReadBuffering::KeepAll, false, |d| {
            let mut sv = d.single_value().unwrap();
            assert!(sv.decode_string().is_err());
        });
    }

    #[test]
    fn record_single_value_requires_one_column() {
        with_source("a\nb\n", ReadBuffering::KeepAll, false, |d| {
            let mut file = d.keyed().unwrap();
            let mut row1 = file.nested(1u64).unwrap();
            let mut sv = row1.single_value().unwrap();
            assert_eq!(sv.decode_string().unwrap(), "b");
        });
    }

    #[test]
    fn mismatch_carries_text_and_path() {
        with_source("a,xyz\n", ReadBuffering::KeepAll, false, |d| {
            let mut file = d.unkeyed().unwrap();
            let mut row = file.next().unwrap();
            let mut rec = row.keyed().unwrap();
            let mut field = rec.nested(1u64).unwrap();
            let err = i64::decode(&mut field).unwrap_err();
            match err.kind() {
                ErrorKind::Mismatch { expected, value } => {
                    assert_eq!(expected, "i64");
                    assert_eq!(value, "xyz");
                }
                kind => panic!("bad kind: {:?}", kind),
            }
            assert_eq!(err.coding_path().to_string(), "0/1");
        });
    }

    #[test]
    fn optional_fields() {
        with_source("a,\n", ReadBuffering::KeepAll, false, |d| {
            let mut file = d.unkeyed().unwrap();
            let mut row = file.next().unwrap();
            let mut rec = row.unkeyed().unwrap();
            let some: Option<String> =
                Decode::decode(&mut rec.next().unwrap()).unwrap();
            let none: Option<String> =
                Decode::decode(&mut rec.next().unwrap()).unwrap();
            assert_eq!(some, Some("a".to_string()));
            assert_eq!(none, None);
        });
    }

    #[test]
    fn sequential_buffering_expires_random_access() {
        with_source(
            "a\nb\nc\nd\ne\nf\n",
            ReadBuffering::Sequential,
            false,
            |d| {
                let mut file = d.keyed().unwrap();
                let mut row5 = file.nested(5u64).unwrap();
                assert_eq!(
                    String::decode(&mut row5).unwrap(),
                    "f".to_string()
                );
                let mut row2 = file.nested(2u64).unwrap();
                let err = String::decode(&mut row2).unwrap_err();
                match err.kind() {
                    ErrorKind::ExpiredCache { row } => assert_eq!(*row, 2),
                    kind => panic!("bad kind: {:?}", kind),
                }
            },
        );
    }
}
