use std::fs::File;
use std::io;
use std::path::Path;

use csvcodec_core::{
    Encoding, HeaderPolicy, Reader as CoreReader,
    ReaderBuilder as CoreReaderBuilder, Status, TrimPolicy,
};

use crate::buffer::ReadBuffering;
use crate::decoder::{Decode, Decoder};
use crate::error::{read_error, Error, ErrorKind, Result};
use crate::source::Source;

/// Builds a CSV decoder with various configuration knobs.
///
/// This forwards the dialect configuration to the core reader and adds
/// the codec-level buffering strategy.
#[derive(Clone, Debug, Default)]
pub struct ReaderBuilder {
    core: CoreReaderBuilder,
    buffering: ReadBuffering,
}

impl ReaderBuilder {
    /// Create a new builder for configuring CSV decoding.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// The field delimiter to use when parsing CSV. The default is `","`.
    pub fn field_delimiter(&mut self, delim: &str) -> &mut ReaderBuilder {
        self.core.field_delimiter(delim);
        self
    }

    /// The row delimiter to use when parsing CSV. The default is `"\n"`.
    pub fn row_delimiter(&mut self, delim: &str) -> &mut ReaderBuilder {
        self.core.row_delimiter(delim);
        self
    }

    /// The escape scalar. The default is `"`; `None` disables quoting.
    pub fn escape(&mut self, escape: Option<char>) -> &mut ReaderBuilder {
        self.core.escape(escape);
        self
    }

    /// How the first row is interpreted. The default is
    /// `HeaderPolicy::None`.
    pub fn header(&mut self, policy: HeaderPolicy) -> &mut ReaderBuilder {
        self.core.header(policy);
        self
    }

    /// Which scalars are discarded at field boundaries.
    pub fn trim(&mut self, trim: TrimPolicy) -> &mut ReaderBuilder {
        self.core.trim(trim);
        self
    }

    /// The presumed input encoding; `None` infers it.
    pub fn encoding(
        &mut self,
        encoding: Option<Encoding>,
    ) -> &mut ReaderBuilder {
        self.core.encoding(encoding);
        self
    }

    /// How produced rows are retained for random access during
    /// structured decoding. The default is `ReadBuffering::KeepAll`.
    pub fn buffering(&mut self, strategy: ReadBuffering) -> &mut ReaderBuilder {
        self.buffering = strategy;
        self
    }

    /// Build a CSV reader from this configuration that reads from `rdr`.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Result<Reader<R>> {
        let core = self.core.from_reader(rdr).map_err(read_error)?;
        Ok(Reader { core, buffering: self.buffering })
    }

    /// Build a CSV reader that reads from the file at `path`.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Reader<File>> {
        let core = self.core.from_path(path).map_err(read_error)?;
        Ok(Reader { core, buffering: self.buffering })
    }
}

/// A CSV reader.
///
/// Rows can be pulled one at a time with `read_row`, deserialized with
/// serde through `deserialize`, or the whole input can be decoded into a
/// `Decode` type through the container tree with `decode`.
#[derive(Debug)]
pub struct Reader<R> {
    core: CoreReader<R>,
    buffering: ReadBuffering,
}

impl<R: io::Read> Reader<R> {
    /// Create a reader over `rdr` with the default configuration.
    pub fn from_reader(rdr: R) -> Result<Reader<R>> {
        ReaderBuilder::new().from_reader(rdr)
    }

    /// Read the next row. Returns `Ok(None)` at end of input.
    pub fn read_row(&mut self) -> Result<Option<Vec<String>>> {
        self.core.read_row().map_err(read_error)
    }

    /// The header row, when one exists under the configured policy.
    pub fn headers(&mut self) -> Result<Option<&[String]>> {
        self.core.headers().map_err(read_error)
    }

    /// The index of the row the reader will produce next.
    pub fn row_index(&self) -> u64 {
        self.core.row_index()
    }

    /// The best-known `(rows_read, expected_fields_per_row)` pair.
    pub fn count(&self) -> (u64, u64) {
        self.core.count()
    }

    /// The lifecycle state of this reader.
    pub fn status(&self) -> Status {
        self.core.status()
    }

    /// The encoding chosen for this input.
    pub fn encoding(&self) -> Encoding {
        self.core.encoding()
    }

    /// Decode the whole input into `T` through the container tree.
    ///
    /// The reader must be fresh: once rows have been pulled through
    /// `read_row` or `deserialize`, the container tree would observe a
    /// truncated file, so this reports `AlreadyParsed`.
    pub fn decode<T: Decode>(self) -> Result<T> {
        let (rows_read, _) = self.core.count();
        if rows_read > 0 {
            return Err(Error::new(ErrorKind::AlreadyParsed));
        }
        let mut source = Source::new(self.core, self.buffering);
        let mut decoder = Decoder::file(&mut source);
        T::decode(&mut decoder)
    }

    /// Unwrap this reader into its source bridge, for direct coordinate
    /// access.
    pub fn into_source(self) -> Source<R> {
        Source::new(self.core, self.buffering)
    }

    /// An iterator that deserializes each remaining row into `T`.
    ///
    /// With headers enabled, struct fields are matched to columns by
    /// header name; otherwise rows deserialize positionally.
    #[cfg(feature = "serde")]
    pub fn deserialize<T>(&mut self) -> Result<DeserializeIter<'_, R, T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let headers = self.headers()?.map(|h| h.to_vec());
        Ok(DeserializeIter {
            reader: self,
            headers,
            _marker: std::marker::PhantomData,
        })
    }
}

/// An iterator over deserialized rows. Created by `Reader::deserialize`.
#[cfg(feature = "serde")]
pub struct DeserializeIter<'r, R, T> {
    reader: &'r mut Reader<R>,
    headers: Option<Vec<String>>,
    _marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'r, R, T> Iterator for DeserializeIter<'r, R, T>
where
    R: io::Read,
    T: serde::de::DeserializeOwned,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        let row_index = self.reader.row_index();
        match self.reader.read_row() {
            Ok(None) => None,
            Ok(Some(row)) => {
                let deserialized = crate::serde_impl::deserialize_row(
                    &row,
                    self.headers.as_deref(),
                );
                Some(deserialized.map_err(|err| match err.into_kind() {
                    ErrorKind::Deserialize { err, .. } => {
                        Error::new(ErrorKind::Deserialize {
                            row: Some(row_index),
                            err,
                        })
                    }
                    kind => Error::new(kind),
                }))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Reader, ReaderBuilder};
    use crate::error::ErrorKind;

    #[test]
    fn row_interface_forwards() {
        let mut rdr =
            Reader::from_reader("a,b\nc,d\n".as_bytes()).unwrap();
        assert_eq!(
            rdr.read_row().unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(rdr.row_index(), 1);
    }

    #[test]
    fn decode_whole_file() {
        let rdr = Reader::from_reader("a,b\nc,d\n".as_bytes()).unwrap();
        let rows: Vec<Vec<String>> = rdr.decode().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["c".to_string(), "d".to_string()]);
    }

    #[test]
    fn decode_after_read_row_is_already_parsed() {
        let mut rdr =
            Reader::from_reader("a\nb\n".as_bytes()).unwrap();
        rdr.read_row().unwrap();
        let err = rdr.decode::<Vec<Vec<String>>>().unwrap_err();
        match err.kind() {
            ErrorKind::AlreadyParsed => {}
            kind => panic!("bad kind: {:?}", kind),
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_rows_positionally() {
        let mut rdr =
            Reader::from_reader("1,a\n2,b\n".as_bytes()).unwrap();
        let rows: Vec<(u64, String)> = rdr
            .deserialize()
            .unwrap()
            .collect::<crate::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(rows, vec![(1, "a".to_string()), (2, "b".to_string())]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_error_cites_row() {
        let mut rdr = ReaderBuilder::new()
            .from_reader("1\nx\n".as_bytes())
            .unwrap();
        let rows: Vec<crate::Result<u64>> =
            rdr.deserialize().unwrap().collect();
        assert!(rows[0].is_ok());
        let err = rows[1].as_ref().unwrap_err();
        match err.kind() {
            ErrorKind::Deserialize { row: Some(1), .. } => {}
            kind => panic!("bad kind: {:?}", kind),
        }
    }
}
