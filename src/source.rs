use std::collections::HashMap;
use std::io;

use csvcodec_core::{Reader as CoreReader, Status};

use crate::buffer::{ReadBuffering, RowBuffer};
use crate::error::{read_error, Error, ErrorKind, Result};
use crate::key::Key;

/// The read side of the codec bridge.
///
/// A source layers random access by `(row, field)` coordinate over the
/// sequential reader: rows are pulled on demand and retained according
/// to the buffering strategy. All container code funnels through the
/// single `field` primitive.
#[derive(Debug)]
pub struct Source<R> {
    reader: CoreReader<R>,
    buffer: RowBuffer,
    header_index: Option<HashMap<String, u64>>,
}

impl<R: io::Read> Source<R> {
    pub fn new(reader: CoreReader<R>, strategy: ReadBuffering) -> Source<R> {
        Source {
            reader,
            buffer: RowBuffer::new(strategy),
            header_index: None,
        }
    }

    /// The field at the given coordinate.
    ///
    /// Rows not yet produced are pulled from the reader; rows already
    /// produced are served from the buffer, or report `ExpiredCache`
    /// when the strategy evicted them.
    pub fn field(&mut self, row: u64, field: u64) -> Result<String> {
        self.pull_to(row)?;
        let fields = match self.buffer.retrieve(row) {
            Some(fields) => fields,
            None => {
                return Err(Error::new(ErrorKind::ExpiredCache { row }));
            }
        };
        match fields.get(field as usize) {
            Some(value) => Ok(value.clone()),
            None => Err(Error::new(ErrorKind::FieldOutOfBounds {
                field,
                width: fields.len() as u64,
            })),
        }
    }

    /// The number of data rows, known only once the reader has finished
    /// or failed.
    pub fn num_rows(&self) -> Option<u64> {
        match self.reader.status() {
            Status::Active => None,
            Status::Finished | Status::Failed => Some(self.reader.count().0),
        }
    }

    /// The width of rows in this input.
    ///
    /// Pulls the first row when necessary; `None` when the input has no
    /// rows at all.
    pub fn row_width(&mut self) -> Result<Option<u64>> {
        let (_, expected) = self.reader.count();
        if expected > 0 {
            return Ok(Some(expected));
        }
        // The first row (or the header row alone) settles the width.
        self.is_row_at_end(0)?;
        let (_, expected) = self.reader.count();
        Ok(if expected > 0 { Some(expected) } else { None })
    }

    /// Whether row `i` lies at or beyond the end of the input.
    ///
    /// Attempts to pull rows up to `i`; returns true when the input is
    /// exhausted first.
    pub fn is_row_at_end(&mut self, i: u64) -> Result<bool> {
        while self.reader.row_index() <= i
            && self.reader.status() == Status::Active
        {
            match self.reader.read_row() {
                Ok(Some(row)) => {
                    let index = self.reader.row_index() - 1;
                    self.buffer.store(index, row);
                }
                Ok(None) => break,
                Err(err) => return Err(read_error(err)),
            }
        }
        Ok(i >= self.reader.count().0)
    }

    /// The header row, when the configuration yields one.
    pub fn headers(&mut self) -> Result<Option<Vec<String>>> {
        match self.reader.headers() {
            Ok(headers) => Ok(headers.map(|h| h.to_vec())),
            Err(err) => Err(read_error(err)),
        }
    }

    /// Resolve a key to a column index.
    ///
    /// Integer keys resolve to themselves. Name keys are looked up in a
    /// map from header name to column index, built on first use.
    pub fn field_index_for(&mut self, key: &Key) -> Result<u64> {
        let name = match *key {
            Key::Index(i) => return Ok(i),
            Key::Name(ref name) => name,
        };
        if self.header_index.is_none() {
            self.header_index = Some(self.build_header_index()?);
        }
        // The map was just populated above.
        let index = self.header_index.as_ref().and_then(|m| m.get(name));
        match index {
            Some(&i) => Ok(i),
            None => Err(Error::new(ErrorKind::UnmatchedHeader {
                name: name.clone(),
            })),
        }
    }

    fn build_header_index(&mut self) -> Result<HashMap<String, u64>> {
        let headers = match self.headers()? {
            Some(headers) => headers,
            None => return Err(Error::new(ErrorKind::EmptyHeader)),
        };
        let mut map = HashMap::with_capacity(headers.len());
        for (i, name) in headers.into_iter().enumerate() {
            if map.insert(name.clone(), i as u64).is_some() {
                return Err(Error::new(ErrorKind::InvalidHashableHeader {
                    name,
                }));
            }
        }
        Ok(map)
    }

    /// Pull rows from the reader until `row` has been produced, storing
    /// each into the buffer.
    fn pull_to(&mut self, row: u64) -> Result<()> {
        while self.reader.row_index() <= row {
            match self.reader.status() {
                Status::Active => {}
                Status::Finished => {
                    return Err(Error::new(ErrorKind::RowOutOfBounds {
                        row,
                        num_rows: self.reader.count().0,
                    }));
                }
                Status::Failed => {
                    // Re-raise the reader's sticky error.
                    return match self.reader.read_row() {
                        Err(err) => Err(read_error(err)),
                        Ok(_) => unreachable!(),
                    };
                }
            }
            match self.reader.read_row() {
                Ok(Some(produced)) => {
                    let index = self.reader.row_index() - 1;
                    self.buffer.store(index, produced);
                }
                Ok(None) => {
                    return Err(Error::new(ErrorKind::RowOutOfBounds {
                        row,
                        num_rows: self.reader.count().0,
                    }));
                }
                Err(err) => return Err(read_error(err)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use csvcodec_core::{HeaderPolicy, ReaderBuilder};

    use super::Source;
    use crate::buffer::ReadBuffering;
    use crate::error::ErrorKind;
    use crate::key::Key;

    fn source(data: &'static str, strategy: ReadBuffering) -> Source<&[u8]> {
        let rdr =
            ReaderBuilder::new().from_reader(data.as_bytes()).unwrap();
        Source::new(rdr, strategy)
    }

    fn source_with_headers(data: &'static str) -> Source<&[u8]> {
        let rdr = ReaderBuilder::new()
            .header(HeaderPolicy::FirstLine)
            .from_reader(data.as_bytes())
            .unwrap();
        Source::new(rdr, ReadBuffering::KeepAll)
    }

    #[test]
    fn random_access_with_keep_all() {
        let mut src = source("a,b\nc,d\ne,f\n", ReadBuffering::KeepAll);
        assert_eq!(src.field(2, 1).unwrap(), "f");
        assert_eq!(src.field(0, 0).unwrap(), "a");
        assert_eq!(src.field(1, 1).unwrap(), "d");
    }

    #[test]
    fn sequential_expires_earlier_rows() {
        let mut src = source("a\nb\nc\nd\ne\nf\n", ReadBuffering::Sequential);
        assert_eq!(src.field(5, 0).unwrap(), "f");
        let err = src.field(2, 0).unwrap_err();
        match err.kind() {
            ErrorKind::ExpiredCache { row } => assert_eq!(*row, 2),
            kind => panic!("bad kind: {:?}", kind),
        }
    }

    #[test]
    fn sequential_can_reread_current_row() {
        let mut src = source("a,b\nc,d\n", ReadBuffering::Sequential);
        assert_eq!(src.field(1, 0).unwrap(), "c");
        assert_eq!(src.field(1, 1).unwrap(), "d");
    }

    #[test]
    fn row_out_of_bounds() {
        let mut src = source("a\nb\n", ReadBuffering::KeepAll);
        let err = src.field(5, 0).unwrap_err();
        match err.kind() {
            ErrorKind::RowOutOfBounds { row, num_rows } => {
                assert_eq!((*row, *num_rows), (5, 2));
            }
            kind => panic!("bad kind: {:?}", kind),
        }
    }

    #[test]
    fn field_out_of_bounds() {
        let mut src = source("a,b\n", ReadBuffering::KeepAll);
        let err = src.field(0, 7).unwrap_err();
        match err.kind() {
            ErrorKind::FieldOutOfBounds { field, width } => {
                assert_eq!((*field, *width), (7, 2));
            }
            kind => panic!("bad kind: {:?}", kind),
        }
    }

    #[test]
    fn num_rows_known_after_exhaustion() {
        let mut src = source("a\nb\n", ReadBuffering::KeepAll);
        assert_eq!(src.num_rows(), None);
        assert!(src.is_row_at_end(10).unwrap());
        assert_eq!(src.num_rows(), Some(2));
    }

    #[test]
    fn is_row_at_end_within_bounds() {
        let mut src = source("a\nb\n", ReadBuffering::KeepAll);
        assert!(!src.is_row_at_end(0).unwrap());
        assert!(!src.is_row_at_end(1).unwrap());
        assert!(src.is_row_at_end(2).unwrap());
    }

    #[test]
    fn key_resolution_by_index_and_name() {
        let mut src = source_with_headers("name,age\nalice,39\n");
        assert_eq!(src.field_index_for(&Key::Index(1)).unwrap(), 1);
        assert_eq!(
            src.field_index_for(&Key::Name("age".to_string())).unwrap(),
            1
        );
        let err = src
            .field_index_for(&Key::Name("height".to_string()))
            .unwrap_err();
        match err.kind() {
            ErrorKind::UnmatchedHeader { name } => assert_eq!(name, "height"),
            kind => panic!("bad kind: {:?}", kind),
        }
    }

    #[test]
    fn name_lookup_without_headers_fails() {
        let mut src = source("a,b\n", ReadBuffering::KeepAll);
        let err = src
            .field_index_for(&Key::Name("a".to_string()))
            .unwrap_err();
        match err.kind() {
            ErrorKind::EmptyHeader => {}
            kind => panic!("bad kind: {:?}", kind),
        }
    }

    #[test]
    fn duplicate_headers_fail_name_lookup() {
        let mut src = source_with_headers("a,a\n1,2\n");
        let err = src
            .field_index_for(&Key::Name("a".to_string()))
            .unwrap_err();
        match err.kind() {
            ErrorKind::InvalidHashableHeader { name } => assert_eq!(name, "a"),
            kind => panic!("bad kind: {:?}", kind),
        }
    }

    #[test]
    fn headers_are_not_data_rows() {
        let mut src = source_with_headers("name,age\nalice,39\n");
        assert_eq!(src.field(0, 0).unwrap(), "alice");
        assert!(src.is_row_at_end(1).unwrap());
    }
}
