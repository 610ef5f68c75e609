use std::collections::HashMap;
use std::io;

use log::trace;

use csvcodec_core::Writer as CoreWriter;

use crate::buffer::{FieldBuffer, WriteBuffering};
use crate::error::{write_error, Error, ErrorKind, Result};
use crate::key::Key;

/// The write side of the codec bridge.
///
/// A sink layers random access by `(row, field)` coordinate over the
/// sequential writer. Under `KeepAll`, every field is staged and the
/// grid is flushed when the encoding completes. Under `Assembled` and
/// `Sequential`, a field at the writer's focus is written through
/// immediately, a field ahead of it is staged, and a field behind it
/// reports `WritingSurpassed`.
#[derive(Debug)]
pub struct Sink<W: io::Write> {
    writer: CoreWriter<W>,
    strategy: WriteBuffering,
    staged: FieldBuffer,
    /// The configured header row, kept for name resolution.
    headers: Option<Vec<String>>,
    header_index: Option<HashMap<String, u64>>,
    completed: bool,
}

impl<W: io::Write> Sink<W> {
    /// Wrap a writer.
    ///
    /// `headers` must be the header row the writer was configured with,
    /// when there is one; it settles the row width and resolves name
    /// keys. `Assembled` buffering requires it.
    pub fn new(
        writer: CoreWriter<W>,
        headers: Option<Vec<String>>,
        strategy: WriteBuffering,
    ) -> Result<Sink<W>> {
        if strategy == WriteBuffering::Assembled && headers.is_none() {
            return Err(write_error(csvcodec_core::Error::configuration(
                "assembled buffering requires a configured header row to \
                 settle the row width",
            )));
        }
        Ok(Sink {
            writer,
            strategy,
            staged: FieldBuffer::new(),
            headers,
            header_index: None,
            completed: false,
        })
    }

    /// The row width, when it is already settled.
    pub fn known_width(&self) -> Option<u64> {
        if let Some(ref headers) = self.headers {
            return Some(headers.len() as u64);
        }
        let expected = self.writer.expected_fields();
        if expected > 0 {
            Some(expected)
        } else {
            None
        }
    }

    /// The coordinate the writer will emit next.
    pub fn focus(&self) -> (u64, u64) {
        (self.writer.row_index(), self.writer.field_index())
    }

    /// Put one field value at a coordinate.
    pub fn put(&mut self, value: String, row: u64, field: u64) -> Result<()> {
        if self.completed {
            return Err(Error::new(ErrorKind::InvalidPath {
                msg: "the encoding has already been completed".to_string(),
            }));
        }
        if self.strategy == WriteBuffering::KeepAll {
            // Everything is retained until `complete`; the focus never
            // advances, so no coordinate is ever surpassed.
            self.staged.stage(row, field, value);
            return Ok(());
        }
        if (row, field) < self.focus() {
            return Err(Error::new(ErrorKind::WritingSurpassed {
                row,
                field,
            }));
        }
        self.staged.stage(row, field, value);
        self.drain()
    }

    /// Write staged fields through the writer for as long as the staged
    /// grid is contiguous at the focus.
    fn drain(&mut self) -> Result<()> {
        loop {
            if let Some(width) = self.known_width() {
                if self.writer.field_index() == width {
                    trace!(
                        "row {} filled, flushing",
                        self.writer.row_index()
                    );
                    self.writer.end_row().map_err(write_error)?;
                }
            }
            let (row, field) = self.focus();
            match self.staged.take(row, field) {
                Some(value) => {
                    self.writer.write_field(&value).map_err(write_error)?;
                }
                None => return Ok(()),
            }
        }
    }

    /// Flush every remaining staged field and finish the writer.
    ///
    /// Staged rows and fields are emitted in ascending coordinate order;
    /// gaps are padded with empty fields and empty rows. A staged field
    /// that cannot fit within the settled row width is `CorruptedBuffer`.
    pub fn complete(&mut self) -> Result<()> {
        if self.completed {
            return Ok(());
        }
        let pending_row = if self.writer.field_index() > 0 {
            Some(self.writer.row_index())
        } else {
            None
        };
        let last_row = match (self.staged.max_row(), pending_row) {
            (Some(staged), Some(pending)) => Some(staged.max(pending)),
            (staged, pending) => staged.or(pending),
        };
        if let Some(last_row) = last_row {
            let width = match self.known_width() {
                Some(width) => {
                    if self.staged.max_field().map_or(false, |f| f >= width) {
                        return Err(Error::new(ErrorKind::CorruptedBuffer {
                            msg: format!(
                                "{} staged fields lie beyond the row width \
                                 of {}",
                                self.staged.len(),
                                width
                            ),
                        }));
                    }
                    width
                }
                None => self
                    .staged
                    .max_field()
                    .map(|f| f + 1)
                    .unwrap_or(0)
                    .max(self.writer.field_index()),
            };
            trace!(
                "completing encoding: flushing through row {} at width {}",
                last_row,
                width
            );
            for row in self.writer.row_index()..=last_row {
                while self.writer.field_index() < width {
                    let field = self.writer.field_index();
                    let value =
                        self.staged.take(row, field).unwrap_or_default();
                    self.writer.write_field(&value).map_err(write_error)?;
                }
                self.writer.end_row().map_err(write_error)?;
            }
        }
        if !self.staged.is_empty() {
            return Err(Error::new(ErrorKind::CorruptedBuffer {
                msg: format!(
                    "{} staged fields could not be flushed",
                    self.staged.len()
                ),
            }));
        }
        self.writer.end_encoding().map_err(write_error)?;
        self.completed = true;
        Ok(())
    }

    /// Resolve a key to a column index against the configured headers.
    pub fn field_index_for(&mut self, key: &Key) -> Result<u64> {
        let name = match *key {
            Key::Index(i) => return Ok(i),
            Key::Name(ref name) => name,
        };
        if self.header_index.is_none() {
            self.header_index = Some(self.build_header_index()?);
        }
        let index = self.header_index.as_ref().and_then(|m| m.get(name));
        match index {
            Some(&i) => Ok(i),
            None => Err(Error::new(ErrorKind::UnmatchedHeader {
                name: name.clone(),
            })),
        }
    }

    fn build_header_index(&mut self) -> Result<HashMap<String, u64>> {
        let headers = match self.headers {
            Some(ref headers) => headers,
            None => return Err(Error::new(ErrorKind::EmptyHeader)),
        };
        let mut map = HashMap::with_capacity(headers.len());
        for (i, name) in headers.iter().enumerate() {
            if map.insert(name.clone(), i as u64).is_some() {
                return Err(Error::new(ErrorKind::InvalidHashableHeader {
                    name: name.clone(),
                }));
            }
        }
        Ok(map)
    }

    /// Unwrap the underlying output, flushing buffered bytes.
    ///
    /// Meaningful only after `complete`.
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(write_error)
    }
}

#[cfg(test)]
mod tests {
    use csvcodec_core::WriterBuilder;

    use super::Sink;
    use crate::buffer::WriteBuffering;
    use crate::error::ErrorKind;
    use crate::key::Key;

    fn sink(strategy: WriteBuffering) -> Sink<Vec<u8>> {
        let wtr = WriterBuilder::new().from_memory().unwrap();
        Sink::new(wtr, None, strategy).unwrap()
    }

    fn sink_with_headers(
        strategy: WriteBuffering,
        headers: &[&str],
    ) -> Sink<Vec<u8>> {
        let headers: Vec<String> =
            headers.iter().map(|h| h.to_string()).collect();
        let wtr = WriterBuilder::new()
            .headers(headers.clone())
            .from_memory()
            .unwrap();
        Sink::new(wtr, Some(headers), strategy).unwrap()
    }

    fn output(mut sink: Sink<Vec<u8>>) -> String {
        sink.complete().unwrap();
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn keep_all_accepts_any_order() {
        let mut sink = sink(WriteBuffering::KeepAll);
        sink.put("d".to_string(), 1, 1).unwrap();
        sink.put("a".to_string(), 0, 0).unwrap();
        sink.put("b".to_string(), 0, 1).unwrap();
        sink.put("c".to_string(), 1, 0).unwrap();
        assert_eq!(output(sink), "a,b\nc,d\n");
    }

    #[test]
    fn keep_all_allows_overwrites() {
        let mut sink = sink(WriteBuffering::KeepAll);
        sink.put("x".to_string(), 0, 0).unwrap();
        sink.put("a".to_string(), 0, 0).unwrap();
        sink.put("b".to_string(), 0, 1).unwrap();
        assert_eq!(output(sink), "a,b\n");
    }

    #[test]
    fn keep_all_pads_gaps() {
        let mut sink = sink(WriteBuffering::KeepAll);
        sink.put("d".to_string(), 2, 1).unwrap();
        assert_eq!(output(sink), ",\n,\n,d\n");
    }

    #[test]
    fn sequential_writes_through_in_order() {
        let mut sink = sink(WriteBuffering::Sequential);
        sink.put("a".to_string(), 0, 0).unwrap();
        sink.put("b".to_string(), 0, 1).unwrap();
        assert_eq!(output(sink), "a,b\n");
    }

    #[test]
    fn sequential_rejects_surpassed_coordinates() {
        let mut sink = sink(WriteBuffering::Sequential);
        sink.put("a".to_string(), 0, 0).unwrap();
        sink.put("b".to_string(), 0, 1).unwrap();
        let err = sink.put("x".to_string(), 0, 0).unwrap_err();
        match err.kind() {
            ErrorKind::WritingSurpassed { row, field } => {
                assert_eq!((*row, *field), (0, 0));
            }
            kind => panic!("bad kind: {:?}", kind),
        }
    }

    #[test]
    fn sequential_stages_ahead_of_focus() {
        let mut sink = sink(WriteBuffering::Sequential);
        sink.put("b".to_string(), 0, 1).unwrap();
        sink.put("a".to_string(), 0, 0).unwrap();
        assert_eq!(output(sink), "a,b\n");
    }

    #[test]
    fn assembled_requires_headers() {
        let wtr = WriterBuilder::new().from_memory().unwrap();
        assert!(Sink::new(wtr, None, WriteBuffering::Assembled).is_err());
    }

    #[test]
    fn assembled_flushes_filled_rows() {
        let mut sink =
            sink_with_headers(WriteBuffering::Assembled, &["x", "y"]);
        sink.put("b".to_string(), 0, 1).unwrap();
        sink.put("a".to_string(), 0, 0).unwrap();
        // Row 0 has been emitted; rewriting it is an error.
        let err = sink.put("z".to_string(), 0, 0).unwrap_err();
        match err.kind() {
            ErrorKind::WritingSurpassed { .. } => {}
            kind => panic!("bad kind: {:?}", kind),
        }
        sink.put("c".to_string(), 1, 0).unwrap();
        assert_eq!(output(sink), "x,y\na,b\nc,\n");
    }

    #[test]
    fn staged_field_beyond_width_is_corrupted_buffer() {
        let mut sink =
            sink_with_headers(WriteBuffering::KeepAll, &["x", "y"]);
        sink.put("far".to_string(), 0, 5).unwrap();
        let err = sink.complete().unwrap_err();
        match err.kind() {
            ErrorKind::CorruptedBuffer { .. } => {}
            kind => panic!("bad kind: {:?}", kind),
        }
    }

    #[test]
    fn complete_is_idempotent() {
        let mut sink = sink(WriteBuffering::Sequential);
        sink.put("a".to_string(), 0, 0).unwrap();
        sink.complete().unwrap();
        sink.complete().unwrap();
    }

    #[test]
    fn put_after_complete_fails() {
        let mut sink = sink(WriteBuffering::Sequential);
        sink.put("a".to_string(), 0, 0).unwrap();
        sink.complete().unwrap();
        assert!(sink.put("b".to_string(), 1, 0).is_err());
    }

    #[test]
    fn empty_completion_writes_headers_alone() {
        let sink = sink_with_headers(WriteBuffering::KeepAll, &["x", "y"]);
        assert_eq!(output(sink), "x,y\n");
    }

    #[test]
    fn name_keys_resolve_against_headers() {
        let mut sink =
            sink_with_headers(WriteBuffering::KeepAll, &["x", "y"]);
        assert_eq!(
            sink.field_index_for(&Key::Name("y".to_string())).unwrap(),
            1
        );
        assert!(sink
            .field_index_for(&Key::Name("z".to_string()))
            .is_err());
        assert_eq!(sink.field_index_for(&Key::Index(4)).unwrap(), 4);
    }

    #[test]
    fn name_keys_without_headers_fail() {
        let mut sink = sink(WriteBuffering::KeepAll);
        let err =
            sink.field_index_for(&Key::Name("x".to_string())).unwrap_err();
        match err.kind() {
            ErrorKind::EmptyHeader => {}
            kind => panic!("bad kind: {:?}", kind),
        }
    }
}
