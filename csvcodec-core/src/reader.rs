use std::collections::VecDeque;
use std::fs::File;
use std::io;
use std::path::Path;

use log::debug;

use crate::encoding::Encoding;
use crate::error::{Error, ErrorKind, Result, Sticky};
use crate::scalar::ScalarSource;
use crate::settings::{Delimiters, HeaderPolicy, TrimPolicy};

/// Builds a CSV reader with various configuration knobs.
///
/// This builder can be used to tweak the field and row delimiters, the
/// escape scalar, header handling, trimming and the presumed encoding.
/// Once a `Reader` is built, its configuration cannot be changed.
#[derive(Clone, Debug)]
pub struct ReaderBuilder {
    field_delimiter: String,
    row_delimiter: String,
    escape: Option<char>,
    header: HeaderPolicy,
    trim: TrimPolicy,
    encoding: Option<Encoding>,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder {
            field_delimiter: ",".to_string(),
            row_delimiter: "\n".to_string(),
            escape: Some('"'),
            header: HeaderPolicy::None,
            trim: TrimPolicy::None,
            encoding: None,
        }
    }
}

impl ReaderBuilder {
    /// Create a new builder for configuring CSV parsing.
    ///
    /// To convert a builder into a reader, call one of the methods
    /// starting with `from_`.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// The field delimiter to use when parsing CSV.
    ///
    /// Any non-empty sequence of scalars is accepted. The default is `","`.
    pub fn field_delimiter(&mut self, delim: &str) -> &mut ReaderBuilder {
        self.field_delimiter = delim.to_string();
        self
    }

    /// The row delimiter to use when parsing CSV.
    ///
    /// Any non-empty sequence of scalars is accepted. The default is
    /// `"\n"`.
    pub fn row_delimiter(&mut self, delim: &str) -> &mut ReaderBuilder {
        self.row_delimiter = delim.to_string();
        self
    }

    /// The escape scalar, which both surrounds quoted fields and escapes
    /// itself when doubled inside one.
    ///
    /// The default is `"`. Passing `None` disables quoting entirely.
    pub fn escape(&mut self, escape: Option<char>) -> &mut ReaderBuilder {
        self.escape = escape;
        self
    }

    /// How the first row of the input is interpreted.
    ///
    /// The default is `HeaderPolicy::None`.
    pub fn header(&mut self, policy: HeaderPolicy) -> &mut ReaderBuilder {
        self.header = policy;
        self
    }

    /// Which scalars are discarded at field boundaries, outside quoting.
    ///
    /// The default is `TrimPolicy::None`.
    pub fn trim(&mut self, trim: TrimPolicy) -> &mut ReaderBuilder {
        self.trim = trim;
        self
    }

    /// The presumed input encoding.
    ///
    /// The default, `None`, infers the encoding from a byte-order mark or
    /// from UTF-8 validation of the leading bytes.
    pub fn encoding(&mut self, encoding: Option<Encoding>) -> &mut ReaderBuilder {
        self.encoding = encoding;
        self
    }

    /// Build a CSV reader from this configuration that reads from `rdr`.
    ///
    /// Note that the reader buffers its input internally, so `rdr` should
    /// not be wrapped in a `io::BufReader`.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Result<Reader<R>> {
        Reader::new(self, rdr)
    }

    /// Build a CSV reader from this configuration that reads from the
    /// file at `path`.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Reader<File>> {
        Reader::new(self, File::open(path)?)
    }
}

/// The lifecycle state of a reader or writer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// More rows may follow.
    Active,
    /// The input was exhausted cleanly.
    Finished,
    /// An error was reported. The state machine is permanently unusable
    /// and repeats the same error kind on every subsequent call.
    Failed,
}

/// Which delimiter sequence to match against.
#[derive(Clone, Copy)]
enum Delim {
    Field,
    Row,
}

/// How a field ended.
enum FieldEnd {
    Delim,
    Row,
    Eof,
}

/// A streaming CSV reader.
///
/// Rows are produced in input order as vectors of field strings, with
/// delimiters stripped, escapes resolved and trimming applied. After the
/// first row, every row must have the same number of fields.
#[derive(Debug)]
pub struct Reader<R> {
    scalars: ScalarSource<R>,
    delims: Delimiters,
    trim: TrimPolicy,
    header_policy: HeaderPolicy,
    headers: Option<Vec<String>>,
    headers_done: bool,
    /// A data row parsed while resolving `HeaderPolicy::Infer`, awaiting
    /// delivery.
    pending_row: Option<Vec<String>>,
    lookahead: VecDeque<char>,
    row_index: u64,
    rows_read: u64,
    expected: u64,
    status: Status,
    sticky: Option<Sticky>,
}

impl<R: io::Read> Reader<R> {
    fn new(builder: &ReaderBuilder, rdr: R) -> Result<Reader<R>> {
        let delims = Delimiters::resolve(
            &builder.field_delimiter,
            &builder.row_delimiter,
            builder.escape,
            &builder.trim,
        )?;
        let scalars = ScalarSource::open(rdr, builder.encoding)?;
        Ok(Reader {
            scalars,
            delims,
            trim: builder.trim.clone(),
            header_policy: builder.header,
            headers: None,
            headers_done: false,
            pending_row: None,
            lookahead: VecDeque::new(),
            row_index: 0,
            rows_read: 0,
            expected: 0,
            status: Status::Active,
            sticky: None,
        })
    }

    /// The encoding chosen for this input.
    pub fn encoding(&self) -> Encoding {
        self.scalars.encoding()
    }

    /// The index of the row the reader will produce next.
    pub fn row_index(&self) -> u64 {
        self.row_index
    }

    /// The best-known `(rows_read, expected_fields_per_row)` pair.
    ///
    /// The expected width is `0` until the first row (or the header row)
    /// has been read.
    pub fn count(&self) -> (u64, u64) {
        (self.rows_read, self.expected)
    }

    /// The lifecycle state of this reader.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The header row, when one exists under the configured policy.
    ///
    /// Forces header resolution, which may read the first row of the
    /// input.
    pub fn headers(&mut self) -> Result<Option<&[String]>> {
        if let Some(ref sticky) = self.sticky {
            return Err(Error::resurface(sticky));
        }
        if !self.headers_done {
            if let Err(err) = self.resolve_headers() {
                return Err(self.fail(err));
            }
        }
        Ok(self.headers.as_deref())
    }

    /// Read the next row.
    ///
    /// Returns `Ok(None)` once the input is exhausted. Any error is
    /// permanent: the reader's status becomes `Failed` and subsequent
    /// calls report the same error kind.
    pub fn read_row(&mut self) -> Result<Option<Vec<String>>> {
        if let Some(ref sticky) = self.sticky {
            return Err(Error::resurface(sticky));
        }
        if self.status == Status::Finished {
            return Ok(None);
        }
        match self.read_row_inner() {
            Ok(row) => Ok(row),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn read_row_inner(&mut self) -> Result<Option<Vec<String>>> {
        if !self.headers_done {
            self.resolve_headers()?;
            if self.status == Status::Finished {
                return Ok(None);
            }
        }
        if let Some(row) = self.pending_row.take() {
            self.row_index += 1;
            self.rows_read += 1;
            return Ok(Some(row));
        }
        self.scalars.set_row(self.row_index);
        match self.parse_row()? {
            None => {
                self.status = Status::Finished;
                Ok(None)
            }
            Some(row) => {
                self.enforce_width(row.len())?;
                self.row_index += 1;
                self.rows_read += 1;
                Ok(Some(row))
            }
        }
    }

    fn fail(&mut self, err: Error) -> Error {
        self.status = Status::Failed;
        self.sticky = Some(err.sticky());
        err
    }

    /// Applies the header policy by examining the first row, when the
    /// policy calls for it.
    fn resolve_headers(&mut self) -> Result<()> {
        self.headers_done = true;
        if self.header_policy == HeaderPolicy::None {
            return Ok(());
        }
        self.scalars.set_row(0);
        let row = match self.parse_row()? {
            None => {
                self.status = Status::Finished;
                return Ok(());
            }
            Some(row) => row,
        };
        self.enforce_width(row.len())?;
        let is_header = match self.header_policy {
            HeaderPolicy::FirstLine => true,
            HeaderPolicy::Infer => infer_headers(&row),
            HeaderPolicy::None => false,
        };
        if is_header {
            debug!("using first row as headers ({} columns)", row.len());
            self.headers = Some(row);
        } else {
            debug!("first row treated as data, not headers");
            self.pending_row = Some(row);
        }
        Ok(())
    }

    fn enforce_width(&mut self, len: usize) -> Result<()> {
        let len = len as u64;
        if self.expected == 0 {
            self.expected = len;
            return Ok(());
        }
        if len != self.expected {
            let mut pos = self.scalars.pos();
            pos.row = self.row_index;
            return Err(Error::new(ErrorKind::InvalidInput {
                pos,
                msg: format!(
                    "row {} has {} fields, but the first row has {}",
                    self.row_index, len, self.expected
                ),
            }));
        }
        Ok(())
    }

    /// Parse one row, or `None` at end of input. Rows consisting solely
    /// of a row delimiter are skipped.
    fn parse_row(&mut self) -> Result<Option<Vec<String>>> {
        while self.try_match(Delim::Row)? {}
        if self.peek_scalar()?.is_none() {
            return Ok(None);
        }
        let mut fields = Vec::new();
        loop {
            let (field, end) = self.parse_field()?;
            fields.push(field);
            match end {
                FieldEnd::Delim => {}
                FieldEnd::Row | FieldEnd::Eof => break,
            }
        }
        Ok(Some(fields))
    }

    fn parse_field(&mut self) -> Result<(String, FieldEnd)> {
        // Leading trim, stopping at a delimiter (an all-trimmed field is
        // empty) or at the first content scalar.
        if !self.trim.is_none() {
            loop {
                if self.try_match(Delim::Field)? {
                    return Ok((String::new(), FieldEnd::Delim));
                }
                if self.try_match(Delim::Row)? {
                    return Ok((String::new(), FieldEnd::Row));
                }
                match self.peek_scalar()? {
                    Some(c) if self.trim.matches(c) => {
                        self.next_scalar()?;
                    }
                    _ => break,
                }
            }
        }
        let escape = self.delims.escape;
        match escape {
            Some(esc) if self.peek_scalar()? == Some(esc) => {
                self.next_scalar()?;
                self.parse_quoted_field(esc)
            }
            _ => self.parse_unquoted_field(),
        }
    }

    fn parse_unquoted_field(&mut self) -> Result<(String, FieldEnd)> {
        let mut buf = String::new();
        loop {
            if self.try_match(Delim::Field)? {
                self.trim_trailing(&mut buf);
                return Ok((buf, FieldEnd::Delim));
            }
            if self.try_match(Delim::Row)? {
                self.trim_trailing(&mut buf);
                return Ok((buf, FieldEnd::Row));
            }
            match self.next_scalar()? {
                Some(c) => buf.push(c),
                None => {
                    self.trim_trailing(&mut buf);
                    return Ok((buf, FieldEnd::Eof));
                }
            }
        }
    }

    /// Parses the remainder of a quoted field. The opening escape scalar
    /// has already been consumed; scalars inside the quotes are never
    /// trimmed.
    fn parse_quoted_field(&mut self, esc: char) -> Result<(String, FieldEnd)> {
        let mut buf = String::new();
        loop {
            let c = match self.next_scalar()? {
                Some(c) => c,
                None => {
                    return Err(self.bad_input(
                        "unexpected end of input inside a quoted field",
                    ));
                }
            };
            if c != esc {
                buf.push(c);
                continue;
            }
            if self.peek_scalar()? == Some(esc) {
                // A doubled escape scalar inside quotes is one literal
                // escape scalar.
                self.next_scalar()?;
                buf.push(esc);
                continue;
            }
            // The quote closed. Only trimmable scalars may precede the
            // delimiter or end of input.
            loop {
                if self.try_match(Delim::Field)? {
                    return Ok((buf, FieldEnd::Delim));
                }
                if self.try_match(Delim::Row)? {
                    return Ok((buf, FieldEnd::Row));
                }
                match self.peek_scalar()? {
                    None => return Ok((buf, FieldEnd::Eof)),
                    Some(c) if self.trim.matches(c) => {
                        self.next_scalar()?;
                    }
                    Some(c) => {
                        return Err(self.bad_input(&format!(
                            "unexpected scalar {:?} after a closing quote",
                            c
                        )));
                    }
                }
            }
        }
    }

    fn trim_trailing(&self, buf: &mut String) {
        if self.trim.is_none() {
            return;
        }
        while buf.chars().next_back().map_or(false, |c| self.trim.matches(c)) {
            buf.pop();
        }
    }

    fn bad_input(&self, msg: &str) -> Error {
        let mut pos = self.scalars.pos();
        pos.row = self.row_index;
        Error::new(ErrorKind::InvalidInput { pos, msg: msg.to_string() })
    }

    /// Match a delimiter sequence without committing to a partial match.
    ///
    /// Scalars are consumed only when the whole sequence matches; a
    /// failed partial match leaves every scalar in the lookahead to be
    /// read back into the current field verbatim.
    fn try_match(&mut self, which: Delim) -> Result<bool> {
        let len = match which {
            Delim::Field => self.delims.field.len(),
            Delim::Row => self.delims.row.len(),
        };
        for i in 0..len {
            let want = match which {
                Delim::Field => self.delims.field[i],
                Delim::Row => self.delims.row[i],
            };
            match self.peek_at(i)? {
                Some(c) if c == want => {}
                _ => return Ok(false),
            }
        }
        for _ in 0..len {
            self.lookahead.pop_front();
        }
        Ok(true)
    }

    fn peek_scalar(&mut self) -> Result<Option<char>> {
        self.peek_at(0)
    }

    fn peek_at(&mut self, i: usize) -> Result<Option<char>> {
        while self.lookahead.len() <= i {
            match self.scalars.next()? {
                Some(c) => self.lookahead.push_back(c),
                None => return Ok(None),
            }
        }
        Ok(Some(self.lookahead[i]))
    }

    fn next_scalar(&mut self) -> Result<Option<char>> {
        if let Some(c) = self.lookahead.pop_front() {
            return Ok(Some(c));
        }
        self.scalars.next()
    }
}

/// The `HeaderPolicy::Infer` predicate: a first row is headers exactly
/// when every field is non-empty and all fields are pairwise distinct.
fn infer_headers(row: &[String]) -> bool {
    if row.iter().any(|f| f.is_empty()) {
        return false;
    }
    for (i, field) in row.iter().enumerate() {
        if row[i + 1..].contains(field) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::{Reader, ReaderBuilder, Status};
    use crate::encoding::Encoding;
    use crate::error::ErrorKind;
    use crate::settings::{HeaderPolicy, TrimPolicy};

    type Csv = Vec<Vec<String>>;

    macro_rules! csv {
        ($([$($field:expr),*]),*) => {{
            let mut csv = Csv::new();
            $(
                let row: Vec<String> =
                    vec![$($field.to_string()),*];
                csv.push(row);
            )*
            csv
        }}
    }

    macro_rules! parses_to {
        ($name:ident, $data:expr, $expected:expr) => {
            parses_to!($name, $data, $expected, |builder| builder);
        };
        ($name:ident, $data:expr, $expected:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut builder = ReaderBuilder::new();
                $config(&mut builder);
                let mut rdr =
                    builder.from_reader($data.as_bytes()).unwrap();
                let got = parse(&mut rdr);
                let expected: Csv = $expected;
                assert_eq!(expected, got);
            }
        };
    }

    macro_rules! fails_parsing {
        ($name:ident, $data:expr) => {
            fails_parsing!($name, $data, |builder| builder);
        };
        ($name:ident, $data:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut builder = ReaderBuilder::new();
                $config(&mut builder);
                let mut rdr =
                    builder.from_reader($data.as_bytes()).unwrap();
                loop {
                    match rdr.read_row() {
                        Ok(Some(_)) => {}
                        Ok(None) => panic!("expected a parse failure"),
                        Err(err) => {
                            match err.kind() {
                                ErrorKind::InvalidInput { .. } => break,
                                kind => panic!("bad kind: {:?}", kind),
                            }
                        }
                    }
                }
                assert_eq!(rdr.status(), Status::Failed);
            }
        };
    }

    fn parse<R: std::io::Read>(rdr: &mut Reader<R>) -> Csv {
        let mut csv = Csv::new();
        while let Some(row) = rdr.read_row().unwrap() {
            csv.push(row);
        }
        csv
    }

    parses_to!(one_row_one_field, "a", csv![["a"]]);
    parses_to!(one_row_many_fields, "a,b,c", csv![["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma, "a,b,", csv![["a", "b", ""]]);
    parses_to!(one_row_one_field_lf, "a\n", csv![["a"]]);
    parses_to!(one_row_many_fields_lf, "a,b,c\n", csv![["a", "b", "c"]]);

    parses_to!(many_rows_one_field, "a\nb", csv![["a"], ["b"]]);
    parses_to!(
        many_rows_many_fields,
        "a,b,c\nx,y,z",
        csv![["a", "b", "c"], ["x", "y", "z"]]
    );
    parses_to!(
        many_rows_trailing_comma,
        "a,b,\nx,y,\n",
        csv![["a", "b", ""], ["x", "y", ""]]
    );

    parses_to!(empty, "", csv![]);
    parses_to!(empty_lines, "\n\n\n\n", csv![]);
    parses_to!(
        empty_lines_interspersed,
        "\n\na,b\n\n\nx,y\n\n\nm,n\n",
        csv![["a", "b"], ["x", "y"], ["m", "n"]]
    );
    parses_to!(
        trailing_lines_no_row,
        "\n\n\na,b,c\nx,y,z\n\n\n",
        csv![["a", "b", "c"], ["x", "y", "z"]]
    );

    parses_to!(quote_empty, "\"\"", csv![[""]]);
    parses_to!(quote_lf, "\"\"\n", csv![[""]]);
    parses_to!(quote_space, "\" \"", csv![[" "]]);
    parses_to!(quote_inner_space, "\" a \"", csv![[" a "]]);
    parses_to!(
        quoted_field_delimiter,
        "\"hello, world\",x\n",
        csv![["hello, world", "x"]]
    );
    parses_to!(
        quoted_row_delimiter,
        "\"a\nb\",c\n",
        csv![["a\nb", "c"]]
    );
    parses_to!(doubled_quote, "\"a\"\"b\",c\n", csv![["a\"b", "c"]]);
    parses_to!(
        quote_not_at_field_start,
        "  \"a\"  ",
        csv![["  \"a\"  "]]
    );
    parses_to!(
        quote_disabled,
        "\"a\",b",
        csv![["\"a\"", "b"]],
        |b: &mut ReaderBuilder| {
            b.escape(None);
        }
    );
    parses_to!(
        quote_change,
        "zazzbz,c",
        csv![["azb", "c"]],
        |b: &mut ReaderBuilder| {
            b.escape(Some('z'));
        }
    );

    parses_to!(
        delimiter_tabs,
        "a\tb",
        csv![["a", "b"]],
        |b: &mut ReaderBuilder| {
            b.field_delimiter("\t");
        }
    );
    parses_to!(
        row_delimiter_weird,
        "a,bzc,d",
        csv![["a", "b"], ["c", "d"]],
        |b: &mut ReaderBuilder| {
            b.row_delimiter("z");
        }
    );
    parses_to!(
        multi_scalar_field_delimiter,
        "a||b||c\nx||y||z\n",
        csv![["a", "b", "c"], ["x", "y", "z"]],
        |b: &mut ReaderBuilder| {
            b.field_delimiter("||");
        }
    );
    parses_to!(
        multi_scalar_partial_match_flushed,
        "a|b||c\n",
        csv![["a|b", "c"]],
        |b: &mut ReaderBuilder| {
            b.field_delimiter("||");
        }
    );
    parses_to!(
        crlf_rows,
        "a,b\r\nc,d\r\n",
        csv![["a", "b"], ["c", "d"]],
        |b: &mut ReaderBuilder| {
            b.row_delimiter("\r\n");
        }
    );
    parses_to!(
        cr_kept_when_rows_are_lf,
        "a,b\r\nc,d",
        csv![["a", "b\r"], ["c", "d"]]
    );

    parses_to!(
        trim_whitespace,
        "  a  ,\tb\t\n",
        csv![["a", "b"]],
        |b: &mut ReaderBuilder| {
            b.trim(TrimPolicy::Whitespace);
        }
    );
    parses_to!(
        trim_preserves_quoted,
        "  \" a \"  ,b\n",
        csv![[" a ", "b"]],
        |b: &mut ReaderBuilder| {
            b.trim(TrimPolicy::Whitespace);
        }
    );
    parses_to!(
        trim_custom_scalars,
        "..a..,b.\n",
        csv![["a", "b"]],
        |b: &mut ReaderBuilder| {
            b.trim(TrimPolicy::Scalars(vec!['.']));
        }
    );
    parses_to!(
        trim_all_trimmed_field_is_empty,
        "   ,b\n",
        csv![["", "b"]],
        |b: &mut ReaderBuilder| {
            b.trim(TrimPolicy::Whitespace);
        }
    );

    fails_parsing!(unequal_row_width, "a,b\nc\n");
    fails_parsing!(unterminated_quote, "\"unterminated,a\n");
    fails_parsing!(garbage_after_closing_quote, "\"a\"b,c\n");

    #[test]
    fn width_error_cites_row() {
        let mut rdr = ReaderBuilder::new()
            .from_reader("a,b\nc\n".as_bytes())
            .unwrap();
        assert!(rdr.read_row().unwrap().is_some());
        let err = rdr.read_row().unwrap_err();
        match err.kind() {
            ErrorKind::InvalidInput { pos, .. } => assert_eq!(pos.row(), 1),
            kind => panic!("bad kind: {:?}", kind),
        }
    }

    #[test]
    fn failure_is_sticky() {
        let mut rdr = ReaderBuilder::new()
            .from_reader("\"unterminated".as_bytes())
            .unwrap();
        let first = rdr.read_row().unwrap_err();
        let second = rdr.read_row().unwrap_err();
        match (first.kind(), second.kind()) {
            (
                ErrorKind::InvalidInput { msg: m1, .. },
                ErrorKind::InvalidInput { msg: m2, .. },
            ) => assert_eq!(m1, m2),
            kinds => panic!("bad kinds: {:?}", kinds),
        }
        assert_eq!(rdr.status(), Status::Failed);
    }

    #[test]
    fn headers_first_line() {
        let mut rdr = ReaderBuilder::new()
            .header(HeaderPolicy::FirstLine)
            .from_reader("a,b,c\n1,2,3\n".as_bytes())
            .unwrap();
        assert_eq!(
            rdr.headers().unwrap().unwrap(),
            &["a".to_string(), "b".to_string(), "c".to_string()][..]
        );
        assert_eq!(rdr.row_index(), 0);
        assert_eq!(parse(&mut rdr), csv![["1", "2", "3"]]);
    }

    #[test]
    fn headers_none() {
        let mut rdr = ReaderBuilder::new()
            .from_reader("a,b,c\n1,2,3\n".as_bytes())
            .unwrap();
        assert_eq!(rdr.headers().unwrap(), None);
        assert_eq!(parse(&mut rdr), csv![["a", "b", "c"], ["1", "2", "3"]]);
    }

    #[test]
    fn headers_infer_accepts_distinct_nonempty() {
        let mut rdr = ReaderBuilder::new()
            .header(HeaderPolicy::Infer)
            .from_reader("name,age\nalice,39\n".as_bytes())
            .unwrap();
        assert!(rdr.headers().unwrap().is_some());
        assert_eq!(parse(&mut rdr), csv![["alice", "39"]]);
    }

    #[test]
    fn headers_infer_rejects_duplicates() {
        let mut rdr = ReaderBuilder::new()
            .header(HeaderPolicy::Infer)
            .from_reader("a,a\n1,2\n".as_bytes())
            .unwrap();
        assert_eq!(rdr.headers().unwrap(), None);
        assert_eq!(parse(&mut rdr), csv![["a", "a"], ["1", "2"]]);
    }

    #[test]
    fn headers_infer_rejects_empty_field() {
        let mut rdr = ReaderBuilder::new()
            .header(HeaderPolicy::Infer)
            .from_reader("a,\n1,2\n".as_bytes())
            .unwrap();
        assert_eq!(rdr.headers().unwrap(), None);
        assert_eq!(parse(&mut rdr), csv![["a", ""], ["1", "2"]]);
    }

    #[test]
    fn header_row_participates_in_width() {
        let mut rdr = ReaderBuilder::new()
            .header(HeaderPolicy::FirstLine)
            .from_reader("a,b,c\n1,2\n".as_bytes())
            .unwrap();
        assert!(rdr.headers().unwrap().is_some());
        assert!(rdr.read_row().is_err());
    }

    #[test]
    fn utf8_bom_input() {
        let mut data = Vec::new();
        data.extend_from_slice(b"\xEF\xBB\xBF");
        data.extend_from_slice("α,β\n".as_bytes());
        let mut rdr =
            ReaderBuilder::new().from_reader(&data[..]).unwrap();
        assert_eq!(rdr.encoding(), Encoding::Utf8);
        assert_eq!(parse(&mut rdr), csv![["α", "β"]]);
    }

    #[test]
    fn utf16_le_input() {
        let mut data: Vec<u8> = vec![0xFF, 0xFE];
        for unit in "a,b\nc,d\n".encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        let mut rdr =
            ReaderBuilder::new().from_reader(&data[..]).unwrap();
        assert_eq!(rdr.encoding(), Encoding::Utf16Le);
        assert_eq!(parse(&mut rdr), csv![["a", "b"], ["c", "d"]]);
    }

    #[test]
    fn count_reports_rows_and_width() {
        let mut rdr = ReaderBuilder::new()
            .from_reader("a,b\nc,d\n".as_bytes())
            .unwrap();
        assert_eq!(rdr.count(), (0, 0));
        rdr.read_row().unwrap();
        assert_eq!(rdr.count(), (1, 2));
        parse(&mut rdr);
        assert_eq!(rdr.count(), (2, 2));
        assert_eq!(rdr.status(), Status::Finished);
    }
}
