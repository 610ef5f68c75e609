use std::io;

use crate::encoding::{decode_utf8, detect, Encoding, Utf8Step};
use crate::error::{Error, ErrorKind, Position, Result};

/// Read buffer growth increment.
const CHUNK: usize = 8 * (1 << 10);

/// How many leading bytes are inspected when inferring an encoding.
const DETECT_LEN: usize = 1 << 10;

/// A lazy decoder from bytes to Unicode scalars.
///
/// A scalar source wraps a byte reader and presents its contents one
/// scalar at a time, with a single scalar of lookahead. Decoding performs
/// the minimum work necessary for the selected encoding; malformed
/// sequences report `InvalidInput`.
#[derive(Debug)]
pub struct ScalarSource<R> {
    inner: R,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    eof: bool,
    /// The encoding chosen at open time, as reported to callers.
    encoding: Encoding,
    /// The encoding actually used for decoding. Differs from `encoding`
    /// only when an inferred ASCII prefix is decoded as UTF-8 (see
    /// `open`).
    decode_as: Encoding,
    peeked: Option<char>,
    byte: u64,
    line: u64,
    row: u64,
}

impl<R: io::Read> ScalarSource<R> {
    /// Open a scalar source over `inner`.
    ///
    /// When `presumed` is `None`, the encoding is inferred from the
    /// leading bytes: a BOM wins, a BOM-less all-ASCII prefix classifies
    /// as ASCII, anything else must validate as UTF-8. Inference failure
    /// is a configuration error, since the caller declined to presume an
    /// encoding.
    ///
    /// An inferred ASCII classification is decoded as UTF-8: ASCII is a
    /// strict subset, and the input may carry non-ASCII scalars beyond
    /// the inspected prefix. A caller-presumed `Ascii` stays strict.
    pub fn open(inner: R, presumed: Option<Encoding>) -> Result<ScalarSource<R>> {
        let mut src = ScalarSource {
            inner,
            buf: Vec::new(),
            start: 0,
            end: 0,
            eof: false,
            encoding: Encoding::Utf8,
            decode_as: Encoding::Utf8,
            peeked: None,
            byte: 0,
            line: 1,
            row: 0,
        };
        src.ensure(DETECT_LEN)?;
        let sniffed = detect(&src.buf[src.start..src.end]);
        match presumed {
            Some(encoding) => {
                if sniffed.bom_len > 0 && sniffed.encoding != Some(encoding) {
                    return Err(Error::new(ErrorKind::InvalidInput {
                        pos: src.pos(),
                        msg: format!(
                            "byte-order mark indicates {:?}, but the \
                             configured encoding is {:?}",
                            sniffed.encoding.unwrap(),
                            encoding
                        ),
                    }));
                }
                src.encoding = encoding;
                src.decode_as = encoding;
            }
            None => {
                let encoding = match sniffed.encoding {
                    Some(encoding) => encoding,
                    None => {
                        return Err(Error::new(ErrorKind::InvalidConfiguration {
                            msg: "cannot infer the input encoding; the input \
                                  is neither valid UTF-8 nor carries a \
                                  byte-order mark"
                                .to_string(),
                        }));
                    }
                };
                src.encoding = encoding;
                src.decode_as = if encoding == Encoding::Ascii {
                    Encoding::Utf8
                } else {
                    encoding
                };
            }
        }
        src.start += sniffed.bom_len;
        src.byte += sniffed.bom_len as u64;
        Ok(src)
    }

    /// The encoding chosen for this input.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The position of the next undecoded byte.
    pub fn pos(&self) -> Position {
        Position { byte: self.byte, line: self.line, row: self.row }
    }

    /// Record the index of the row currently being read, for error
    /// positions.
    pub fn set_row(&mut self, row: u64) {
        self.row = row;
    }

    /// Look at the next scalar without consuming it.
    pub fn peek(&mut self) -> Result<Option<char>> {
        if self.peeked.is_none() {
            self.peeked = self.decode_scalar()?;
        }
        Ok(self.peeked)
    }

    /// Consume and return the next scalar. Returns `Ok(None)` at end of
    /// input.
    pub fn next(&mut self) -> Result<Option<char>> {
        let scalar = match self.peeked.take() {
            Some(scalar) => Some(scalar),
            None => self.decode_scalar()?,
        };
        if scalar == Some('\n') {
            self.line += 1;
        }
        Ok(scalar)
    }

    /// Refill the buffer until at least `n` unconsumed bytes are
    /// available or the input is exhausted.
    fn ensure(&mut self, n: usize) -> Result<()> {
        while self.end - self.start < n && !self.eof {
            if self.start > 0 {
                self.buf.copy_within(self.start..self.end, 0);
                self.end -= self.start;
                self.start = 0;
            }
            if self.buf.len() < self.end + CHUNK {
                self.buf.resize(self.end + CHUNK, 0);
            }
            match self.inner.read(&mut self.buf[self.end..]) {
                Ok(0) => self.eof = true,
                Ok(nread) => self.end += nread,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(Error::from(err)),
            }
        }
        Ok(())
    }

    fn available(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    fn consume(&mut self, n: usize) {
        self.start += n;
        self.byte += n as u64;
    }

    fn bad_input(&self, msg: String) -> Error {
        Error::new(ErrorKind::InvalidInput { pos: self.pos(), msg })
    }

    fn decode_scalar(&mut self) -> Result<Option<char>> {
        match self.decode_as {
            Encoding::Utf8 => self.decode_utf8_scalar(),
            Encoding::Ascii => self.decode_ascii_scalar(),
            Encoding::Utf16Le => self.decode_utf16_scalar(true),
            Encoding::Utf16Be => self.decode_utf16_scalar(false),
            Encoding::Utf32Le => self.decode_utf32_scalar(true),
            Encoding::Utf32Be => self.decode_utf32_scalar(false),
        }
    }

    fn decode_ascii_scalar(&mut self) -> Result<Option<char>> {
        self.ensure(1)?;
        let b = match self.available().first() {
            None => return Ok(None),
            Some(&b) => b,
        };
        if b >= 0x80 {
            return Err(self.bad_input(format!(
                "byte 0x{:02X} is not ASCII",
                b
            )));
        }
        self.consume(1);
        Ok(Some(b as char))
    }

    fn decode_utf8_scalar(&mut self) -> Result<Option<char>> {
        // Four bytes cover the longest UTF-8 sequence.
        self.ensure(4)?;
        if self.available().is_empty() {
            return Ok(None);
        }
        match decode_utf8(self.available()) {
            Utf8Step::Scalar { scalar, len } => {
                self.consume(len);
                Ok(Some(scalar))
            }
            Utf8Step::Incomplete => {
                Err(self.bad_input("truncated UTF-8 sequence".to_string()))
            }
            Utf8Step::Invalid => {
                Err(self.bad_input("invalid UTF-8 sequence".to_string()))
            }
        }
    }

    fn decode_utf16_scalar(&mut self, le: bool) -> Result<Option<char>> {
        let unit = match self.take_u16(le)? {
            None => return Ok(None),
            Some(unit) => unit,
        };
        match unit {
            0xD800..=0xDBFF => {
                let low = match self.take_u16(le)? {
                    None => {
                        return Err(self.bad_input(
                            "UTF-16 high surrogate at end of input"
                                .to_string(),
                        ));
                    }
                    Some(low) => low,
                };
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.bad_input(
                        "UTF-16 high surrogate not followed by a low \
                         surrogate"
                            .to_string(),
                    ));
                }
                let value = 0x1_0000
                    + (((unit - 0xD800) as u32) << 10)
                    + (low - 0xDC00) as u32;
                Ok(std::char::from_u32(value))
            }
            0xDC00..=0xDFFF => {
                Err(self.bad_input("unpaired UTF-16 low surrogate".to_string()))
            }
            _ => Ok(std::char::from_u32(unit as u32)),
        }
    }

    fn take_u16(&mut self, le: bool) -> Result<Option<u16>> {
        self.ensure(2)?;
        let avail = self.available();
        if avail.is_empty() {
            return Ok(None);
        }
        if avail.len() < 2 {
            return Err(self.bad_input("truncated UTF-16 unit".to_string()));
        }
        let unit = if le {
            u16::from_le_bytes([avail[0], avail[1]])
        } else {
            u16::from_be_bytes([avail[0], avail[1]])
        };
        self.consume(2);
        Ok(Some(unit))
    }

    fn decode_utf32_scalar(&mut self, le: bool) -> Result<Option<char>> {
        self.ensure(4)?;
        let avail = self.available();
        if avail.is_empty() {
            return Ok(None);
        }
        if avail.len() < 4 {
            return Err(self.bad_input("truncated UTF-32 unit".to_string()));
        }
        let raw = [avail[0], avail[1], avail[2], avail[3]];
        let value =
            if le { u32::from_le_bytes(raw) } else { u32::from_be_bytes(raw) };
        match std::char::from_u32(value) {
            Some(scalar) => {
                self.consume(4);
                Ok(Some(scalar))
            }
            None => Err(self.bad_input(format!(
                "0x{:08X} is not a Unicode scalar value",
                value
            ))),
        }
    }
}
