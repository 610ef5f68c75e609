use csvcodec::{
    Encoding, ErrorKind, HeaderPolicy, ReadBuffering, Reader, ReaderBuilder,
    TrimPolicy, Writer, WriterBuilder,
};

fn read_all(data: &[u8]) -> Vec<Vec<String>> {
    let mut rdr = Reader::from_reader(data).unwrap();
    let mut rows = Vec::new();
    while let Some(row) = rdr.read_row().unwrap() {
        rows.push(row);
    }
    rows
}

fn write_all(rows: &[Vec<String>]) -> Vec<u8> {
    let mut wtr = Writer::from_memory();
    for row in rows {
        wtr.write_row(row).unwrap();
    }
    wtr.end_encoding().unwrap();
    wtr.into_bytes().unwrap()
}

fn rows(table: &[&[&str]]) -> Vec<Vec<String>> {
    table
        .iter()
        .map(|row| row.iter().map(|f| f.to_string()).collect())
        .collect()
}

// Universal property 1: reading back written rows yields the original
// sequence when reader and writer share a configuration.
#[test]
fn round_trip() {
    let tables: &[&[&[&str]]] = &[
        &[&["a", "b", "c"], &["1", "2", "3"]],
        &[&["hello, world", "x"]],
        &[&["a\"b", "c"], &["d", "e\nf"]],
        &[&["", ""], &["", ""]],
        &[&["α", "β"], &["γ", "δ"]],
        &[&["lone"]],
        &[&[""]],
    ];
    for table in tables {
        let original = rows(table);
        let bytes = write_all(&original);
        assert_eq!(
            read_all(&bytes),
            original,
            "round trip failed for {:?}",
            original
        );
    }
}

// Universal property 2: a header list and zero rows produce the header
// row followed by a single row terminator.
#[test]
fn header_write_is_idempotent() {
    let mut wtr = WriterBuilder::new()
        .headers(vec!["a".to_string(), "b".to_string()])
        .from_memory()
        .unwrap();
    wtr.end_encoding().unwrap();
    assert_eq!(wtr.into_bytes().unwrap(), b"a,b\n");
}

// Universal property 3: every row of a successful read has the width of
// row 0.
#[test]
fn width_invariant() {
    let rows = read_all(b"a,b,c\n1,2,3\nx,y,z\n");
    assert!(rows.iter().all(|row| row.len() == rows[0].len()));
}

// Universal property 4: trimming is symmetric around field content.
#[test]
fn trim_symmetry() {
    let values = &["v", "a b", "x"];
    for value in values {
        let data = format!("  \t{}\t  \n", value);
        let mut rdr = ReaderBuilder::new()
            .trim(TrimPolicy::Whitespace)
            .from_reader(data.as_bytes())
            .unwrap();
        let row = rdr.read_row().unwrap().unwrap();
        assert_eq!(row, vec![value.to_string()]);
    }
}

// Universal property 5: quoting preserves values containing delimiter
// and escape scalars.
#[test]
fn quote_survival() {
    let values = &["a,b", "a\nb", "a\"b", "\"", ",", "\n", "a,\"b\",c"];
    for value in values {
        let original = rows(&[&[value]]);
        let bytes = write_all(&original);
        assert_eq!(
            read_all(&bytes),
            original,
            "quote survival failed for {:?}",
            value
        );
    }
}

// Universal property 6: header lookup matches positional access.
#[test]
fn header_lookup_matches_position() {
    let data = "name,age\nalice,39\nbob,25\n";
    let rdr = ReaderBuilder::new()
        .header(HeaderPolicy::FirstLine)
        .from_reader(data.as_bytes())
        .unwrap();
    let mut source = rdr.into_source();
    let by_name = {
        let col = source
            .field_index_for(&csvcodec::Key::Name("age".to_string()))
            .unwrap();
        source.field(1, col).unwrap()
    };
    assert_eq!(by_name, source.field(1, 1).unwrap());
}

// Scenario 1: headers none and first-line over the same input.
#[test]
fn scenario_headers() {
    let data = b"a,b,c\n1,2,3\n";
    assert_eq!(
        read_all(data),
        rows(&[&["a", "b", "c"], &["1", "2", "3"]])
    );

    let mut rdr = ReaderBuilder::new()
        .header(HeaderPolicy::FirstLine)
        .from_reader(&data[..])
        .unwrap();
    assert_eq!(
        rdr.headers().unwrap().unwrap(),
        &["a".to_string(), "b".to_string(), "c".to_string()][..]
    );
    assert_eq!(rdr.read_row().unwrap().unwrap(), rows(&[&["1", "2", "3"]])[0]);
    assert_eq!(rdr.read_row().unwrap(), None);
}

// Scenario 2: a quoted field containing the field delimiter.
#[test]
fn scenario_quoted_delimiter() {
    assert_eq!(
        read_all(b"\"hello, world\",x\n"),
        rows(&[&["hello, world", "x"]])
    );
}

// Scenario 3: a doubled escape scalar inside quotes.
#[test]
fn scenario_doubled_quote() {
    assert_eq!(read_all(b"\"a\"\"b\",c\n"), rows(&[&["a\"b", "c"]]));
}

// Scenario 4: a row width mismatch cites the offending row.
#[test]
fn scenario_width_mismatch() {
    let mut rdr = Reader::from_reader(&b"a,b\nc\n"[..]).unwrap();
    assert!(rdr.read_row().unwrap().is_some());
    let err = rdr.read_row().unwrap_err();
    match err.kind() {
        ErrorKind::Read(core) => match core.kind() {
            csvcodec_core::ErrorKind::InvalidInput { pos, .. } => {
                assert_eq!(pos.row(), 1);
            }
            kind => panic!("bad core kind: {:?}", kind),
        },
        kind => panic!("bad kind: {:?}", kind),
    }
}

// Scenario 5: end of input inside a quoted field.
#[test]
fn scenario_unterminated_quote() {
    let mut rdr = Reader::from_reader(&b"\"unterminated,a\n"[..]).unwrap();
    let err = rdr.read_row().unwrap_err();
    match err.kind() {
        ErrorKind::Read(core) => match core.kind() {
            csvcodec_core::ErrorKind::InvalidInput { .. } => {}
            kind => panic!("bad core kind: {:?}", kind),
        },
        kind => panic!("bad kind: {:?}", kind),
    }
}

// Scenario 6: writer quoting of a field containing the delimiter.
#[test]
fn scenario_writer_quotes() {
    let mut wtr = Writer::from_memory();
    wtr.write_field("a").unwrap();
    wtr.write_field("b,c").unwrap();
    wtr.end_row().unwrap();
    wtr.end_encoding().unwrap();
    assert_eq!(wtr.into_bytes().unwrap(), b"a,\"b,c\"\n");
}

// Scenario 7: a UTF-8 BOM selects the UTF-8 encoding.
#[test]
fn scenario_utf8_bom() {
    let mut data = Vec::new();
    data.extend_from_slice(b"\xEF\xBB\xBF");
    data.extend_from_slice("α,β\n".as_bytes());
    let mut rdr = Reader::from_reader(&data[..]).unwrap();
    assert_eq!(rdr.encoding(), Encoding::Utf8);
    assert_eq!(
        rdr.read_row().unwrap().unwrap(),
        vec!["α".to_string(), "β".to_string()]
    );
}

// Scenario 8: sequential buffering expires rows behind the reader.
#[test]
fn scenario_sequential_cache_expiry() {
    let data = b"r0\nr1\nr2\nr3\nr4\nr5\n";
    let rdr = ReaderBuilder::new()
        .buffering(ReadBuffering::Sequential)
        .from_reader(&data[..])
        .unwrap();
    let mut source = rdr.into_source();
    assert_eq!(source.field(5, 0).unwrap(), "r5");
    let err = source.field(2, 0).unwrap_err();
    match err.kind() {
        ErrorKind::ExpiredCache { row } => assert_eq!(*row, 2),
        kind => panic!("bad kind: {:?}", kind),
    }
}

// Structured decoding and encoding through the container tree round
// trips the grid.
#[test]
fn codec_round_trip() {
    let original = rows(&[&["a", "b"], &["c", "d"], &["e", "f"]]);
    let wtr = Writer::from_memory();
    let bytes = wtr.encode(&original).unwrap();
    let rdr = Reader::from_reader(&bytes[..]).unwrap();
    let decoded: Vec<Vec<String>> = rdr.decode().unwrap();
    assert_eq!(decoded, original);
}

// UTF-16 input decodes through the scalar source.
#[test]
fn utf16_le_input_with_bom() {
    let mut data: Vec<u8> = vec![0xFF, 0xFE];
    for unit in "a,b\nc,d\n".encode_utf16() {
        data.extend_from_slice(&unit.to_le_bytes());
    }
    let mut rdr = Reader::from_reader(&data[..]).unwrap();
    assert_eq!(rdr.encoding(), Encoding::Utf16Le);
    assert_eq!(
        rdr.read_row().unwrap().unwrap(),
        vec!["a".to_string(), "b".to_string()]
    );
}

// A custom multi-scalar dialect survives a round trip.
#[test]
fn custom_dialect_round_trip() {
    let original = rows(&[&["a", "b|c"], &["d", "e"]]);
    let mut wtr = WriterBuilder::new()
        .field_delimiter("||")
        .row_delimiter("\r\n")
        .from_memory()
        .unwrap();
    for row in &original {
        wtr.write_row(row).unwrap();
    }
    wtr.end_encoding().unwrap();
    let bytes = wtr.into_bytes().unwrap();

    let mut rdr = ReaderBuilder::new()
        .field_delimiter("||")
        .row_delimiter("\r\n")
        .from_reader(&bytes[..])
        .unwrap();
    let mut got = Vec::new();
    while let Some(row) = rdr.read_row().unwrap() {
        got.push(row);
    }
    assert_eq!(got, original);
}

#[cfg(feature = "serde")]
mod serde_tests {
    use serde::{Deserialize, Serialize};

    use csvcodec::{HeaderPolicy, ReaderBuilder, WriterBuilder};

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct City {
        city: String,
        pop: u64,
    }

    #[test]
    fn serde_round_trip_with_headers() {
        let cities = vec![
            City { city: "Boston".to_string(), pop: 4628910 },
            City { city: "Concord".to_string(), pop: 42695 },
        ];

        let mut wtr = WriterBuilder::new()
            .serialize_headers(true)
            .from_memory()
            .unwrap();
        for city in &cities {
            wtr.serialize(city).unwrap();
        }
        wtr.end_encoding().unwrap();
        let bytes = wtr.into_bytes().unwrap();
        assert_eq!(
            String::from_utf8(bytes.clone()).unwrap(),
            "city,pop\nBoston,4628910\nConcord,42695\n"
        );

        let mut rdr = ReaderBuilder::new()
            .header(HeaderPolicy::FirstLine)
            .from_reader(&bytes[..])
            .unwrap();
        let got: Vec<City> = rdr
            .deserialize()
            .unwrap()
            .collect::<csvcodec::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(got, cities);
    }
}
