/*!
A CSV codec: streaming parsing and writing plus a structured container
layer for mapping CSV grids onto user types.

The row-level interface reads and writes rows of field strings:

```
fn example() -> csvcodec::Result<()> {
    let data = "city,pop\nBoston,4628910\n";
    let mut rdr = csvcodec::ReaderBuilder::new()
        .header(csvcodec::HeaderPolicy::FirstLine)
        .from_reader(data.as_bytes())?;
    while let Some(row) = rdr.read_row()? {
        println!("{:?}", row);
    }
    Ok(())
}
example().unwrap();
```

The container layer exposes the grid as file → record → field, with
keyed, unkeyed and single-value views, so `Decode`/`Encode` types can
address fields sequentially or at random:

```
fn example() -> csvcodec::Result<()> {
    let rdr = csvcodec::Reader::from_reader("a,b\nc,d\n".as_bytes())?;
    let rows: Vec<Vec<String>> = rdr.decode()?;
    assert_eq!(rows[1][0], "c");

    let wtr = csvcodec::Writer::from_memory();
    let bytes = wtr.encode(&rows)?;
    assert_eq!(bytes, b"a,b\nc,d\n");
    Ok(())
}
example().unwrap();
```

With the `serde` feature (enabled by default), rows also serialize and
deserialize through serde; see `Reader::deserialize` and
`Writer::serialize`.
*/

pub use csvcodec_core::{
    detect, Detection, Encoding, HeaderPolicy, Position, Status, TrimPolicy,
};

pub use crate::buffer::{ReadBuffering, WriteBuffering};
pub use crate::decoder::{
    Decode, Decoder, KeyedDecoder, SingleValueDecoder, UnkeyedDecoder,
};
pub use crate::encoder::{
    Encode, Encoder, KeyedEncoder, SingleValueEncoder, UnkeyedEncoder,
};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::key::{CodingPath, Key};
#[cfg(feature = "serde")]
pub use crate::reader::DeserializeIter;
pub use crate::reader::{Reader, ReaderBuilder};
#[cfg(feature = "serde")]
pub use crate::serde_impl::{DeserializeError, DeserializeErrorKind};
pub use crate::sink::Sink;
pub use crate::source::Source;
pub use crate::writer::{Writer, WriterBuilder};

mod buffer;
mod decoder;
mod encoder;
mod error;
mod key;
mod reader;
#[cfg(feature = "serde")]
mod serde_impl;
mod sink;
mod source;
mod writer;
