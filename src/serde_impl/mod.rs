pub use self::de::{deserialize_row, DeserializeError, DeserializeErrorKind};
pub use self::ser::serialize_row;

mod de;
mod ser;
