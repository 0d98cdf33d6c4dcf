//! Value types shared between the storage engine and the command layer.

mod row;

pub use row::{KEY_SIZE, ROW_SIZE, Row, RowError, VALUE_FIELD_SIZE, VALUE_MAX_LEN, Value};
