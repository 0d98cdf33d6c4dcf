//! Table rows and their fixed-width cell encoding.
//!
//! A row is a `u32` primary key plus a short string value. On disk it takes
//! exactly [`ROW_SIZE`] bytes:
//!
//! - `key`: 4 bytes (little-endian u32)
//! - `value`: 12 bytes (up to 11 UTF-8 bytes, zero padded)

use std::fmt;

/// Maximum length of a value in bytes.
pub const VALUE_MAX_LEN: usize = 11;

/// Size of the key field in bytes.
pub const KEY_SIZE: usize = 4;

/// Size of the value field in bytes (room for a terminating zero).
pub const VALUE_FIELD_SIZE: usize = VALUE_MAX_LEN + 1;

/// Total serialized size of a row.
pub const ROW_SIZE: usize = KEY_SIZE + VALUE_FIELD_SIZE;

/// A short string value of at most [`VALUE_MAX_LEN`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value(String);

impl Value {
    /// Validate and wrap a string value.
    pub fn new(value: &str) -> Result<Self, RowError> {
        if value.len() > VALUE_MAX_LEN {
            return Err(RowError::ValueTooLong(value.len()));
        }
        if value.contains('\0') {
            return Err(RowError::NulByte);
        }
        Ok(Self(value.to_owned()))
    }

    /// The value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Write the value into a [`VALUE_FIELD_SIZE`] byte field, zero padded.
    fn write_field(&self, dest: &mut [u8]) {
        let bytes = self.0.as_bytes();
        dest[..bytes.len()].copy_from_slice(bytes);
        dest[bytes.len()..VALUE_FIELD_SIZE].fill(0);
    }

    /// Read a value back from a zero padded field.
    fn read_field(src: &[u8]) -> Result<Self, RowError> {
        let field = &src[..VALUE_MAX_LEN];
        let len = field.iter().position(|&b| b == 0).unwrap_or(VALUE_MAX_LEN);
        let text = std::str::from_utf8(&field[..len]).map_err(|_| RowError::InvalidUtf8)?;
        Ok(Self(text.to_owned()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A logical table record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: u32,
    pub value: Value,
}

impl Row {
    /// Build a row, validating the value.
    pub fn new(key: u32, value: &str) -> Result<Self, RowError> {
        Ok(Self {
            key,
            value: Value::new(value)?,
        })
    }

    /// Serialize the row into the first [`ROW_SIZE`] bytes of `dest`.
    pub fn serialize(&self, dest: &mut [u8]) {
        dest[..KEY_SIZE].copy_from_slice(&self.key.to_le_bytes());
        self.value.write_field(&mut dest[KEY_SIZE..ROW_SIZE]);
    }

    /// Deserialize a row from the first [`ROW_SIZE`] bytes of `src`.
    pub fn deserialize(src: &[u8]) -> Result<Self, RowError> {
        let key = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        let value = Value::read_field(&src[KEY_SIZE..ROW_SIZE])?;
        Ok(Self { key, value })
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.key, self.value)
    }
}

/// Errors produced when building or decoding a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// Value is longer than [`VALUE_MAX_LEN`] bytes.
    ValueTooLong(usize),
    /// Value contains a zero byte, which the encoding uses as padding.
    NulByte,
    /// Stored value bytes are not valid UTF-8.
    InvalidUtf8,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueTooLong(len) => {
                write!(f, "value too long: {len} bytes (max {VALUE_MAX_LEN})")
            }
            Self::NulByte => write!(f, "value must not contain a zero byte"),
            Self::InvalidUtf8 => write!(f, "stored value is not valid UTF-8"),
        }
    }
}

impl std::error::Error for RowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_layout() {
        let row = Row::new(0x0102_0304, "foo").expect("valid row");
        let mut buf = [0xAAu8; ROW_SIZE];
        row.serialize(&mut buf);

        assert_eq!(&buf[..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&buf[4..7], b"foo");
        assert!(buf[7..].iter().all(|&b| b == 0), "value must be zero padded");

        assert_eq!(Row::deserialize(&buf).expect("decode"), row);
    }

    #[test]
    fn test_full_length_value() {
        let row = Row::new(7, "abcdefghijk").expect("11 bytes fits");
        let mut buf = [0u8; ROW_SIZE];
        row.serialize(&mut buf);

        let decoded = Row::deserialize(&buf).expect("decode");
        assert_eq!(decoded.value.as_str(), "abcdefghijk");
        assert_eq!(buf[ROW_SIZE - 1], 0);
    }

    #[test]
    fn test_value_too_long() {
        assert_eq!(
            Value::new("abcdefghijkl"),
            Err(RowError::ValueTooLong(12))
        );
        // Length is measured in bytes, not characters
        assert_eq!(Value::new("ééééééé"), Err(RowError::ValueTooLong(14)));
    }

    #[test]
    fn test_value_rejects_nul() {
        assert_eq!(Value::new("a\0b"), Err(RowError::NulByte));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut buf = [0u8; ROW_SIZE];
        buf[4] = 0xFF;
        assert_eq!(Row::deserialize(&buf), Err(RowError::InvalidUtf8));
    }

    #[test]
    fn test_display() {
        let row = Row::new(42, "bar").expect("valid row");
        assert_eq!(row.to_string(), "(42, bar)");
    }
}
