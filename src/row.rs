//! Fixed-width row codec
//!
//! A row is serialized into exactly `ROW_SIZE` bytes:
//! `[id: i32 BE][username: 32 bytes, zero padded][email: 255 bytes, zero padded]`

use std::fmt;

use crate::error::{DbError, DbResult};

pub const COLUMN_USERNAME_SIZE: usize = 32;
pub const COLUMN_EMAIL_SIZE: usize = 255;

pub const ID_SIZE: usize = std::mem::size_of::<i32>();
pub const USERNAME_SIZE: usize = COLUMN_USERNAME_SIZE;
pub const EMAIL_SIZE: usize = COLUMN_EMAIL_SIZE;

pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// A single record of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl Row {
    /// Create a row, rejecting fields that do not fit their column
    pub fn new(id: i32, username: impl Into<String>, email: impl Into<String>) -> DbResult<Self> {
        let row = Self {
            id,
            username: username.into(),
            email: email.into(),
        };
        row.validate()?;
        Ok(row)
    }

    /// Check that both text fields fit their fixed-width columns
    pub fn validate(&self) -> DbResult<()> {
        if self.username.len() > USERNAME_SIZE {
            return Err(DbError::StringTooLong {
                field: "username",
                len: self.username.len(),
                max: USERNAME_SIZE,
            });
        }
        if self.email.len() > EMAIL_SIZE {
            return Err(DbError::StringTooLong {
                field: "email",
                len: self.email.len(),
                max: EMAIL_SIZE,
            });
        }
        Ok(())
    }

    /// Serialize into `dest`, which must be exactly `ROW_SIZE` bytes.
    ///
    /// Text longer than its column is truncated; `validate` rejects such rows up front.
    pub fn serialize_into(&self, dest: &mut [u8]) {
        debug_assert_eq!(dest.len(), ROW_SIZE);

        dest[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_be_bytes());
        write_padded(
            &mut dest[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE],
            self.username.as_bytes(),
        );
        write_padded(
            &mut dest[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE],
            self.email.as_bytes(),
        );
    }

    pub fn serialize(&self) -> [u8; ROW_SIZE] {
        let mut buf = [0u8; ROW_SIZE];
        self.serialize_into(&mut buf);
        buf
    }

    /// Decode a row from the first `ROW_SIZE` bytes of `src`
    pub fn deserialize(src: &[u8]) -> Self {
        let id = i32::from_be_bytes([
            src[ID_OFFSET],
            src[ID_OFFSET + 1],
            src[ID_OFFSET + 2],
            src[ID_OFFSET + 3],
        ]);

        Self {
            id,
            username: read_trimmed(&src[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]),
            email: read_trimmed(&src[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

fn write_padded(dest: &mut [u8], src: &[u8]) {
    let n = src.len().min(dest.len());
    dest[..n].copy_from_slice(&src[..n]);
    dest[n..].fill(0);
}

fn read_trimmed(src: &[u8]) -> String {
    let end = src.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&src[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_size() {
        assert_eq!(ROW_SIZE, 291);
        assert_eq!(USERNAME_OFFSET, 4);
        assert_eq!(EMAIL_OFFSET, 36);
    }

    #[test]
    fn test_serialize_layout() {
        let row = Row::new(1, "alice", "alice@example.com").unwrap();
        let bytes = row.serialize();

        assert_eq!(&bytes[0..4], &[0, 0, 0, 1]);
        assert_eq!(&bytes[4..9], b"alice");
        assert!(bytes[9..36].iter().all(|&b| b == 0));
        assert_eq!(&bytes[36..53], b"alice@example.com");
        assert!(bytes[53..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_round_trip() {
        let rows = [
            Row::new(0, "", "").unwrap(),
            Row::new(42, "bob", "bob@x.com").unwrap(),
            Row::new(-7, "neg", "neg@x.com").unwrap(),
            Row::new(i32::MAX, "a".repeat(USERNAME_SIZE), "e".repeat(EMAIL_SIZE)).unwrap(),
        ];

        for row in rows {
            assert_eq!(Row::deserialize(&row.serialize()), row);
        }
    }

    #[test]
    fn test_serialize_overwrites_stale_bytes() {
        let mut buf = [0xFFu8; ROW_SIZE];
        let row = Row::new(3, "c", "c@x.com").unwrap();
        row.serialize_into(&mut buf);
        assert_eq!(Row::deserialize(&buf), row);
    }

    #[test]
    fn test_string_too_long() {
        let result = Row::new(1, "u".repeat(USERNAME_SIZE + 1), "e");
        assert!(matches!(
            result,
            Err(DbError::StringTooLong { field: "username", len: 33, max: 32 })
        ));

        let result = Row::new(1, "u", "e".repeat(EMAIL_SIZE + 1));
        assert!(matches!(
            result,
            Err(DbError::StringTooLong { field: "email", .. })
        ));
    }

    #[test]
    fn test_display() {
        let row = Row::new(1, "a", "a@x.com").unwrap();
        assert_eq!(row.to_string(), "(1, a, a@x.com)");
    }
}
