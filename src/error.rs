use thiserror::Error;

use crate::storage::StorageError;

/// Broad classification of engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Table or page limits exceeded
    Capacity,
    /// Duplicate keys, corrupt files, malformed nodes
    Integrity,
    /// Row fields that do not fit their columns
    Validation,
    /// File open/read/write/seek failures
    Io,
    /// Tree operations the engine does not support
    Unimplemented,
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Table full")]
    TableFull,

    #[error("Duplicate key: {0}")]
    DuplicateKey(i32),

    #[error("String is too long: {field} is {len} bytes (max {max})")]
    StringTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Invalid node type tag: {0}")]
    InvalidNodeType(u32),

    #[error("Tried to access child_num {child_num} > num_keys {num_keys}")]
    ChildOutOfRange { child_num: usize, num_keys: usize },

    #[error("Corrupt node: {count} entries exceeds capacity {max}")]
    CorruptNode { count: usize, max: usize },

    #[error("Invalid tree state: {0}")]
    InvalidState(String),

    #[error("Not implemented: {0}")]
    Unimplemented(&'static str),
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Storage(e) => match e {
                StorageError::Io(_) | StorageError::FileClosed => ErrorKind::Io,
                StorageError::CorruptFile { .. } => ErrorKind::Integrity,
                StorageError::PageOutOfBounds { .. } => ErrorKind::Capacity,
                StorageError::PageNotLoaded(_)
                | StorageError::AliasedPage(_)
                | StorageError::InvalidMaxPages(_) => ErrorKind::Integrity,
            },
            DbError::TableFull => ErrorKind::Capacity,
            DbError::DuplicateKey(_) => ErrorKind::Integrity,
            DbError::StringTooLong { .. } => ErrorKind::Validation,
            DbError::InvalidNodeType(_)
            | DbError::ChildOutOfRange { .. }
            | DbError::CorruptNode { .. }
            | DbError::InvalidState(_) => ErrorKind::Integrity,
            DbError::Unimplemented(_) => ErrorKind::Unimplemented,
        }
    }

    /// Whether a caller may report this error and keep issuing statements
    /// against the same table
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DbError::TableFull | DbError::DuplicateKey(_) | DbError::StringTooLong { .. }
        )
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(DbError::TableFull.kind(), ErrorKind::Capacity);
        assert_eq!(DbError::DuplicateKey(1).kind(), ErrorKind::Integrity);
        assert_eq!(
            DbError::Unimplemented("split").kind(),
            ErrorKind::Unimplemented
        );
        assert_eq!(
            DbError::from(StorageError::CorruptFile { len: 3 }).kind(),
            ErrorKind::Integrity
        );
        assert_eq!(
            DbError::from(StorageError::PageOutOfBounds {
                page_num: 100,
                max_pages: 100
            })
            .kind(),
            ErrorKind::Capacity
        );
        assert_eq!(
            DbError::CorruptNode { count: 99, max: 13 }.kind(),
            ErrorKind::Integrity
        );
        let io = std::io::Error::other("disk gone");
        assert_eq!(DbError::from(StorageError::from(io)).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_recoverable() {
        assert!(DbError::TableFull.is_recoverable());
        assert!(DbError::DuplicateKey(5).is_recoverable());
        assert!(!DbError::Unimplemented("split").is_recoverable());
        assert!(!DbError::from(StorageError::FileClosed).is_recoverable());
    }

    #[test]
    fn test_messages() {
        assert_eq!(DbError::DuplicateKey(5).to_string(), "Duplicate key: 5");
        assert_eq!(DbError::TableFull.to_string(), "Table full");
    }
}
