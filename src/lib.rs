//! A single-file, page-oriented B-tree storage engine.
//!
//! Rows of `(id, username, email)` are stored in fixed-size 4KB pages. Page 0
//! is always the root node; leaves keep their cells sorted by id and a full
//! root leaf is split and promoted to an internal node.

pub mod btree;
pub mod error;
pub mod row;
pub mod storage;
pub mod table;

pub use btree::{
    Key, LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS, LEAF_NODE_RIGHT_SPLIT_COUNT, Node,
    NodeType, layout_constants,
};
pub use error::{DbError, DbResult, ErrorKind};
pub use row::{EMAIL_SIZE, ROW_SIZE, Row, USERNAME_SIZE};
pub use storage::{DbFile, PAGE_SIZE, PageNum, Pager, StorageError, StorageResult, TABLE_MAX_PAGES};
pub use table::{Cursor, ExecuteOutput, Statement, StatementKind, Table};
