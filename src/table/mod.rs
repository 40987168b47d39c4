//! Table handle: owns the pager and executes statements against the B-tree

mod cursor;
mod statement;

pub use cursor::Cursor;
pub use statement::{ExecuteOutput, Statement, StatementKind};

use std::path::Path;

use log::debug;

use crate::btree::{Key, Node, NodeType};
use crate::error::{DbError, DbResult};
use crate::row::Row;
use crate::storage::{PageNum, Pager, TABLE_MAX_PAGES};

/// A single-table database stored in one paged file
pub struct Table {
    root_page_num: PageNum,
    pager: Pager,
}

impl Table {
    /// Open the table stored at `path`, creating an empty one if the file is new
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::with_max_pages(path, TABLE_MAX_PAGES)
    }

    /// Open the table with a custom page limit
    pub fn with_max_pages<P: AsRef<Path>>(path: P, max_pages: usize) -> DbResult<Self> {
        let mut pager = Pager::with_max_pages(path, max_pages)?;

        if pager.num_pages() == 0 {
            // New database file: page 0 becomes an empty root leaf
            let mut root = Node::new(pager.page_mut(0)?);
            root.initialize_leaf();
            root.set_root(true);
        }

        Ok(Self {
            root_page_num: 0,
            pager,
        })
    }

    /// Flush every page to disk and release the file
    pub fn close(mut self) -> DbResult<()> {
        self.pager.close()?;
        Ok(())
    }

    pub fn root_page_num(&self) -> PageNum {
        self.root_page_num
    }

    /// Direct access to the pager, for diagnostics
    pub fn pager_mut(&mut self) -> &mut Pager {
        &mut self.pager
    }

    /// Execute a prepared statement
    pub fn execute(&mut self, statement: &Statement) -> DbResult<ExecuteOutput> {
        match statement {
            Statement::Insert(row) => {
                self.execute_insert(row)?;
                Ok(ExecuteOutput::Inserted)
            }
            Statement::Select => Ok(ExecuteOutput::Rows(self.execute_select()?)),
        }
    }

    /// Insert a row keyed by its id.
    ///
    /// `DuplicateKey` and `TableFull` leave the table unchanged.
    pub fn execute_insert(&mut self, row: &Row) -> DbResult<()> {
        row.validate()?;

        let key = row.id;
        let mut cursor = self.find(key)?;
        if cursor.key()? == Some(key) {
            return Err(DbError::DuplicateKey(key));
        }

        cursor.leaf_insert(key, row)
    }

    /// Rows from the start of the table in ascending key order.
    ///
    /// The scan stays within the leftmost leaf; see `Cursor::advance`.
    pub fn execute_select(&mut self) -> DbResult<Vec<Row>> {
        let mut cursor = Cursor::start(self)?;
        let mut rows = Vec::new();

        while !cursor.end_of_table() {
            rows.push(cursor.row()?);
            cursor.advance()?;
        }

        Ok(rows)
    }

    /// Cursor at the position of `key`, or where it would be inserted
    pub fn find(&mut self, key: Key) -> DbResult<Cursor<'_>> {
        let root_page_num = self.root_page_num;
        let root_type = Node::new(self.pager.page(root_page_num)?).node_type()?;

        match root_type {
            NodeType::Leaf => Cursor::leaf_node_find(self, root_page_num, key),
            NodeType::Internal => Cursor::internal_node_find(self, root_page_num, key),
        }
    }

    /// Cursor at the first row of the table
    pub fn start(&mut self) -> DbResult<Cursor<'_>> {
        Cursor::start(self)
    }

    /// Cursor past the last row of a single-leaf table
    pub fn end(&mut self) -> DbResult<Cursor<'_>> {
        Cursor::end(self)
    }

    /// Promote the root after it split.
    ///
    /// The old root is copied to a new page that becomes the left child; the
    /// root page is re-initialized as an internal node with one key and two
    /// children.
    pub(crate) fn create_new_root(&mut self, right_child_page_num: PageNum) -> DbResult<()> {
        debug_assert!(self.pager.has_room_for(1));

        let root_page_num = self.root_page_num;
        let left_child_page_num = self.pager.unused_page_num();
        debug!(
            "promoting root {}: left child {}, right child {}",
            root_page_num, left_child_page_num, right_child_page_num
        );

        {
            let (root_page, left_page) =
                self.pager.page_pair_mut(root_page_num, left_child_page_num)?;
            left_page.copy_from_slice(root_page);

            let mut left_node = Node::new(left_page);
            left_node.set_root(false);
            left_node.set_parent(root_page_num);
            let left_max_key = left_node.max_key()?.ok_or_else(|| {
                DbError::InvalidState("left child of a split root is empty".to_string())
            })?;

            let mut root_node = Node::new(root_page);
            root_node.initialize_internal();
            root_node.set_root(true);
            root_node.set_internal_num_keys(1);
            root_node.set_internal_child(0, left_child_page_num)?;
            root_node.set_internal_key(0, left_max_key);
            root_node.set_internal_right_child(right_child_page_num);
        }

        let mut right_node = Node::new(self.pager.page_mut(right_child_page_num)?);
        right_node.set_parent(root_page_num);
        Ok(())
    }

    /// Render the tree in pre-order, one node or key per line, indented by depth
    pub fn render_tree(&mut self) -> DbResult<String> {
        let mut out = String::new();
        self.render_node(self.root_page_num, 0, &mut out)?;
        Ok(out)
    }

    fn render_node(&mut self, page_num: PageNum, depth: usize, out: &mut String) -> DbResult<()> {
        if depth > self.pager.max_pages() {
            return Err(DbError::InvalidState(format!(
                "tree deeper than {} pages",
                self.pager.max_pages()
            )));
        }

        let node = Node::new(self.pager.page(page_num)?);
        let indent = "  ".repeat(depth);

        match node.node_type()? {
            NodeType::Leaf => {
                let num_cells = node.leaf_num_cells()?;
                out.push_str(&format!("{indent}- leaf (size {num_cells})\n"));
                for i in 0..num_cells {
                    out.push_str(&format!("{indent}  - {}\n", node.leaf_key(i)));
                }
            }
            NodeType::Internal => {
                let num_keys = node.internal_num_keys()?;
                out.push_str(&format!("{indent}- internal (size {num_keys})\n"));

                let children = (0..num_keys)
                    .map(|i| -> DbResult<(PageNum, Key)> {
                        Ok((node.internal_child(i)?, node.internal_key(i)))
                    })
                    .collect::<DbResult<Vec<_>>>()?;
                let right_child = node.internal_right_child();

                for (child, key) in children {
                    self.render_node(child, depth + 1, out)?;
                    out.push_str(&format!("{indent}  - key {key}\n"));
                }
                self.render_node(right_child, depth + 1, out)?;
            }
        }

        Ok(())
    }
}
