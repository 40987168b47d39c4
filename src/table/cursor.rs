use log::debug;

use crate::btree::{
    Key, LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS, LEAF_NODE_RIGHT_SPLIT_COUNT, Node,
    NodeType,
};
use crate::error::{DbError, DbResult};
use crate::row::Row;
use crate::storage::PageNum;

use super::Table;

/// A position within the table: a cell of one leaf page.
///
/// The cursor borrows the table mutably for its whole lifetime, so at most one
/// cursor (and one page view) is live at a time.
pub struct Cursor<'a> {
    table: &'a mut Table,
    page_num: PageNum,
    cell_num: usize,
    end_of_table: bool,
}

impl<'a> Cursor<'a> {
    /// Cursor at the first cell of the leftmost leaf
    pub fn start(table: &'a mut Table) -> DbResult<Self> {
        let mut cursor = table.find(Key::MIN)?;
        cursor.cell_num = 0;
        cursor.end_of_table = cursor.leaf_num_cells()? == 0;
        Ok(cursor)
    }

    /// Cursor one past the last cell of the root leaf
    pub fn end(table: &'a mut Table) -> DbResult<Self> {
        let page_num = table.root_page_num();
        let node = Node::new(table.pager.page(page_num)?);
        if node.node_type()? != NodeType::Leaf {
            return Err(DbError::InvalidState(
                "end cursor requires a leaf root".to_string(),
            ));
        }
        let cell_num = node.leaf_num_cells()?;

        Ok(Self {
            table,
            page_num,
            cell_num,
            end_of_table: true,
        })
    }

    /// Binary search a leaf for the first cell whose key is `>= key`
    pub fn leaf_node_find(table: &'a mut Table, page_num: PageNum, key: Key) -> DbResult<Self> {
        let node = Node::new(table.pager.page(page_num)?);
        let cell_num = node.leaf_find(key)?;

        Ok(Self {
            table,
            page_num,
            cell_num,
            end_of_table: false,
        })
    }

    /// Descend from an internal node to the leaf whose key range contains `key`
    pub fn internal_node_find(
        table: &'a mut Table,
        page_num: PageNum,
        key: Key,
    ) -> DbResult<Self> {
        let mut page_num = page_num;

        // A well-formed tree is never deeper than the number of pages
        for _ in 0..table.pager.max_pages() {
            let node = Node::new(table.pager.page(page_num)?);
            let child_num = node.internal_find_child(key)?;
            let child_page_num = node.internal_child(child_num)?;

            let child_type = Node::new(table.pager.page(child_page_num)?).node_type()?;
            match child_type {
                NodeType::Leaf => return Self::leaf_node_find(table, child_page_num, key),
                NodeType::Internal => page_num = child_page_num,
            }
        }

        Err(DbError::InvalidState(format!(
            "cycle detected while descending from page {page_num}"
        )))
    }

    pub fn page_num(&self) -> PageNum {
        self.page_num
    }

    pub fn cell_num(&self) -> usize {
        self.cell_num
    }

    pub fn end_of_table(&self) -> bool {
        self.end_of_table
    }

    fn leaf_num_cells(&mut self) -> DbResult<usize> {
        Node::new(self.table.pager.page(self.page_num)?).leaf_num_cells()
    }

    /// Key stored at the cursor position, `None` when past the leaf's last cell
    pub fn key(&mut self) -> DbResult<Option<Key>> {
        let node = Node::new(self.table.pager.page(self.page_num)?);
        if self.cell_num < node.leaf_num_cells()? {
            Ok(Some(node.leaf_key(self.cell_num)))
        } else {
            Ok(None)
        }
    }

    /// Page and byte offset of the row payload under the cursor
    pub fn value(&self) -> (PageNum, usize) {
        (
            self.page_num,
            Node::<&[u8]>::leaf_value_offset(self.cell_num),
        )
    }

    /// Decode the row under the cursor
    pub fn row(&mut self) -> DbResult<Row> {
        let num_cells = self.leaf_num_cells()?;
        if self.cell_num >= num_cells {
            return Err(DbError::InvalidState(format!(
                "no row at cell {} of page {} ({} cells)",
                self.cell_num, self.page_num, num_cells
            )));
        }

        let (page_num, offset) = self.value();
        let page = self.table.pager.page(page_num)?;
        Ok(Row::deserialize(&page[offset..]))
    }

    /// Step to the next cell. End-of-table is detected per leaf: the cursor
    /// never moves on to a sibling leaf.
    pub fn advance(&mut self) -> DbResult<()> {
        let num_cells = self.leaf_num_cells()?;
        self.cell_num += 1;
        if self.cell_num >= num_cells {
            self.end_of_table = true;
        }
        Ok(())
    }

    /// Insert `row` under `key` at the cursor position, splitting the leaf if it is full
    pub fn leaf_insert(&mut self, key: Key, row: &Row) -> DbResult<()> {
        let num_cells = self.leaf_num_cells()?;
        if num_cells >= LEAF_NODE_MAX_CELLS {
            return self.leaf_split_and_insert(key, row);
        }

        let mut node = Node::new(self.table.pager.page_mut(self.page_num)?);

        // Make room for the new cell, moving from the end backward
        for i in (self.cell_num + 1..=num_cells).rev() {
            node.copy_leaf_cell(i - 1, i);
        }

        node.write_leaf_cell(self.cell_num, key, row);
        node.set_leaf_num_cells(num_cells + 1);
        Ok(())
    }

    /// Split a full leaf into two and insert the new cell into the correct half.
    ///
    /// Only a root leaf can be split; the old root's contents move to a fresh
    /// left child and the root page becomes an internal node. Both refusal paths
    /// return before any page is touched.
    pub fn leaf_split_and_insert(&mut self, key: Key, row: &Row) -> DbResult<()> {
        let old_page_num = self.page_num;

        let is_root = Node::new(self.table.pager.page(old_page_num)?).is_root();
        if !is_root {
            return Err(DbError::Unimplemented(
                "updating parent after splitting a non-root leaf",
            ));
        }

        // New right sibling plus the left child created by root promotion
        if !self.table.pager.has_room_for(2) {
            return Err(DbError::TableFull);
        }

        let new_page_num = self.table.pager.unused_page_num();
        debug!(
            "splitting leaf {} into {} at cell {} (key {})",
            old_page_num, new_page_num, self.cell_num, key
        );

        {
            let (old_page, new_page) = self.table.pager.page_pair_mut(old_page_num, new_page_num)?;
            let mut old_node = Node::new(old_page);
            let mut new_node = Node::new(new_page);
            new_node.initialize_leaf();

            // Lay out the existing cells plus the new one, highest index first,
            // so each old cell is read before its slot is overwritten.
            for i in (0..=LEAF_NODE_MAX_CELLS).rev() {
                let to_new = i >= LEAF_NODE_LEFT_SPLIT_COUNT;
                let index_within_node = if to_new {
                    i - LEAF_NODE_LEFT_SPLIT_COUNT
                } else {
                    i
                };

                if i == self.cell_num {
                    let dest = if to_new { &mut new_node } else { &mut old_node };
                    dest.write_leaf_cell(index_within_node, key, row);
                    continue;
                }

                let src = if i > self.cell_num { i - 1 } else { i };
                if to_new {
                    new_node.set_leaf_cell(index_within_node, old_node.leaf_cell(src));
                } else {
                    old_node.copy_leaf_cell(src, index_within_node);
                }
            }

            old_node.set_leaf_num_cells(LEAF_NODE_LEFT_SPLIT_COUNT);
            new_node.set_leaf_num_cells(LEAF_NODE_RIGHT_SPLIT_COUNT);
        }

        self.table.create_new_root(new_page_num)
    }
}
