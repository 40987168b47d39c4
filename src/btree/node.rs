use crate::error::{DbError, DbResult};
use crate::row::{ROW_SIZE, Row};
use crate::storage::PageNum;

use super::*;

/// Zero-copy view over one page interpreted as a B-tree node.
///
/// `Node<&[u8]>` only reads; `Node<&mut [u8]>` also writes straight into the
/// page buffer, so changes are visible through the pager without a write-back.
pub struct Node<B> {
    data: B,
}

impl<B: AsRef<[u8]>> Node<B> {
    pub fn new(data: B) -> Self {
        debug_assert!(data.as_ref().len() >= crate::storage::PAGE_SIZE);
        Self { data }
    }

    fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn read_u32(&self, offset: usize) -> u32 {
        let b = self.bytes();
        u32::from_be_bytes([b[offset], b[offset + 1], b[offset + 2], b[offset + 3]])
    }

    fn read_i32(&self, offset: usize) -> i32 {
        self.read_u32(offset) as i32
    }

    // ========== Common header ==========

    pub fn node_type(&self) -> DbResult<NodeType> {
        NodeType::try_from(self.read_u32(NODE_TYPE_OFFSET))
    }

    pub fn is_root(&self) -> bool {
        self.read_u32(IS_ROOT_OFFSET) == 1
    }

    pub fn parent(&self) -> PageNum {
        self.read_u32(PARENT_POINTER_OFFSET) as PageNum
    }

    // ========== Leaf nodes ==========

    /// Number of cells, rejecting counts that cannot fit in a page
    pub fn leaf_num_cells(&self) -> DbResult<usize> {
        let num_cells = self.read_u32(LEAF_NODE_NUM_CELLS_OFFSET) as usize;
        if num_cells > LEAF_NODE_MAX_CELLS {
            return Err(DbError::CorruptNode {
                count: num_cells,
                max: LEAF_NODE_MAX_CELLS,
            });
        }
        Ok(num_cells)
    }

    /// Byte offset of cell `cell_num` within the page
    pub fn leaf_cell_offset(cell_num: usize) -> usize {
        LEAF_NODE_HEADER_SIZE + cell_num * LEAF_NODE_CELL_SIZE
    }

    /// Byte offset of the row payload of cell `cell_num` within the page
    pub fn leaf_value_offset(cell_num: usize) -> usize {
        Self::leaf_cell_offset(cell_num) + LEAF_NODE_VALUE_OFFSET
    }

    pub fn leaf_key(&self, cell_num: usize) -> Key {
        self.read_i32(Self::leaf_cell_offset(cell_num) + LEAF_NODE_KEY_OFFSET)
    }

    pub fn leaf_value(&self, cell_num: usize) -> &[u8] {
        let offset = Self::leaf_value_offset(cell_num);
        &self.bytes()[offset..offset + LEAF_NODE_VALUE_SIZE]
    }

    pub fn leaf_cell(&self, cell_num: usize) -> &[u8] {
        let offset = Self::leaf_cell_offset(cell_num);
        &self.bytes()[offset..offset + LEAF_NODE_CELL_SIZE]
    }

    pub fn leaf_row(&self, cell_num: usize) -> Row {
        Row::deserialize(self.leaf_value(cell_num))
    }

    /// Index of the first cell whose key is `>= key` (the insertion point)
    pub fn leaf_find(&self, key: Key) -> DbResult<usize> {
        let mut min_index = 0;
        let mut one_past_max_index = self.leaf_num_cells()?;

        while one_past_max_index != min_index {
            let index = (min_index + one_past_max_index) / 2;
            let key_at_index = self.leaf_key(index);
            if key == key_at_index {
                return Ok(index);
            }
            if key < key_at_index {
                one_past_max_index = index;
            } else {
                min_index = index + 1;
            }
        }

        Ok(min_index)
    }

    // ========== Internal nodes ==========

    pub fn internal_num_keys(&self) -> DbResult<usize> {
        let num_keys = self.read_u32(INTERNAL_NODE_NUM_KEYS_OFFSET) as usize;
        if num_keys > INTERNAL_NODE_MAX_CELLS {
            return Err(DbError::CorruptNode {
                count: num_keys,
                max: INTERNAL_NODE_MAX_CELLS,
            });
        }
        Ok(num_keys)
    }

    pub fn internal_right_child(&self) -> PageNum {
        self.read_u32(INTERNAL_NODE_RIGHT_CHILD_OFFSET) as PageNum
    }

    fn internal_cell_offset(cell_num: usize) -> usize {
        INTERNAL_NODE_HEADER_SIZE + cell_num * INTERNAL_NODE_CELL_SIZE
    }

    /// Page of child `child_num`; `child_num == num_keys` addresses the right child
    pub fn internal_child(&self, child_num: usize) -> DbResult<PageNum> {
        let num_keys = self.internal_num_keys()?;
        if child_num > num_keys {
            Err(DbError::ChildOutOfRange {
                child_num,
                num_keys,
            })
        } else if child_num == num_keys {
            Ok(self.internal_right_child())
        } else {
            Ok(self.read_u32(Self::internal_cell_offset(child_num)) as PageNum)
        }
    }

    pub fn internal_key(&self, key_num: usize) -> Key {
        self.read_i32(Self::internal_cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE)
    }

    /// Index of the child whose key range contains `key`
    pub fn internal_find_child(&self, key: Key) -> DbResult<usize> {
        let mut min_index = 0;
        // There is one more child than key
        let mut max_index = self.internal_num_keys()?;

        while min_index != max_index {
            let index = (min_index + max_index) / 2;
            let key_to_right = self.internal_key(index);
            if key_to_right >= key {
                max_index = index;
            } else {
                min_index = index + 1;
            }
        }

        Ok(min_index)
    }

    /// Largest key stored in this node, `None` if it holds no cells.
    ///
    /// For internal nodes this is the last stored key, not the maximum of the
    /// right child subtree.
    pub fn max_key(&self) -> DbResult<Option<Key>> {
        Ok(match self.node_type()? {
            NodeType::Leaf => match self.leaf_num_cells()? {
                0 => None,
                n => Some(self.leaf_key(n - 1)),
            },
            NodeType::Internal => match self.internal_num_keys()? {
                0 => None,
                n => Some(self.internal_key(n - 1)),
            },
        })
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Node<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        self.bytes_mut()[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    fn write_i32(&mut self, offset: usize, value: i32) {
        self.write_u32(offset, value as u32);
    }

    pub fn set_node_type(&mut self, node_type: NodeType) {
        self.write_u32(NODE_TYPE_OFFSET, node_type.tag());
    }

    pub fn set_root(&mut self, is_root: bool) {
        self.write_u32(IS_ROOT_OFFSET, u32::from(is_root));
    }

    pub fn set_parent(&mut self, parent: PageNum) {
        self.write_u32(PARENT_POINTER_OFFSET, parent as u32);
    }

    pub fn initialize_leaf(&mut self) {
        self.set_node_type(NodeType::Leaf);
        self.set_root(false);
        self.set_leaf_num_cells(0);
    }

    pub fn set_leaf_num_cells(&mut self, num_cells: usize) {
        self.write_u32(LEAF_NODE_NUM_CELLS_OFFSET, num_cells as u32);
    }

    pub fn set_leaf_key(&mut self, cell_num: usize, key: Key) {
        self.write_i32(Self::leaf_cell_offset(cell_num) + LEAF_NODE_KEY_OFFSET, key);
    }

    pub fn leaf_value_mut(&mut self, cell_num: usize) -> &mut [u8] {
        let offset = Self::leaf_value_offset(cell_num);
        &mut self.bytes_mut()[offset..offset + LEAF_NODE_VALUE_SIZE]
    }

    pub fn set_leaf_value(&mut self, cell_num: usize, value: &[u8]) {
        debug_assert_eq!(value.len(), ROW_SIZE);
        self.leaf_value_mut(cell_num).copy_from_slice(value);
    }

    pub fn set_leaf_cell(&mut self, cell_num: usize, cell: &[u8]) {
        let offset = Self::leaf_cell_offset(cell_num);
        self.bytes_mut()[offset..offset + LEAF_NODE_CELL_SIZE].copy_from_slice(cell);
    }

    /// Copy cell `from` over cell `to` within this node
    pub fn copy_leaf_cell(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        let src = Self::leaf_cell_offset(from);
        let dest = Self::leaf_cell_offset(to);
        self.bytes_mut()
            .copy_within(src..src + LEAF_NODE_CELL_SIZE, dest);
    }

    /// Write a full cell (key plus serialized row) at `cell_num`
    pub fn write_leaf_cell(&mut self, cell_num: usize, key: Key, row: &Row) {
        self.set_leaf_key(cell_num, key);
        row.serialize_into(self.leaf_value_mut(cell_num));
    }

    pub fn initialize_internal(&mut self) {
        self.set_node_type(NodeType::Internal);
        self.set_root(false);
        self.set_internal_num_keys(0);
    }

    pub fn set_internal_num_keys(&mut self, num_keys: usize) {
        self.write_u32(INTERNAL_NODE_NUM_KEYS_OFFSET, num_keys as u32);
    }

    pub fn set_internal_right_child(&mut self, page_num: PageNum) {
        self.write_u32(INTERNAL_NODE_RIGHT_CHILD_OFFSET, page_num as u32);
    }

    pub fn set_internal_child(&mut self, child_num: usize, page_num: PageNum) -> DbResult<()> {
        let num_keys = self.internal_num_keys()?;
        if child_num > num_keys {
            return Err(DbError::ChildOutOfRange {
                child_num,
                num_keys,
            });
        }

        if child_num == num_keys {
            self.set_internal_right_child(page_num);
        } else {
            self.write_u32(Self::internal_cell_offset(child_num), page_num as u32);
        }
        Ok(())
    }

    pub fn set_internal_key(&mut self, key_num: usize, key: Key) {
        self.write_i32(
            Self::internal_cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE,
            key,
        );
    }
}
