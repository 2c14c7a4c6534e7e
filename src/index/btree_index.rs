use std::sync::Arc;

use crate::buffer::BufferPoolManager;
use crate::common::{
    PageId, RecordId, Result, TesseraError, HEADER_PAGE_ID, INVALID_PAGE_ID,
};
use crate::storage::page::{
    set_parent_page_id_of, BTreePage, HeaderPage, HeaderPageRef, InternalPage, InternalPageRef,
    LeafPage, LeafPageRef, INTERNAL_PAGE_CAPACITY, LEAF_PAGE_CAPACITY,
};

use super::btree_iterator::BTreeIterator;
use super::key_comparator::KeyComparator;

/// Clustered B+Tree index with unique keys, backed by buffer-pool pages.
///
/// Leaves hold the (key, record) pairs and chain together in ascending key
/// order; internal pages route by separator keys. The root page id is
/// published in the header page (page 0) under the tree's name whenever it
/// changes, so a tree can be reopened from the same file.
///
/// The tree takes no latches of its own beyond the buffer pool's; callers
/// serialize mutating operations. Every page fetched is unpinned exactly
/// once on every path, dirty exactly when it was mutated.
pub struct BPlusTree {
    name: String,
    root_page_id: PageId,
    bpm: Arc<BufferPoolManager>,
    comparator: Arc<dyn KeyComparator>,
    leaf_max_size: usize,
    internal_max_size: usize,
}

impl BPlusTree {
    pub fn new(
        name: impl Into<String>,
        bpm: Arc<BufferPoolManager>,
        comparator: Arc<dyn KeyComparator>,
        leaf_max_size: usize,
        internal_max_size: usize,
    ) -> Self {
        assert!((2..=LEAF_PAGE_CAPACITY).contains(&leaf_max_size));
        assert!((3..=INTERNAL_PAGE_CAPACITY).contains(&internal_max_size));
        Self {
            name: name.into(),
            root_page_id: INVALID_PAGE_ID,
            bpm,
            comparator,
            leaf_max_size,
            internal_max_size,
        }
    }

    /// Reopens a tree whose root was published in the header page; a name
    /// with no record yields an empty tree.
    pub fn open(
        name: impl Into<String>,
        bpm: Arc<BufferPoolManager>,
        comparator: Arc<dyn KeyComparator>,
        leaf_max_size: usize,
        internal_max_size: usize,
    ) -> Result<Self> {
        let name = name.into();
        let frame = bpm.fetch_page(HEADER_PAGE_ID)?;
        let root_page_id = {
            let data = frame.read_data();
            HeaderPageRef::new(&data[..])
                .find_record(&name)
                .unwrap_or(INVALID_PAGE_ID)
        };
        bpm.unpin_page(HEADER_PAGE_ID, false);

        let mut tree = Self::new(name, bpm, comparator, leaf_max_size, internal_max_size);
        tree.root_page_id = root_page_id;
        Ok(tree)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_page_id(&self) -> PageId {
        self.root_page_id
    }

    pub fn is_empty(&self) -> bool {
        !self.root_page_id.is_valid()
    }

    fn cmp(&self) -> &dyn KeyComparator {
        self.comparator.as_ref()
    }

    /// Point lookup.
    pub fn get_value(&self, key: u32) -> Result<Option<RecordId>> {
        if self.is_empty() {
            return Ok(None);
        }
        let leaf_id = self.find_leaf(key)?;
        let frame = self.bpm.fetch_page(leaf_id)?;
        let result = {
            let data = frame.read_data();
            LeafPageRef::new(&data[..]).lookup(key, self.cmp())
        };
        self.bpm.unpin_page(leaf_id, false);
        Ok(result)
    }

    /// Inserts a unique key. Returns `Ok(false)` if the key already exists.
    pub fn insert(&mut self, key: u32, value: RecordId) -> Result<bool> {
        if self.is_empty() {
            return self.start_new_tree(key, value);
        }

        let leaf_id = self.find_leaf(key)?;
        let frame = self.bpm.fetch_page(leaf_id)?;

        let (duplicate, needs_split, parent_id) = {
            let data = frame.read_data();
            let leaf = LeafPageRef::new(&data[..]);
            (
                leaf.contains_key(key, self.cmp()),
                leaf.size() + 1 >= leaf.max_size(),
                leaf.parent_page_id(),
            )
        };

        if duplicate {
            self.bpm.unpin_page(leaf_id, false);
            return Ok(false);
        }

        if !needs_split {
            {
                let mut data = frame.write_data();
                let inserted = LeafPage::new(&mut data[..]).insert(key, value, self.cmp());
                debug_assert!(inserted);
            }
            self.bpm.unpin_page(leaf_id, true);
            return Ok(true);
        }

        // The sibling is allocated before the leaf is touched, so an
        // exhausted pool aborts with the tree unchanged.
        let (new_leaf_id, new_frame) = match self.bpm.new_page() {
            Ok(page) => page,
            Err(e) => {
                self.bpm.unpin_page(leaf_id, false);
                return Err(e);
            }
        };

        let separator = {
            let mut left_data = frame.write_data();
            let mut right_data = new_frame.write_data();
            let mut leaf = LeafPage::new(&mut left_data[..]);
            let mut right = LeafPage::new(&mut right_data[..]);
            right.init(new_leaf_id, parent_id, self.leaf_max_size);
            right.set_next_page_id(leaf.next_page_id());
            leaf.set_next_page_id(new_leaf_id);
            leaf.split_and_insert(key, value, self.cmp(), &mut right)
        };

        if parent_id.is_valid() {
            self.bpm.unpin_page(leaf_id, true);
            self.bpm.unpin_page(new_leaf_id, true);
            self.insert_into_internal(separator, leaf_id, new_leaf_id, parent_id)?;
        } else {
            let result = self.install_new_root(leaf_id, separator, new_leaf_id);
            self.bpm.unpin_page(leaf_id, true);
            self.bpm.unpin_page(new_leaf_id, true);
            result?;
        }
        Ok(true)
    }

    /// Removes a key if present; absent keys are a no-op.
    pub fn remove(&mut self, key: u32) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let leaf_id = self.find_leaf(key)?;
        let frame = self.bpm.fetch_page(leaf_id)?;

        let (removed, is_root, size, min_size) = {
            let mut data = frame.write_data();
            let mut leaf = LeafPage::new(&mut data[..]);
            let removed = leaf.remove(key, self.cmp());
            (
                removed,
                !leaf.parent_page_id().is_valid(),
                leaf.size(),
                leaf.min_size(),
            )
        };

        if !removed {
            self.bpm.unpin_page(leaf_id, false);
            return Ok(());
        }
        self.bpm.unpin_page(leaf_id, true);

        if is_root {
            if size == 0 {
                let deleted = self.bpm.delete_page(leaf_id)?;
                debug_assert!(deleted, "empty root leaf must be deletable");
                self.root_page_id = INVALID_PAGE_ID;
                self.update_root_page_id(false)?;
            }
            return Ok(());
        }

        if size >= min_size {
            return Ok(());
        }
        if self.steal_into_leaf(leaf_id)? {
            return Ok(());
        }
        self.merge_leaf(leaf_id)
    }

    /// Iterator over the whole tree in key order.
    pub fn iter(&self) -> Result<BTreeIterator> {
        if self.is_empty() {
            return Ok(BTreeIterator::exhausted(Arc::clone(&self.bpm)));
        }
        let leaf_id = self.leftmost_leaf()?;
        let frame = self.bpm.fetch_page(leaf_id)?;
        Ok(BTreeIterator::new(
            Arc::clone(&self.bpm),
            frame,
            leaf_id,
            0,
        ))
    }

    /// Iterator positioned at `key`. When the key is absent this falls back
    /// to `iter()`, i.e. the first entry of the whole tree - callers probing
    /// for a range start must check the first yielded key.
    pub fn iter_from(&self, key: u32) -> Result<BTreeIterator> {
        if self.is_empty() {
            return Ok(BTreeIterator::exhausted(Arc::clone(&self.bpm)));
        }
        let leaf_id = self.find_leaf(key)?;
        let frame = self.bpm.fetch_page(leaf_id)?;
        let index = {
            let data = frame.read_data();
            LeafPageRef::new(&data[..]).key_index_of(key, self.cmp())
        };
        match index {
            Some(index) => Ok(BTreeIterator::new(
                Arc::clone(&self.bpm),
                frame,
                leaf_id,
                index,
            )),
            None => {
                self.bpm.unpin_page(leaf_id, false);
                self.iter()
            }
        }
    }

    /// Walks from the root to the leaf that covers `key`, unpinning each
    /// page before descending.
    fn find_leaf(&self, key: u32) -> Result<PageId> {
        debug_assert!(!self.is_empty());
        let mut page_id = self.root_page_id;
        loop {
            let frame = self.bpm.fetch_page(page_id)?;
            let next = {
                let data = frame.read_data();
                if BTreePage::new(&data[..]).is_leaf() {
                    None
                } else {
                    Some(InternalPageRef::new(&data[..]).find_child(key, self.cmp()))
                }
            };
            self.bpm.unpin_page(page_id, false);
            match next {
                None => return Ok(page_id),
                Some(child) => page_id = child,
            }
        }
    }

    fn leftmost_leaf(&self) -> Result<PageId> {
        debug_assert!(!self.is_empty());
        let mut page_id = self.root_page_id;
        loop {
            let frame = self.bpm.fetch_page(page_id)?;
            let next = {
                let data = frame.read_data();
                if BTreePage::new(&data[..]).is_leaf() {
                    None
                } else {
                    Some(InternalPageRef::new(&data[..]).child_at(0))
                }
            };
            self.bpm.unpin_page(page_id, false);
            match next {
                None => return Ok(page_id),
                Some(child) => page_id = child,
            }
        }
    }

    fn start_new_tree(&mut self, key: u32, value: RecordId) -> Result<bool> {
        let (root_id, frame) = self.bpm.new_page()?;
        {
            let mut data = frame.write_data();
            let mut leaf = LeafPage::new(&mut data[..]);
            leaf.init(root_id, INVALID_PAGE_ID, self.leaf_max_size);
            let inserted = leaf.insert(key, value, self.cmp());
            debug_assert!(inserted);
        }
        self.root_page_id = root_id;
        let result = self.update_root_page_id(true);
        self.bpm.unpin_page(root_id, true);
        result?;
        Ok(true)
    }

    /// Publishes a split into the parent page, splitting it in turn (and so
    /// on up to the root) when it is already full.
    fn insert_into_internal(
        &mut self,
        key: u32,
        left_child: PageId,
        right_child: PageId,
        page_id: PageId,
    ) -> Result<()> {
        let frame = self.bpm.fetch_page(page_id)?;
        let (has_room, parent_id) = {
            let data = frame.read_data();
            let page = InternalPageRef::new(&data[..]);
            (page.size() + 1 <= page.max_size(), page.parent_page_id())
        };

        if has_room {
            {
                let mut data = frame.write_data();
                InternalPage::new(&mut data[..]).insert_after(left_child, key, right_child);
            }
            self.bpm.unpin_page(page_id, true);
            return Ok(());
        }

        let (new_id, new_frame) = match self.bpm.new_page() {
            Ok(page) => page,
            Err(e) => {
                self.bpm.unpin_page(page_id, false);
                return Err(e);
            }
        };

        let (promoted, moved_children) = {
            let mut left_data = frame.write_data();
            let mut right_data = new_frame.write_data();
            let mut page = InternalPage::new(&mut left_data[..]);
            let mut right = InternalPage::new(&mut right_data[..]);
            right.init(new_id, parent_id, self.internal_max_size);
            let promoted =
                page.split_and_insert(key, left_child, right_child, self.cmp(), &mut right);
            let moved: Vec<PageId> = (0..right.size()).map(|i| right.child_at(i)).collect();
            (promoted, moved)
        };

        self.reparent(&moved_children, new_id)?;

        if parent_id.is_valid() {
            self.bpm.unpin_page(page_id, true);
            self.bpm.unpin_page(new_id, true);
            self.insert_into_internal(promoted, page_id, new_id, parent_id)
        } else {
            let result = self.install_new_root(page_id, promoted, new_id);
            self.bpm.unpin_page(page_id, true);
            self.bpm.unpin_page(new_id, true);
            result
        }
    }

    /// Grows the tree by one level: a fresh internal root over the two
    /// halves of a root split. Both halves must still be pinned by the
    /// caller.
    fn install_new_root(
        &mut self,
        left_child: PageId,
        separator: u32,
        right_child: PageId,
    ) -> Result<()> {
        let (root_id, root_frame) = self.bpm.new_page()?;
        {
            let mut data = root_frame.write_data();
            let mut root = InternalPage::new(&mut data[..]);
            root.init(root_id, INVALID_PAGE_ID, self.internal_max_size);
            root.populate(left_child, separator, right_child);
        }
        self.bpm.unpin_page(root_id, true);
        self.reparent(&[left_child, right_child], root_id)?;
        self.root_page_id = root_id;
        self.update_root_page_id(false)
    }

    /// Points each page at its new parent.
    fn reparent(&self, children: &[PageId], parent: PageId) -> Result<()> {
        for &child in children {
            let frame = self.bpm.fetch_page(child)?;
            {
                let mut data = frame.write_data();
                set_parent_page_id_of(&mut data[..], parent);
            }
            self.bpm.unpin_page(child, true);
        }
        Ok(())
    }

    /// Left and right neighbors of a page under its own parent.
    fn sibling_ids(&self, page_id: PageId) -> Result<(PageId, PageId)> {
        let frame = self.bpm.fetch_page(page_id)?;
        let parent_id = {
            let data = frame.read_data();
            BTreePage::new(&data[..]).parent_page_id()
        };
        self.bpm.unpin_page(page_id, false);

        if !parent_id.is_valid() {
            return Ok((INVALID_PAGE_ID, INVALID_PAGE_ID));
        }
        let parent_frame = self.bpm.fetch_page(parent_id)?;
        let siblings = {
            let data = parent_frame.read_data();
            InternalPageRef::new(&data[..]).sibling_of(page_id)
        };
        self.bpm.unpin_page(parent_id, false);
        Ok(siblings)
    }

    /// Tries to bring an underfull leaf back to `min_size` by borrowing one
    /// entry from a sibling that can spare it, fixing up the parent
    /// separator. Returns `Ok(false)` when neither sibling can donate.
    fn steal_into_leaf(&mut self, leaf_id: PageId) -> Result<bool> {
        let (left_id, right_id) = self.sibling_ids(leaf_id)?;

        if left_id.is_valid() {
            let left_frame = self.bpm.fetch_page(left_id)?;
            let can_spare = {
                let data = left_frame.read_data();
                let left = LeafPageRef::new(&data[..]);
                left.size() > left.min_size()
            };
            if can_spare {
                let frame = self.bpm.fetch_page(leaf_id)?;
                let parent_id = {
                    let data = frame.read_data();
                    LeafPageRef::new(&data[..]).parent_page_id()
                };
                let parent_frame = self.bpm.fetch_page(parent_id)?;
                {
                    let mut data = frame.write_data();
                    let mut left_data = left_frame.write_data();
                    let mut parent_data = parent_frame.write_data();
                    let mut leaf = LeafPage::new(&mut data[..]);
                    let mut left = LeafPage::new(&mut left_data[..]);
                    let mut parent = InternalPage::new(&mut parent_data[..]);
                    let (child, separator) = leaf.steal_from_left(&mut left);
                    parent.replace_separator(child, separator);
                }
                self.bpm.unpin_page(parent_id, true);
                self.bpm.unpin_page(left_id, true);
                self.bpm.unpin_page(leaf_id, true);
                return Ok(true);
            }
            self.bpm.unpin_page(left_id, false);
        }

        if right_id.is_valid() {
            let right_frame = self.bpm.fetch_page(right_id)?;
            let can_spare = {
                let data = right_frame.read_data();
                let right = LeafPageRef::new(&data[..]);
                right.size() > right.min_size()
            };
            if can_spare {
                let frame = self.bpm.fetch_page(leaf_id)?;
                let parent_id = {
                    let data = frame.read_data();
                    LeafPageRef::new(&data[..]).parent_page_id()
                };
                let parent_frame = self.bpm.fetch_page(parent_id)?;
                {
                    let mut data = frame.write_data();
                    let mut right_data = right_frame.write_data();
                    let mut parent_data = parent_frame.write_data();
                    let mut leaf = LeafPage::new(&mut data[..]);
                    let mut right = LeafPage::new(&mut right_data[..]);
                    let mut parent = InternalPage::new(&mut parent_data[..]);
                    let (child, separator) = leaf.steal_from_right(&mut right);
                    parent.replace_separator(child, separator);
                }
                self.bpm.unpin_page(parent_id, true);
                self.bpm.unpin_page(right_id, true);
                self.bpm.unpin_page(leaf_id, true);
                return Ok(true);
            }
            self.bpm.unpin_page(right_id, false);
        }

        Ok(false)
    }

    /// Folds the underfull leaf and a sibling into one page (always right
    /// into left) and removes the dead separator from the parent.
    fn merge_leaf(&mut self, leaf_id: PageId) -> Result<()> {
        let (sib_left, sib_right) = self.sibling_ids(leaf_id)?;
        debug_assert!(sib_left.is_valid() || sib_right.is_valid());
        let (left_id, right_id) = if sib_left.is_valid() {
            (sib_left, leaf_id)
        } else {
            (leaf_id, sib_right)
        };

        let left_frame = self.bpm.fetch_page(left_id)?;
        let right_frame = self.bpm.fetch_page(right_id)?;
        let (removed, parent_id) = {
            let mut left_data = left_frame.write_data();
            let mut right_data = right_frame.write_data();
            let mut left = LeafPage::new(&mut left_data[..]);
            let mut right = LeafPage::new(&mut right_data[..]);
            let parent_id = left.parent_page_id();
            (left.merge_right(&mut right), parent_id)
        };
        self.bpm.unpin_page(left_id, true);
        self.bpm.unpin_page(right_id, true);

        let deleted = self.bpm.delete_page(right_id)?;
        debug_assert!(deleted, "merged leaf must be deletable");

        self.delete_from_internal(removed, parent_id)
    }

    /// Removes the separator for a dead child, then restores the invariants
    /// of the internal page it came out of: collapse a single-child root,
    /// or borrow/merge below the `max(2, min_size)` floor.
    fn delete_from_internal(&mut self, removed_child: PageId, page_id: PageId) -> Result<()> {
        let frame = self.bpm.fetch_page(page_id)?;
        let (is_root, size, min_size, first_child) = {
            let mut data = frame.write_data();
            let mut page = InternalPage::new(&mut data[..]);
            let removed = page.remove_child(removed_child);
            debug_assert!(removed, "separator for a merged child must exist");
            (
                !page.parent_page_id().is_valid(),
                page.size(),
                page.min_size(),
                page.child_at(0),
            )
        };
        self.bpm.unpin_page(page_id, true);

        if is_root {
            if size == 1 {
                // A root with no separators left collapses onto its only
                // child.
                let child_frame = self.bpm.fetch_page(first_child)?;
                {
                    let mut data = child_frame.write_data();
                    set_parent_page_id_of(&mut data[..], INVALID_PAGE_ID);
                }
                self.bpm.unpin_page(first_child, true);
                self.root_page_id = first_child;
                self.update_root_page_id(false)?;
                let deleted = self.bpm.delete_page(page_id)?;
                debug_assert!(deleted, "retired root must be deletable");
            }
            return Ok(());
        }

        if size >= usize::max(2, min_size) {
            return Ok(());
        }
        if self.steal_into_internal(page_id)? {
            return Ok(());
        }
        self.merge_internal(page_id)
    }

    /// Borrowing between internal pages rotates the parent separator
    /// through and hands one child pointer across; the donor must keep at
    /// least two children of its own.
    fn steal_into_internal(&mut self, page_id: PageId) -> Result<bool> {
        let (left_id, right_id) = self.sibling_ids(page_id)?;

        if left_id.is_valid() {
            let left_frame = self.bpm.fetch_page(left_id)?;
            let can_spare = {
                let data = left_frame.read_data();
                let left = InternalPageRef::new(&data[..]);
                left.size() - 1 >= usize::max(2, left.min_size())
            };
            if can_spare {
                let frame = self.bpm.fetch_page(page_id)?;
                let parent_id = {
                    let data = frame.read_data();
                    InternalPageRef::new(&data[..]).parent_page_id()
                };
                let parent_frame = self.bpm.fetch_page(parent_id)?;
                let moved_child = {
                    let mut data = frame.write_data();
                    let mut left_data = left_frame.write_data();
                    let mut parent_data = parent_frame.write_data();
                    let mut page = InternalPage::new(&mut data[..]);
                    let mut left = InternalPage::new(&mut left_data[..]);
                    let mut parent = InternalPage::new(&mut parent_data[..]);
                    page.redistribute_from_left(&mut left, &mut parent)
                };
                self.bpm.unpin_page(parent_id, true);
                self.bpm.unpin_page(left_id, true);
                self.bpm.unpin_page(page_id, true);
                self.reparent(&[moved_child], page_id)?;
                return Ok(true);
            }
            self.bpm.unpin_page(left_id, false);
        }

        if right_id.is_valid() {
            let right_frame = self.bpm.fetch_page(right_id)?;
            let can_spare = {
                let data = right_frame.read_data();
                let right = InternalPageRef::new(&data[..]);
                right.size() - 1 >= usize::max(2, right.min_size())
            };
            if can_spare {
                let frame = self.bpm.fetch_page(page_id)?;
                let parent_id = {
                    let data = frame.read_data();
                    InternalPageRef::new(&data[..]).parent_page_id()
                };
                let parent_frame = self.bpm.fetch_page(parent_id)?;
                let moved_child = {
                    let mut data = frame.write_data();
                    let mut right_data = right_frame.write_data();
                    let mut parent_data = parent_frame.write_data();
                    let mut page = InternalPage::new(&mut data[..]);
                    let mut right = InternalPage::new(&mut right_data[..]);
                    let mut parent = InternalPage::new(&mut parent_data[..]);
                    page.redistribute_from_right(&mut right, &mut parent)
                };
                self.bpm.unpin_page(parent_id, true);
                self.bpm.unpin_page(right_id, true);
                self.bpm.unpin_page(page_id, true);
                self.reparent(&[moved_child], page_id)?;
                return Ok(true);
            }
            self.bpm.unpin_page(right_id, false);
        }

        Ok(false)
    }

    /// Merges an underfull internal page with a sibling (right into left),
    /// re-parents the children that moved, and recurses the separator
    /// deletion into the parent.
    fn merge_internal(&mut self, page_id: PageId) -> Result<()> {
        let (sib_left, sib_right) = self.sibling_ids(page_id)?;
        debug_assert!(sib_left.is_valid() || sib_right.is_valid());
        let (left_id, right_id) = if sib_left.is_valid() {
            (sib_left, page_id)
        } else {
            (page_id, sib_right)
        };

        let left_frame = self.bpm.fetch_page(left_id)?;
        let right_frame = self.bpm.fetch_page(right_id)?;
        let parent_id = {
            let data = left_frame.read_data();
            InternalPageRef::new(&data[..]).parent_page_id()
        };
        let parent_frame = self.bpm.fetch_page(parent_id)?;
        let separator = {
            let data = parent_frame.read_data();
            InternalPageRef::new(&data[..]).separator_for(right_id)
        };
        let Some(separator) = separator else {
            self.bpm.unpin_page(parent_id, false);
            self.bpm.unpin_page(left_id, false);
            self.bpm.unpin_page(right_id, false);
            return Err(TesseraError::IndexCorrupted(format!(
                "parent {} has no separator for {}",
                parent_id, right_id
            )));
        };
        self.bpm.unpin_page(parent_id, false);

        let (removed, moved_children) = {
            let mut left_data = left_frame.write_data();
            let mut right_data = right_frame.write_data();
            let mut left = InternalPage::new(&mut left_data[..]);
            let mut right = InternalPage::new(&mut right_data[..]);
            let moved: Vec<PageId> = (0..right.size()).map(|i| right.child_at(i)).collect();
            (left.merge_from_right(&mut right, separator), moved)
        };
        self.bpm.unpin_page(left_id, true);
        self.bpm.unpin_page(right_id, true);

        self.reparent(&moved_children, left_id)?;

        let deleted = self.bpm.delete_page(right_id)?;
        debug_assert!(deleted, "merged page must be deletable");

        self.delete_from_internal(removed, parent_id)
    }

    /// Keeps the header page's record of this tree's root in sync. `create`
    /// distinguishes the very first publication from later updates; an
    /// invalid root deletes the record instead.
    fn update_root_page_id(&self, create: bool) -> Result<()> {
        let frame = self.bpm.fetch_page(HEADER_PAGE_ID)?;
        let ok = {
            let mut data = frame.write_data();
            let mut header = HeaderPage::new(&mut data[..]);
            if !self.root_page_id.is_valid() {
                header.delete_record(&self.name);
                true
            } else if create {
                header.insert_record(&self.name, self.root_page_id)
                    || header.update_record(&self.name, self.root_page_id)
            } else {
                header.update_record(&self.name, self.root_page_id)
                    || header.insert_record(&self.name, self.root_page_id)
            }
        };
        self.bpm.unpin_page(HEADER_PAGE_ID, true);
        if !ok {
            return Err(TesseraError::HeaderDirectoryFull);
        }
        Ok(())
    }
}
