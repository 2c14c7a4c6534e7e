use crate::common::{PageId, PAGE_SIZE};

use super::btree_page::{read_page_id, read_u32, write_page_id, write_u32};

// Page 0 layout: a record count followed by fixed-width (name, root page id)
// records. A zeroed page is a valid empty header.
const RECORD_COUNT_OFFSET: usize = 0;
const RECORDS_OFFSET: usize = 4;
const NAME_SIZE: usize = 32;
const RECORD_SIZE: usize = NAME_SIZE + 4;

/// Most records the header page can hold.
pub const HEADER_PAGE_CAPACITY: usize = (PAGE_SIZE - RECORDS_OFFSET) / RECORD_SIZE;

fn record_offset(index: usize) -> usize {
    RECORDS_OFFSET + index * RECORD_SIZE
}

fn name_at(data: &[u8], index: usize) -> &[u8] {
    let offset = record_offset(index);
    let name = &data[offset..offset + NAME_SIZE];
    let end = name.iter().position(|&b| b == 0).unwrap_or(NAME_SIZE);
    &name[..end]
}

fn find_index(data: &[u8], count: usize, name: &str) -> Option<usize> {
    (0..count).find(|&i| name_at(data, i) == name.as_bytes())
}

/// Mutable view over the header page, which maps index names to their root
/// page ids.
pub struct HeaderPage<'a> {
    data: &'a mut [u8],
}

impl<'a> HeaderPage<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        assert_eq!(data.len(), PAGE_SIZE);
        Self { data }
    }

    pub fn record_count(&self) -> usize {
        read_u32(self.data, RECORD_COUNT_OFFSET) as usize
    }

    fn set_record_count(&mut self, count: usize) {
        write_u32(self.data, RECORD_COUNT_OFFSET, count as u32);
    }

    pub fn find_record(&self, name: &str) -> Option<PageId> {
        let idx = find_index(self.data, self.record_count(), name)?;
        Some(read_page_id(self.data, record_offset(idx) + NAME_SIZE))
    }

    /// Appends a record. Fails on over-long names, duplicates, and a full
    /// page.
    pub fn insert_record(&mut self, name: &str, root_page_id: PageId) -> bool {
        let count = self.record_count();
        if name.len() > NAME_SIZE
            || count >= HEADER_PAGE_CAPACITY
            || find_index(self.data, count, name).is_some()
        {
            return false;
        }
        let offset = record_offset(count);
        self.data[offset..offset + NAME_SIZE].fill(0);
        self.data[offset..offset + name.len()].copy_from_slice(name.as_bytes());
        write_page_id(self.data, offset + NAME_SIZE, root_page_id);
        self.set_record_count(count + 1);
        true
    }

    /// Rewrites an existing record's root page id.
    pub fn update_record(&mut self, name: &str, root_page_id: PageId) -> bool {
        let Some(idx) = find_index(self.data, self.record_count(), name) else {
            return false;
        };
        write_page_id(self.data, record_offset(idx) + NAME_SIZE, root_page_id);
        true
    }

    pub fn delete_record(&mut self, name: &str) -> bool {
        let count = self.record_count();
        let Some(idx) = find_index(self.data, count, name) else {
            return false;
        };
        self.data
            .copy_within(record_offset(idx + 1)..record_offset(count), record_offset(idx));
        self.set_record_count(count - 1);
        true
    }
}

/// Read-only view over the header page.
pub struct HeaderPageRef<'a> {
    data: &'a [u8],
}

impl<'a> HeaderPageRef<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        assert_eq!(data.len(), PAGE_SIZE);
        Self { data }
    }

    pub fn record_count(&self) -> usize {
        read_u32(self.data, RECORD_COUNT_OFFSET) as usize
    }

    pub fn find_record(&self, name: &str) -> Option<PageId> {
        let idx = find_index(self.data, self.record_count(), name)?;
        Some(read_page_id(self.data, record_offset(idx) + NAME_SIZE))
    }
}
