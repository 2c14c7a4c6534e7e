use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{
    FrameId, PageId, Result, TesseraError, DEFAULT_BUCKET_SIZE, FIRST_ALLOCATABLE_PAGE_ID,
    PAGE_SIZE,
};
use crate::container::ExtendibleHashTable;
use crate::storage::disk::{DiskManager, DiskScheduler};

use super::{FrameHeader, LruKReplacer};

/// State guarded by the pool latch.
struct PoolInner {
    free_list: VecDeque<FrameId>,
    next_page_id: u32,
}

/// BufferPoolManager mediates all access between in-memory frames and the
/// paged database file.
///
/// Pages are fetched read-through into a bounded set of frames, pinned while
/// in use, and written back lazily: a dirty frame reaches disk only when it
/// is evicted or explicitly flushed. Victims come from the LRU-K replacer;
/// residency is tracked by an extendible-hash page table.
///
/// A single coarse latch serializes every public operation, disk I/O
/// included.
pub struct BufferPoolManager {
    pool_size: usize,
    frames: Vec<Arc<FrameHeader>>,
    page_table: ExtendibleHashTable<PageId, FrameId>,
    replacer: LruKReplacer,
    disk_scheduler: DiskScheduler,
    latch: Mutex<PoolInner>,
}

impl BufferPoolManager {
    /// Creates a pool of `pool_size` frames with LRU-`k` replacement over
    /// the given disk manager. All frames start on the free list.
    pub fn new(pool_size: usize, k: usize, disk_manager: Arc<DiskManager>) -> Self {
        let mut frames = Vec::with_capacity(pool_size);
        let mut free_list = VecDeque::with_capacity(pool_size);
        for i in 0..pool_size {
            let frame_id = FrameId::new(i as u32);
            frames.push(Arc::new(FrameHeader::new(frame_id)));
            free_list.push_back(frame_id);
        }

        Self {
            pool_size,
            frames,
            page_table: ExtendibleHashTable::new(DEFAULT_BUCKET_SIZE),
            replacer: LruKReplacer::new(k, pool_size),
            disk_scheduler: DiskScheduler::new(disk_manager),
            latch: Mutex::new(PoolInner {
                free_list,
                next_page_id: FIRST_ALLOCATABLE_PAGE_ID,
            }),
        }
    }

    /// Allocates a fresh page id and binds it to a zeroed frame, pinned once.
    /// Fails with `BufferPoolFull` when the free list is empty and no frame
    /// is evictable.
    pub fn new_page(&self) -> Result<(PageId, Arc<FrameHeader>)> {
        let mut inner = self.latch.lock();
        let frame_id = self.acquire_frame(&mut inner)?;

        let page_id = PageId::new(inner.next_page_id);
        inner.next_page_id += 1;

        let frame = &self.frames[frame_id.as_usize()];
        frame.reset();
        frame.set_page_id(page_id);
        frame.pin();

        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        Ok((page_id, Arc::clone(frame)))
    }

    /// Returns the frame holding `page_id`, reading it from disk if it is
    /// not resident. The frame comes back with one additional pin.
    pub fn fetch_page(&self, page_id: PageId) -> Result<Arc<FrameHeader>> {
        if !page_id.is_valid() {
            return Err(TesseraError::InvalidPageId(page_id));
        }

        let mut inner = self.latch.lock();

        if let Some(frame_id) = self.page_table.find(&page_id) {
            let frame = &self.frames[frame_id.as_usize()];
            frame.pin();
            self.replacer.record_access(frame_id);
            self.replacer.set_evictable(frame_id, false);
            return Ok(Arc::clone(frame));
        }

        let frame_id = self.acquire_frame(&mut inner)?;
        let frame = &self.frames[frame_id.as_usize()];

        let mut buf = [0u8; PAGE_SIZE];
        self.disk_scheduler.read_sync(page_id, &mut buf)?;

        frame.set_page_id(page_id);
        frame.copy_from(&buf);
        frame.set_dirty(false);
        frame.pin();

        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        Ok(Arc::clone(frame))
    }

    /// Drops one pin from the page, folding `dirty` into the frame's dirty
    /// flag. Returns `false` if the page is not resident or not pinned.
    /// The frame becomes evictable when its last pin is released.
    pub fn unpin_page(&self, page_id: PageId, dirty: bool) -> bool {
        let _inner = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id.as_usize()];
        if dirty {
            frame.set_dirty(true);
        }
        match frame.unpin() {
            Some(0) => {
                self.replacer.set_evictable(frame_id, true);
                true
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Writes the page through to disk and clears its dirty flag. Pins and
    /// evictability are untouched. `Ok(false)` if the page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        if !page_id.is_valid() {
            return Err(TesseraError::InvalidPageId(page_id));
        }
        let _inner = self.latch.lock();
        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(false);
        };
        self.write_back(&self.frames[frame_id.as_usize()])?;
        Ok(true)
    }

    /// Writes every resident page through to disk, dirty or not.
    pub fn flush_all_pages(&self) -> Result<()> {
        let _inner = self.latch.lock();
        for frame in &self.frames {
            if frame.page_id().is_valid() {
                self.write_back(frame)?;
            }
        }
        Ok(())
    }

    /// Evicts `page_id` from the pool and deallocates it on disk.
    /// `Ok(true)` if the page is gone afterwards (including when it was not
    /// resident to begin with); `Ok(false)` if it is pinned.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        let mut inner = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(true);
        };
        let frame = &self.frames[frame_id.as_usize()];
        if frame.pin_count() > 0 {
            return Ok(false);
        }

        frame.reset();
        self.page_table.remove(&page_id);
        self.replacer.remove(frame_id);
        inner.free_list.push_back(frame_id);

        self.disk_scheduler.disk_manager().deallocate_page(page_id);
        Ok(true)
    }

    /// Current pin count of a resident page.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let _inner = self.latch.lock();
        self.page_table
            .find(&page_id)
            .map(|frame_id| self.frames[frame_id.as_usize()].pin_count())
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn free_frame_count(&self) -> usize {
        self.latch.lock().free_list.len()
    }

    /// Hands out a frame for reuse: from the free list when possible,
    /// otherwise by evicting a victim (writing it back first if dirty) and
    /// unmapping it from the page table. The frame comes back reset.
    fn acquire_frame(&self, inner: &mut PoolInner) -> Result<FrameId> {
        if let Some(frame_id) = inner.free_list.pop_front() {
            return Ok(frame_id);
        }

        let Some(frame_id) = self.replacer.evict() else {
            return Err(TesseraError::BufferPoolFull);
        };
        let frame = &self.frames[frame_id.as_usize()];
        let old_page_id = frame.page_id();
        if frame.is_dirty() {
            self.write_back(frame)?;
        }
        self.page_table.remove(&old_page_id);
        frame.reset();
        Ok(frame_id)
    }

    fn write_back(&self, frame: &FrameHeader) -> Result<()> {
        let mut buf = [0u8; PAGE_SIZE];
        frame.copy_to(&mut buf);
        self.disk_scheduler.write_sync(frame.page_id(), &buf)?;
        frame.set_dirty(false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_bpm(pool_size: usize) -> (BufferPoolManager, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let dm = Arc::new(DiskManager::new(temp_file.path()).unwrap());
        (BufferPoolManager::new(pool_size, 2, dm), temp_file)
    }

    #[test]
    fn test_new_pool_is_all_free() {
        let (bpm, _temp) = create_bpm(10);
        assert_eq!(bpm.pool_size(), 10);
        assert_eq!(bpm.free_frame_count(), 10);
    }

    #[test]
    fn test_new_page_is_pinned_and_zeroed() {
        let (bpm, _temp) = create_bpm(10);
        let (page_id, frame) = bpm.new_page().unwrap();

        assert_eq!(page_id, PageId::new(FIRST_ALLOCATABLE_PAGE_ID));
        assert_eq!(frame.pin_count(), 1);
        assert!(!frame.is_dirty());
        assert!(frame.read_data().iter().all(|&b| b == 0));
        assert_eq!(bpm.free_frame_count(), 9);
    }

    #[test]
    fn test_unpin_and_refetch() {
        let (bpm, _temp) = create_bpm(10);
        let (page_id, frame) = bpm.new_page().unwrap();
        frame.write_data()[0] = 42;
        assert!(bpm.unpin_page(page_id, true));
        assert!(!bpm.unpin_page(page_id, false));

        let frame = bpm.fetch_page(page_id).unwrap();
        assert_eq!(frame.read_data()[0], 42);
        assert_eq!(frame.pin_count(), 1);
        bpm.unpin_page(page_id, false);
    }

    #[test]
    fn test_dirty_page_survives_eviction() {
        let (bpm, _temp) = create_bpm(2);

        let (first, frame) = bpm.new_page().unwrap();
        frame.write_data()[0] = 7;
        bpm.unpin_page(first, true);

        // Force the first page out of both frames.
        for _ in 0..2 {
            let (pid, _) = bpm.new_page().unwrap();
            bpm.unpin_page(pid, false);
        }

        let frame = bpm.fetch_page(first).unwrap();
        assert_eq!(frame.read_data()[0], 7);
        bpm.unpin_page(first, false);
    }

    #[test]
    fn test_pool_exhaustion() {
        let (bpm, _temp) = create_bpm(3);
        let pages: Vec<_> = (0..3).map(|_| bpm.new_page().unwrap().0).collect();

        assert!(matches!(bpm.new_page(), Err(TesseraError::BufferPoolFull)));
        assert!(matches!(
            bpm.fetch_page(PageId::new(999)),
            Err(TesseraError::BufferPoolFull)
        ));

        assert!(bpm.unpin_page(pages[1], false));
        assert!(bpm.new_page().is_ok());
    }

    #[test]
    fn test_flush_clears_dirty() {
        let (bpm, _temp) = create_bpm(4);
        let (page_id, frame) = bpm.new_page().unwrap();
        frame.write_data()[10] = 99;
        bpm.unpin_page(page_id, true);

        assert!(bpm.flush_page(page_id).unwrap());
        let frame = bpm.fetch_page(page_id).unwrap();
        assert!(!frame.is_dirty());
        bpm.unpin_page(page_id, false);

        assert!(!bpm.flush_page(PageId::new(4242)).unwrap());
    }

    #[test]
    fn test_delete_page() {
        let (bpm, _temp) = create_bpm(4);
        let (page_id, _frame) = bpm.new_page().unwrap();

        // Pinned pages cannot be deleted.
        assert!(!bpm.delete_page(page_id).unwrap());

        bpm.unpin_page(page_id, false);
        assert!(bpm.delete_page(page_id).unwrap());
        assert_eq!(bpm.get_pin_count(page_id), None);
        assert_eq!(bpm.free_frame_count(), 4);

        // Deleting a non-resident page is a no-op success.
        assert!(bpm.delete_page(PageId::new(777)).unwrap());
    }

    #[test]
    fn test_never_written_page_reads_zeroed() {
        let (bpm, _temp) = create_bpm(2);
        let frame = bpm.fetch_page(PageId::new(123)).unwrap();
        assert!(frame.read_data().iter().all(|&b| b == 0));
        bpm.unpin_page(PageId::new(123), false);
    }
}
