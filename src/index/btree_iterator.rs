use std::sync::Arc;

use crate::buffer::{BufferPoolManager, FrameHeader};
use crate::common::{PageId, RecordId, Result, INVALID_PAGE_ID};
use crate::storage::page::LeafPageRef;

/// Forward iterator over the leaf chain.
///
/// Holds exactly one pinned leaf at a time; advancing past a leaf unpins it
/// and fetches its successor. Dropping the iterator releases whatever leaf
/// it still holds. Leaves are unpinned dirty even though iteration only
/// reads; the redundant write-back is harmless.
pub struct BTreeIterator {
    bpm: Arc<BufferPoolManager>,
    frame: Option<Arc<FrameHeader>>,
    page_id: PageId,
    index: usize,
}

impl BTreeIterator {
    pub(crate) fn new(
        bpm: Arc<BufferPoolManager>,
        frame: Arc<FrameHeader>,
        page_id: PageId,
        index: usize,
    ) -> Self {
        Self {
            bpm,
            frame: Some(frame),
            page_id,
            index,
        }
    }

    /// Iterator over nothing; used for an empty tree.
    pub(crate) fn exhausted(bpm: Arc<BufferPoolManager>) -> Self {
        Self {
            bpm,
            frame: None,
            page_id: INVALID_PAGE_ID,
            index: 0,
        }
    }

    fn advance(&mut self) -> Result<Option<(u32, RecordId)>> {
        loop {
            let Some(frame) = &self.frame else {
                return Ok(None);
            };

            let next_page_id = {
                let data = frame.read_data();
                let leaf = LeafPageRef::new(&data[..]);
                if self.index < leaf.size() {
                    let entry = (leaf.key_at(self.index), leaf.value_at(self.index));
                    self.index += 1;
                    return Ok(Some(entry));
                }
                leaf.next_page_id()
            };

            // This leaf is exhausted; hand the pin over to its successor.
            self.frame = None;
            self.bpm.unpin_page(self.page_id, true);
            if !next_page_id.is_valid() {
                return Ok(None);
            }
            let frame = self.bpm.fetch_page(next_page_id)?;
            self.page_id = next_page_id;
            self.index = 0;
            self.frame = Some(frame);
        }
    }
}

impl Iterator for BTreeIterator {
    type Item = Result<(u32, RecordId)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.frame = None;
                Some(Err(e))
            }
        }
    }
}

impl Drop for BTreeIterator {
    fn drop(&mut self) {
        if self.frame.take().is_some() {
            self.bpm.unpin_page(self.page_id, true);
        }
    }
}
