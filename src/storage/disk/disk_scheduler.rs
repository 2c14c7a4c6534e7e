use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::common::{PageId, Result, TesseraError, PAGE_SIZE};

use super::DiskManager;

/// One queued disk operation. Buffers are passed by raw pointer; the
/// synchronous wrappers keep the referenced memory alive until the worker
/// signals completion.
enum DiskRequest {
    Read {
        page_id: PageId,
        buf: *mut u8,
        done: Sender<bool>,
    },
    Write {
        page_id: PageId,
        buf: *const u8,
        done: Sender<bool>,
    },
}

// Safety: the pointers are only dereferenced by the worker thread, and the
// issuing thread blocks on `done` until the worker is finished with them.
unsafe impl Send for DiskRequest {}

/// DiskScheduler funnels page I/O onto a single background worker thread,
/// serializing requests in submission order. Dropping the scheduler
/// disconnects the queue and joins the worker.
pub struct DiskScheduler {
    disk_manager: Arc<DiskManager>,
    queue: Option<Sender<DiskRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl DiskScheduler {
    pub fn new(disk_manager: Arc<DiskManager>) -> Self {
        let (queue, requests) = bounded::<DiskRequest>(64);
        let worker_dm = Arc::clone(&disk_manager);
        let worker = thread::spawn(move || Self::run_worker(worker_dm, requests));

        Self {
            disk_manager,
            queue: Some(queue),
            worker: Some(worker),
        }
    }

    /// Queues a read and blocks until the page bytes have landed in `data`.
    pub fn read_sync(&self, page_id: PageId, data: &mut [u8]) -> Result<()> {
        assert_eq!(data.len(), PAGE_SIZE);
        let (done, finished) = bounded(1);
        self.submit(DiskRequest::Read {
            page_id,
            buf: data.as_mut_ptr(),
            done,
        })?;
        Self::await_completion(&finished, page_id, "read")
    }

    /// Queues a write and blocks until `data` has been handed to the file.
    pub fn write_sync(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        assert_eq!(data.len(), PAGE_SIZE);
        let (done, finished) = bounded(1);
        self.submit(DiskRequest::Write {
            page_id,
            buf: data.as_ptr(),
            done,
        })?;
        Self::await_completion(&finished, page_id, "write")
    }

    pub fn disk_manager(&self) -> &Arc<DiskManager> {
        &self.disk_manager
    }

    fn submit(&self, request: DiskRequest) -> Result<()> {
        let queue = self
            .queue
            .as_ref()
            .ok_or_else(|| TesseraError::DiskScheduler("scheduler is shut down".to_string()))?;
        queue
            .send(request)
            .map_err(|_| TesseraError::DiskScheduler("worker thread is gone".to_string()))
    }

    fn await_completion(finished: &Receiver<bool>, page_id: PageId, op: &str) -> Result<()> {
        match finished.recv() {
            Ok(true) => Ok(()),
            Ok(false) => Err(TesseraError::DiskScheduler(format!(
                "{} of {} failed",
                op, page_id
            ))),
            Err(_) => Err(TesseraError::DiskScheduler(
                "worker dropped the request".to_string(),
            )),
        }
    }

    fn run_worker(disk_manager: Arc<DiskManager>, requests: Receiver<DiskRequest>) {
        // Ends when every sender is dropped.
        for request in requests {
            match request {
                DiskRequest::Read { page_id, buf, done } => {
                    // Safety: see the Send impl above.
                    let data = unsafe { std::slice::from_raw_parts_mut(buf, PAGE_SIZE) };
                    let ok = disk_manager.read_page(page_id, data).is_ok();
                    let _ = done.send(ok);
                }
                DiskRequest::Write { page_id, buf, done } => {
                    // Safety: see the Send impl above.
                    let data = unsafe { std::slice::from_raw_parts(buf, PAGE_SIZE) };
                    let ok = disk_manager.write_page(page_id, data).is_ok();
                    let _ = done.send(ok);
                }
            }
        }
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        self.queue.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_scheduler_round_trip() {
        let temp = NamedTempFile::new().unwrap();
        let dm = Arc::new(DiskManager::new(temp.path()).unwrap());
        let scheduler = DiskScheduler::new(dm);

        let page_id = scheduler.disk_manager().allocate_page();
        let mut data = [0u8; PAGE_SIZE];
        data[0] = 42;
        scheduler.write_sync(page_id, &data).unwrap();

        let mut out = [0u8; PAGE_SIZE];
        scheduler.read_sync(page_id, &mut out).unwrap();
        assert_eq!(out[0], 42);
    }

    #[test]
    fn test_scheduler_serializes_many_requests() {
        let temp = NamedTempFile::new().unwrap();
        let dm = Arc::new(DiskManager::new(temp.path()).unwrap());
        let scheduler = DiskScheduler::new(dm);

        let pages: Vec<PageId> = (0..8).map(|_| scheduler.disk_manager().allocate_page()).collect();
        for (i, &page_id) in pages.iter().enumerate() {
            let data = [i as u8; PAGE_SIZE];
            scheduler.write_sync(page_id, &data).unwrap();
        }
        for (i, &page_id) in pages.iter().enumerate() {
            let mut out = [0u8; PAGE_SIZE];
            scheduler.read_sync(page_id, &mut out).unwrap();
            assert_eq!(out[0], i as u8);
        }
    }
}
