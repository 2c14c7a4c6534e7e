use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::common::{FrameId, Timestamp};

/// Access history of a single tracked frame: up to `k` timestamps in
/// insertion order, oldest dropped on overflow.
#[derive(Debug)]
struct FrameAccess {
    history: VecDeque<Timestamp>,
    evictable: bool,
}

impl FrameAccess {
    fn new() -> Self {
        Self {
            history: VecDeque::new(),
            evictable: false,
        }
    }

    fn record(&mut self, timestamp: Timestamp, k: usize) {
        self.history.push_back(timestamp);
        while self.history.len() > k {
            self.history.pop_front();
        }
    }

    /// Timestamp of the kth most recent access, or `None` with fewer than k
    /// accesses (infinite backward distance).
    fn kth_recent(&self, k: usize) -> Option<Timestamp> {
        if self.history.len() < k {
            None
        } else {
            Some(self.history[self.history.len() - k])
        }
    }

    fn most_recent(&self) -> Option<Timestamp> {
        self.history.back().copied()
    }
}

struct ReplacerInner {
    frames: HashMap<FrameId, FrameAccess>,
    current: Timestamp,
    evictable_count: usize,
}

/// LRU-K replacement policy.
///
/// The victim is the evictable frame with the largest backward K-distance:
/// the time since its kth most recent access. Frames with fewer than k
/// recorded accesses have infinite distance and are evicted first, oldest
/// last access winning (classic LRU over that subset). Eviction drops the
/// frame's history.
pub struct LruKReplacer {
    k: usize,
    num_frames: usize,
    inner: Mutex<ReplacerInner>,
}

impl LruKReplacer {
    pub fn new(k: usize, num_frames: usize) -> Self {
        assert!(k > 0, "k must be positive");
        Self {
            k,
            num_frames,
            inner: Mutex::new(ReplacerInner {
                frames: HashMap::new(),
                current: 0,
                evictable_count: 0,
            }),
        }
    }

    /// Stamps an access for the frame, tracking it from the first access on.
    /// Out-of-range frame ids are ignored.
    pub fn record_access(&self, frame_id: FrameId) {
        if frame_id.as_usize() >= self.num_frames {
            return;
        }
        let mut inner = self.inner.lock();
        let timestamp = inner.current;
        inner.current += 1;
        inner
            .frames
            .entry(frame_id)
            .or_insert_with(FrameAccess::new)
            .record(timestamp, self.k);
    }

    /// Picks and removes the victim with the largest backward K-distance.
    /// Returns `None` when nothing is evictable.
    pub fn evict(&self) -> Option<FrameId> {
        let mut inner = self.inner.lock();
        if inner.evictable_count == 0 {
            return None;
        }

        let mut victim: Option<FrameId> = None;
        // For frames with full history the largest distance is the smallest
        // kth-recent timestamp; among short-history frames the smallest last
        // access wins. Short history always beats full history.
        let mut victim_kth: Option<Timestamp> = None;
        let mut victim_last: Option<Timestamp> = None;

        for (&frame_id, access) in inner.frames.iter() {
            if !access.evictable {
                continue;
            }
            let kth = access.kth_recent(self.k);
            let last = access.most_recent();

            let better = match (victim_kth, kth) {
                (None, Some(_)) => false,
                (Some(_), None) => true,
                (None, None) => match (victim_last, last) {
                    (Some(v), Some(c)) => c < v,
                    (None, Some(_)) => true,
                    _ => false,
                },
                (Some(v), Some(c)) => c < v,
            };

            if victim.is_none() || better {
                victim = Some(frame_id);
                victim_kth = kth;
                victim_last = last;
            }
        }

        if let Some(frame_id) = victim {
            inner.frames.remove(&frame_id);
            inner.evictable_count -= 1;
        }
        victim
    }

    /// Flags a tracked frame as evictable or pinned-down. Unknown and
    /// out-of-range frames are ignored.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        if frame_id.as_usize() >= self.num_frames {
            return;
        }
        let mut inner = self.inner.lock();
        let Some(access) = inner.frames.get_mut(&frame_id) else {
            return;
        };
        if access.evictable == evictable {
            return;
        }
        access.evictable = evictable;
        if evictable {
            inner.evictable_count += 1;
        } else {
            inner.evictable_count -= 1;
        }
    }

    /// Drops a frame's record. Only currently-evictable frames may be
    /// removed; anything else is ignored.
    pub fn remove(&self, frame_id: FrameId) {
        let mut inner = self.inner.lock();
        let evictable = inner.frames.get(&frame_id).map(|a| a.evictable);
        if evictable == Some(true) {
            inner.frames.remove(&frame_id);
            inner.evictable_count -= 1;
        }
    }

    /// Number of evictable frames currently tracked.
    pub fn size(&self) -> usize {
        self.inner.lock().evictable_count
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_replacer() {
        let replacer = LruKReplacer::new(2, 8);
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_single_access_frames_evict_oldest_first() {
        let replacer = LruKReplacer::new(2, 8);
        for i in 0..3 {
            replacer.record_access(FrameId::new(i));
            replacer.set_evictable(FrameId::new(i), true);
        }
        assert_eq!(replacer.size(), 3);
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), Some(FrameId::new(2)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_short_history_beats_full_history() {
        let replacer = LruKReplacer::new(2, 8);

        // Frame 0 reaches full history, frame 1 does not.
        replacer.record_access(FrameId::new(0));
        replacer.record_access(FrameId::new(0));
        replacer.record_access(FrameId::new(1));

        replacer.set_evictable(FrameId::new(0), true);
        replacer.set_evictable(FrameId::new(1), true);

        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
    }

    #[test]
    fn test_largest_k_distance_wins() {
        let replacer = LruKReplacer::new(2, 8);

        // Second accesses at t=3, t=4, t=5; frame 0's is the oldest.
        for i in 0..3 {
            replacer.record_access(FrameId::new(i));
        }
        for i in 0..3 {
            replacer.record_access(FrameId::new(i));
        }
        for i in 0..3 {
            replacer.set_evictable(FrameId::new(i), true);
        }

        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), Some(FrameId::new(2)));
    }

    #[test]
    fn test_set_evictable_unknown_frame_is_noop() {
        let replacer = LruKReplacer::new(2, 8);
        replacer.set_evictable(FrameId::new(5), true);
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_remove_requires_evictable() {
        let replacer = LruKReplacer::new(2, 8);
        replacer.record_access(FrameId::new(0));

        // Pinned: remove must not drop the record.
        replacer.remove(FrameId::new(0));
        replacer.set_evictable(FrameId::new(0), true);
        assert_eq!(replacer.size(), 1);

        replacer.remove(FrameId::new(0));
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_eviction_resets_history() {
        let replacer = LruKReplacer::new(2, 8);
        replacer.record_access(FrameId::new(0));
        replacer.record_access(FrameId::new(0));
        replacer.set_evictable(FrameId::new(0), true);
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));

        // Re-tracked frame starts over with a single access.
        replacer.record_access(FrameId::new(0));
        replacer.record_access(FrameId::new(1));
        replacer.record_access(FrameId::new(1));
        replacer.set_evictable(FrameId::new(0), true);
        replacer.set_evictable(FrameId::new(1), true);

        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
    }

    #[test]
    fn test_toggle_evictable_adjusts_size() {
        let replacer = LruKReplacer::new(2, 8);
        replacer.record_access(FrameId::new(0));
        replacer.set_evictable(FrameId::new(0), true);
        assert_eq!(replacer.size(), 1);

        replacer.set_evictable(FrameId::new(0), false);
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);

        replacer.set_evictable(FrameId::new(0), true);
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
    }
}
