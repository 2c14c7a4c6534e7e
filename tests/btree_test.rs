//! Integration tests for the B+Tree index

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tempfile::NamedTempFile;

use tessera::buffer::BufferPoolManager;
use tessera::common::{PageId, RecordId};
use tessera::index::{BPlusTree, IntegerComparator};
use tessera::storage::disk::DiskManager;
use tessera::storage::page::{BTreePage, InternalPageRef};

fn create_bpm(pool_size: usize) -> (Arc<BufferPoolManager>, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = Arc::new(DiskManager::new(temp_file.path()).unwrap());
    (Arc::new(BufferPoolManager::new(pool_size, 2, dm)), temp_file)
}

fn create_tree(
    bpm: &Arc<BufferPoolManager>,
    leaf_max: usize,
    internal_max: usize,
) -> BPlusTree {
    BPlusTree::new(
        "test_index",
        Arc::clone(bpm),
        Arc::new(IntegerComparator),
        leaf_max,
        internal_max,
    )
}

fn record(key: u32) -> RecordId {
    RecordId::new(PageId::new(key), (key % 32) as u16)
}

fn collect_keys(tree: &BPlusTree) -> Vec<u32> {
    tree.iter()
        .unwrap()
        .map(|entry| entry.unwrap().0)
        .collect()
}

#[test]
fn test_empty_tree() {
    let (bpm, _temp) = create_bpm(10);
    let mut tree = create_tree(&bpm, 4, 5);

    assert!(tree.is_empty());
    assert_eq!(tree.get_value(1).unwrap(), None);
    tree.remove(1).unwrap();
    assert_eq!(collect_keys(&tree), Vec::<u32>::new());
}

#[test]
fn test_first_split_promotes_middle_key() {
    let (bpm, _temp) = create_bpm(20);
    let mut tree = create_tree(&bpm, 4, 5);

    for key in 1..=3 {
        assert!(tree.insert(key, record(key)).unwrap());
    }
    let leaf_root = tree.root_page_id();

    // The fourth insert overflows the leaf and grows a new internal root
    // whose single separator is 3.
    assert!(tree.insert(4, record(4)).unwrap());
    assert_ne!(tree.root_page_id(), leaf_root);

    let frame = bpm.fetch_page(tree.root_page_id()).unwrap();
    {
        let data = frame.read_data();
        assert!(!BTreePage::new(&data[..]).is_leaf());
        let root = InternalPageRef::new(&data[..]);
        assert_eq!(root.size(), 2);
        assert_eq!(root.key_at(1), 3);
    }
    bpm.unpin_page(tree.root_page_id(), false);

    assert!(tree.insert(5, record(5)).unwrap());
    assert_eq!(tree.get_value(3).unwrap(), Some(record(3)));
    assert_eq!(collect_keys(&tree), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_duplicate_insert_is_rejected() {
    let (bpm, _temp) = create_bpm(10);
    let mut tree = create_tree(&bpm, 4, 5);

    assert!(tree.insert(7, record(7)).unwrap());
    assert!(!tree.insert(7, record(8)).unwrap());
    assert_eq!(tree.get_value(7).unwrap(), Some(record(7)));
}

#[test]
fn test_delete_with_merge_and_borrow() {
    let (bpm, _temp) = create_bpm(20);
    let mut tree = create_tree(&bpm, 4, 5);

    for key in 1..=7 {
        assert!(tree.insert(key, record(key)).unwrap());
    }

    // Deleting the low keys forces a leaf merge and then a borrow from the
    // right sibling.
    for key in 1..=3 {
        tree.remove(key).unwrap();
        for remaining in key + 1..=7 {
            assert_eq!(
                tree.get_value(remaining).unwrap(),
                Some(record(remaining)),
                "lost key {} after removing {}",
                remaining,
                key
            );
        }
    }
    assert_eq!(collect_keys(&tree), vec![4, 5, 6, 7]);

    // One more removal leaves a single leaf's worth of data; the root
    // collapses back to that leaf.
    tree.remove(7).unwrap();
    let frame = bpm.fetch_page(tree.root_page_id()).unwrap();
    {
        let data = frame.read_data();
        assert!(BTreePage::new(&data[..]).is_leaf());
    }
    bpm.unpin_page(tree.root_page_id(), false);
    assert_eq!(collect_keys(&tree), vec![4, 5, 6]);
}

#[test]
fn test_delete_borrows_from_left_sibling() {
    let (bpm, _temp) = create_bpm(20);
    let mut tree = create_tree(&bpm, 4, 5);

    for key in 1..=5 {
        tree.insert(key, record(key)).unwrap();
    }
    tree.insert(0, record(0)).unwrap();

    // Shrink the right leaf below minimum; its left sibling holds three
    // entries and donates its last one.
    tree.remove(4).unwrap();
    tree.remove(5).unwrap();

    assert_eq!(collect_keys(&tree), vec![0, 1, 2, 3]);
    for key in 0..=3 {
        assert_eq!(tree.get_value(key).unwrap(), Some(record(key)));
    }
}

#[test]
fn test_delete_everything_then_reuse() {
    let (bpm, _temp) = create_bpm(30);
    let mut tree = create_tree(&bpm, 3, 3);
    let mut rng = StdRng::seed_from_u64(99);

    let mut keys: Vec<u32> = (0..60).collect();
    keys.shuffle(&mut rng);
    for &key in &keys {
        assert!(tree.insert(key, record(key)).unwrap());
    }
    assert_eq!(collect_keys(&tree), (0..60).collect::<Vec<u32>>());

    keys.shuffle(&mut rng);
    for &key in &keys {
        tree.remove(key).unwrap();
        assert_eq!(tree.get_value(key).unwrap(), None);
    }
    assert!(tree.is_empty());
    assert_eq!(collect_keys(&tree), Vec::<u32>::new());

    // The emptied tree accepts new data.
    for key in [5u32, 1, 9] {
        assert!(tree.insert(key, record(key)).unwrap());
    }
    assert_eq!(collect_keys(&tree), vec![1, 5, 9]);
}

#[test]
fn test_many_keys_ascending_and_lookup() {
    let (bpm, _temp) = create_bpm(50);
    let mut tree = create_tree(&bpm, 8, 8);

    for key in 0..300 {
        assert!(tree.insert(key, record(key)).unwrap());
    }
    for key in 0..300 {
        assert_eq!(tree.get_value(key).unwrap(), Some(record(key)), "key {}", key);
    }
    assert_eq!(tree.get_value(300).unwrap(), None);
    assert_eq!(collect_keys(&tree), (0..300).collect::<Vec<u32>>());
}

#[test]
fn test_many_keys_descending_insert() {
    let (bpm, _temp) = create_bpm(50);
    let mut tree = create_tree(&bpm, 4, 5);

    for key in (0..120).rev() {
        assert!(tree.insert(key, record(key)).unwrap());
    }
    assert_eq!(collect_keys(&tree), (0..120).collect::<Vec<u32>>());
}

#[test]
fn test_mixed_workload() {
    let (bpm, _temp) = create_bpm(30);
    let mut tree = create_tree(&bpm, 4, 5);
    let mut rng = StdRng::seed_from_u64(1234);

    let mut keys: Vec<u32> = (0..120).collect();
    keys.shuffle(&mut rng);
    for &key in &keys {
        tree.insert(key, record(key)).unwrap();
    }

    for key in (0..120).filter(|k| k % 2 == 0) {
        tree.remove(key).unwrap();
    }
    for key in 0..120 {
        let expected = (key % 2 == 1).then(|| record(key));
        assert_eq!(tree.get_value(key).unwrap(), expected, "key {}", key);
    }
    let odds: Vec<u32> = (0..120).filter(|k| k % 2 == 1).collect();
    assert_eq!(collect_keys(&tree), odds);
}

#[test]
fn test_iter_from_key() {
    let (bpm, _temp) = create_bpm(30);
    let mut tree = create_tree(&bpm, 4, 5);

    for key in (10..60).step_by(10) {
        tree.insert(key, record(key)).unwrap();
    }

    let keys: Vec<u32> = tree
        .iter_from(30)
        .unwrap()
        .map(|entry| entry.unwrap().0)
        .collect();
    assert_eq!(keys, vec![30, 40, 50]);

    // An absent key falls back to the very first entry.
    let keys: Vec<u32> = tree
        .iter_from(35)
        .unwrap()
        .map(|entry| entry.unwrap().0)
        .collect();
    assert_eq!(keys, vec![10, 20, 30, 40, 50]);
}

#[test]
fn test_iterator_drop_releases_pins() {
    let (bpm, _temp) = create_bpm(10);
    let mut tree = create_tree(&bpm, 4, 5);
    for key in 0..20 {
        tree.insert(key, record(key)).unwrap();
    }

    {
        let mut iter = tree.iter().unwrap();
        // Consume only part of the chain, then drop mid-leaf.
        for _ in 0..3 {
            iter.next();
        }
    }

    // With no pins left behind, the whole pool is reclaimable.
    for _ in 0..10 {
        let (pid, _) = bpm.new_page().unwrap();
        bpm.unpin_page(pid, false);
    }
}

#[test]
fn test_reopen_from_header_page() {
    let (bpm, _temp) = create_bpm(30);
    let root_id;
    {
        let mut tree = create_tree(&bpm, 4, 5);
        for key in 0..50 {
            tree.insert(key, record(key)).unwrap();
        }
        root_id = tree.root_page_id();
    }

    let reopened = BPlusTree::open(
        "test_index",
        Arc::clone(&bpm),
        Arc::new(IntegerComparator),
        4,
        5,
    )
    .unwrap();
    assert_eq!(reopened.root_page_id(), root_id);
    for key in 0..50 {
        assert_eq!(reopened.get_value(key).unwrap(), Some(record(key)));
    }
    assert_eq!(collect_keys(&reopened), (0..50).collect::<Vec<u32>>());
}
