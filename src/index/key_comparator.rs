use std::cmp::Ordering;

/// Ordering seam for index keys. The tree and the page codecs never compare
/// keys directly; every decision goes through the comparator handed to the
/// tree at construction.
pub trait KeyComparator: Send + Sync {
    fn compare(&self, a: u32, b: u32) -> Ordering;
}

/// Natural unsigned order.
pub struct IntegerComparator;

impl KeyComparator for IntegerComparator {
    fn compare(&self, a: u32, b: u32) -> Ordering {
        a.cmp(&b)
    }
}

/// Reversed order; a tree built with this iterates from the largest key
/// down.
pub struct ReverseComparator;

impl KeyComparator for ReverseComparator {
    fn compare(&self, a: u32, b: u32) -> Ordering {
        b.cmp(&a)
    }
}
