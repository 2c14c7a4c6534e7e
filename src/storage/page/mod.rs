mod btree_internal_page;
mod btree_leaf_page;
mod btree_page;
mod header_page;

pub use btree_internal_page::{InternalPage, InternalPageRef, INTERNAL_PAGE_CAPACITY};
pub use btree_leaf_page::{LeafPage, LeafPageRef, LEAF_PAGE_CAPACITY};
pub use btree_page::{BTreePage, PageType, BTREE_HEADER_SIZE};
pub use header_page::{HeaderPage, HeaderPageRef, HEADER_PAGE_CAPACITY};

pub(crate) use btree_page::set_parent_page_id_of;
