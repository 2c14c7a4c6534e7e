mod config;
mod error;
mod types;

pub use config::*;
pub use error::{Result, TesseraError};
pub use types::{FrameId, PageId, RecordId, Timestamp};
