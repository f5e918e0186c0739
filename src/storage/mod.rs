pub mod index;
pub mod pagefile;
pub mod record;

pub use index::{BTreeIndex, IndexCursor};
pub use pagefile::{OpenMode, PAGE_SIZE, PageId, PagedFile};
pub use record::{RecordFile, RecordId};
