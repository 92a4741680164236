pub mod cache;
pub mod engine;
pub mod memory;
pub mod persistence;
pub mod table;

pub use cache::{TableHandle, TableHandleCache};
pub use engine::{ContinuationToken, ScanPage, TableStore};
pub use memory::InMemoryTableStore;
pub use persistence::{SnapshotManager, StoreSnapshot};
pub use table::{ETAG_WILDCARD, Table, validate_table_name};
