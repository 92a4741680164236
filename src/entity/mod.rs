pub mod merge;
pub mod persistent;
pub mod typed;

pub use merge::{FieldRule, FieldSource, MergeAnnotation, MergePolicy, MergeStrategy};
pub use persistent::PersistentFields;
pub use typed::TableEntity;
