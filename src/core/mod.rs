pub mod error;
pub mod types;
pub mod value;

pub use error::{Result, StoreError};
pub use types::{Entity, EntityMeta, OrderedMap, Properties};
pub use value::{FromValue, Value, default_timestamp};
