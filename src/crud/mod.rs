//! Create/read/update/delete façades bound to one table partition.

pub mod record_crud;
pub mod table_crud;

pub use record_crud::RecordCrud;
pub use table_crud::TableEntityCrud;
