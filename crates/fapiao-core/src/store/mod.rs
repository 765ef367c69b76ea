//! SQLite persistence: connection setup and migrations, record CRUD,
//! the recycle-bin lifecycle, and read-side queries.

pub mod lifecycle;
pub mod query;
pub mod records;
pub mod sqlite;

pub use lifecycle::{
    RETENTION_DAYS, empty_recycle_bin, list_recycled, move_to_recycle, permanent_delete,
    purge_expired, restore,
};
pub use query::{
    SEARCH_LIMIT, SearchFilter, SortDirection, SortKey, Statistics, list_records, search_records,
    statistics,
};
pub use records::{
    NewRecord, batch_update_fields, find_id_by_fingerprint, find_id_by_invoice_number, get_record,
    insert_record, update_fields,
};
pub use sqlite::{open_database, open_memory_database};
