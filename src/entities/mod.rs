pub mod accounts;
pub mod catalog_entries;
