//! tally-export: CSV serialization of statement transactions and account groups

pub mod csv_export;

pub use csv_export::{
    group_file_name, transactions_to_string, write_groups, write_preview, write_transactions,
    HEADERS,
};
