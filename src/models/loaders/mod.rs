pub mod csv_loader;

pub use csv_loader::{load_reference_table, normalize_header, read_reference_table, TableSchema};
