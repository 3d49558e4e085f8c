//! Persistence layer — append-only tabular storage for completed profiles.

pub mod csv_backend;
pub mod traits;

pub use csv_backend::CsvProfileStore;
pub use traits::ProfileStore;
