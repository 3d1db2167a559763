//! Data engineering: loading, cleaning, profiling, persistence.

pub mod clean;
pub mod schema;
pub mod source;
pub mod storage;
pub mod table;
pub mod validate;

pub use clean::{Cleaner, ImputeStrategy, Imputation};
pub use schema::{ColumnSchema, ColumnType, SchemaDefinition};
pub use source::CsvSource;
pub use storage::{hash_file, write_json, write_model, write_report, write_table};
pub use table::DataTable;
pub use validate::{DataQualityReport, profile};
