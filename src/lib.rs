//! turns csv, excel and fixed-width files into `create table` + `insert` sql scripts,
//! and runs those scripts (or reads tables back) through a caller-supplied connection.

pub mod cli;
pub mod database;
pub mod dataset;
pub mod error;
pub mod fixed_width;
pub mod loader;
mod script;
mod sql_generator;
pub mod transform;
mod type_inference;
mod utils;

pub use database::{ResultSet, SqlConnection, read_table, run_sql_file};
pub use dataset::{Cell, Column, Dataset, StorageType};
pub use error::{EtlError, Result};
pub use loader::{LoadOptions, SourceFormat, load_dataset, read_csv};
pub use script::{
    CREATE_PREFIX, SqlScript, assemble, assemble_script, save_script, table_name_from_script,
};
pub use sql_generator::{COLUMN_TYPE_MAPPING, build_create_table, build_inserts, format_value, map_type};
pub use transform::split_leading_code;
pub use type_inference::{infer_storage_type, parse_cell, unify_cells};
pub use utils::{iter_file_paths, table_name_from_path};
