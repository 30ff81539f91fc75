//! assembling `create table` + `insert` scripts and writing them to disk.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::dataset::Dataset;
use crate::error::{EtlError, Result};
use crate::loader::{LoadOptions, load_dataset};
use crate::sql_generator::{build_create_table, build_inserts};
use crate::utils::table_name_from_path;

/// every assembled script starts with this, followed by the table name and ` (`.
pub const CREATE_PREFIX: &str = "CREATE TABLE IF NOT EXISTS ";
const NAME_END_MARKER: &str = " (";

/// a generated script together with the table it creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlScript {
    table_name: String,
    text: String,
}

impl SqlScript {
    /// wraps existing script text, recovering the table name from its first statement.
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let table_name = table_name_from_script(&text)?.to_string();
        Ok(SqlScript { table_name, text })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// writes the script to `<output_dir>/<table_name>.sql` without overwriting anything.
    pub fn save_to(&self, output_dir: &Path) -> Result<PathBuf> {
        write_unique(&self.table_name, &self.text, output_dir)
    }
}

impl fmt::Display for SqlScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// joins the `create table` statement and the row inserts into one script.
///
/// the ddl is followed by a blank line and one insert per line; the script always ends
/// with exactly one newline, so a dataset without rows yields just the ddl.
pub fn assemble_script(dataset: &Dataset, table_name: &str) -> SqlScript {
    let mut text = build_create_table(dataset, table_name);
    let inserts = build_inserts(dataset, table_name);
    if !inserts.is_empty() {
        text.push_str("\n\n");
        text.push_str(&inserts.join("\n"));
    }
    text.push('\n');

    SqlScript {
        table_name: table_name.to_string(),
        text,
    }
}

/// loads a source file and builds its script; the table name is the lower-cased file stem.
///
/// the parsed dataset is handed back so callers can reuse it without reading the file again.
pub fn assemble(source_path: &Path, options: &LoadOptions) -> Result<(Dataset, SqlScript)> {
    let dataset = load_dataset(source_path, options)?;
    let table_name = table_name_from_path(source_path)?;
    let script = assemble_script(&dataset, &table_name);
    debug!(
        "Assembled script for table {table_name} with {} insert(s)",
        dataset.row_count()
    );
    Ok((dataset, script))
}

/// recovers the table name from the leading `create table if not exists <name> (` of a script.
pub fn table_name_from_script(script: &str) -> Result<&str> {
    let rest = script.strip_prefix(CREATE_PREFIX).ok_or_else(|| {
        EtlError::MalformedScript("SQL script does not start with the expected prefix".to_string())
    })?;
    let end = rest.find(NAME_END_MARKER).ok_or_else(|| {
        EtlError::MalformedScript("SQL script does not have the expected format".to_string())
    })?;
    let table_name = &rest[..end];
    if table_name.trim().is_empty() {
        return Err(EtlError::MalformedScript(
            "SQL script does not name a table".to_string(),
        ));
    }
    Ok(table_name)
}

/// saves script text under its table name, returning the path of the new file.
///
/// the script is validated before the directory is touched. when `<name>.sql` is taken the
/// first free `<name>_1.sql`, `<name>_2.sql`, ... is used instead.
pub fn save_script(script: &str, output_dir: &Path) -> Result<PathBuf> {
    let table_name = table_name_from_script(script)?;
    write_unique(table_name, script, output_dir)
}

fn write_unique(table_name: &str, text: &str, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let mut candidate = output_dir.join(format!("{table_name}.sql"));
    let mut counter = 1;
    loop {
        // create_new fails on an existing file, so nothing is ever overwritten.
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut file) => {
                file.write_all(text.as_bytes())?;
                let saved = candidate
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                info!("Successfully saved {saved} to {}", output_dir.display());
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                candidate = output_dir.join(format!("{table_name}_{counter}.sql"));
                counter += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
