use std::path::{Path, PathBuf};
use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, info, warn};

use crate::{
    LoadOptions, SourceFormat, SqlScript, assemble, assemble_script, iter_file_paths, load_dataset,
    read_table, run_sql_file, split_leading_code, table_name_from_path,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Generate and run SQL scripts from tabular files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a CREATE TABLE + INSERT script for one or more files
    Generate(GenerateArgs),
    /// Build scripts for every supported file in a directory
    Batch(BatchArgs),
    /// Execute .sql files against a SQLite database
    Run(RunArgs),
    /// Print every row of a table
    Read(ReadArgs),
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Character encoding of csv and txt inputs (defaults to utf-8)
    #[arg(long)]
    pub encoding: Option<String>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Treat the first row as column names
    #[arg(long, conflicts_with = "no_header")]
    pub header: bool,
    /// Treat the first row as data
    #[arg(long)]
    pub no_header: bool,
    /// Infer timestamp columns from csv and txt text
    #[arg(long)]
    pub parse_dates: bool,
    /// Comma-separated values to read as NULL (replaces the defaults)
    #[arg(long, value_delimiter = ',')]
    pub null_values: Option<Vec<String>>,
    /// Split a leading numeric code off the first column
    #[arg(long)]
    pub split_code: bool,
}

impl LoadArgs {
    fn options(&self) -> Result<LoadOptions> {
        let mut options = LoadOptions::new().with_parse_dates(self.parse_dates);
        if let Some(label) = &self.encoding {
            options = options.with_encoding(label)?;
        }
        if let Some(delimiter) = self.delimiter {
            options = options.with_delimiter(delimiter);
        }
        if self.header {
            options = options.with_has_header(true);
        } else if self.no_header {
            options = options.with_has_header(false);
        }
        if let Some(values) = &self.null_values {
            options = options.with_null_values(values.clone());
        }
        Ok(options)
    }
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Input files (.csv, .xls, .xlsx, .txt)
    #[arg(short, long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,
    /// Directory the .sql files are written to
    #[arg(short, long = "output-dir", required_unless_present = "stdout")]
    pub output_dir: Option<PathBuf>,
    /// Print the scripts instead of saving them
    #[arg(long)]
    pub stdout: bool,
    #[command(flatten)]
    pub load: LoadArgs,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Directory holding the input files
    #[arg(short, long = "dir")]
    pub dir: PathBuf,
    /// Directory the .sql files are written to
    #[arg(short, long = "output-dir")]
    pub output_dir: PathBuf,
    #[command(flatten)]
    pub load: LoadArgs,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// SQLite database file
    #[arg(long)]
    pub db: PathBuf,
    /// .sql files to execute, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// SQLite database file
    #[arg(long)]
    pub db: PathBuf,
    /// Table to read (interpolated verbatim, must be trusted)
    pub table: String,
    /// Emit the result as JSON
    #[arg(long)]
    pub json: bool,
}

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("tabular_sql", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => handle_generate(&args),
        Commands::Batch(args) => handle_batch(&args),
        Commands::Run(args) => handle_run(&args),
        Commands::Read(args) => handle_read(&args),
    }
}

fn handle_generate(args: &GenerateArgs) -> Result<()> {
    let options = args.load.options()?;
    for input in &args.inputs {
        let script = build_script(input, &options, args.load.split_code)?;
        if args.stdout {
            print!("{script}");
        } else if let Some(dir) = &args.output_dir {
            script
                .save_to(dir)
                .with_context(|| format!("Writing script for {input:?} to {dir:?}"))?;
        }
    }
    Ok(())
}

fn handle_batch(args: &BatchArgs) -> Result<()> {
    let options = args.load.options()?;
    let paths = iter_file_paths(&args.dir).with_context(|| format!("Listing {:?}", args.dir))?;
    let mut written = 0;
    for path in paths {
        if SourceFormat::from_path(&path).is_err() {
            warn!("Skipping {}: unsupported file format", path.display());
            continue;
        }
        let script = build_script(&path, &options, args.load.split_code)?;
        script
            .save_to(&args.output_dir)
            .with_context(|| format!("Writing script for {path:?} to {:?}", args.output_dir))?;
        written += 1;
    }
    info!("Generated {written} script(s) from {}", args.dir.display());
    Ok(())
}

fn build_script(input: &Path, options: &LoadOptions, split_code: bool) -> Result<SqlScript> {
    if !split_code {
        let (_, script) =
            assemble(input, options).with_context(|| format!("Generating SQL from {input:?}"))?;
        return Ok(script);
    }
    let dataset = load_dataset(input, options).with_context(|| format!("Loading {input:?}"))?;
    let dataset =
        split_leading_code(dataset).with_context(|| format!("Splitting codes in {input:?}"))?;
    let table_name = table_name_from_path(input)?;
    Ok(assemble_script(&dataset, &table_name))
}

fn handle_run(args: &RunArgs) -> Result<()> {
    let mut conn = rusqlite::Connection::open(&args.db)
        .with_context(|| format!("Opening database {:?}", args.db))?;
    for file in &args.files {
        run_sql_file(file, &mut conn).with_context(|| format!("Running {file:?}"))?;
    }
    Ok(())
}

fn handle_read(args: &ReadArgs) -> Result<()> {
    let mut conn = rusqlite::Connection::open(&args.db)
        .with_context(|| format!("Opening database {:?}", args.db))?;
    let result = read_table(&args.table, &mut conn)
        .with_context(|| format!("Reading table {}", args.table))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    println!("{}", result.columns.join("\t"));
    for row in &result.rows {
        let line: Vec<String> = row
            .iter()
            .map(|cell| cell.to_text().unwrap_or_else(|| "NULL".to_string()))
            .collect();
        println!("{}", line.join("\t"));
    }
    Ok(())
}

fn parse_delimiter(value: &str) -> std::result::Result<u8, String> {
    match value {
        "tab" | "\\t" => Ok(b'\t'),
        v if v.len() == 1 && v.is_ascii() => Ok(v.as_bytes()[0]),
        other => Err(format!("Unsupported delimiter '{other}'")),
    }
}
