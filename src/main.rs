fn main() {
    if let Err(err) = tabular_sql::cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
