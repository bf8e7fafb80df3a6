#[cfg(not(feature = "cli"))]
compile_error!("The `recman` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::process;

use recman::cli::app::{Cli, Commands};
use recman::BtrieveError;

fn main() {
    let cli = Cli::parse();

    let writer_result: Result<Box<dyn Write>, BtrieveError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|e| BtrieveError::IoError(format!("cannot create {path}: {e}"))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };

    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Stat { file, json } => {
            recman::cli::stat::execute(&recman::cli::stat::StatOptions { file, json }, &mut writer)
        }
        Commands::Create { file, out } => {
            recman::cli::create::execute(&recman::cli::create::CreateOptions { file, out }, &mut writer)
        }
        Commands::Dump { file, position } => {
            recman::cli::dump::execute(&recman::cli::dump::DumpOptions { file, position }, &mut writer)
        }
        Commands::Query { file, key, op, value } => recman::cli::query::execute(
            &recman::cli::query::QueryOptions { file, key, op, value },
            &mut writer,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {e} (code {})", e.code());
        process::exit(1);
    }
}
