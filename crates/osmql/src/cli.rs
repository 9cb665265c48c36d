//! osmql command-line interface

use clap::{Parser, Subcommand};
use colored::Colorize;
use osmql_builder::{JsonSerializer, load_query};
use osmql_diagnostics::Severity;
use std::path::PathBuf;

/// Overpass QL query builder tools
#[derive(Parser)]
#[command(name = "osmql")]
#[command(author, version, about = "Overpass QL query builder tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a saved query document to Overpass QL text
    Compile {
        /// Query document (JSON) to compile
        file: PathBuf,
    },
    /// Check a saved query document and report diagnostics
    Validate {
        /// Query documents (JSON) to validate
        files: Vec<PathBuf>,
    },
    /// Re-emit a query document in the current format, normalized
    Fmt {
        /// Query document (JSON) to rewrite
        file: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the CLI with the process arguments.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { file } => {
            let query = load_query(&file)?;
            for diagnostic in query.validate() {
                if diagnostic.severity == Severity::Warning {
                    eprintln!("{} {}", "warning:".yellow().bold(), diagnostic);
                }
            }
            println!("{}", query.compile()?);
        }
        Commands::Validate { files } => {
            let mut failed = false;
            for file in files {
                let query = load_query(&file)?;
                let diagnostics = query.validate();
                if diagnostics.is_empty() {
                    println!("{} {}", "ok".green().bold(), file.display());
                    continue;
                }
                for diagnostic in &diagnostics {
                    let label = match diagnostic.severity {
                        Severity::Error => "error:".red().bold(),
                        Severity::Warning => "warning:".yellow().bold(),
                        Severity::Info => "info:".blue().bold(),
                    };
                    println!("{} {}: {}", label, file.display(), diagnostic);
                }
                failed |= diagnostics
                    .iter()
                    .any(|d| d.severity == Severity::Error);
            }
            if failed {
                anyhow::bail!("validation failed");
            }
        }
        Commands::Fmt { file, output } => {
            let query = load_query(&file)?;
            let json = JsonSerializer::pretty().serialize(&query)?;
            match output {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{}", json),
            }
        }
    }
    Ok(())
}
