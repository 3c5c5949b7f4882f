mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "suelo",
    version,
    about = "Extract structured data from soil-analysis lab report PDFs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one PDF report into per-page records
    Extract {
        /// Path to the PDF file
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write records to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Pages per processing batch
        #[arg(long, default_value_t = 5)]
        batch_size: usize,

        /// Worker threads per batch
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },
    /// Extract every PDF in a directory
    Scan {
        /// Directory containing PDF reports
        input_dir: PathBuf,

        /// Write all records to a combined JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Pages per processing batch
        #[arg(long, default_value_t = 5)]
        batch_size: usize,

        /// Worker threads per batch
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input_file,
            output,
            out,
            batch_size,
            workers,
        } => commands::extract::run(input_file, &output, out, batch_size, workers),
        Commands::Scan {
            input_dir,
            out,
            batch_size,
            workers,
        } => commands::scan::run(input_dir, out, batch_size, workers),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
