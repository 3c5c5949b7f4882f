use std::path::PathBuf;
use std::time::Duration;

use suelo_core::error::SueloError;
use suelo_core::{extract_document, BatchConfig, NoMemoryProbe, PdftotextDecoder};

use crate::output;

pub fn batch_config(batch_size: usize, workers: usize) -> BatchConfig {
    BatchConfig {
        batch_size,
        max_workers: workers,
        page_timeout: Duration::from_secs(30),
        ..BatchConfig::default()
    }
}

pub fn run(
    pdf_file: PathBuf,
    output_format: &str,
    output_file: Option<PathBuf>,
    batch_size: usize,
    workers: usize,
) -> Result<(), SueloError> {
    let pdf_bytes = std::fs::read(&pdf_file)?;
    let decoder = PdftotextDecoder::new();
    let config = batch_config(batch_size, workers);
    let records = extract_document(&pdf_bytes, &decoder, &config, &NoMemoryProbe);

    let output_str = match output_format {
        "json" => output::json::to_pretty(&records)?,
        _ => output::table::format_records(&records),
    };

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = output::json::to_pretty(&records)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Extracted {} record(s), written to {}",
                records.len(),
                path.display()
            );
        }
        None => {
            println!("{output_str}");
        }
    }

    Ok(())
}
