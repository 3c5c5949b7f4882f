use std::path::PathBuf;

use serde::Serialize;
use suelo_core::error::SueloError;
use suelo_core::{extract_document, PdftotextDecoder, ProcMemoryProbe, Record};

use crate::commands::extract::batch_config;
use crate::output;

#[derive(Serialize)]
struct FileResult {
    file: String,
    records: Vec<Record>,
}

pub fn run(
    input_dir: PathBuf,
    output_file: Option<PathBuf>,
    batch_size: usize,
    workers: usize,
) -> Result<(), SueloError> {
    let mut pdf_files: Vec<PathBuf> = std::fs::read_dir(&input_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdf_files.sort();

    if pdf_files.is_empty() {
        eprintln!("No PDF files found in {}", input_dir.display());
        return Ok(());
    }

    let decoder = PdftotextDecoder::new();
    let config = batch_config(batch_size, workers);
    let probe = ProcMemoryProbe;

    let mut results = Vec::with_capacity(pdf_files.len());
    for path in &pdf_files {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        tracing::info!(file = %file, "scanning report");

        let records = match std::fs::read(path) {
            Ok(bytes) => extract_document(&bytes, &decoder, &config, &probe),
            Err(e) => vec![Record::error(format!("Error al procesar el PDF: {e}"))],
        };

        let useful = records.iter().filter(|r| !r.is_error()).count();
        eprintln!("{file}: {useful} record(s)");
        results.push(FileResult { file, records });
    }

    match output_file {
        Some(path) => {
            let json = serde_json::to_string_pretty(&results)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Scanned {} file(s), written to {}",
                results.len(),
                path.display()
            );
        }
        None => {
            for result in &results {
                println!("=== {} ===\n", result.file);
                println!("{}", output::table::format_records(&result.records));
            }
        }
    }

    Ok(())
}
