//! Extraction engine for soil-analysis laboratory reports.
//!
//! Takes PDF report bytes, decodes each page into plain text plus
//! positioned word tokens, filters for the pages that carry results, and
//! reconstructs the report's tables from token geometry. The output is
//! one flat string-keyed [`Record`] per relevant page, with Spanish
//! sentinel values for anything that could not be recovered.
//!
//! The pipeline, in order:
//!
//! 1. [`extraction`] decodes the document (pdftotext bbox backend).
//! 2. [`page`] keeps relevant pages and runs field + table extraction.
//! 3. [`layout`] reconstructs rows and columns from token positions.
//! 4. [`labels`] canonicalizes free-text interpretations.
//! 5. [`batch`] fans pages out over a bounded worker pool.

pub mod batch;
pub mod error;
pub mod extraction;
pub mod fields;
pub mod labels;
pub mod layout;
pub mod model;
pub mod page;

pub use batch::{BatchConfig, MemoryProbe, NoMemoryProbe, ProcMemoryProbe};
pub use error::SueloError;
pub use extraction::pdftotext::PdftotextDecoder;
pub use extraction::{DocumentDecoder, PageContent, Token};
pub use model::Record;

use page::is_relevant_page;

/// Message of the error record emitted when no result section exists.
pub const ERR_NO_SECTIONS: &str = "No se encontraron secciones requeridas en el PDF";

/// Message of the error record emitted under memory pressure.
pub const ERR_MEMORY: &str = "Error al procesar el PDF: memoria insuficiente";

/// Run the whole pipeline over one document.
///
/// Never fails: decoding errors and empty documents are reported as a
/// single error record so batch callers always get uniform rows. Records
/// arrive in completion order within each processing batch.
pub fn extract_document(
    bytes: &[u8],
    decoder: &dyn DocumentDecoder,
    config: &BatchConfig,
    probe: &dyn MemoryProbe,
) -> Vec<Record> {
    if let Some(usage) = probe.usage_percent() {
        if usage > config.memory_threshold_percent {
            tracing::error!(
                usage_percent = usage,
                threshold = config.memory_threshold_percent,
                "refusing document under memory pressure"
            );
            return vec![Record::error(ERR_MEMORY)];
        }
    }

    let pages = match decoder.decode_pages(bytes) {
        Ok(pages) => pages,
        Err(e) => {
            tracing::error!(backend = decoder.backend_name(), error = %e, "document decode failed");
            return vec![Record::error(format!("Error al procesar el PDF: {e}"))];
        }
    };

    let relevant: Vec<PageContent> = pages
        .into_iter()
        .filter(|p| is_relevant_page(&p.text))
        .collect();
    tracing::debug!(relevant = relevant.len(), "relevant pages selected");

    if relevant.is_empty() {
        return vec![Record::error(ERR_NO_SECTIONS)];
    }

    let records = batch::process_pages(relevant, config, probe);
    if records.is_empty() {
        return vec![Record::error(ERR_NO_SECTIONS)];
    }
    records
}
