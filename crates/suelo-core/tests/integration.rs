//! Integration tests for the extract_document() end-to-end pipeline.
//!
//! Uses a MockDecoder that returns pre-built PageContent without
//! invoking pdftotext, so these tests run without poppler-utils.

use suelo_core::{
    extract_document, BatchConfig, DocumentDecoder, MemoryProbe, NoMemoryProbe, PageContent,
    Record, SueloError, Token, ERR_MEMORY, ERR_NO_SECTIONS,
};

struct MockDecoder {
    pages: Vec<PageContent>,
}

impl DocumentDecoder for MockDecoder {
    fn decode_pages(&self, _bytes: &[u8]) -> Result<Vec<PageContent>, SueloError> {
        Ok(self.pages.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct FailingDecoder;

impl DocumentDecoder for FailingDecoder {
    fn decode_pages(&self, _bytes: &[u8]) -> Result<Vec<PageContent>, SueloError> {
        Err(SueloError::Decode("archivo corrupto".to_string()))
    }

    fn backend_name(&self) -> &str {
        "failing"
    }
}

fn extract(pages: Vec<PageContent>) -> Vec<Record> {
    extract_document(
        b"%PDF-mock",
        &MockDecoder { pages },
        &BatchConfig::default(),
        &NoMemoryProbe,
    )
}

/// A token centered at `x` on the line at `y`.
fn tok(text: &str, x: f32, y: f32) -> Token {
    Token::new(text, x - 5.0, x + 5.0, y - 4.0, y + 4.0)
}

fn sample_data_page() -> PageContent {
    PageContent {
        page_number: 1,
        text: "Nombre del productor JUAN PEREZ Coordenadas 19.1,-99.2\n\
               DATOS Y CONDICIONES DE LA MUESTRA\n\
               Cultivo a establecer MAIZ\n\
               Meta de rendimiento 12.5 t/ha\n\
               Municipio TEXCOCO Localidad SAN MIGUEL Cantidad 1\n\
               RESULTADOS\n\
               Arcilla (%) 32.1\nLimo (%) 28\nArena (%) 39.9\nTextura Franco\n"
            .to_string(),
        tokens: Vec::new(),
    }
}

/// Result page with the fertility table laid out positionally: five
/// header labels at uneven x positions, a value row, an interpretation
/// row. The page text only carries the relevance marker.
fn fertility_page() -> PageContent {
    let mut tokens = vec![
        tok("M.O", 0.0, 100.0),
        tok("Fósforo", 100.0, 100.0),
        tok("Potasio", 300.0, 100.0),
        tok("Calcio", 400.0, 100.0),
        tok("Azufre", 700.0, 100.0),
    ];
    tokens.extend([
        tok("Resultado", -80.0, 120.0),
        tok("3,5", 0.0, 120.0),
        tok("N/A", 100.0, 120.0),
        tok("12", 300.0, 120.0),
        tok("8", 400.0, 120.0),
        tok("1,2", 500.0, 120.0),
    ]);
    tokens.extend([
        tok("Interpretación", -80.0, 140.0),
        tok("medio", 0.0, 140.0),
        tok("muy", 290.0, 140.0),
        tok("alto", 310.0, 140.0),
    ]);
    PageContent {
        page_number: 2,
        text: "DATOS Y CONDICIONES DE LA MUESTRA\n".to_string(),
        tokens,
    }
}

fn micronutrients_and_relations_page() -> PageContent {
    let mut tokens = vec![
        tok("MICRONUTRIENTES", 200.0, 50.0),
        tok("Parámetro", 50.0, 70.0),
        tok("Unidad", 200.0, 70.0),
        tok("Resultado", 300.0, 70.0),
        tok("Interpretación", 420.0, 70.0),
        tok("Hierro", 40.0, 90.0),
        tok("(Fe)", 70.0, 90.0),
        tok("mg", 190.0, 90.0),
        tok("kg¯¹", 215.0, 90.0),
        tok("12,5", 300.0, 90.0),
        tok("Alto", 420.0, 90.0),
        tok("Zinc", 40.0, 110.0),
        tok("1,1", 300.0, 110.0),
    ];
    tokens.extend([
        tok("RELACIONES", 100.0, 300.0),
        tok("ENTRE", 160.0, 300.0),
        tok("CATIONES", 220.0, 300.0),
        tok("Ca/Mg", 100.0, 320.0),
        tok("Mg/K", 200.0, 320.0),
        tok("Ca/K", 300.0, 320.0),
        tok("(Ca+Mg)/K", 400.0, 320.0),
        tok("K/Mg", 500.0, 320.0),
        tok("2.1", 100.0, 340.0),
        tok("0,8", 200.0, 340.0),
        tok("1.5", 300.0, 340.0),
        tok("Me/100", 100.0, 360.0),
        tok("g", 300.0, 360.0),
    ]);
    PageContent {
        page_number: 3,
        text: "MICRONUTRIENTES\n".to_string(),
        tokens,
    }
}

#[test]
fn test_sample_data_fields_extracted() {
    let records = extract(vec![sample_data_page()]);
    assert_eq!(records.len(), 1);
    let record = &records[0];

    assert_eq!(record.get("nombre_productor"), Some("JUAN PEREZ"));
    assert_eq!(record.get("cultivo_establecer"), Some("MAIZ"));
    assert_eq!(record.get("meta_rendimiento"), Some("12.5"));
    assert_eq!(record.get("municipio"), Some("TEXCOCO"));
    assert_eq!(record.get("localidad"), Some("SAN MIGUEL"));
    assert_eq!(record.get("arcilla"), Some("32.1"));
    assert_eq!(record.get("textura"), Some("Franco"));
    // nothing tabular on this page
    assert_eq!(record.get("mo"), Some("No encontrado"));
    assert_eq!(record.get("interp_mo"), Some("No disponible"));
}

#[test]
fn test_fertility_table_bucketed_to_columns() {
    let records = extract(vec![fertility_page()]);
    assert_eq!(records.len(), 1);
    let record = &records[0];

    // found header labels keep their centers, the rest interpolate
    // evenly between them, and each value lands on its nearest column
    assert_eq!(record.get("mo"), Some("3.5"));
    assert_eq!(record.get("fosforo"), Some("No analizado"));
    assert_eq!(record.get("nitrogeno"), Some("No encontrado"));
    assert_eq!(record.get("potasio"), Some("12"));
    assert_eq!(record.get("calcio"), Some("8"));
    assert_eq!(record.get("magnesio"), Some("1.2"));
    assert_eq!(record.get("sodio"), Some("No encontrado"));
    assert_eq!(record.get("azufre"), Some("No encontrado"));

    // split "muy alto" is stitched before classification
    assert_eq!(record.get("interp_mo"), Some("Medio"));
    assert_eq!(record.get("interp_potasio"), Some("Muy Alto"));
    assert_eq!(record.get("interp_nitrogeno"), Some("No disponible"));
}

#[test]
fn test_micronutrients_and_cation_relations() {
    let records = extract(vec![micronutrients_and_relations_page()]);
    assert_eq!(records.len(), 1);
    let record = &records[0];

    assert_eq!(record.get("hierro"), Some("12.5"));
    assert_eq!(record.get("unidad_hierro"), Some("mg kg¯¹"));
    assert_eq!(record.get("interp_hierro"), Some("Alto"));
    // unit bucket empty: canonical default unit applies
    assert_eq!(record.get("zinc"), Some("1.1"));
    assert_eq!(record.get("unidad_zinc"), Some("mg kg¯¹"));
    assert_eq!(record.get("boro"), Some("No encontrado"));

    assert_eq!(record.get("rel_ca_mg"), Some("2.1"));
    assert_eq!(record.get("rel_mg_k"), Some("0.8"));
    assert_eq!(record.get("rel_ca_k"), Some("1.5"));
    assert_eq!(record.get("rel_ca_mg_k"), Some("No encontrado"));
    // interpretation row holds only unit noise
    assert_eq!(record.get("interp_rel_ca_mg"), Some("No disponible"));
    assert_eq!(record.get("interp_rel_mg_k"), Some("No disponible"));
}

#[test]
fn test_irrelevant_pages_yield_error_record() {
    let records = extract(vec![PageContent {
        page_number: 1,
        text: "Portada del laboratorio\n".to_string(),
        tokens: Vec::new(),
    }]);
    assert_eq!(records.len(), 1);
    assert!(records[0].is_error());
    assert_eq!(records[0].get("error"), Some(ERR_NO_SECTIONS));
}

#[test]
fn test_relevant_but_empty_page_yields_error_record() {
    // relevance marker present, but nothing extractable on the page
    let records = extract(vec![PageContent {
        page_number: 1,
        text: "DATOS Y CONDICIONES DE LA MUESTRA\n".to_string(),
        tokens: Vec::new(),
    }]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("error"), Some(ERR_NO_SECTIONS));
}

#[test]
fn test_decode_failure_yields_error_record() {
    let records = extract_document(
        b"not a pdf",
        &FailingDecoder,
        &BatchConfig::default(),
        &NoMemoryProbe,
    );
    assert_eq!(records.len(), 1);
    let message = records[0].get("error").unwrap();
    assert!(message.starts_with("Error al procesar el PDF:"));
    assert!(message.contains("archivo corrupto"));
}

#[test]
fn test_memory_pressure_yields_resource_error_record() {
    struct SaturatedProbe;
    impl MemoryProbe for SaturatedProbe {
        fn usage_percent(&self) -> Option<f32> {
            Some(99.0)
        }
    }

    let records = extract_document(
        b"%PDF-mock",
        &MockDecoder {
            pages: vec![sample_data_page()],
        },
        &BatchConfig::default(),
        &SaturatedProbe,
    );
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("error"), Some(ERR_MEMORY));
}

#[test]
fn test_worker_count_does_not_change_results() {
    let pages = vec![
        sample_data_page(),
        fertility_page(),
        micronutrients_and_relations_page(),
    ];
    let decoder = MockDecoder { pages };

    let serial = BatchConfig {
        batch_size: 1,
        max_workers: 1,
        ..BatchConfig::default()
    };
    let parallel = BatchConfig {
        batch_size: 3,
        max_workers: 4,
        ..BatchConfig::default()
    };

    let sort_key = |r: &Record| {
        (
            r.get("nombre_productor").unwrap_or("").to_string(),
            r.get("mo").unwrap_or("").to_string(),
            r.get("hierro").unwrap_or("").to_string(),
        )
    };
    let mut a = extract_document(b"x", &decoder, &serial, &NoMemoryProbe);
    let mut b = extract_document(b"x", &decoder, &parallel, &NoMemoryProbe);
    a.sort_by_key(sort_key);
    b.sort_by_key(sort_key);
    assert_eq!(a, b);
}

#[test]
fn test_records_serialize_as_flat_json_objects() {
    let records = extract(vec![sample_data_page()]);
    let json = serde_json::to_value(&records).unwrap();

    let obj = json
        .as_array()
        .and_then(|a| a.first())
        .and_then(|v| v.as_object())
        .unwrap();
    assert_eq!(obj.get("nombre_productor").unwrap(), "JUAN PEREZ");
    assert_eq!(obj.get("interp_hierro").unwrap(), "No disponible");
    assert!(obj.values().all(|v| v.is_string()));
}
