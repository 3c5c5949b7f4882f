use regex::Regex;
use std::sync::LazyLock;

use crate::model::NOT_FOUND;

/// Where a field's anchor pattern is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope {
    /// Whole page text.
    Page,
    /// The "DATOS Y CONDICIONES DE LA MUESTRA" section slice, falling
    /// back to the whole page when the section bounds are not found.
    SampleSection,
}

/// A single scalar field: a key, an anchored capture pattern, and the
/// text scope to search in. Missing or empty captures yield `No encontrado`.
pub struct FieldSpec {
    pub key: &'static str,
    pub scope: FieldScope,
    pattern: LazyLock<Regex>,
}

macro_rules! field {
    ($key:literal, $scope:expr, $pattern:literal) => {
        FieldSpec {
            key: $key,
            scope: $scope,
            pattern: LazyLock::new(|| Regex::new($pattern).expect("valid field pattern")),
        }
    };
}

/// The fixed field set: sample data first, then physical soil properties.
///
/// Patterns mirror the report wording; open-ended captures stop at the
/// label of the following field so neighboring columns don't bleed in.
pub static FIELD_SPECS: [FieldSpec; 14] = [
    field!(
        "nombre_productor",
        FieldScope::Page,
        r"(?i)Nombre del productor\s+([A-ZÁÉÍÓÚÑ\s]+?)(?:\s*Coordenadas|$)"
    ),
    field!(
        "cultivo_establecer",
        FieldScope::SampleSection,
        r"(?i)Cultivo a establecer\s+([A-ZÁÉÍÓÚÑ\s]+?)(?:\s+Meta de rendimiento|\n)"
    ),
    field!(
        "meta_rendimiento",
        FieldScope::SampleSection,
        r"(?i)Meta de rendimiento\s+([\d.]+)\s*t/ha"
    ),
    field!(
        "municipio",
        FieldScope::SampleSection,
        r"(?i)Municipio\s+([A-ZÁÉÍÓÚÑ\s]+?)\s+Localidad\b"
    ),
    field!(
        "localidad",
        FieldScope::SampleSection,
        r"(?i)Localidad\s+([A-ZÁÉÍÓÚÑ\s]+?)(?:\s+Cantidad\b|\n)"
    ),
    field!(
        "arcilla",
        FieldScope::Page,
        r"(?i)Arcilla\s*\(%\)\s+([\d.]+)"
    ),
    field!("limo", FieldScope::Page, r"(?i)Limo\s*\(%\)\s+([\d.]+)"),
    field!("arena", FieldScope::Page, r"(?i)Arena\s*\(%\)\s+([\d.]+)"),
    field!(
        "textura",
        FieldScope::Page,
        r"(?i)Textura\s+([A-Za-zÁÉÍÓÚÑáéíóúñ]+)"
    ),
    field!(
        "porcentaje_saturacion",
        FieldScope::Page,
        r"(?i)Porcentaje de saturación\s*\(PS\)\s+(\S+)"
    ),
    field!(
        "capacidad_campo",
        FieldScope::Page,
        r"(?i)Capacidad de campo\s*\(cc\)\s+(\S+)"
    ),
    field!(
        "punto_marchitez",
        FieldScope::Page,
        r"(?i)Punto de marchitez permanente\s*\(pmp\)\s+(\S+)"
    ),
    field!(
        "conductividad_hidraulica",
        FieldScope::Page,
        r"(?i)Conductividad hidráulica\s+(\S+)"
    ),
    field!(
        "densidad_aparente",
        FieldScope::Page,
        r"(?i)Densidad aparente\s*\(Dap\)\s+(\S+)"
    ),
];

static SAMPLE_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)DATOS Y CONDICIONES DE LA MUESTRA(.*?)(?:RESULTADOS|PARÁMETROS QUÍMICOS DEL SUELO)",
    )
    .expect("valid section pattern")
});

/// Slice the sample-data section out of a page's text, if both bounds
/// are present.
pub fn slice_sample_section(page_text: &str) -> Option<&str> {
    SAMPLE_SECTION
        .captures(page_text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Apply a field's anchor pattern to text; first capture group, trimmed.
/// Missing match or empty capture yields the default sentinel.
pub fn extract_field(spec: &FieldSpec, text: &str) -> String {
    spec.pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Extract all fields from a page, honoring each spec's scope.
pub fn extract_fields(page_text: &str) -> Vec<(&'static str, String)> {
    let section = slice_sample_section(page_text).unwrap_or(page_text);

    FIELD_SPECS
        .iter()
        .map(|spec| {
            let haystack = match spec.scope {
                FieldScope::Page => page_text,
                FieldScope::SampleSection => section,
            };
            (spec.key, extract_field(spec, haystack))
        })
        .collect()
}
