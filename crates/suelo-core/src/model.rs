use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel: field absent or unparseable.
pub const NOT_FOUND: &str = "No encontrado";
/// Sentinel: classification could not be determined.
pub const NOT_AVAILABLE: &str = "No disponible";
/// Sentinel: source explicitly marked the value "N/A".
pub const NOT_ANALYZED: &str = "No analizado";

/// Sample-data and physical soil fields, filled by the field extractor.
pub const FIELD_KEYS: [&str; 14] = [
    "nombre_productor",
    "cultivo_establecer",
    "meta_rendimiento",
    "municipio",
    "localidad",
    "arcilla",
    "limo",
    "arena",
    "textura",
    "porcentaje_saturacion",
    "capacidad_campo",
    "punto_marchitez",
    "conductividad_hidraulica",
    "densidad_aparente",
];

/// Fertility table keys, in declared column order.
pub const FERTILITY_KEYS: [&str; 8] = [
    "mo", "fosforo", "nitrogeno", "potasio", "calcio", "magnesio", "sodio", "azufre",
];

/// Chemical parameter table keys, in declared column order.
pub const CHEMICAL_KEYS: [&str; 5] = [
    "ph_agua",
    "ph_cacl2",
    "ph_kcl",
    "carbonato_calcio",
    "conductividad_electrica",
];

/// Micronutrient table keys, in declared row order.
pub const MICRO_KEYS: [&str; 5] = ["hierro", "cobre", "zinc", "manganeso", "boro"];

/// Cation relation table keys, in declared column order.
pub const RATIO_KEYS: [&str; 5] = [
    "rel_ca_mg",
    "rel_mg_k",
    "rel_ca_k",
    "rel_ca_mg_k",
    "rel_k_mg",
];

/// One extracted record per relevant page.
///
/// A closed mapping from field keys to string values; every key of the
/// schema is always present, populated with its sentinel default when
/// nothing could be extracted. Error records carry a single `error` key
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, String>,
}

impl Record {
    /// A record with the complete key set, every key at its default sentinel.
    pub fn with_defaults() -> Self {
        let mut values = BTreeMap::new();

        for key in FIELD_KEYS {
            values.insert(key.to_string(), NOT_FOUND.to_string());
        }
        for key in FERTILITY_KEYS.iter().chain(&CHEMICAL_KEYS).chain(&RATIO_KEYS) {
            values.insert(key.to_string(), NOT_FOUND.to_string());
            values.insert(format!("interp_{key}"), NOT_AVAILABLE.to_string());
        }
        for key in MICRO_KEYS {
            values.insert(key.to_string(), NOT_FOUND.to_string());
            values.insert(format!("unidad_{key}"), NOT_FOUND.to_string());
            values.insert(format!("interp_{key}"), NOT_AVAILABLE.to_string());
        }

        Record { values }
    }

    /// A synthetic document-level error record.
    pub fn error(message: impl Into<String>) -> Self {
        let mut values = BTreeMap::new();
        values.insert("error".to_string(), message.into());
        Record { values }
    }

    pub fn is_error(&self) -> bool {
        self.values.contains_key("error")
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Overwrite a key. The key set is closed: writing a key that is not
    /// part of the schema is a programming error.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        debug_assert!(
            self.values.contains_key(key),
            "record key '{key}' is not part of the schema"
        );
        self.values.insert(key.to_string(), value.into());
    }

    /// Whether this record extracted anything beyond defaults.
    ///
    /// Probes the producer name, the crop, and a small set of numeric
    /// fields; a page whose record fails all probes is discarded.
    pub fn is_useful(&self) -> bool {
        const PROBES: [&str; 7] = [
            "nombre_productor",
            "cultivo_establecer",
            "mo",
            "fosforo",
            "ph_agua",
            "hierro",
            "rel_ca_mg",
        ];
        PROBES
            .iter()
            .any(|key| self.get(key).is_some_and(|v| v != NOT_FOUND))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_full_key_set() {
        let record = Record::with_defaults();
        // 14 fields + 18 table values with interp + 5 micros with unit and interp
        assert_eq!(record.len(), 14 + 18 * 2 + 5 * 3);
        for key in FIELD_KEYS {
            assert_eq!(record.get(key), Some(NOT_FOUND));
        }
        assert_eq!(record.get("interp_mo"), Some(NOT_AVAILABLE));
        assert_eq!(record.get("unidad_boro"), Some(NOT_FOUND));
        assert_eq!(record.get("interp_rel_k_mg"), Some(NOT_AVAILABLE));
    }

    #[test]
    fn test_default_record_not_useful() {
        assert!(!Record::with_defaults().is_useful());
    }

    #[test]
    fn test_producer_name_makes_record_useful() {
        let mut record = Record::with_defaults();
        record.set("nombre_productor", "JUAN PEREZ");
        assert!(record.is_useful());
    }

    #[test]
    fn test_numeric_probe_makes_record_useful() {
        let mut record = Record::with_defaults();
        record.set("ph_agua", "6.5");
        assert!(record.is_useful());
    }

    #[test]
    fn test_error_record() {
        let record = Record::error("no pages");
        assert!(record.is_error());
        assert_eq!(record.get("error"), Some("no pages"));
        assert_eq!(record.len(), 1);
    }
}
