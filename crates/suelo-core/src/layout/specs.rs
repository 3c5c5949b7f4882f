//! The four tabular sections of a soil report, described declaratively.

use crate::layout::tables::{ColumnSpec, LayoutVariant, Locator, ParamTarget, TableSpec};

/// Fertility results. Only five of the eight columns carry a reliably
/// word-split header label; the other three take interpolated centers.
pub static FERTILITY: TableSpec = TableSpec {
    name: "fertilidad",
    locator: Locator::HeaderLabels,
    columns: &[
        ColumnSpec { key: "mo", labels: &["M.O", "M.O."] },
        ColumnSpec { key: "fosforo", labels: &["Fósforo", "Fosforo"] },
        ColumnSpec { key: "nitrogeno", labels: &[] },
        ColumnSpec { key: "potasio", labels: &["Potasio"] },
        ColumnSpec { key: "calcio", labels: &["Calcio"] },
        ColumnSpec { key: "magnesio", labels: &[] },
        ColumnSpec { key: "sodio", labels: &[] },
        ColumnSpec { key: "azufre", labels: &["Azufre"] },
    ],
    variant: LayoutVariant::AttributeHeader,
};

/// Chemical parameters. The three pH variants are told apart by their
/// solution token; carbonate and conductivity anchor the right edge.
pub static CHEMICAL: TableSpec = TableSpec {
    name: "parametros_quimicos",
    locator: Locator::HeaderLabels,
    columns: &[
        ColumnSpec { key: "ph_agua", labels: &["(Agua)", "Agua"] },
        ColumnSpec { key: "ph_cacl2", labels: &["(CaCl2)", "CaCl2"] },
        ColumnSpec { key: "ph_kcl", labels: &["(KCl)", "KCl"] },
        ColumnSpec { key: "carbonato_calcio", labels: &["Carbonato"] },
        ColumnSpec { key: "conductividad_electrica", labels: &["Conductividad"] },
    ],
    variant: LayoutVariant::AttributeHeader,
};

/// Micronutrients: a row-per-parameter table under its section title.
pub static MICRONUTRIENTS: TableSpec = TableSpec {
    name: "micronutrientes",
    locator: Locator::TitleContains("MICRONUTRIENTES"),
    columns: &[
        ColumnSpec { key: "parametro", labels: &["Parámetro", "Parametro"] },
        ColumnSpec { key: "unidad", labels: &["Unidad"] },
        ColumnSpec { key: "resultado", labels: &["Resultado"] },
        ColumnSpec { key: "interpretacion", labels: &["Interpretación", "Interpretacion"] },
    ],
    variant: LayoutVariant::ParameterTable {
        targets: &[
            ParamTarget { key: "hierro", name: "Hierro" },
            ParamTarget { key: "cobre", name: "Cobre" },
            ParamTarget { key: "zinc", name: "Zinc" },
            ParamTarget { key: "manganeso", name: "Manganeso" },
            ParamTarget { key: "boro", name: "Boro" },
        ],
        terminator: "RELACIONES",
        default_unit: "mg kg¯¹",
    },
};

/// Cation relations: ratio names as column headers, one value row and
/// one interpretation row underneath.
pub static CATION_RELATIONS: TableSpec = TableSpec {
    name: "relaciones_cationes",
    locator: Locator::TitleContains("RELACIONES"),
    columns: &[
        ColumnSpec { key: "rel_ca_mg", labels: &["Ca/Mg"] },
        ColumnSpec { key: "rel_mg_k", labels: &["Mg/K"] },
        ColumnSpec { key: "rel_ca_k", labels: &["Ca/K"] },
        ColumnSpec { key: "rel_ca_mg_k", labels: &["(Ca+Mg)/K"] },
        ColumnSpec { key: "rel_k_mg", labels: &["K/Mg"] },
    ],
    variant: LayoutVariant::NamedRatio,
};

/// All tables, in the order their sections appear in the report.
pub static ALL_TABLES: [&TableSpec; 4] = [&FERTILITY, &CHEMICAL, &MICRONUTRIENTS, &CATION_RELATIONS];
