use suelo_core::error::SueloError;
use suelo_core::Record;

pub fn to_pretty(records: &[Record]) -> Result<String, SueloError> {
    Ok(serde_json::to_string_pretty(records)?)
}
