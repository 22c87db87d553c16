//! Trust boundary for datamart payloads.
//!
//! `is_valid` is the structural predicate; `validate` runs it and then decodes into
//! a typed [`RawDataset`]. Only the shape can reject a payload: individual records
//! decode leniently (see [`Company::from_value`]). Nothing past this point looks at
//! raw JSON again.

use crate::domain::{AttemptFailure, Company, RawDataset};
use serde_json::Value;

/// Raw keys accepted for the company list.
const COMPANY_KEYS: [&str; 2] = ["empresas", "companies"];

/// True when `payload` is an object whose company list is present and is an array.
/// An empty array is valid. Never panics.
pub fn is_valid(payload: &Value) -> bool {
    company_list(payload).is_some()
}

fn company_list(payload: &Value) -> Option<&Vec<Value>> {
    let obj = payload.as_object()?;
    COMPANY_KEYS
        .iter()
        .find_map(|k| obj.get(*k))
        .and_then(Value::as_array)
}

/// Classify and decode. A shape problem becomes `AttemptFailure::Validation`.
pub fn validate(payload: Value) -> Result<RawDataset, AttemptFailure> {
    let records = company_list(&payload).ok_or_else(|| {
        AttemptFailure::Validation("company list missing or not an array".to_string())
    })?;
    Ok(RawDataset::new(
        records.iter().map(Company::from_value).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_valid_classification() {
        assert!(is_valid(&json!({"empresas": []})));
        assert!(is_valid(&json!({"empresas": [{"rubro": "Tech"}]})));
        assert!(is_valid(&json!({"companies": []})));
        assert!(!is_valid(&json!({})));
        assert!(!is_valid(&json!({"empresas": "x"})));
        assert!(!is_valid(&json!({"empresas": null})));
        assert!(!is_valid(&Value::Null));
        assert!(!is_valid(&json!([1, 2, 3])));
    }

    #[test]
    fn test_validate_empty_is_ok() {
        let ds = validate(json!({"empresas": []})).unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn test_validate_tolerates_messy_records() {
        let ds = validate(json!({"empresas": [
            {"rubro": "Tech"},
            {"rubro": null, "sedes": null, "empresaFamiliar": null},
            {"tamanoEmpresa": "Grande", "tamanioEmpresa": "Grande"},
            42
        ]}))
        .unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.companies[0].sector, "Tech");
        assert!(ds.companies[1].branches.is_empty());
        assert_eq!(ds.companies[2].size_class, "Grande");
        assert_eq!(ds.companies[3], Company::default());
    }

    #[test]
    fn test_validate_with_both_list_keys_uses_empresas() {
        let ds = validate(json!({
            "empresas": [{"rubro": "Tech"}],
            "companies": [{"rubro": "Food"}, {"rubro": "Food"}]
        }))
        .unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.companies[0].sector, "Tech");
    }

    #[test]
    fn test_validate_rejects_shape() {
        let err = validate(json!({"data": []})).unwrap_err();
        assert!(matches!(err, AttemptFailure::Validation(_)));
    }
}
