//! Domain entities. Pure data structures for the core business.
//!
//! Field names are English; serde renames map them onto the datamart's raw keys.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Label shown for a blank category value (sector, size, legal type, branch, SDG).
pub const UNSPECIFIED: &str = "(unspecified)";

/// Display and selection label for a raw category value. Blank values share [`UNSPECIFIED`].
pub fn category_label(raw: &str) -> &str {
    if raw.trim().is_empty() {
        UNSPECIFIED
    } else {
        raw
    }
}

/// The validated datamart payload. Immutable once cached; every derived view is a fresh value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDataset {
    #[serde(
        rename = "empresas",
        alias = "companies",
        deserialize_with = "lenient::records"
    )]
    pub companies: Vec<Company>,
}

impl RawDataset {
    pub fn new(companies: Vec<Company>) -> Self {
        Self { companies }
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

/// A single company record. Fields the dashboard does not read are kept in `extra`.
///
/// Decoding never rejects a record: null or wrong-typed fields fall back to their
/// defaults and booleans follow JSON truthiness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "CompanyRecord")]
pub struct Company {
    #[serde(rename = "rubro")]
    pub sector: String,
    /// `tamanoEmpresa`, falling back to `tamanioEmpresa` when blank or absent.
    #[serde(rename = "tamanoEmpresa")]
    pub size_class: String,
    #[serde(rename = "tipoSocietaria")]
    pub legal_type: String,
    /// Raw founding date as delivered. See [`Company::founding_year`].
    #[serde(rename = "fechaFundacion")]
    pub founding_date: Option<String>,
    #[serde(rename = "sedes")]
    pub branches: Vec<Branch>,
    #[serde(rename = "ods")]
    pub sdg_commitments: Vec<SdgCommitment>,
    #[serde(rename = "empresaFamiliar")]
    pub is_family_owned: bool,
    #[serde(rename = "operacionesInternacionales")]
    pub operates_internationally: bool,
    #[serde(rename = "sostenibilidad")]
    pub is_sustainable: bool,
    #[serde(rename = "impactoSocial")]
    pub has_social_impact: bool,
    #[serde(rename = "cambioRubro")]
    pub changed_sector: bool,
    #[serde(rename = "cambioTipoSocietario")]
    pub changed_legal_type: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Company {
    /// Decode one raw record. Anything that is not an object yields an empty record.
    pub fn from_value(raw: &Value) -> Self {
        CompanyRecord::deserialize(raw)
            .map(Company::from)
            .unwrap_or_default()
    }

    pub fn has_sdg_commitments(&self) -> bool {
        !self.sdg_commitments.is_empty()
    }

    pub fn has_changes(&self) -> bool {
        self.changed_sector || self.changed_legal_type
    }

    /// Founding year, or None when the date is missing or unparseable.
    pub fn founding_year(&self) -> Option<i32> {
        self.founding_date.as_deref().and_then(parse_year)
    }
}

/// Wire shape of a company record. Both size keys are read since producers emit either.
#[derive(Default, Deserialize)]
#[serde(default)]
struct CompanyRecord {
    #[serde(rename = "rubro", deserialize_with = "lenient::text")]
    sector: String,
    #[serde(rename = "tamanoEmpresa", deserialize_with = "lenient::opt_text")]
    size_class: Option<String>,
    #[serde(rename = "tamanioEmpresa", deserialize_with = "lenient::opt_text")]
    size_class_alt: Option<String>,
    #[serde(rename = "tipoSocietaria", deserialize_with = "lenient::text")]
    legal_type: String,
    #[serde(rename = "fechaFundacion", deserialize_with = "lenient::opt_text")]
    founding_date: Option<String>,
    #[serde(rename = "sedes", deserialize_with = "lenient::named")]
    branches: Vec<Branch>,
    #[serde(rename = "ods", deserialize_with = "lenient::named")]
    sdg_commitments: Vec<SdgCommitment>,
    #[serde(rename = "empresaFamiliar", deserialize_with = "lenient::truthy")]
    is_family_owned: bool,
    #[serde(rename = "operacionesInternacionales", deserialize_with = "lenient::truthy")]
    operates_internationally: bool,
    #[serde(rename = "sostenibilidad", deserialize_with = "lenient::truthy")]
    is_sustainable: bool,
    #[serde(rename = "impactoSocial", deserialize_with = "lenient::truthy")]
    has_social_impact: bool,
    #[serde(rename = "cambioRubro", deserialize_with = "lenient::truthy")]
    changed_sector: bool,
    #[serde(rename = "cambioTipoSocietario", deserialize_with = "lenient::truthy")]
    changed_legal_type: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<CompanyRecord> for Company {
    fn from(r: CompanyRecord) -> Self {
        let size_class = [r.size_class, r.size_class_alt]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or_default();
        Self {
            sector: r.sector,
            size_class,
            legal_type: r.legal_type,
            founding_date: r.founding_date,
            branches: r.branches,
            sdg_commitments: r.sdg_commitments,
            is_family_owned: r.is_family_owned,
            operates_internationally: r.operates_internationally,
            is_sustainable: r.is_sustainable,
            has_social_impact: r.has_social_impact,
            changed_sector: r.changed_sector,
            changed_legal_type: r.changed_legal_type,
            extra: r.extra,
        }
    }
}

/// A branch location (department / city name).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Branch {
    #[serde(rename = "nombre")]
    pub name: String,
}

impl From<String> for Branch {
    fn from(name: String) -> Self {
        Self { name }
    }
}

/// A named sustainable-development-goal commitment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SdgCommitment {
    #[serde(rename = "nombre")]
    pub name: String,
}

impl From<String> for SdgCommitment {
    fn from(name: String) -> Self {
        Self { name }
    }
}

mod lenient {
    use super::Company;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar_text(v: &Value) -> Option<String> {
        match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub(super) fn records<'de, D>(d: D) -> Result<Vec<Company>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<Value>::deserialize(d)?;
        Ok(raw.iter().map(Company::from_value).collect())
    }

    pub(super) fn text<'de, D>(d: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(scalar_text(&Value::deserialize(d)?).unwrap_or_default())
    }

    pub(super) fn opt_text<'de, D>(d: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(scalar_text(&Value::deserialize(d)?))
    }

    pub(super) fn truthy<'de, D>(d: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(d)? {
            Value::Null => false,
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0 && !x.is_nan()),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        })
    }

    /// A list of `{nombre}` objects (or bare names). Each element is kept so list
    /// lengths match the payload; an element without a usable name gets an empty one.
    pub(super) fn named<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: From<String>,
    {
        let Value::Array(items) = Value::deserialize(d)? else {
            return Ok(Vec::new());
        };
        Ok(items
            .iter()
            .map(|item| {
                let name = match item {
                    Value::Object(o) => o.get("nombre").or_else(|| o.get("name")),
                    other => Some(other),
                };
                T::from(name.and_then(scalar_text).unwrap_or_default())
            })
            .collect())
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339, `YYYY-MM-DDTHH:MM:SS` and a bare year.
fn parse_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.year());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.year());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.year());
    }
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse().ok();
    }
    None
}
