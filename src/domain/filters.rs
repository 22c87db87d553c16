//! Filter state and the stable multi-dimension filter.
//!
//! A selection set per dimension; values inside one set are OR-ed, dimensions are AND-ed.
//! An empty set means "no constraint". The state is an immutable value: every transition
//! returns a new `FilterState`.

use crate::domain::entities::category_label;
use crate::domain::{Company, RawDataset};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

pub const HAS_COMMITMENTS: &str = "has-commitments";
pub const NO_COMMITMENTS: &str = "no-commitments";
pub const FAMILY_OWNED: &str = "family-owned";
pub const NOT_FAMILY_OWNED: &str = "not-family-owned";
pub const INTERNATIONAL: &str = "international";
pub const DOMESTIC: &str = "domestic";

/// One independent axis over which the dataset can be restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Sector,
    SizeClass,
    LegalType,
    BranchLocation,
    SdgCommitment,
    FamilyOwned,
    InternationalOps,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Sector,
        Dimension::SizeClass,
        Dimension::LegalType,
        Dimension::BranchLocation,
        Dimension::SdgCommitment,
        Dimension::FamilyOwned,
        Dimension::InternationalOps,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Dimension::Sector => "sector",
            Dimension::SizeClass => "sizeClass",
            Dimension::LegalType => "legalType",
            Dimension::BranchLocation => "branchLocation",
            Dimension::SdgCommitment => "sdgCommitment",
            Dimension::FamilyOwned => "familyOwned",
            Dimension::InternationalOps => "internationalOps",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Dimension::Sector => "Economic sector",
            Dimension::SizeClass => "Company size",
            Dimension::LegalType => "Legal type",
            Dimension::BranchLocation => "Branch location",
            Dimension::SdgCommitment => "SDG commitment",
            Dimension::FamilyOwned => "Family business",
            Dimension::InternationalOps => "Operations",
        }
    }

    /// The two-token partition for boolean dimensions, `(true_token, false_token)`.
    pub fn partition_tokens(self) -> Option<(&'static str, &'static str)> {
        match self {
            Dimension::SdgCommitment => Some((HAS_COMMITMENTS, NO_COMMITMENTS)),
            Dimension::FamilyOwned => Some((FAMILY_OWNED, NOT_FAMILY_OWNED)),
            Dimension::InternationalOps => Some((INTERNATIONAL, DOMESTIC)),
            _ => None,
        }
    }

    /// Whether `company` passes a non-empty `selection` on this dimension.
    fn accepts(self, company: &Company, selection: &BTreeSet<String>) -> bool {
        match self {
            Dimension::Sector => selection.contains(category_label(&company.sector)),
            Dimension::SizeClass => selection.contains(category_label(&company.size_class)),
            Dimension::LegalType => selection.contains(category_label(&company.legal_type)),
            Dimension::BranchLocation => company
                .branches
                .iter()
                .any(|b| selection.contains(category_label(&b.name))),
            Dimension::SdgCommitment => {
                partition_accepts(self, selection, company.has_sdg_commitments())
            }
            Dimension::FamilyOwned => partition_accepts(self, selection, company.is_family_owned),
            Dimension::InternationalOps => {
                partition_accepts(self, selection, company.operates_internationally)
            }
        }
    }
}

/// Boolean partition: only recognised tokens count; none or both recognised means no constraint.
fn partition_accepts(dim: Dimension, selection: &BTreeSet<String>, value: bool) -> bool {
    let Some((yes, no)) = dim.partition_tokens() else {
        return true;
    };
    match (selection.contains(yes), selection.contains(no)) {
        (true, false) => value,
        (false, true) => !value,
        _ => true,
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDimension(pub String);

impl fmt::Display for UnknownDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown filter dimension '{}'", self.0)
    }
}

impl std::error::Error for UnknownDimension {}

impl FromStr for Dimension {
    type Err = UnknownDimension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|d| d.key() == s)
            .ok_or_else(|| UnknownDimension(s.to_string()))
    }
}

/// Selected values per dimension. Absent and empty sets are equivalent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterState {
    selections: BTreeMap<Dimension, BTreeSet<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `(key, values)` pairs. Unknown keys are ignored.
    pub fn from_raw<'a, I, V>(raw: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: IntoIterator<Item = &'a str>,
    {
        raw.into_iter()
            .filter_map(|(k, vs)| k.parse::<Dimension>().ok().map(|d| (d, vs)))
            .fold(Self::new(), |state, (dim, vs)| {
                state.with_values(dim, vs.into_iter().map(str::to_string))
            })
    }

    /// Add `value` to the dimension's set if absent, remove it if present.
    pub fn toggle(&self, dim: Dimension, value: &str) -> Self {
        let mut next = self.clone();
        let set = next.selections.entry(dim).or_default();
        if !set.remove(value) {
            set.insert(value.to_string());
        }
        if set.is_empty() {
            next.selections.remove(&dim);
        }
        next
    }

    /// Replace the selection for one dimension.
    pub fn with_values<I>(&self, dim: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut next = self.clone();
        let set: BTreeSet<String> = values.into_iter().collect();
        if set.is_empty() {
            next.selections.remove(&dim);
        } else {
            next.selections.insert(dim, set);
        }
        next
    }

    pub fn cleared(&self) -> Self {
        Self::new()
    }

    pub fn selected(&self, dim: Dimension) -> Option<&BTreeSet<String>> {
        self.selections.get(&dim)
    }

    pub fn is_selected(&self, dim: Dimension, value: &str) -> bool {
        self.selected(dim).is_some_and(|s| s.contains(value))
    }

    /// Total number of selected values over all dimensions.
    pub fn active_count(&self) -> usize {
        self.selections.values().map(BTreeSet::len).sum()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.active_count() == 0
    }

    pub fn matches(&self, company: &Company) -> bool {
        self.selections
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .all(|(dim, set)| dim.accepts(company, set))
    }
}

/// Stable filter: a new dataset with the matching companies in input order.
pub fn apply_filters(dataset: &RawDataset, filters: &FilterState) -> RawDataset {
    if filters.is_unconstrained() {
        return dataset.clone();
    }
    RawDataset::new(
        dataset
            .companies
            .iter()
            .filter(|c| filters.matches(c))
            .cloned()
            .collect(),
    )
}

/// Selectable values per dimension, in first-seen order. Blank values appear as
/// [`UNSPECIFIED`](crate::domain::entities::UNSPECIFIED).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    options: BTreeMap<Dimension, Vec<String>>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &RawDataset) -> Self {
        let mut options: BTreeMap<Dimension, Vec<String>> = BTreeMap::new();
        for c in &dataset.companies {
            push_unique(options.entry(Dimension::Sector).or_default(), &c.sector);
            push_unique(options.entry(Dimension::SizeClass).or_default(), &c.size_class);
            push_unique(options.entry(Dimension::LegalType).or_default(), &c.legal_type);
            let branches = options.entry(Dimension::BranchLocation).or_default();
            for b in &c.branches {
                push_unique(branches, &b.name);
            }
        }
        for dim in Dimension::ALL {
            if let Some((yes, no)) = dim.partition_tokens() {
                options.insert(dim, vec![yes.to_string(), no.to_string()]);
            }
        }
        Self { options }
    }

    pub fn values(&self, dim: Dimension) -> &[String] {
        self.options.get(&dim).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn push_unique(values: &mut Vec<String>, raw: &str) {
    let value = category_label(raw);
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Branch, SdgCommitment};

    fn company(sector: &str, size: &str, branches: &[&str], sdg: usize, family: bool) -> Company {
        Company {
            sector: sector.into(),
            size_class: size.into(),
            legal_type: "SRL".into(),
            branches: branches
                .iter()
                .map(|n| Branch { name: n.to_string() })
                .collect(),
            sdg_commitments: (0..sdg)
                .map(|i| SdgCommitment {
                    name: format!("ODS {}", i + 1),
                })
                .collect(),
            is_family_owned: family,
            ..Default::default()
        }
    }

    fn dataset() -> RawDataset {
        RawDataset::new(vec![
            company("Tech", "Large", &["La Paz", "Oruro"], 2, true),
            company("Food", "Small", &["Santa Cruz"], 0, false),
            company("Tech", "Small", &[], 1, false),
            company("Mining", "Large", &["Oruro"], 0, true),
        ])
    }

    fn sectors(ds: &RawDataset) -> Vec<(&str, &str)> {
        ds.companies
            .iter()
            .map(|c| (c.sector.as_str(), c.size_class.as_str()))
            .collect()
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let ds = dataset();
        assert_eq!(apply_filters(&ds, &FilterState::new()), ds);
    }

    #[test]
    fn test_values_within_dimension_are_ored() {
        let f = FilterState::new()
            .toggle(Dimension::Sector, "Food")
            .toggle(Dimension::Sector, "Mining");
        let out = apply_filters(&dataset(), &f);
        assert_eq!(sectors(&out), vec![("Food", "Small"), ("Mining", "Large")]);
    }

    #[test]
    fn test_dimensions_are_anded() {
        let ds = dataset();
        let f1 = FilterState::new().toggle(Dimension::Sector, "Tech");
        let f2 = FilterState::new().toggle(Dimension::SizeClass, "Small");
        let both = f1.toggle(Dimension::SizeClass, "Small");
        let out = apply_filters(&ds, &both);
        assert_eq!(sectors(&out), vec![("Tech", "Small")]);

        let a = apply_filters(&ds, &f1);
        let b = apply_filters(&ds, &f2);
        let intersection: Vec<_> = a
            .companies
            .iter()
            .filter(|c| b.companies.contains(c))
            .cloned()
            .collect();
        assert_eq!(out.companies, intersection);
    }

    #[test]
    fn test_branch_location_is_union_membership() {
        let f = FilterState::new().toggle(Dimension::BranchLocation, "Oruro");
        let out = apply_filters(&dataset(), &f);
        assert_eq!(sectors(&out), vec![("Tech", "Large"), ("Mining", "Large")]);
    }

    #[test]
    fn test_sdg_partition_tokens() {
        let ds = dataset();
        let has = FilterState::new().toggle(Dimension::SdgCommitment, HAS_COMMITMENTS);
        assert_eq!(apply_filters(&ds, &has).len(), 2);
        let none = FilterState::new().toggle(Dimension::SdgCommitment, NO_COMMITMENTS);
        assert_eq!(apply_filters(&ds, &none).len(), 2);
        let both = has.toggle(Dimension::SdgCommitment, NO_COMMITMENTS);
        assert_eq!(apply_filters(&ds, &both), ds);
    }

    #[test]
    fn test_family_partition_combined_with_sector() {
        let f = FilterState::new()
            .toggle(Dimension::FamilyOwned, NOT_FAMILY_OWNED)
            .toggle(Dimension::Sector, "Tech");
        let out = apply_filters(&dataset(), &f);
        assert_eq!(sectors(&out), vec![("Tech", "Small")]);
    }

    #[test]
    fn test_unknown_values_and_keys_do_not_panic() {
        let ds = dataset();
        let f = FilterState::from_raw([("planet", vec!["Mars"])]);
        assert!(f.is_unconstrained());
        let f = FilterState::new().toggle(Dimension::Sector, "Aerospace");
        assert!(apply_filters(&ds, &f).is_empty());
        let f = FilterState::new().toggle(Dimension::InternationalOps, "maybe");
        assert_eq!(apply_filters(&ds, &f), ds);
    }

    #[test]
    fn test_toggle_returns_new_state() {
        let original = FilterState::new();
        let on = original.toggle(Dimension::Sector, "Tech");
        assert!(original.is_unconstrained());
        assert_eq!(on.active_count(), 1);
        assert!(on.is_selected(Dimension::Sector, "Tech"));
        let off = on.toggle(Dimension::Sector, "Tech");
        assert_eq!(off, original);
    }

    #[test]
    fn test_from_raw_and_parse() {
        assert_eq!("sizeClass".parse::<Dimension>(), Ok(Dimension::SizeClass));
        assert!("size".parse::<Dimension>().is_err());
        let f = FilterState::from_raw([
            ("sector", vec!["Tech", "Food"]),
            ("familyOwned", vec![FAMILY_OWNED]),
        ]);
        assert_eq!(f.active_count(), 3);
    }

    #[test]
    fn test_filter_options_first_seen_order() {
        let opts = FilterOptions::from_dataset(&dataset());
        assert_eq!(opts.values(Dimension::Sector), ["Tech", "Food", "Mining"]);
        assert_eq!(
            opts.values(Dimension::BranchLocation),
            ["La Paz", "Oruro", "Santa Cruz"]
        );
        assert_eq!(
            opts.values(Dimension::SdgCommitment),
            [HAS_COMMITMENTS, NO_COMMITMENTS]
        );
    }

    #[test]
    fn test_blank_values_are_selectable_as_unspecified() {
        use crate::domain::entities::UNSPECIFIED;
        let ds = RawDataset::new(vec![
            company("Tech", "Large", &["La Paz"], 0, false),
            company("", " ", &[""], 0, false),
        ]);
        let opts = FilterOptions::from_dataset(&ds);
        assert_eq!(opts.values(Dimension::Sector), ["Tech", UNSPECIFIED]);
        assert_eq!(opts.values(Dimension::SizeClass), ["Large", UNSPECIFIED]);
        assert_eq!(opts.values(Dimension::BranchLocation), ["La Paz", UNSPECIFIED]);

        let f = FilterState::new().toggle(Dimension::Sector, UNSPECIFIED);
        assert_eq!(sectors(&apply_filters(&ds, &f)), vec![("", " ")]);
        let f = FilterState::new().toggle(Dimension::BranchLocation, UNSPECIFIED);
        assert_eq!(apply_filters(&ds, &f).len(), 1);
    }
}
