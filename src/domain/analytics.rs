//! KPI and breakdown derivation over a (filtered) dataset.
//!
//! Pure functions. Every rate and average is finite: division by zero yields 0.
//! An empty input produces [`DashboardAggregates::no_data`].

use crate::domain::entities::category_label;
use crate::domain::{Company, RawDataset};
use chrono::Datelike;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Number of entries kept in the SDG distribution.
pub const TOP_SDG_LIMIT: usize = 8;
/// Ages above this are capped before scaling the profile's age axis.
pub const PROFILE_AGE_CAP_YEARS: f64 = 50.0;
/// Average branch count is multiplied by this for the profile's presence axis.
pub const PROFILE_BRANCH_SCALE: f64 = 20.0;
/// Upper bound of every profile axis.
pub const PROFILE_MAX: f64 = 100.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub with_sdg: usize,
    pub international: usize,
    pub family_owned: usize,
    pub sustainable: usize,
    pub social_impact: usize,
    /// Companies that changed sector or legal type.
    pub with_changes: usize,
    pub sdg_rate: f64,
    pub international_rate: f64,
    pub family_owned_rate: f64,
    pub sustainable_rate: f64,
    pub social_impact_rate: f64,
    pub avg_branches: f64,
    /// Over companies with a parseable founding date only.
    pub avg_age_years: f64,
    /// Total commitments divided by the number of committed companies.
    pub avg_sdg_per_committed: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeSdgSplit {
    pub size_class: String,
    pub with_sdg: usize,
    pub without_sdg: usize,
}

impl SizeSdgSplit {
    pub fn total(&self) -> usize {
        self.with_sdg + self.without_sdg
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProfileAxis {
    Internationalization,
    Sustainability,
    SocialImpact,
    SdgCommitment,
    NationalPresence,
    Age,
}

impl ProfileAxis {
    pub fn label(self) -> &'static str {
        match self {
            ProfileAxis::Internationalization => "Internationalization",
            ProfileAxis::Sustainability => "Sustainability",
            ProfileAxis::SocialImpact => "Social impact",
            ProfileAxis::SdgCommitment => "SDG commitment",
            ProfileAxis::NationalPresence => "National presence",
            ProfileAxis::Age => "Age",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileMetric {
    pub axis: ProfileAxis,
    /// Always within `0.0..=PROFILE_MAX`.
    pub value: f64,
}

/// Everything the dashboard renders, recomputed from (dataset, filters) on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardAggregates {
    pub kpis: Kpis,
    pub by_sector: Vec<CategoryCount>,
    pub by_size: Vec<CategoryCount>,
    pub by_legal_type: Vec<CategoryCount>,
    pub by_branch_location: Vec<CategoryCount>,
    pub founded_per_year: Vec<YearCount>,
    pub sdg_by_size: Vec<SizeSdgSplit>,
    pub top_sdgs: Vec<CategoryCount>,
    pub profile: Vec<ProfileMetric>,
}

impl DashboardAggregates {
    /// Sentinel for an empty selection: all counts, rates and profile axes are zero.
    pub fn no_data() -> Self {
        Self {
            profile: PROFILE_AXES
                .iter()
                .map(|&axis| ProfileMetric { axis, value: 0.0 })
                .collect(),
            ..Default::default()
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.kpis.total == 0
    }
}

const PROFILE_AXES: [ProfileAxis; 6] = [
    ProfileAxis::Internationalization,
    ProfileAxis::Sustainability,
    ProfileAxis::SocialImpact,
    ProfileAxis::SdgCommitment,
    ProfileAxis::NationalPresence,
    ProfileAxis::Age,
];

/// Aggregates against the local calendar year.
pub fn compute_kpis(dataset: &RawDataset) -> DashboardAggregates {
    compute_kpis_at(dataset, chrono::Local::now().year())
}

/// Aggregates with ages measured against `current_year`.
pub fn compute_kpis_at(dataset: &RawDataset, current_year: i32) -> DashboardAggregates {
    let companies = &dataset.companies;
    if companies.is_empty() {
        return DashboardAggregates::no_data();
    }

    let kpis = kpis(companies, current_year);
    let profile = profile(companies, &kpis, current_year);

    DashboardAggregates {
        by_sector: count_by(companies.iter().map(|c| c.sector.as_str())),
        by_size: count_by(companies.iter().map(|c| c.size_class.as_str())),
        by_legal_type: count_by(companies.iter().map(|c| c.legal_type.as_str())),
        by_branch_location: branch_breakdown(companies),
        founded_per_year: founded_per_year(companies),
        sdg_by_size: sdg_by_size(companies),
        top_sdgs: top_sdgs(companies, TOP_SDG_LIMIT),
        profile,
        kpis,
    }
}

fn kpis(companies: &[Company], current_year: i32) -> Kpis {
    let total = companies.len();
    let count = |pred: fn(&Company) -> bool| companies.iter().filter(|c| pred(c)).count();

    let with_sdg = count(Company::has_sdg_commitments);
    let international = count(|c| c.operates_internationally);
    let family_owned = count(|c| c.is_family_owned);
    let sustainable = count(|c| c.is_sustainable);
    let social_impact = count(|c| c.has_social_impact);
    let with_changes = count(Company::has_changes);

    let total_branches: usize = companies.iter().map(|c| c.branches.len()).sum();
    let total_sdgs: usize = companies.iter().map(|c| c.sdg_commitments.len()).sum();
    let ages: Vec<f64> = ages(companies, current_year).collect();

    Kpis {
        total,
        with_sdg,
        international,
        family_owned,
        sustainable,
        social_impact,
        with_changes,
        sdg_rate: percent(with_sdg, total),
        international_rate: percent(international, total),
        family_owned_rate: percent(family_owned, total),
        sustainable_rate: percent(sustainable, total),
        social_impact_rate: percent(social_impact, total),
        avg_branches: round1(ratio(total_branches as f64, total)),
        avg_age_years: round1(ratio(ages.iter().sum(), ages.len())),
        avg_sdg_per_committed: round1(ratio(total_sdgs as f64, with_sdg)),
    }
}

fn ages(companies: &[Company], current_year: i32) -> impl Iterator<Item = f64> + '_ {
    companies
        .iter()
        .filter_map(Company::founding_year)
        .map(move |y| f64::from(current_year - y))
}

fn profile(companies: &[Company], kpis: &Kpis, current_year: i32) -> Vec<ProfileMetric> {
    let total = companies.len();
    let capped_ages: Vec<f64> = ages(companies, current_year)
        .map(|a| a.clamp(0.0, PROFILE_AGE_CAP_YEARS))
        .collect();
    let total_branches: usize = companies.iter().map(|c| c.branches.len()).sum();

    PROFILE_AXES
        .iter()
        .map(|&axis| {
            let raw = match axis {
                ProfileAxis::Internationalization => ratio(kpis.international as f64, total) * 100.0,
                ProfileAxis::Sustainability => ratio(kpis.sustainable as f64, total) * 100.0,
                ProfileAxis::SocialImpact => ratio(kpis.social_impact as f64, total) * 100.0,
                ProfileAxis::SdgCommitment => ratio(kpis.with_sdg as f64, total) * 100.0,
                ProfileAxis::NationalPresence => {
                    ratio(total_branches as f64, total) * PROFILE_BRANCH_SCALE
                }
                ProfileAxis::Age => {
                    ratio(capped_ages.iter().sum(), capped_ages.len())
                        * (PROFILE_MAX / PROFILE_AGE_CAP_YEARS)
                }
            };
            ProfileMetric {
                axis,
                value: raw.clamp(0.0, PROFILE_MAX),
            }
        })
        .collect()
}

/// Count per distinct label, descending by count; ties keep first-seen order.
fn count_by<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<CategoryCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<CategoryCount> = Vec::new();
    for label in labels.map(category_label) {
        match index.get(label) {
            Some(&i) => out[i].count += 1,
            None => {
                index.insert(label, out.len());
                out.push(CategoryCount {
                    label: label.to_string(),
                    count: 1,
                });
            }
        }
    }
    // sort_by is stable
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Companies per branch name; a company with two branches in one place counts once there.
fn branch_breakdown(companies: &[Company]) -> Vec<CategoryCount> {
    let labels = companies.iter().flat_map(|c| {
        let mut seen: Vec<&str> = Vec::with_capacity(c.branches.len());
        for b in &c.branches {
            if !seen.contains(&b.name.as_str()) {
                seen.push(b.name.as_str());
            }
        }
        seen
    });
    count_by(labels)
}

fn founded_per_year(companies: &[Company]) -> Vec<YearCount> {
    let mut per_year: BTreeMap<i32, usize> = BTreeMap::new();
    for year in companies.iter().filter_map(Company::founding_year) {
        *per_year.entry(year).or_default() += 1;
    }
    per_year
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect()
}

fn sdg_by_size(companies: &[Company]) -> Vec<SizeSdgSplit> {
    let mut rows: Vec<SizeSdgSplit> = Vec::new();
    for c in companies {
        let size_class = category_label(&c.size_class);
        let idx = match rows.iter().position(|r| r.size_class == size_class) {
            Some(i) => i,
            None => {
                rows.push(SizeSdgSplit {
                    size_class: size_class.to_string(),
                    with_sdg: 0,
                    without_sdg: 0,
                });
                rows.len() - 1
            }
        };
        if c.has_sdg_commitments() {
            rows[idx].with_sdg += 1;
        } else {
            rows[idx].without_sdg += 1;
        }
    }
    rows.sort_by_key(|r| std::cmp::Reverse(r.total()));
    rows
}

fn top_sdgs(companies: &[Company], limit: usize) -> Vec<CategoryCount> {
    let names = companies
        .iter()
        .flat_map(|c| c.sdg_commitments.iter().map(|s| s.name.as_str()));
    let mut counts = count_by(names);
    counts.truncate(limit);
    counts
}

fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

fn percent(part: usize, total: usize) -> f64 {
    round1(ratio(part as f64 * 100.0, total))
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
