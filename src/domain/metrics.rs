//! Pre-aggregated metrics served by the statistics API.

use serde::Serialize;

/// First year offered by the companies-per-year endpoint.
pub const FIRST_YEAR: i32 = 1825;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StatMetric {
    AverageAge,
    CompaniesPerYear { from: i32, to: i32 },
    SizePercentages,
    SectorPercentages,
    AverageBranches,
    SdgCommitmentShares,
    CompaniesPerDepartment,
    MilestonesPerYear,
}

impl StatMetric {
    /// Every metric, with the per-year range ending at `current_year`.
    pub fn all(current_year: i32) -> Vec<StatMetric> {
        vec![
            StatMetric::AverageAge,
            StatMetric::CompaniesPerYear {
                from: FIRST_YEAR,
                to: current_year,
            },
            StatMetric::SizePercentages,
            StatMetric::SectorPercentages,
            StatMetric::AverageBranches,
            StatMetric::SdgCommitmentShares,
            StatMetric::CompaniesPerDepartment,
            StatMetric::MilestonesPerYear,
        ]
    }

    /// Path relative to the API base, including the query string.
    pub fn path(&self) -> String {
        match self {
            StatMetric::AverageAge => "/promedio-antiguedad".to_string(),
            StatMetric::CompaniesPerYear { from, to } => {
                format!("/empresas-anio?inicio={}&fin={}", from, to)
            }
            StatMetric::SizePercentages => "/empresas-tamanios-porcentaje".to_string(),
            StatMetric::SectorPercentages => "/porcentajes-rubros".to_string(),
            StatMetric::AverageBranches => "/promedio-sedes".to_string(),
            StatMetric::SdgCommitmentShares => "/porciones-accion".to_string(),
            StatMetric::CompaniesPerDepartment => "/empresas-departamento".to_string(),
            StatMetric::MilestonesPerYear => "/total-hitos-anio".to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatMetric::AverageAge => "Average company age",
            StatMetric::CompaniesPerYear { .. } => "Companies founded per year",
            StatMetric::SizePercentages => "Share by company size",
            StatMetric::SectorPercentages => "Share by sector",
            StatMetric::AverageBranches => "Average branches",
            StatMetric::SdgCommitmentShares => "SDG commitment shares",
            StatMetric::CompaniesPerDepartment => "Companies per department",
            StatMetric::MilestonesPerYear => "Milestones per year",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_year_path_carries_range() {
        let m = StatMetric::CompaniesPerYear { from: 1825, to: 2025 };
        assert_eq!(m.path(), "/empresas-anio?inicio=1825&fin=2025");
    }

    #[test]
    fn test_all_metrics_have_distinct_paths() {
        let all = StatMetric::all(2025);
        assert_eq!(all.len(), 8);
        let mut paths: Vec<String> = all.iter().map(StatMetric::path).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 8);
    }
}
