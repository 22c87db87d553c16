//! CSV export of the filtered view. Uses the `csv` crate for safe serialization.
//!
//! Semicolon-delimited; one file for companies, one per breakdown table.

use crate::domain::{CategoryCount, Company, DashboardAggregates, DomainError, RawDataset};
use crate::ports::ExportPort;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Convert companies to CSV: `Sector;Size;LegalType;Founded;Branches;SDGs;Family;International`.
pub fn companies_to_csv(companies: &[Company]) -> Result<String, csv::Error> {
    let mut wtr = new_writer();
    wtr.write_record([
        "Sector",
        "Size",
        "LegalType",
        "Founded",
        "Branches",
        "SDGs",
        "Family",
        "International",
    ])?;

    for c in companies {
        let founded = c.founding_date.as_deref().unwrap_or("").to_string();
        let branches = c
            .branches
            .iter()
            .map(|b| b.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let sdgs = c
            .sdg_commitments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        wtr.write_record([
            c.sector.as_str(),
            c.size_class.as_str(),
            c.legal_type.as_str(),
            founded.as_str(),
            branches.as_str(),
            sdgs.as_str(),
            yes_no(c.is_family_owned),
            yes_no(c.operates_internationally),
        ])?;
    }

    finish(wtr)
}

/// Convert a breakdown table to CSV: `Label;Count`.
pub fn breakdown_to_csv(rows: &[CategoryCount]) -> Result<String, csv::Error> {
    let mut wtr = new_writer();
    wtr.write_record(["Label", "Count"])?;
    for row in rows {
        wtr.write_record([row.label.as_str(), row.count.to_string().as_str()])?;
    }
    finish(wtr)
}

fn yes_no(v: bool) -> &'static str {
    if v { "yes" } else { "no" }
}

fn new_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .from_writer(Vec::new())
}

fn finish(mut wtr: csv::Writer<Vec<u8>>) -> Result<String, csv::Error> {
    wtr.flush()?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })
}

/// Writes CSV files into a directory.
#[derive(Debug, Default)]
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ExportPort for CsvExporter {
    async fn export(
        &self,
        dir: &Path,
        companies: &RawDataset,
        aggregates: &DashboardAggregates,
    ) -> Result<Vec<PathBuf>, DomainError> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| DomainError::Export(format!("create {}: {}", dir.display(), e)))?;

        let csv_err = |e: csv::Error| DomainError::Export(format!("CSV serialization: {}", e));
        let files = [
            ("companies.csv", companies_to_csv(&companies.companies).map_err(csv_err)?),
            ("by_sector.csv", breakdown_to_csv(&aggregates.by_sector).map_err(csv_err)?),
            ("by_size.csv", breakdown_to_csv(&aggregates.by_size).map_err(csv_err)?),
            (
                "by_legal_type.csv",
                breakdown_to_csv(&aggregates.by_legal_type).map_err(csv_err)?,
            ),
            (
                "by_branch_location.csv",
                breakdown_to_csv(&aggregates.by_branch_location).map_err(csv_err)?,
            ),
            ("top_sdgs.csv", breakdown_to_csv(&aggregates.top_sdgs).map_err(csv_err)?),
        ];

        let mut written = Vec::with_capacity(files.len());
        for (name, content) in files {
            let path = dir.join(name);
            fs::write(&path, content)
                .await
                .map_err(|e| DomainError::Export(format!("write {}: {}", path.display(), e)))?;
            written.push(path);
        }

        info!(
            dir = %dir.display(),
            files = written.len(),
            companies = companies.len(),
            "export complete"
        );
        Ok(written)
    }
}
