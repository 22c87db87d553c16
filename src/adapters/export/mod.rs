//! Export adapters. Implement ExportPort.

pub mod csv_export;

pub use csv_export::{CsvExporter, breakdown_to_csv, companies_to_csv};
