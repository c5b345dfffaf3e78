//! Report generation port trait.

use crate::domain::dashboard::Analysis;
use crate::domain::error::DashboardError;
use std::path::Path;

/// Port for writing a dashboard report.
pub trait ReportPort {
    fn write(&self, analysis: &Analysis, output_path: &Path) -> Result<(), DashboardError>;
}
