//! JSON report adapter implementing ReportPort.
//!
//! Writes the same camelCase documents the web API serves, pretty-printed.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::domain::country_stats::CountryStats;
use crate::domain::error::TradeMapError;
use crate::domain::lookup::CompanyDetail;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_json<T: Serialize>(&self, value: &T, path: &Path) -> Result<(), TradeMapError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| TradeMapError::Io(std::io::Error::other(e.to_string())))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(TradeMapError::Io)?;
        }
        fs::write(path, json).map_err(TradeMapError::Io)?;

        tracing::info!(path = %path.display(), "report written");
        Ok(())
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_country(&self, stats: &CountryStats, output_path: &Path) -> Result<(), TradeMapError> {
        self.write_json(stats, output_path)
    }

    fn write_company(
        &self,
        detail: &CompanyDetail,
        output_path: &Path,
    ) -> Result<(), TradeMapError> {
        self.write_json(detail, output_path)
    }
}
