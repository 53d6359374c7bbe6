//! Report output port trait.

use std::path::Path;

use crate::domain::country_stats::CountryStats;
use crate::domain::error::TradeMapError;
use crate::domain::lookup::CompanyDetail;

/// Port for writing statistics reports to a file.
pub trait ReportPort {
    fn write_country(&self, stats: &CountryStats, output_path: &Path) -> Result<(), TradeMapError>;

    fn write_company(
        &self,
        detail: &CompanyDetail,
        output_path: &Path,
    ) -> Result<(), TradeMapError>;
}
