use anyhow::Context;

use crate::cli::utils::output_list;
use crate::cli::OutputFormat;
use crate::config;
use crate::integrations::SapCompanies;

/// Company codes only; credentials never leave the file
pub fn list_companies(output_format: OutputFormat) -> anyhow::Result<()> {
    let path = config::config()
        .integrations
        .sap_companies_file
        .as_deref()
        .context("SAP_COMPANIES_FILE is not configured")?;
    let companies = SapCompanies::load(path)?;
    output_list(&output_format, "companies", &companies.names(), "No SAP companies configured")
}
