use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use survey_runtime::{ReportExporter, ReportFilters, ReportFormat};
use survey_store::SurveyType;
use tracing::info;

use super::{block_on, http_api};
use crate::config::Config;

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Destination file
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,
    #[arg(long, value_enum, default_value_t = FormatArg::Xlsx)]
    pub format: FormatArg,
    #[arg(long = "survey-id")]
    pub survey_id: Option<String>,
    #[arg(long = "type", value_name = "TYPE")]
    pub survey_type: Option<SurveyType>,
    #[arg(long = "study-program")]
    pub study_program: Option<String>,
    #[arg(long = "graduation-year")]
    pub graduation_year: Option<u16>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Xlsx,
    Pdf,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Xlsx => ReportFormat::Xlsx,
            FormatArg::Pdf => ReportFormat::Pdf,
        }
    }
}

impl ReportArgs {
    pub fn filters(&self) -> ReportFilters {
        ReportFilters {
            survey_id: self.survey_id.clone(),
            survey_type: self.survey_type.map(|survey_type| survey_type.to_string()),
            study_program: self.study_program.clone(),
            graduation_year: self.graduation_year,
            format: self.format.into(),
        }
    }
}

pub fn run(args: ReportArgs, config: &Config) -> Result<()> {
    let api = http_api(config)?;
    let filters = args.filters();
    let bytes = block_on(api.export(&filters))?.context("report export failed")?;
    fs::write(&args.out, &bytes)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    info!(path = %args.out.display(), bytes = bytes.len(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_carry_every_flag() {
        let args = ReportArgs {
            out: PathBuf::from("report.pdf"),
            format: FormatArg::Pdf,
            survey_id: Some("tracer-2026".into()),
            survey_type: Some(SurveyType::TracerStudy),
            study_program: Some("Informatika".into()),
            graduation_year: Some(2025),
        };
        let filters = args.filters();
        assert_eq!(filters.format, ReportFormat::Pdf);
        assert_eq!(filters.survey_type.as_deref(), Some("tracer-study"));
        assert_eq!(filters.graduation_year, Some(2025));
    }
}
