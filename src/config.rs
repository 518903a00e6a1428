use std::{env, num::ParseIntError, path::PathBuf};

use chrono::{FixedOffset, Local, Offset};
use thiserror::Error;

pub const DEFAULT_TITLE: &str = "result_obj info";
pub const DEFAULT_HIGHCHARTS_SRC: &str = "https://code.highcharts.com/highcharts.js";

pub struct ReportConfig {
    // Heading of the page and the document title.
    pub title: String,
    // Every timestamp in the report is rendered in this offset.
    pub timezone: FixedOffset,
    // Script URL of the charting library the page loads.
    pub highcharts_src: String,
    // Maximum number of log records rendered. None renders all of them.
    pub log_limit: Option<usize>,
    // Where the binary writes the page. Defaults to `<database>.html`.
    pub output: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            timezone: Local::now().offset().fix(),
            highcharts_src: DEFAULT_HIGHCHARTS_SRC.to_string(),
            log_limit: None,
            output: None,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("report title is empty")]
    EmptyTitle,
    #[error("highcharts script url is empty")]
    EmptyScriptSource,
    #[error("log limit must be greater than zero")]
    ZeroLogLimit,
    #[error("error parsing REPORT_LOG_LIMIT")]
    LogLimitFormat(ParseIntError),
}

impl ReportConfig {
    /// Defaults overridden by `REPORT_TITLE`, `REPORT_HIGHCHARTS_SRC`,
    /// `REPORT_LOG_LIMIT` and `REPORT_OUTPUT`. The timezone is the local
    /// offset at the time of the call.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(title) = var("REPORT_TITLE") {
            config.title = title;
        }
        if let Some(src) = var("REPORT_HIGHCHARTS_SRC") {
            config.highcharts_src = src;
        }
        if let Some(limit) = var("REPORT_LOG_LIMIT") {
            config.log_limit = Some(
                limit
                    .trim()
                    .parse()
                    .map_err(ConfigError::LogLimitFormat)?,
            );
        }
        config.output = var("REPORT_OUTPUT").map(PathBuf::from);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::EmptyTitle);
        }
        if self.highcharts_src.trim().is_empty() {
            return Err(ConfigError::EmptyScriptSource);
        }
        if self.log_limit == Some(0) {
            return Err(ConfigError::ZeroLogLimit);
        }
        Ok(())
    }
}
