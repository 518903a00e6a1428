use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, info};
use rusqlite::Connection;
use thiserror::Error;

use crate::{
    config::{ConfigError, ReportConfig},
    store::{self, StoreError},
};

pub mod html;
pub mod sections;

use sections::{
    LogsSection, MetadataSection, MetricsSection, RestorePointSection, ResultSection, Section,
    StatusSection,
};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("error validating config")]
    InvalidConfig(#[from] ConfigError),
    #[error("failed to read result database")]
    Store(#[from] StoreError),
    #[error("failed to serialize chart options")]
    Chart(#[from] serde_json::Error),
    #[error("failed to write report")]
    Write(#[from] io::Error),
}

pub struct Report {
    sections: Vec<Box<dyn Section>>,
}

fn push<S: Section + 'static>(sections: &mut Vec<Box<dyn Section>>, section: Option<S>, name: &str) {
    match section {
        Some(section) => sections.push(Box::new(section)),
        None => debug!("no rows for {}, leaving the section out", name),
    }
}

impl Report {
    /// Reads every section from the database. Tables without rows produce no
    /// section; any query failure aborts the whole report.
    pub fn load(conn: &Connection, config: &ReportConfig) -> Result<Self, ReportError> {
        config.validate()?;

        let mut sections = Vec::new();
        push(&mut sections, MetadataSection::load(conn)?, "Metadata");
        push(&mut sections, StatusSection::load(conn)?, "StatusHistory");
        push(&mut sections, RestorePointSection::load(conn)?, "RestorePoint");
        push(&mut sections, ResultSection::load(conn)?, "Result");
        push(&mut sections, MetricsSection::load(conn)?, "Metrics");
        push(&mut sections, LogsSection::load(conn, config)?, "Logs");
        Ok(Self { sections })
    }

    pub fn titles(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.title()).collect()
    }

    pub fn render(&self, config: &ReportConfig) -> Result<String, ReportError> {
        let items: Vec<(String, String)> = self
            .sections
            .iter()
            .map(|s| (s.title().to_string(), html::section_id(s.title())))
            .collect();

        let mut content = String::new();
        for section in &self.sections {
            let body = section.render(&config.timezone)?;
            content.push_str(&html::section(section.title(), &body));
        }

        Ok(html::page(
            &config.title,
            &config.highcharts_src,
            &html::navigation(&items),
            &content,
        ))
    }
}

/// `result.db` becomes `result.db.html` in the same directory.
pub fn default_output(db_path: &Path) -> PathBuf {
    let mut name = db_path.as_os_str().to_owned();
    name.push(".html");
    PathBuf::from(name)
}

/// Renders the database at `db_path` and writes the page, returning where it
/// was written.
pub fn write_report(db_path: &Path, config: &ReportConfig) -> Result<PathBuf, ReportError> {
    let conn = store::open(db_path)?;
    let report = Report::load(&conn, config)?;
    let page = report.render(config)?;

    let output = config
        .output
        .clone()
        .unwrap_or_else(|| default_output(db_path));
    fs::write(&output, page)?;
    info!(
        "wrote report with {} sections to {}",
        report.sections.len(),
        output.display()
    );
    Ok(output)
}
