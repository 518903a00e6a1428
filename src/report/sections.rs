use chrono::FixedOffset;
use log::{debug, warn};
use rusqlite::Connection;

use super::{html, ReportError};
use crate::{
    config::ReportConfig,
    format::{html_from_ts, human_size},
    metric::{MetricKind, MetricObservation},
    series::{counter_series, interval_series, value_series, ChartSeries},
    store::{
        metrics::{list_series, MetricCursor},
        records::{
            count_logs, read_env_vars, read_logs, read_metadata, read_restore_points,
            read_results, read_status_history, EnvVar, LogRecord, Metadata, ResultEntry,
            RestorePoint, StatusChange,
        },
    },
};

/// One block of the report. Sections are only built when their table holds
/// rows.
pub trait Section {
    fn title(&self) -> &str;
    fn render(&self, tz: &FixedOffset) -> Result<String, ReportError>;
}

fn size_cell(size: Option<u64>) -> String {
    size.map(human_size).unwrap_or_else(|| "-".to_string())
}

fn code(text: &str) -> String {
    format!("<code>{}</code>", html::escape(text))
}

pub struct MetadataSection {
    metadata: Vec<Metadata>,
    env_vars: Vec<EnvVar>,
}

impl MetadataSection {
    pub fn load(conn: &Connection) -> Result<Option<Self>, ReportError> {
        let metadata = read_metadata(conn)?;
        let env_vars = read_env_vars(conn)?;
        if metadata.is_empty() && env_vars.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self { metadata, env_vars }))
    }
}

impl Section for MetadataSection {
    fn title(&self) -> &str {
        "Metadata"
    }

    fn render(&self, tz: &FixedOffset) -> Result<String, ReportError> {
        let mut body = String::new();
        for metadata in &self.metadata {
            body.push_str(&html::table(
                &["Field", "Value"],
                &[
                    vec!["Started".to_string(), html_from_ts(metadata.timestamp, tz)],
                    vec!["Command".to_string(), code(&metadata.argv)],
                    vec!["Working directory".to_string(), code(&metadata.pwd)],
                ],
            ));
        }
        if !self.env_vars.is_empty() {
            body.push_str("<h4 class=\"text-lg font-semibold pt-3 pb-2\">Environment variables</h4>\n");
            let rows: Vec<Vec<String>> = self
                .env_vars
                .iter()
                .map(|var| vec![code(&var.key), html::escape(&var.value)])
                .collect();
            body.push_str(&html::table(&["Key", "Value"], &rows));
        }
        Ok(body)
    }
}

pub struct StatusSection {
    history: Vec<StatusChange>,
}

impl StatusSection {
    pub fn load(conn: &Connection) -> Result<Option<Self>, ReportError> {
        let history = read_status_history(conn)?;
        Ok((!history.is_empty()).then_some(Self { history }))
    }
}

impl Section for StatusSection {
    fn title(&self) -> &str {
        "Status history"
    }

    fn render(&self, tz: &FixedOffset) -> Result<String, ReportError> {
        let rows: Vec<Vec<String>> = self
            .history
            .iter()
            .map(|change| {
                vec![
                    html_from_ts(change.timestamp, tz),
                    html::escape(&change.status),
                ]
            })
            .collect();
        Ok(html::table(&["Time", "Status"], &rows))
    }
}

pub struct RestorePointSection {
    points: Vec<RestorePoint>,
}

impl RestorePointSection {
    pub fn load(conn: &Connection) -> Result<Option<Self>, ReportError> {
        let points = read_restore_points(conn)?;
        Ok((!points.is_empty()).then_some(Self { points }))
    }
}

impl Section for RestorePointSection {
    fn title(&self) -> &str {
        "Restore points"
    }

    fn render(&self, tz: &FixedOffset) -> Result<String, ReportError> {
        let rows: Vec<Vec<String>> = self
            .points
            .iter()
            .map(|point| {
                vec![
                    html_from_ts(point.timestamp, tz),
                    html::escape(&point.kind),
                    size_cell(point.size),
                ]
            })
            .collect();
        Ok(html::table(&["Time", "Type", "Size"], &rows))
    }
}

pub struct ResultSection {
    results: Vec<ResultEntry>,
}

impl ResultSection {
    pub fn load(conn: &Connection) -> Result<Option<Self>, ReportError> {
        let results = read_results(conn)?;
        Ok((!results.is_empty()).then_some(Self { results }))
    }
}

impl Section for ResultSection {
    fn title(&self) -> &str {
        "Result"
    }

    fn render(&self, tz: &FixedOffset) -> Result<String, ReportError> {
        let rows: Vec<Vec<String>> = self
            .results
            .iter()
            .map(|result| {
                vec![
                    html_from_ts(result.timestamp, tz),
                    html::escape(&result.kind),
                    size_cell(result.size),
                ]
            })
            .collect();
        Ok(html::table(&["Time", "Type", "Size"], &rows))
    }
}

type Transform = fn(Vec<MetricObservation>, &str) -> ChartSeries;

pub struct MetricsSection {
    charts: Vec<ChartSeries>,
}

impl MetricsSection {
    // Values are charted first, then counters, then start/stop intervals.
    // Series made only of STOP rows have nothing to pair with and are skipped.
    pub fn load(conn: &Connection) -> Result<Option<Self>, ReportError> {
        let series = list_series(conn)?;
        if series.is_empty() {
            return Ok(None);
        }

        let mut values = Vec::new();
        let mut counters = Vec::new();
        let mut intervals = Vec::new();
        for (name, kind) in series {
            let (charts, transform): (&mut Vec<ChartSeries>, Transform) = match kind {
                MetricKind::Value => (&mut values, value_series::<Vec<MetricObservation>>),
                MetricKind::Increment => (&mut counters, counter_series::<Vec<MetricObservation>>),
                MetricKind::Start => (&mut intervals, interval_series::<Vec<MetricObservation>>),
                MetricKind::Stop => continue,
            };
            let mut cursor = MetricCursor::prepare(conn, &name, kind)?;
            let observations = cursor.observations()?.collect::<Result<Vec<_>, _>>()?;
            charts.push(transform(observations, &name));
        }

        let charts: Vec<ChartSeries> = values
            .into_iter()
            .chain(counters)
            .chain(intervals)
            .collect();
        if charts.is_empty() {
            return Ok(None);
        }
        for chart in &charts {
            debug!("{}: {} chart points", chart.title, chart.len());
        }
        Ok(Some(Self { charts }))
    }

    pub fn charts(&self) -> &[ChartSeries] {
        &self.charts
    }
}

impl Section for MetricsSection {
    fn title(&self) -> &str {
        "Metrics"
    }

    fn render(&self, _tz: &FixedOffset) -> Result<String, ReportError> {
        let mut body = String::new();
        for chart in &self.charts {
            let options = serde_json::to_string(&chart.options())?;
            body.push_str(&html::chart(&options));
        }
        Ok(body)
    }
}

pub struct LogsSection {
    records: Vec<LogRecord>,
    total: usize,
}

impl LogsSection {
    pub fn load(conn: &Connection, config: &ReportConfig) -> Result<Option<Self>, ReportError> {
        let total = count_logs(conn)?;
        if total == 0 {
            return Ok(None);
        }
        let records = read_logs(conn, config.log_limit)?;
        if records.len() < total {
            warn!(
                "rendering {} of {} log records, raise REPORT_LOG_LIMIT to see more",
                records.len(),
                total
            );
        }
        Ok(Some(Self { records, total }))
    }
}

fn level_class(levelname: &str) -> &'static str {
    match levelname {
        "DEBUG" => "text-gray-500",
        "INFO" => "text-blue-700",
        "WARNING" | "WARN" => "text-yellow-700",
        "ERROR" | "CRITICAL" | "FATAL" => "text-red-700",
        _ => "text-gray-900",
    }
}

fn location(record: &LogRecord) -> String {
    let mut location = html::escape(&record.filename);
    if let Some(lineno) = record.lineno {
        location.push_str(&format!(":{}", lineno));
    }
    if !record.func_name.is_empty() {
        location.push_str(&format!(" ({})", html::escape(&record.func_name)));
    }
    let mut title = html::escape(&record.pathname);
    if !record.module.is_empty() {
        title.push_str(&format!(" [{}]", html::escape(&record.module)));
    }
    format!("<span title=\"{}\">{}</span>", title, location)
}

fn worker(name: &str, id: Option<i64>) -> String {
    match id {
        Some(id) => format!("{} ({})", html::escape(name), id),
        None => html::escape(name),
    }
}

impl Section for LogsSection {
    fn title(&self) -> &str {
        "Logs"
    }

    fn render(&self, tz: &FixedOffset) -> Result<String, ReportError> {
        let mut body = String::from(
            "<table class=\"table-auto w-full text-sm\">\n<thead><tr>\
             <th class=\"px-2 py-1 text-left border-b\">Time</th>\
             <th class=\"px-2 py-1 text-left border-b\">Level</th>\
             <th class=\"px-2 py-1 text-left border-b\">Logger</th>\
             <th class=\"px-2 py-1 text-left border-b\">Message</th>\
             <th class=\"px-2 py-1 text-left border-b\">Location</th>\
             <th class=\"px-2 py-1 text-left border-b\">Process</th>\
             <th class=\"px-2 py-1 text-left border-b\">Thread</th>\
             </tr></thead>\n<tbody>\n",
        );
        for record in &self.records {
            let cells = vec![
                html_from_ts(record.created, tz),
                html::escape(&record.levelname),
                html::escape(&record.name),
                format!("<pre class=\"whitespace-pre-wrap\">{}</pre>", html::escape(&record.msg)),
                location(record),
                worker(&record.process_name, record.process),
                worker(&record.thread_name, record.thread),
            ];
            body.push_str(&html::table_row(&cells, Some(level_class(&record.levelname))));
        }
        body.push_str("</tbody>\n</table>\n");

        let omitted = self.total.saturating_sub(self.records.len());
        if omitted > 0 {
            body.push_str(&format!(
                "<p class=\"pt-2 text-sm text-gray-600\">{} more log records not shown.</p>\n",
                omitted
            ));
        }
        Ok(body)
    }
}

#[cfg(test)]
pub mod tests {
    use chrono::FixedOffset;
    use rusqlite::params;

    use crate::{
        config::ReportConfig,
        store::fixture::{empty_db, insert_log, insert_metric},
    };

    use super::{
        LogsSection, MetadataSection, MetricsSection, RestorePointSection, ResultSection, Section,
        StatusSection,
    };

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_empty_tables_have_no_sections() {
        let conn = empty_db();
        let config = ReportConfig::default();
        assert!(MetadataSection::load(&conn).unwrap().is_none());
        assert!(StatusSection::load(&conn).unwrap().is_none());
        assert!(RestorePointSection::load(&conn).unwrap().is_none());
        assert!(ResultSection::load(&conn).unwrap().is_none());
        assert!(MetricsSection::load(&conn).unwrap().is_none());
        assert!(LogsSection::load(&conn, &config).unwrap().is_none());
    }

    #[test]
    fn test_metadata_section() {
        let conn = empty_db();
        conn.execute(
            "INSERT INTO Metadata VALUES (0.0, 'job.py --name <x>', '/srv')",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO MetadataEnvVars VALUES ('LANG', 'C')", [])
            .unwrap();

        let section = MetadataSection::load(&conn).unwrap().unwrap();
        let html = section.render(&utc()).unwrap();
        assert_eq!(section.title(), "Metadata");
        assert!(html.contains("<code>job.py --name &lt;x&gt;</code>"));
        assert!(html.contains("1970-01-01 00:00:00.00"));
        assert!(html.contains("Environment variables"));
        assert!(html.contains("<code>LANG</code>"));
    }

    #[test]
    fn test_restore_point_sizes() {
        let conn = empty_db();
        conn.execute(
            "INSERT INTO RestorePoint VALUES (1.0, 'pickle', ?1)",
            params![vec![1u8; 1536]],
        )
        .unwrap();
        conn.execute("INSERT INTO RestorePoint VALUES (2.0, 'none', NULL)", [])
            .unwrap();

        let html = RestorePointSection::load(&conn)
            .unwrap()
            .unwrap()
            .render(&utc())
            .unwrap();
        assert!(html.contains(">1.5 KiB</td>"));
        assert!(html.contains(">-</td>"));
    }

    #[test]
    fn test_metrics_section_orders_charts() {
        let conn = empty_db();
        insert_metric(&conn, "a_job", "START", 0.0, 10.0);
        insert_metric(&conn, "a_job", "STOP", 0.0, 15.0);
        insert_metric(&conn, "b_hits", "INCREMENT", 1.0, 1.0);
        insert_metric(&conn, "c_load", "VALUE", 0.7, 1.0);
        insert_metric(&conn, "d_orphan", "STOP", 0.0, 1.0);

        let section = MetricsSection::load(&conn).unwrap().unwrap();
        let titles: Vec<&str> = section.charts().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["c_load", "b_hits", "a_job"]);
        assert!(section.charts()[2].points.contains(&(10000.0, 5.0)));

        let html = section.render(&utc()).unwrap();
        assert_eq!(html.matches("class=\"chart ").count(), 3);
        assert!(html.contains("&quot;type&quot;:&quot;datetime&quot;"));
    }

    #[test]
    fn test_metrics_section_absent_with_only_stop_rows() {
        let conn = empty_db();
        insert_metric(&conn, "orphan", "STOP", 0.0, 5.0);
        insert_metric(&conn, "orphan", "STOP", 0.0, 6.0);

        assert!(MetricsSection::load(&conn).unwrap().is_none());
    }

    #[test]
    fn test_logs_section_limit() {
        let conn = empty_db();
        insert_log(&conn, 1.0, "INFO", "first <msg>");
        insert_log(&conn, 2.0, "ERROR", "second");
        insert_log(&conn, 3.0, "DEBUG", "third");

        let config = ReportConfig {
            log_limit: Some(2),
            ..Default::default()
        };
        let html = LogsSection::load(&conn, &config)
            .unwrap()
            .unwrap()
            .render(&utc())
            .unwrap();
        assert!(html.contains("first &lt;msg&gt;"));
        assert!(html.contains("<tr class=\"text-red-700\">"));
        assert!(!html.contains("third"));
        assert!(html.contains("1 more log records not shown."));
        assert!(html.contains("<span title=\"/srv/job.py [job]\">job.py:42 (run)</span>"));
        assert!(html.contains("MainThread (5678)"));
    }
}
