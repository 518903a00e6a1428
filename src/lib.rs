pub mod config;
pub mod format;
pub mod logger;
pub mod report;
pub mod series;
pub mod store;

pub use config::ReportConfig;
pub use metric::{MetricKind, MetricObservation};
pub use series::ChartSeries;

mod metric;
