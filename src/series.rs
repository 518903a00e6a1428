use log::debug;
use serde::Serialize;
use serde_json::{json, Value};

use crate::metric::{MetricKind, MetricObservation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    Datetime,
}

// Points are (milliseconds since the epoch, value) pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub title: String,
    pub series_name: String,
    pub y_label: String,
    pub x_axis: AxisType,
    pub points: Vec<(f64, f64)>,
}

impl ChartSeries {
    fn new(title: &str, series_name: &str, y_label: &str, points: Vec<(f64, f64)>) -> Self {
        Self {
            title: title.to_string(),
            series_name: series_name.to_string(),
            y_label: y_label.to_string(),
            x_axis: AxisType::Datetime,
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Highcharts options object for this series.
    pub fn options(&self) -> Value {
        json!({
            "title": { "text": self.title },
            "xAxis": { "type": self.x_axis },
            "yAxis": { "title": { "text": self.y_label } },
            "series": [{
                "name": self.series_name,
                "data": self.points,
            }],
        })
    }
}

fn millis(timestamp: f64) -> f64 {
    timestamp * 1000.0
}

/// Instantaneous values, charted as-is in source order.
pub fn value_series<I>(observations: I, name: &str) -> ChartSeries
where
    I: IntoIterator<Item = MetricObservation>,
{
    let points = observations
        .into_iter()
        .map(|o| (millis(o.timestamp), o.value))
        .collect();
    ChartSeries::new(name, "Numeric value", "Value", points)
}

/// Monotonic counter: every observation is one hit, the stored value is
/// ignored.
pub fn counter_series<I>(observations: I, name: &str) -> ChartSeries
where
    I: IntoIterator<Item = MetricObservation>,
{
    let points = observations
        .into_iter()
        .enumerate()
        .map(|(hits, o)| (millis(o.timestamp), hits as f64))
        .collect();
    ChartSeries::new(name, "Hit increment", "Hits", points)
}

/// Durations of start/stop intervals, drawn as plateaus.
///
/// Times and heights are collected as two columns and zipped at the end. A
/// START pushes a pending height that its STOP later overwrites with the
/// interval duration; the STOP then pushes the duration again plus a zero
/// height, against times `stop + 1ms` and `stop`, so the line falls back to
/// zero between intervals. A STOP with no open interval is dropped and adds
/// no points, so the zero baseline sits just before the first START. A START
/// that is superseded by another START before any STOP keeps a height of zero.
pub fn interval_series<I>(observations: I, name: &str) -> ChartSeries
where
    I: IntoIterator<Item = MetricObservation>,
{
    let mut sorted: Vec<MetricObservation> = observations.into_iter().collect();
    sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let mut times: Vec<f64> = Vec::with_capacity(sorted.len() * 2 + 1);
    let mut heights: Vec<f64> = Vec::with_capacity(sorted.len() * 2 + 1);
    // Index into `heights` and timestamp of the interval waiting for its STOP.
    let mut open: Option<(usize, f64)> = None;

    for observation in &sorted {
        match observation.kind {
            MetricKind::Stop => {
                let Some((pending, start_ts)) = open.take() else {
                    debug!(
                        "{}: dropping stop at {} without a matching start",
                        name, observation.timestamp
                    );
                    continue;
                };
                let duration = observation.timestamp - start_ts;
                heights[pending] = duration;
                heights.push(duration);

                times.push(millis(observation.timestamp) + 1.0);
                heights.push(0.0);
            }
            _ => {
                // Zero floor just before the first charted START.
                if times.is_empty() {
                    times.push(millis(observation.timestamp) - 1.0);
                    heights.push(0.0);
                }
                if let Some((superseded, _)) = open {
                    heights[superseded] = 0.0;
                }
                open = Some((heights.len(), observation.timestamp));
                heights.push(observation.timestamp);
            }
        }
        times.push(millis(observation.timestamp));
    }

    // An interval still open at the end was never closed.
    if let Some((pending, _)) = open {
        heights[pending] = 0.0;
    }

    let points = times.into_iter().zip(heights).collect();
    ChartSeries::new(name, "How long the start/stop took", "Seconds", points)
}
