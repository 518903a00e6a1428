use std::collections::BTreeSet;

use rusqlite::{params, Connection, Row, Rows, Statement};

use super::StoreError;
use crate::metric::{MetricKind, MetricObservation};

const SELECT_SERIES: &str = "SELECT type, value, timestamp FROM Metrics
    WHERE name = ?1 AND UPPER(type) IN (?2, ?3)
    ORDER BY rowid";

/// Returns every distinct `(name, kind)` pair in the Metrics table, ordered by
/// name and then kind.
pub fn list_series(conn: &Connection) -> Result<Vec<(String, MetricKind)>, StoreError> {
    let mut stmt = conn.prepare("SELECT DISTINCT name, type FROM Metrics")?;
    let mut rows = stmt.query([])?;

    let mut series = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        let kind: String = row.get(1)?;
        series.insert((name, kind.parse::<MetricKind>()?));
    }
    Ok(series.into_iter().collect())
}

/// A prepared read of one metric series.
///
/// The cursor hands out its rows exactly once: `observations` starts the
/// query and any later call fails with [`StoreError::Consumed`]. Reading a
/// `Start` series also yields the `Stop` rows of the same name, since both
/// halves are needed to rebuild intervals.
pub struct MetricCursor<'conn> {
    stmt: Statement<'conn>,
    name: String,
    kind: MetricKind,
    consumed: bool,
}

impl<'conn> MetricCursor<'conn> {
    pub fn prepare(
        conn: &'conn Connection,
        name: &str,
        kind: MetricKind,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            stmt: conn.prepare(SELECT_SERIES)?,
            name: name.to_string(),
            kind,
            consumed: false,
        })
    }

    pub fn observations(&mut self) -> Result<Observations<'_>, StoreError> {
        if self.consumed {
            return Err(StoreError::Consumed);
        }
        self.consumed = true;

        let (first, second) = match self.kind {
            MetricKind::Start => (MetricKind::Start, MetricKind::Stop),
            other => (other, other),
        };
        let name = self.name.as_str();
        let rows = self
            .stmt
            .query(params![name, first.as_str(), second.as_str()])?;
        Ok(Observations { rows, name })
    }
}

/// Single-pass iterator over the rows of a [`MetricCursor`].
pub struct Observations<'a> {
    rows: Rows<'a>,
    name: &'a str,
}

impl<'a> Iterator for Observations<'a> {
    type Item = Result<MetricObservation, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.name;
        match self.rows.next() {
            Ok(Some(row)) => Some(observation(row, name)),
            Ok(None) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

fn observation(row: &Row, name: &str) -> Result<MetricObservation, StoreError> {
    let kind: String = row.get(0)?;
    let value: Option<f64> = row.get(1)?;
    Ok(MetricObservation {
        kind: kind.parse()?,
        name: name.to_string(),
        timestamp: row.get(2)?,
        value: value.unwrap_or_default(),
    })
}

#[cfg(test)]
pub mod tests {
    use crate::{
        metric::MetricKind,
        store::{
            fixture::{empty_db, insert_metric},
            StoreError,
        },
    };

    use super::{list_series, MetricCursor};

    #[test]
    fn test_read_value_series_in_storage_order() {
        let conn = empty_db();
        insert_metric(&conn, "cpu", "VALUE", 3.0, 30.0);
        insert_metric(&conn, "cpu", "VALUE", 1.0, 10.0);
        insert_metric(&conn, "cpu", "INCREMENT", 1.0, 20.0);
        insert_metric(&conn, "mem", "VALUE", 7.0, 15.0);

        let mut cursor = MetricCursor::prepare(&conn, "cpu", MetricKind::Value).unwrap();
        let result: Vec<_> = cursor
            .observations()
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].timestamp, 30.0);
        assert_eq!(result[0].value, 3.0);
        assert_eq!(result[1].timestamp, 10.0);
        assert!(result
            .iter()
            .all(|o| o.name == "cpu" && o.kind == MetricKind::Value));
    }

    #[test]
    fn test_read_start_includes_stop() {
        let conn = empty_db();
        insert_metric(&conn, "job", "START", 0.0, 1.0);
        insert_metric(&conn, "job", "STOP", 0.0, 2.0);
        insert_metric(&conn, "other", "STOP", 0.0, 3.0);

        let mut cursor = MetricCursor::prepare(&conn, "job", MetricKind::Start).unwrap();
        let kinds: Vec<MetricKind> = cursor
            .observations()
            .unwrap()
            .map(|o| o.unwrap().kind)
            .collect();
        assert_eq!(kinds, vec![MetricKind::Start, MetricKind::Stop]);
    }

    #[test]
    fn test_read_stop_excludes_start() {
        let conn = empty_db();
        insert_metric(&conn, "job", "START", 0.0, 1.0);
        insert_metric(&conn, "job", "STOP", 0.0, 2.0);

        let mut cursor = MetricCursor::prepare(&conn, "job", MetricKind::Stop).unwrap();
        assert_eq!(cursor.observations().unwrap().count(), 1);
    }

    #[test]
    fn test_cursor_is_single_pass() {
        let conn = empty_db();
        insert_metric(&conn, "cpu", "VALUE", 1.0, 1.0);

        let mut cursor = MetricCursor::prepare(&conn, "cpu", MetricKind::Value).unwrap();
        assert_eq!(cursor.observations().unwrap().count(), 1);
        assert!(matches!(cursor.observations(), Err(StoreError::Consumed)));
    }

    #[test]
    fn test_null_value_reads_as_zero() {
        let conn = empty_db();
        conn.execute(
            "INSERT INTO Metrics (name, type, value, timestamp) VALUES ('job', 'START', NULL, 4.0)",
            [],
        )
        .unwrap();

        let mut cursor = MetricCursor::prepare(&conn, "job", MetricKind::Start).unwrap();
        let observation = cursor.observations().unwrap().next().unwrap().unwrap();
        assert_eq!(observation.value, 0.0);
        assert_eq!(observation.timestamp, 4.0);
    }

    #[test]
    fn test_list_series_is_sorted_and_deduplicated() {
        let conn = empty_db();
        insert_metric(&conn, "b", "VALUE", 1.0, 1.0);
        insert_metric(&conn, "a", "STOP", 0.0, 2.0);
        insert_metric(&conn, "a", "START", 0.0, 1.0);
        insert_metric(&conn, "a", "start", 0.0, 3.0);
        insert_metric(&conn, "b", "VALUE", 2.0, 2.0);

        let series = list_series(&conn).unwrap();
        assert_eq!(
            series,
            vec![
                ("a".to_string(), MetricKind::Start),
                ("a".to_string(), MetricKind::Stop),
                ("b".to_string(), MetricKind::Value),
            ]
        );
    }

    #[test]
    fn test_unknown_kind_fails() {
        let conn = empty_db();
        insert_metric(&conn, "cpu", "GAUGE", 1.0, 1.0);
        assert!(matches!(
            list_series(&conn),
            Err(StoreError::UnknownKind(kind)) if kind == "GAUGE"
        ));
    }

    #[test]
    fn test_missing_table_propagates() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        assert!(matches!(list_series(&conn), Err(StoreError::Query(_))));
    }
}
