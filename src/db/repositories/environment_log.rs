use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, to_i64},
    models::{EnvironmentEntry, NewEnvironmentEntry},
};

fn row_to_entry(row: &Row) -> Result<EnvironmentEntry> {
    let recorded_at: String = row.get("recorded_at")?;

    Ok(EnvironmentEntry {
        id: row.get("id")?,
        humidity: row.get("humidity")?,
        room_temp: row.get("room_temp")?,
        aqi: row.get("aqi")?,
        device_id: row.get("device_id")?,
        recorded_at: parse_datetime(&recorded_at, "recorded_at")?,
    })
}

impl Database {
    pub async fn append_environment(&self, entry: NewEnvironmentEntry) -> Result<i64> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO environment_log (humidity, room_temp, aqi, device_id, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.environment.humidity,
                    entry.environment.room_temp,
                    entry.environment.aqi,
                    entry.device_id,
                    entry.recorded_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to append environment reading")?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Latest `limit` room readings, oldest first.
    pub async fn query_recent_environment(&self, limit: usize) -> Result<Vec<EnvironmentEntry>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, humidity, room_temp, aqi, device_id, recorded_at
                 FROM environment_log
                 ORDER BY id DESC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![to_i64(limit as u64)?])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_entry(row)?);
            }
            entries.reverse();
            Ok(entries)
        })
        .await
    }
}
