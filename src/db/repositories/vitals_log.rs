use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_risk, to_i64},
    models::{NewVitalsEntry, VitalsEntry},
};
use crate::models::RiskResult;

fn row_to_entry(row: &Row) -> Result<VitalsEntry> {
    let risk: String = row.get("risk")?;
    let recorded_at: String = row.get("recorded_at")?;

    Ok(VitalsEntry {
        id: row.get("id")?,
        patient_id: row.get("patient_id")?,
        heart_rate: row.get("heart_rate")?,
        spo2: row.get("spo2")?,
        temperature: row.get("temperature")?,
        weight: row.get("weight")?,
        risk: parse_risk(&risk)?,
        probability: row.get("probability")?,
        device_id: row.get("device_id")?,
        recorded_at: parse_datetime(&recorded_at, "recorded_at")?,
    })
}

impl Database {
    pub async fn append_vitals(&self, entry: NewVitalsEntry) -> Result<i64> {
        self.execute(move |conn| {
            let risk = entry.risk.unwrap_or_else(RiskResult::monitoring);
            conn.execute(
                "INSERT INTO vitals_log (
                    patient_id,
                    heart_rate,
                    spo2,
                    temperature,
                    weight,
                    risk,
                    probability,
                    device_id,
                    recorded_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    entry.patient_id,
                    entry.vitals.heart_rate,
                    entry.vitals.spo2,
                    entry.vitals.temperature,
                    entry.weight,
                    risk.risk.as_str(),
                    risk.probability,
                    entry.device_id,
                    entry.recorded_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to append vitals")?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Latest `limit` readings for a patient, oldest first.
    pub async fn query_recent_vitals(
        &self,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<VitalsEntry>> {
        let patient_id = patient_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, patient_id, heart_rate, spo2, temperature, weight, risk,
                        probability, device_id, recorded_at
                 FROM vitals_log
                 WHERE patient_id = ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )?;

            let mut rows = stmt.query(params![patient_id, to_i64(limit as u64)?])?;
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
