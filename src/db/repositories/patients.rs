use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, to_i64, to_u32},
    models::Patient,
};
use crate::models::Profile;

fn row_to_patient(row: &Row) -> Result<Patient> {
    let age: Option<i64> = row.get("age")?;
    let created_at: String = row.get("created_at")?;

    Ok(Patient {
        id: row.get("id")?,
        name: row.get("name")?,
        age: age.map(|value| to_u32(value, "age")).transpose()?,
        gender: row.get("gender")?,
        smoking: row.get("smoking")?,
        hypertension: row.get("hypertension")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

fn lookup_patient(
    conn: &Connection,
    name: &str,
    age: Option<i64>,
    gender: Option<&str>,
) -> Result<Option<String>> {
    let id: Option<String> = conn
        .query_row(
            "SELECT id FROM patients
             WHERE name = ?1 AND age IS ?2 AND gender IS ?3
             ORDER BY created_at
             LIMIT 1",
            params![name, age, gender],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

impl Database {
    pub async fn find_patient(&self, profile: &Profile) -> Result<Option<String>> {
        let name = profile.name.clone();
        let age = profile.age;
        let gender = profile.gender.clone();

        self.execute(move |conn| {
            let age = age.map(|value| to_i64(u64::from(value))).transpose()?;
            lookup_patient(conn, &name, age, gender.as_deref())
        })
        .await
    }

    /// Returns the id of the patient matching the profile's name, age and
    /// gender, creating the row on first sight. Risk factors are refreshed
    /// from the profile on every call.
    pub async fn get_or_create_patient(&self, profile: &Profile) -> Result<String> {
        let name = profile.name.clone();
        let age = profile.age;
        let gender = profile.gender.clone();
        let (smoking, hypertension) = (profile.smoking, profile.hypertension);

        self.execute(move |conn| {
            let age = age.map(|value| to_i64(u64::from(value))).transpose()?;

            if let Some(id) = lookup_patient(conn, &name, age, gender.as_deref())? {
                conn.execute(
                    "UPDATE patients SET smoking = ?2, hypertension = ?3 WHERE id = ?1",
                    params![id, smoking, hypertension],
                )
                .with_context(|| format!("failed to update risk factors for patient {id}"))?;
                return Ok(id);
            }

            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO patients (id, name, age, gender, smoking, hypertension, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    name,
                    age,
                    gender,
                    smoking,
                    hypertension,
                    Utc::now().to_rfc3339()
                ],
            )
            .with_context(|| "failed to insert patient")?;
            Ok(id)
        })
        .await
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<Option<Patient>> {
        let patient_id = patient_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, age, gender, smoking, hypertension, created_at
                 FROM patients WHERE id = ?1",
            )?;
            let mut rows = stmt.query(params![patient_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_patient(row)?)),
                None => Ok(None),
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_identity_resolves_to_same_patient() {
        let db = Database::in_memory().unwrap();
        let mut profile = Profile::placeholder("Ravi");
        profile.age = Some(70);

        assert!(db.find_patient(&profile).await.unwrap().is_none());
        let first = db.get_or_create_patient(&profile).await.unwrap();
        let second = db.get_or_create_patient(&profile).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(db.find_patient(&profile).await.unwrap(), Some(first.clone()));

        profile.gender = Some("Male".into());
        let third = db.get_or_create_patient(&profile).await.unwrap();
        assert_ne!(first, third);

        let stored = db.get_patient(&third).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ravi");
        assert_eq!(stored.age, Some(70));
        assert_eq!(stored.gender.as_deref(), Some("Male"));
        assert!(!stored.smoking);
        assert!(!stored.hypertension);
    }

    #[tokio::test]
    async fn risk_factors_are_stored_and_refreshed() {
        let db = Database::in_memory().unwrap();
        let mut profile = Profile::placeholder("Meera");
        profile.age = Some(58);
        profile.smoking = true;

        let id = db.get_or_create_patient(&profile).await.unwrap();
        let stored = db.get_patient(&id).await.unwrap().unwrap();
        assert!(stored.smoking);
        assert!(!stored.hypertension);

        profile.hypertension = true;
        assert_eq!(db.get_or_create_patient(&profile).await.unwrap(), id);
        let stored = db.get_patient(&id).await.unwrap().unwrap();
        assert!(stored.smoking);
        assert!(stored.hypertension);
    }
}
