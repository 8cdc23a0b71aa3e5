use serde::Deserialize;
use sqlx::{Connection, PgConnection};

use crate::error::AppError;

/// Employer as returned by `GET /employers/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmployerRecord {
    pub id: String,
    pub name: String,
    pub alternate_url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The columns of a stored employer shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Employer {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Outcome of a conflict-skipping batch insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub inserted: u64,
    pub skipped: u64,
}

impl Employer {
    /// Insert employers in one transaction. Rows whose id already exists are
    /// left untouched, so the first write of an employer wins.
    pub async fn load(
        conn: &mut PgConnection,
        employers: &[EmployerRecord],
    ) -> Result<LoadSummary, AppError> {
        let mut summary = LoadSummary::default();
        let mut tx = conn.begin().await?;

        for employer in employers {
            let result = sqlx::query(
                "INSERT INTO employers (id, name, url, description) VALUES ($1, $2, $3, $4) ON CONFLICT (id) DO NOTHING",
            )
            .bind(&employer.id)
            .bind(&employer.name)
            .bind(&employer.alternate_url)
            .bind(&employer.description)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                summary.skipped += 1;
            } else {
                summary.inserted += 1;
            }
        }

        tx.commit().await?;
        Ok(summary)
    }

    pub async fn list(conn: &mut PgConnection) -> Result<Vec<Employer>, AppError> {
        let employers = sqlx::query_as::<_, Employer>("SELECT id, name, url FROM employers ORDER BY name, id")
            .fetch_all(conn)
            .await?;
        Ok(employers)
    }

    #[cfg(test)]
    pub async fn get(conn: &mut PgConnection, id: &str) -> Result<Option<Employer>, AppError> {
        let employer = sqlx::query_as::<_, Employer>("SELECT id, name, url FROM employers WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(employer)
    }
}
