use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use sqlx::{Connection, PgConnection};

use crate::error::AppError;

/// Vacancy as listed in `GET /vacancies` items.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VacancyRecord {
    pub id: String,
    pub name: String,
    pub alternate_url: String,
    pub salary: Option<Salary>,
    pub snippet: Option<Snippet>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Salary {
    pub from: Option<Decimal>,
    pub to: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snippet {
    /// Outer `None`: key absent. `Some(None)`: key present with null.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub responsibility: Option<Option<String>>,
}

/// What the source said about a vacancy's responsibilities.
///
/// A snippet without a responsibility key, a responsibility sent as null and a
/// vacancy with no snippet at all are different answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Responsibility {
    Provided(String),
    /// Snippet present without a responsibility key. Stored as `''`.
    Blank,
    /// Responsibility sent as null. Stored as NULL.
    Null,
    /// No snippet object. Stored as NULL.
    Missing,
}

impl Responsibility {
    pub fn into_column(self) -> Option<String> {
        match self {
            Responsibility::Provided(text) => Some(text),
            Responsibility::Blank => Some(String::new()),
            Responsibility::Null | Responsibility::Missing => None,
        }
    }
}

impl VacancyRecord {
    pub fn responsibility(&self) -> Responsibility {
        let Some(snippet) = &self.snippet else {
            return Responsibility::Missing;
        };
        match &snippet.responsibility {
            None => Responsibility::Blank,
            Some(None) => Responsibility::Null,
            Some(Some(text)) => Responsibility::Provided(text.clone()),
        }
    }

    /// Lower and upper salary bounds. No salary object means neither bound.
    pub fn salary_bounds(&self) -> (Option<Decimal>, Option<Decimal>) {
        match &self.salary {
            Some(salary) => (salary.from, salary.to),
            None => (None, None),
        }
    }
}

/// hh.ru sends `2024-03-01T12:00:00+0300`; RFC 3339 is accepted too.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
}

/// Wraps whatever is present, null included, in `Some`. Paired with
/// `#[serde(default)]` so an absent key stays `None`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// A row of the `vacancies` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Vacancy {
    pub id: String,
    pub employer_id: String,
    pub name: String,
    pub url: String,
    pub salary_from: Option<Decimal>,
    pub salary_to: Option<Decimal>,
    pub description: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl Vacancy {
    pub fn from_record(employer_id: &str, record: &VacancyRecord) -> Self {
        let (salary_from, salary_to) = record.salary_bounds();
        Vacancy {
            id: record.id.clone(),
            employer_id: employer_id.to_string(),
            name: record.name.clone(),
            url: record.alternate_url.clone(),
            salary_from,
            salary_to,
            description: record.responsibility().into_column(),
            created_at: record.created_at,
        }
    }

    /// Insert every employer's vacancies in one transaction.
    /// There is no conflict handling: loading into a table that already holds
    /// one of these ids fails the whole batch.
    pub async fn load(
        conn: &mut PgConnection,
        batches: &[(String, Vec<VacancyRecord>)],
    ) -> Result<u64, AppError> {
        let mut inserted = 0;
        let mut tx = conn.begin().await?;

        for (employer_id, records) in batches {
            for record in records {
                let vacancy = Vacancy::from_record(employer_id, record);
                sqlx::query(
                    "INSERT INTO vacancies (id, employer_id, name, url, salary_from, salary_to, description, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                )
                .bind(&vacancy.id)
                .bind(&vacancy.employer_id)
                .bind(&vacancy.name)
                .bind(&vacancy.url)
                .bind(vacancy.salary_from)
                .bind(vacancy.salary_to)
                .bind(&vacancy.description)
                .bind(vacancy.created_at)
                .execute(&mut *tx)
                .await?;
                inserted += 1;
            }
        }

        tx.commit().await?;
        Ok(inserted)
    }

    #[cfg(test)]
    pub async fn get(conn: &mut PgConnection, id: &str) -> Result<Option<Vacancy>, AppError> {
        let vacancy = sqlx::query_as::<_, Vacancy>(
            "SELECT id, employer_id, name, url, salary_from, salary_to, description, created_at FROM vacancies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(vacancy)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn record(value: serde_json::Value) -> VacancyRecord {
        serde_json::from_value(value).unwrap()
    }

    fn base() -> serde_json::Value {
        json!({
            "id": "93000001",
            "name": "Backend developer",
            "alternate_url": "https://hh.ru/vacancy/93000001",
            "created_at": "2024-03-01T12:00:00+0300"
        })
    }

    #[test]
    fn parses_hh_timestamp_with_offset() {
        let vacancy = record(base());
        assert_eq!(vacancy.created_at.offset().local_minus_utc(), 3 * 3600);
        assert_eq!(
            vacancy.created_at.with_timezone(&Utc).to_rfc3339(),
            "2024-03-01T09:00:00+00:00"
        );
    }

    #[test]
    fn accepts_rfc3339_timestamps() {
        let parsed = parse_timestamp("2024-03-01T12:00:00+03:00").unwrap();
        assert_eq!(parsed, parse_timestamp("2024-03-01T12:00:00+0300").unwrap());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn absent_salary_leaves_both_bounds_null() {
        let vacancy = record(base());
        assert_eq!(vacancy.salary_bounds(), (None, None));

        let mut value = base();
        value["salary"] = json!(null);
        assert_eq!(record(value).salary_bounds(), (None, None));
    }

    #[test]
    fn salary_bounds_are_taken_independently() {
        let mut value = base();
        value["salary"] = json!({ "from": 30000, "to": null, "currency": "RUR", "gross": true });
        assert_eq!(record(value).salary_bounds(), (Some(Decimal::from(30000)), None));

        let mut value = base();
        value["salary"] = json!({ "to": 50000 });
        assert_eq!(record(value).salary_bounds(), (None, Some(Decimal::from(50000))));
    }

    #[test]
    fn responsibility_distinguishes_blank_null_and_missing() {
        assert_eq!(record(base()).responsibility(), Responsibility::Missing);

        let mut value = base();
        value["snippet"] = json!(null);
        assert_eq!(record(value).responsibility(), Responsibility::Missing);

        let mut value = base();
        value["snippet"] = json!({ "requirement": "Rust" });
        assert_eq!(record(value).responsibility(), Responsibility::Blank);

        let mut value = base();
        value["snippet"] = json!({ "requirement": "x", "responsibility": null });
        assert_eq!(record(value).responsibility(), Responsibility::Null);

        let mut value = base();
        value["snippet"] = json!({ "responsibility": "Ship features" });
        assert_eq!(
            record(value).responsibility(),
            Responsibility::Provided("Ship features".to_string())
        );
    }

    #[test]
    fn responsibility_column_values() {
        assert_eq!(Responsibility::Missing.into_column(), None);
        assert_eq!(Responsibility::Null.into_column(), None);
        assert_eq!(Responsibility::Blank.into_column(), Some(String::new()));
        assert_eq!(
            Responsibility::Provided("x".to_string()).into_column(),
            Some("x".to_string())
        );
    }

    #[test]
    fn vacancy_row_takes_employer_from_batch_key() {
        let mut value = base();
        value["salary"] = json!({ "from": 100000, "to": 150000 });
        value["snippet"] = json!({ "responsibility": "Design APIs" });
        value["employer"] = json!({ "id": "someone-else" });

        let row = Vacancy::from_record("1740", &record(value));

        assert_eq!(row.employer_id, "1740");
        assert_eq!(row.url, "https://hh.ru/vacancy/93000001");
        assert_eq!(row.salary_from, Some(Decimal::from(100000)));
        assert_eq!(row.salary_to, Some(Decimal::from(150000)));
        assert_eq!(row.description.as_deref(), Some("Design APIs"));
    }

    #[test]
    fn explicit_null_responsibility_is_stored_as_null() {
        let mut value = base();
        value["snippet"] = json!({ "requirement": "x", "responsibility": null });
        assert_eq!(Vacancy::from_record("1740", &record(value)).description, None);

        let mut value = base();
        value["snippet"] = json!({ "requirement": "x" });
        assert_eq!(
            Vacancy::from_record("1740", &record(value)).description.as_deref(),
            Some("")
        );
    }
}
