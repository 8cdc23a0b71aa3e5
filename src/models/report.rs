use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CompanyVacancyCount {
    pub id: String,
    pub name: String,
    pub vacancies_count: i64,
}

/// A vacancy joined with its employer's name.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct VacancyListing {
    pub company_name: String,
    pub title: String,
    pub salary_from: Option<Decimal>,
    pub salary_to: Option<Decimal>,
    pub url: String,
}

impl CompanyVacancyCount {
    /// Every employer with its number of vacancies, including employers with none.
    pub async fn list(conn: &mut PgConnection) -> Result<Vec<CompanyVacancyCount>, AppError> {
        let rows = sqlx::query_as::<_, CompanyVacancyCount>(
            "SELECT e.id, e.name, COUNT(v.id) AS vacancies_count
             FROM employers e
             LEFT JOIN vacancies v ON e.id = v.employer_id
             GROUP BY e.id, e.name
             ORDER BY e.name, e.id",
        )
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }
}

impl VacancyListing {
    pub async fn all(conn: &mut PgConnection) -> Result<Vec<VacancyListing>, AppError> {
        let rows = sqlx::query_as::<_, VacancyListing>(
            "SELECT e.name AS company_name, v.name AS title, v.salary_from, v.salary_to, v.url
             FROM vacancies v
             JOIN employers e ON e.id = v.employer_id
             ORDER BY e.name, v.name, v.id",
        )
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    pub async fn by_employer(
        conn: &mut PgConnection,
        employer_id: &str,
    ) -> Result<Vec<VacancyListing>, AppError> {
        let rows = sqlx::query_as::<_, VacancyListing>(
            "SELECT e.name AS company_name, v.name AS title, v.salary_from, v.salary_to, v.url
             FROM vacancies v
             JOIN employers e ON e.id = v.employer_id
             WHERE v.employer_id = $1
             ORDER BY v.name, v.id",
        )
        .bind(employer_id)
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    /// Rounded mean of salary midpoints over vacancies with both bounds.
    /// `None` when no vacancy has both.
    pub async fn average_salary(conn: &mut PgConnection) -> Result<Option<i64>, AppError> {
        let avg = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT ROUND(AVG((salary_from + salary_to) / 2))::BIGINT
             FROM vacancies
             WHERE salary_from IS NOT NULL AND salary_to IS NOT NULL",
        )
        .fetch_one(conn)
        .await?;
        Ok(avg)
    }

    /// Vacancies whose salary midpoint is strictly above the current average.
    pub async fn above_average(conn: &mut PgConnection) -> Result<Vec<VacancyListing>, AppError> {
        let Some(avg) = Self::average_salary(conn).await? else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, VacancyListing>(
            "SELECT e.name AS company_name, v.name AS title, v.salary_from, v.salary_to, v.url
             FROM vacancies v
             JOIN employers e ON e.id = v.employer_id
             WHERE (v.salary_from + v.salary_to) / 2 > $1
             ORDER BY e.name, v.name, v.id",
        )
        .bind(avg)
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    /// Case-insensitive substring match on the vacancy title.
    pub async fn matching(
        conn: &mut PgConnection,
        keyword: &str,
    ) -> Result<Vec<VacancyListing>, AppError> {
        let rows = sqlx::query_as::<_, VacancyListing>(
            "SELECT e.name AS company_name, v.name AS title, v.salary_from, v.salary_to, v.url
             FROM vacancies v
             JOIN employers e ON e.id = v.employer_id
             WHERE v.name ILIKE '%' || $1 || '%'
             ORDER BY e.name, v.name, v.id",
        )
        .bind(escape_like(keyword))
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }
}

/// Escape LIKE metacharacters so the keyword matches literally.
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
