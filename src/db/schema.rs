use sqlx::{Connection, PgConnection};

use crate::config::DbSettings;
use crate::db;
use crate::error::AppError;

const CREATE_EMPLOYERS: &str = "
    CREATE TABLE IF NOT EXISTS employers (
        id VARCHAR(255) PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        url VARCHAR(255) NOT NULL,
        description TEXT
    )";

const CREATE_VACANCIES: &str = "
    CREATE TABLE IF NOT EXISTS vacancies (
        id VARCHAR(255) PRIMARY KEY,
        employer_id VARCHAR(255) NOT NULL REFERENCES employers (id),
        name VARCHAR(255) NOT NULL,
        salary_from NUMERIC,
        salary_to NUMERIC,
        url VARCHAR(255) NOT NULL,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL
    )";

/// Drop both tables and create them empty. Vacancies go first because they
/// reference employers.
pub async fn reset(conn: &mut PgConnection) -> Result<(), AppError> {
    let mut tx = conn.begin().await?;
    sqlx::query("DROP TABLE IF EXISTS vacancies").execute(&mut *tx).await?;
    sqlx::query("DROP TABLE IF EXISTS employers").execute(&mut *tx).await?;
    sqlx::query(CREATE_EMPLOYERS).execute(&mut *tx).await?;
    sqlx::query(CREATE_VACANCIES).execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(())
}

/// Bring an existing vacancies table up to date. Safe to run repeatedly.
pub async fn migrate(conn: &mut PgConnection) -> Result<(), AppError> {
    sqlx::query("ALTER TABLE vacancies ADD COLUMN IF NOT EXISTS description TEXT")
        .execute(conn)
        .await?;
    Ok(())
}

/// `reset` on a connection of its own.
pub async fn reset_database(settings: &DbSettings) -> Result<(), AppError> {
    let mut conn = db::connect(settings).await?;
    let result = reset(&mut conn).await;
    db::release(conn, result).await?;
    tracing::info!("Tables employers and vacancies recreated");
    Ok(())
}

/// `migrate` on a connection of its own.
pub async fn migrate_database(settings: &DbSettings) -> Result<(), AppError> {
    let mut conn = db::connect(settings).await?;
    let result = migrate(&mut conn).await;
    db::release(conn, result).await?;
    tracing::info!("Schema migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlx::Postgres;
    use sqlx::pool::PoolConnection;

    use super::*;

    async fn table_exists(conn: &mut PgConnection, table: &str) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = $1)",
        )
        .bind(table)
        .fetch_one(conn)
        .await
        .unwrap()
    }

    async fn row_count(conn: &mut PgConnection, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(conn)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "needs PostgreSQL via DATABASE_URL"]
    async fn reset_creates_empty_tables(mut conn: PoolConnection<Postgres>) {
        reset(&mut conn).await.unwrap();

        assert!(table_exists(&mut conn, "employers").await);
        assert!(table_exists(&mut conn, "vacancies").await);
        assert_eq!(row_count(&mut conn, "employers").await, 0);
        assert_eq!(row_count(&mut conn, "vacancies").await, 0);
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "needs PostgreSQL via DATABASE_URL"]
    async fn reset_discards_previous_rows(mut conn: PoolConnection<Postgres>) {
        reset(&mut conn).await.unwrap();
        sqlx::query("INSERT INTO employers (id, name, url) VALUES ('1', 'A', 'u')")
            .execute(&mut *conn)
            .await
            .unwrap();

        reset(&mut conn).await.unwrap();

        assert_eq!(row_count(&mut conn, "employers").await, 0);
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "needs PostgreSQL via DATABASE_URL"]
    async fn vacancies_require_known_employer(mut conn: PoolConnection<Postgres>) {
        reset(&mut conn).await.unwrap();

        let err = sqlx::query(
            "INSERT INTO vacancies (id, employer_id, name, url, created_at) VALUES ('v', 'nobody', 'x', 'u', NOW())",
        )
        .execute(&mut *conn)
        .await
        .unwrap_err();

        let db_err = err.as_database_error().expect("database error");
        assert!(db_err.is_foreign_key_violation());
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "needs PostgreSQL via DATABASE_URL"]
    async fn migrate_adds_missing_description(mut conn: PoolConnection<Postgres>) {
        sqlx::query("CREATE TABLE vacancies (id VARCHAR(255) PRIMARY KEY)")
            .execute(&mut *conn)
            .await
            .unwrap();

        migrate(&mut conn).await.unwrap();
        migrate(&mut conn).await.unwrap();

        let has_column = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM information_schema.columns WHERE table_name = 'vacancies' AND column_name = 'description')",
        )
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        assert!(has_column);
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "needs PostgreSQL via DATABASE_URL"]
    async fn migrate_without_tables_is_an_error(mut conn: PoolConnection<Postgres>) {
        let err = migrate(&mut conn).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
