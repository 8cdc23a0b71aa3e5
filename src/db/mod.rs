pub mod schema;

use sqlx::{Connection, PgConnection};

use crate::config::DbSettings;
use crate::error::AppError;

/// Open a single connection, bounded by the configured connect timeout.
/// Every statement on it is subject to the server-side statement timeout.
pub async fn connect(settings: &DbSettings) -> Result<PgConnection, AppError> {
    let statement_timeout = format!("{}ms", settings.statement_timeout.as_millis());
    let opts = settings
        .connect
        .clone()
        .options([("statement_timeout", statement_timeout)]);

    match tokio::time::timeout(settings.connect_timeout, PgConnection::connect_with(&opts)).await {
        Ok(conn) => Ok(conn?),
        Err(_) => Err(AppError::ConnectTimeout(settings.connect_timeout)),
    }
}

/// Close `conn` and hand back `result`. An error from the work itself wins
/// over an error while closing.
pub async fn release<T>(conn: PgConnection, result: Result<T, AppError>) -> Result<T, AppError> {
    let closed = conn.close().await;
    match (result, closed) {
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                tracing::warn!("Failed to close connection after error: {close_err}");
            }
            Err(e)
        }
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err.into()),
    }
}

/// A long-lived connection for interactive use, closed exactly once.
pub struct Session {
    conn: PgConnection,
}

impl Session {
    pub async fn open(settings: &DbSettings) -> Result<Self, AppError> {
        let conn = connect(settings).await?;
        tracing::debug!("Session opened");
        Ok(Self { conn })
    }

    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    pub async fn close(self) -> Result<(), AppError> {
        self.conn.close().await?;
        tracing::debug!("Session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sqlx::postgres::PgConnectOptions;

    use super::*;

    #[tokio::test]
    async fn connect_gives_up_after_timeout() {
        // Accepts TCP but never speaks the protocol.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let settings = DbSettings {
            connect: PgConnectOptions::new()
                .host("127.0.0.1")
                .port(port)
                .username("nobody")
                .database("nothing"),
            connect_timeout: Duration::from_millis(200),
            statement_timeout: Duration::from_secs(1),
        };

        let err = connect(&settings).await.unwrap_err();
        assert!(matches!(err, AppError::ConnectTimeout(_)));
        assert!(err.is_connection_failure());
    }
}
