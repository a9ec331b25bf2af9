use crate::schema::{ApplyError, StatementExecutor, StatementFailure};
use sqlx::{Connection, PgConnection};

/// Opens a connection, reads the server version and closes it again.
pub async fn probe(database_url: &str) -> Result<String, ApplyError> {
    let mut conn = establish_connection(database_url).await?;

    let version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(&mut conn)
        .await
        .map_err(|e| connect_error(database_url, &e))?;

    if let Err(e) = conn.close().await {
        tracing::warn!("Failed to close probe connection: {}", e);
    }
    Ok(version)
}

pub async fn establish_connection(database_url: &str) -> Result<PgConnection, ApplyError> {
    PgConnection::connect(database_url)
        .await
        .map_err(|e| connect_error(database_url, &e))
}

fn connect_error(database_url: &str, err: &sqlx::Error) -> ApplyError {
    ApplyError::Connect {
        target: redact_url(database_url),
        message: err.to_string(),
    }
}

/// Replaces the password in a connection URL so it can be logged.
pub fn redact_url(database_url: &str) -> String {
    match reqwest::Url::parse(database_url) {
        Ok(mut url) => {
            if url.password().is_some() && url.set_password(Some("***")).is_err() {
                return "<unprintable database url>".to_string();
            }
            url.to_string()
        }
        Err(_) => "<unparseable database url>".to_string(),
    }
}

/// One Postgres connection running each statement on its own, outside any
/// transaction, so every statement commits independently.
pub struct PgStatementExecutor {
    conn: PgConnection,
}

impl PgStatementExecutor {
    pub async fn connect(database_url: &str) -> Result<Self, ApplyError> {
        let conn = establish_connection(database_url).await?;
        tracing::info!("Connected to {}", redact_url(database_url));
        Ok(Self { conn })
    }
}

impl StatementExecutor for PgStatementExecutor {
    async fn execute(&mut self, statement: &str) -> Result<(), StatementFailure> {
        sqlx::raw_sql(statement)
            .execute(&mut self.conn)
            .await
            .map(|_| ())
            .map_err(StatementFailure::from)
    }

    async fn close(self) {
        if let Err(e) = self.conn.close().await {
            tracing::warn!("Failed to close connection cleanly: {}", e);
        }
    }
}

impl From<sqlx::Error> for StatementFailure {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                StatementFailure::new(db.code().as_deref(), db.message())
            }
            _ => StatementFailure::new(None, err.to_string()),
        }
    }
}
