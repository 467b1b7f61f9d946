//! Postgres storage backend.
//!
//! Holds a single connection for the whole run. Each write runs in its own
//! transaction and is rolled back on failure; SQLSTATE `23505` is reported
//! as [`WriteError::UniqueViolation`].

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgQueryResult, PgSslMode};
use sqlx::{Connection, Postgres, Transaction};

use crate::error::{AppError, Result};
use crate::models::{CardId, CardRecord, DatabaseSettings, StoreConfig, WorklistConfig};
use crate::storage::{CardTable, WriteError, Worklist};

/// Postgres `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Card table and worklist backed by one Postgres connection.
pub struct PgCardStore {
    conn: PgConnection,
    table: String,
    worklist: WorklistConfig,
}

impl PgCardStore {
    /// Open the connection.
    pub async fn connect(
        settings: &DatabaseSettings,
        store: &StoreConfig,
        worklist: &WorklistConfig,
    ) -> Result<Self> {
        let options = connect_options(settings)?;
        let conn = PgConnection::connect_with(&options).await?;
        log::info!(
            "Connected to database {} at {}:{}",
            settings.database,
            settings.host,
            settings.port
        );

        Ok(Self {
            conn,
            table: store.table.clone(),
            worklist: worklist.clone(),
        })
    }

    /// Close the connection cleanly.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (id, card_name, ability, attack) VALUES ($1, $2, $3, $4)",
            self.table
        )
    }

    fn update_sql(&self) -> String {
        format!(
            "UPDATE {} SET card_name = $1, ability = $2, attack = $3 WHERE id = $4",
            self.table
        )
    }

    fn worklist_sql(&self) -> String {
        format!(
            "SELECT id::bigint FROM {} WHERE card_category = $1 AND regulation_mark = ANY($2) ORDER BY id",
            self.worklist.source_table
        )
    }
}

fn connect_options(settings: &DatabaseSettings) -> Result<PgConnectOptions> {
    let ssl_mode = settings
        .ssl_mode
        .parse::<PgSslMode>()
        .map_err(|e| AppError::config(format!("DB_SSLMODE '{}': {e}", settings.ssl_mode)))?;

    Ok(PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .password(&settings.password)
        .database(&settings.database)
        .ssl_mode(ssl_mode))
}

fn classify(error: sqlx::Error) -> WriteError {
    match &error {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            WriteError::UniqueViolation(db_err.message().to_string())
        }
        _ => WriteError::Store(error.to_string()),
    }
}

/// Commit on success, roll back on failure.
async fn finish(
    tx: Transaction<'_, Postgres>,
    result: std::result::Result<PgQueryResult, sqlx::Error>,
) -> std::result::Result<(), WriteError> {
    match result {
        Ok(_) => tx.commit().await.map_err(classify),
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                log::warn!("Rollback failed: {rollback}");
            }
            Err(classify(e))
        }
    }
}

#[async_trait]
impl CardTable for PgCardStore {
    async fn insert(&mut self, record: &CardRecord) -> std::result::Result<(), WriteError> {
        let sql = self.insert_sql();
        let mut tx = self.conn.begin().await.map_err(classify)?;
        let result = sqlx::query(&sql)
            .bind(record.id.0)
            .bind(&record.name)
            .bind(&record.ability)
            .bind(&record.attack)
            .execute(&mut *tx)
            .await;
        finish(tx, result).await
    }

    async fn update(&mut self, record: &CardRecord) -> std::result::Result<(), WriteError> {
        let sql = self.update_sql();
        let mut tx = self.conn.begin().await.map_err(classify)?;
        let result = sqlx::query(&sql)
            .bind(&record.name)
            .bind(&record.ability)
            .bind(&record.attack)
            .bind(record.id.0)
            .execute(&mut *tx)
            .await;
        finish(tx, result).await
    }
}

#[async_trait]
impl Worklist for PgCardStore {
    async fn card_ids(&mut self) -> Result<Vec<CardId>> {
        let sql = self.worklist_sql();
        let ids: Vec<i64> = sqlx::query_scalar(&sql)
            .bind(self.worklist.card_category)
            .bind(&self.worklist.regulation_marks)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(ids.into_iter().map(CardId).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(ssl_mode: &str) -> DatabaseSettings {
        DatabaseSettings {
            host: "localhost".into(),
            port: 5432,
            user: "crawler".into(),
            password: "secret".into(),
            database: "cards".into(),
            ssl_mode: ssl_mode.into(),
        }
    }

    #[test]
    fn test_connect_options_accepts_libpq_modes() {
        assert!(connect_options(&settings("disable")).is_ok());
        assert!(connect_options(&settings("require")).is_ok());
        assert!(matches!(
            connect_options(&settings("sometimes")),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_classify_non_database_error() {
        assert!(matches!(
            classify(sqlx::Error::RowNotFound),
            WriteError::Store(_)
        ));
    }
}
