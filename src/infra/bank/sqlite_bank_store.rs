// SQLite implementation of the BankStore trait (`economy.db`).

use crate::core::bank::{Account, BankError, BankStore, STARTING_SPARKS};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;

pub struct SqliteBankStore {
    pool: SqlitePool,
}

impl SqliteBankStore {
    /// Open (creating if needed) the bank database at the given path.
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        let connection_string = format!("sqlite://{}?mode=rwc", database_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Same schema the engine has always used, so existing databases open as-is.
    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                sparks INTEGER DEFAULT 100,
                echo_xp INTEGER DEFAULT 0,
                echo_level INTEGER DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn store_error(e: sqlx::Error) -> BankError {
    BankError::StoreError(e.to_string())
}

#[async_trait]
impl BankStore for SqliteBankStore {
    async fn open_account(&self, user_id: u64) -> Result<bool, BankError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO users (user_id, sparks, echo_xp, echo_level)
            VALUES (?, ?, 0, 1)
            "#,
        )
        .bind(user_id as i64)
        .bind(STARTING_SPARKS)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_account(&self, user_id: u64) -> Result<Account, BankError> {
        let row = sqlx::query(
            r#"
            SELECT user_id, sparks, echo_xp, echo_level
            FROM users
            WHERE user_id = ?
            "#,
        )
        .bind(user_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .ok_or_else(|| BankError::StoreError(format!("no account for user {user_id}")))?;

        // Columns are nullable in the legacy schema; fall back to the defaults.
        Ok(Account {
            user_id: row.get::<i64, _>("user_id") as u64,
            sparks: row
                .get::<Option<i64>, _>("sparks")
                .unwrap_or(STARTING_SPARKS),
            echo_xp: row.get::<Option<i64>, _>("echo_xp").unwrap_or(0),
            echo_level: row.get::<Option<i64>, _>("echo_level").unwrap_or(1),
        })
    }

    async fn add_sparks(&self, user_id: u64, amount: i64) -> Result<i64, BankError> {
        // The balance check lives in the UPDATE itself so that two pool
        // connections can never both spend the same Sparks.
        let updated = sqlx::query(
            r#"
            UPDATE users
            SET sparks = COALESCE(sparks, 100) + ?
            WHERE user_id = ? AND COALESCE(sparks, 100) + ? >= 0
            RETURNING sparks
            "#,
        )
        .bind(amount)
        .bind(user_id as i64)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        match updated {
            Some(row) => Ok(row.get::<i64, _>("sparks")),
            None => {
                let account = self.get_account(user_id).await?;
                Err(BankError::InsufficientFunds {
                    required: -amount,
                    available: account.sparks,
                })
            }
        }
    }

    async fn set_progress(
        &self,
        user_id: u64,
        echo_xp: i64,
        echo_level: i64,
    ) -> Result<(), BankError> {
        sqlx::query(
            r#"
            UPDATE users
            SET echo_xp = ?, echo_level = ?
            WHERE user_id = ?
            "#,
        )
        .bind(echo_xp)
        .bind(echo_level)
        .bind(user_id as i64)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }
}
