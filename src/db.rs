use crate::error::{AppError, AppResult};
use crate::models::{Compte, CompteChanges, CompteRow, NewCompte};
use crate::store::AccountStore;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions, PgPool,
};
use std::str::FromStr;
use std::time::Duration;

/// PostgreSQL-backed account repository
#[derive(Clone)]
pub struct PgRepository {
    pub(crate) pool: PgPool,
}

impl PgRepository {
    /// Create a new repository with a connection pool
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_seconds: u64,
    ) -> AppResult<Self> {
        let options = PgConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Configuration(format!("Invalid database URL: {}", e)))?
            .disable_statement_logging();

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_seconds))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn into_compte(row: CompteRow) -> AppResult<Compte> {
    Compte::try_from(row).map_err(|e| AppError::Internal(format!("Corrupt compte row: {}", e)))
}

#[async_trait]
impl AccountStore for PgRepository {
    async fn list(&self) -> AppResult<Vec<Compte>> {
        let rows = sqlx::query_as::<_, CompteRow>(
            r#"
            SELECT id, date_creation, solde, account_type
            FROM comptes
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(into_compte).collect()
    }

    async fn get(&self, id: i64) -> AppResult<Option<Compte>> {
        let row = sqlx::query_as::<_, CompteRow>(
            r#"
            SELECT id, date_creation, solde, account_type
            FROM comptes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_compte).transpose()
    }

    async fn create(&self, compte: NewCompte) -> AppResult<Compte> {
        let row = sqlx::query_as::<_, CompteRow>(
            r#"
            INSERT INTO comptes (date_creation, solde, account_type)
            VALUES ($1, $2, $3)
            RETURNING id, date_creation, solde, account_type
            "#,
        )
        .bind(compte.date_creation)
        .bind(compte.solde)
        .bind(compte.account_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        into_compte(row)
    }

    async fn update(&self, id: i64, changes: CompteChanges) -> AppResult<Option<Compte>> {
        let row = sqlx::query_as::<_, CompteRow>(
            r#"
            UPDATE comptes
            SET date_creation = COALESCE($1, date_creation),
                solde = COALESCE($2, solde),
                account_type = $3
            WHERE id = $4
            RETURNING id, date_creation, solde, account_type
            "#,
        )
        .bind(changes.date_creation)
        .bind(changes.solde)
        .bind(changes.account_type.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_compte).transpose()
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM comptes WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
