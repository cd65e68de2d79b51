use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{migrate::MigrateError, sqlite::SqlitePoolOptions, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use talentflow_core::company::{Company, CompanyDraft, CompanySummary};
use talentflow_core::validate::normalize_email;

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StorageError::Connect)?;

        apply_pragmas(&pool).await?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle to operate on company records.
    pub fn companies(&self) -> CompanyRepository {
        CompanyRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn apply_pragmas(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA journal_mode = WAL;")
        .fetch_one(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA synchronous = NORMAL;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    Ok(())
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to apply pragma: {0}")]
    Pragma(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository responsible for the `companies` table.
#[derive(Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    /// Inserts a new company record, assigning its identifier, and returns
    /// the persisted row.
    pub async fn insert(
        &self,
        draft: &CompanyDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Company, CompanyError> {
        let id = Uuid::new_v4().to_string();
        // Stored timestamps carry millisecond precision; the returned
        // record matches what a later read produces.
        let created_at = DateTime::from_timestamp_millis(created_at.timestamp_millis())
            .unwrap_or(created_at);
        sqlx::query(
            "INSERT INTO companies \
             (id, organization, email, phone, address, website, industry, logo, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&draft.organization)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.address)
        .bind(&draft.website)
        .bind(&draft.industry)
        .bind(&draft.logo)
        .bind(to_rfc3339(created_at))
        .execute(&self.pool)
        .await?;

        Ok(Company {
            id,
            organization: draft.organization.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
            address: draft.address.clone(),
            website: draft.website.clone(),
            industry: draft.industry.clone(),
            logo: draft.logo.clone(),
            created_at,
        })
    }

    /// Looks up a company by email address.
    ///
    /// The lookup value passes through the same trim + lower-case
    /// normalization applied to the column on insert, so a match is found
    /// however the caller cased the address. Read-then-write callers get no
    /// stronger guarantee: two concurrent registrations can both observe no
    /// match here before either inserts, since the schema carries no unique
    /// index on email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Company>, CompanyError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            "SELECT id, organization, email, phone, address, website, industry, logo, created_at \
             FROM companies WHERE email = ?",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CompanyRow::into_domain))
    }

    /// Fetches a single company by identifier.
    pub async fn fetch(&self, id: &str) -> Result<Company, CompanyError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            "SELECT id, organization, email, phone, address, website, industry, logo, created_at \
             FROM companies WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CompanyError::NotFound)?;

        Ok(row.into_domain())
    }

    /// Lists every company in insertion order, projected for the listing
    /// endpoint.
    pub async fn list(&self) -> Result<Vec<CompanySummary>, CompanyError> {
        let rows = sqlx::query_as::<_, CompanySummaryRow>(
            "SELECT id, organization, email, phone, address, website, industry, logo \
             FROM companies ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CompanySummaryRow::into_domain).collect())
    }
}

/// Errors that can occur while reading or writing company records.
#[derive(Debug, Error)]
pub enum CompanyError {
    #[error("company not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Full company row as stored in the `companies` table.
#[derive(Debug, sqlx::FromRow)]
pub struct CompanyRow {
    pub id: String,
    pub organization: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CompanyRow {
    /// Converts the database row into the domain record.
    pub fn into_domain(self) -> Company {
        Company {
            id: self.id,
            organization: self.organization,
            email: self.email,
            phone: self.phone,
            address: self.address,
            website: self.website,
            industry: self.industry,
            logo: self.logo,
            created_at: self.created_at,
        }
    }
}

/// Projected row backing the listing endpoint.
#[derive(Debug, sqlx::FromRow)]
pub struct CompanySummaryRow {
    pub id: String,
    pub organization: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub logo: Option<String>,
}

impl CompanySummaryRow {
    /// Converts the database row into the listing projection.
    pub fn into_domain(self) -> CompanySummary {
        CompanySummary {
            id: self.id,
            organization: self.organization,
            email: self.email,
            phone: self.phone,
            address: self.address,
            website: self.website,
            industry: self.industry,
            logo: self.logo,
        }
    }
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
