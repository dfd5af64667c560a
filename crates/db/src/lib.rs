//! Postgres connection pool, migration runner, and store error mapping.

use std::time::Duration;

use anyhow::Context;
use catalog_kernel::{settings::DatabaseSettings, CatalogError, IntegritySubject, Migration};
use sqlx::{postgres::PgPoolOptions, PgPool};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS catalog_migrations (
        module TEXT NOT NULL,
        id TEXT NOT NULL,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (module, id)
    )
"#;

/// Create a connection pool, retrying with exponential backoff.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(settings.retry_delay_secs);
    let url_safe = sanitize_connection_url(&settings.url);

    loop {
        match try_connect(settings).await {
            Ok(pool) => {
                tracing::info!(
                    target: "catalog-db",
                    url = %url_safe,
                    max = settings.max_connections,
                    min = settings.min_connections,
                    "database connection pool created"
                );
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > settings.max_retries {
                    return Err(e).with_context(|| {
                        format!(
                            "failed to connect to database at '{}' after {} attempt(s)",
                            url_safe, attempt
                        )
                    });
                }

                let delay = retry_delay(base_delay, attempt);
                tracing::warn!(
                    target: "catalog-db",
                    attempt,
                    error = %e,
                    "database connection failed, retrying in {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Exponential backoff capped at `MAX_RETRY_DELAY`.
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2_u32
        .checked_pow(attempt.saturating_sub(1))
        .unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

async fn try_connect(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .connect(&settings.url)
        .await
}

/// Apply every migration not yet recorded in `catalog_migrations`.
///
/// Each migration runs in its own transaction together with its bookkeeping row.
pub async fn migrate(pool: &PgPool, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
    sqlx::raw_sql(MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .context("failed to create migrations table")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let done: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM catalog_migrations WHERE module = $1 AND id = $2",
        )
        .bind(module)
        .bind(migration.id)
        .fetch_optional(pool)
        .await
        .context("failed to read migration state")?;

        if done.is_some() {
            tracing::debug!(target: "catalog-db", module = %module, id = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await.context("failed to begin migration")?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
        sqlx::query("INSERT INTO catalog_migrations (module, id) VALUES ($1, $2)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await
            .context("failed to record migration")?;
        tx.commit().await.context("failed to commit migration")?;

        tracing::info!(target: "catalog-db", module = %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

/// Translate a driver error into the domain taxonomy.
///
/// Constraint failures become `IntegrityViolation` naming what was wrong;
/// everything else is an opaque store failure.
pub fn store_error(err: sqlx::Error) -> CatalogError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation()
            || db_err.is_foreign_key_violation()
            || db_err.is_check_violation()
        {
            let subject = integrity_subject(db_err.constraint().unwrap_or_default());
            tracing::debug!(
                target: "catalog-db",
                constraint = ?db_err.constraint(),
                %subject,
                "constraint violation"
            );
            return CatalogError::IntegrityViolation(subject);
        }
    }

    CatalogError::store(err)
}

fn integrity_subject(constraint: &str) -> IntegritySubject {
    if constraint.contains("isbn") {
        IntegritySubject::Isbn
    } else if constraint.contains("author_id") {
        IntegritySubject::Authors
    } else if constraint.contains("book_id") {
        IntegritySubject::Books
    } else {
        IntegritySubject::Values
    }
}

/// Hide the password part of a connection URL.
fn sanitize_connection_url(url: &str) -> String {
    if let (Some(scheme_end), Some(at_pos)) = (url.find("://"), url.rfind('@')) {
        if at_pos <= scheme_end + 3 {
            return url.to_string();
        }
        let credentials = &url[scheme_end + 3..at_pos];
        if let Some(colon) = credentials.find(':') {
            return format!(
                "{}{}:***{}",
                &url[..scheme_end + 3],
                &credentials[..colon],
                &url[at_pos..]
            );
        }
    }
    url.to_string()
}
