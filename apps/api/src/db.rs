use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the candidates table if it does not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS candidates (
            id               UUID PRIMARY KEY,
            first_name       TEXT NOT NULL DEFAULT '',
            last_name        TEXT NOT NULL DEFAULT '',
            email            TEXT,
            phone            TEXT,
            linkedin_url     TEXT,
            resume_url       TEXT,
            skills           TEXT[] NOT NULL DEFAULT '{}',
            rating           SMALLINT CHECK (rating BETWEEN 1 AND 5),
            status           TEXT NOT NULL DEFAULT 'sourced'
                CHECK (status IN ('sourced', 'contacted', 'interview', 'offer', 'hired', 'rejected')),
            notes            TEXT,
            "current_role"   TEXT,
            education        TEXT,
            location         TEXT,
            experience_years DOUBLE PRECISION,
            created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS candidates_created_at_idx ON candidates (created_at DESC)",
    )
    .execute(pool)
    .await?;

    info!("Database schema ready");
    Ok(())
}
