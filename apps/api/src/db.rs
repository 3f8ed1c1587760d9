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

/// Idempotent schema bootstrap, run once at startup. Every statement is
/// `IF NOT EXISTS`, so restarting against an initialized database is a
/// no-op.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema initialized");
    Ok(())
}

// `post_id` in posts is intentionally NOT unique: exports overlap between
// uploads, and missing identifiers fall back to millisecond timestamps
// that can collide within a burst. `created_at` carries window membership
// on every imported table.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        user_id         BIGSERIAL PRIMARY KEY,
        username        TEXT NOT NULL UNIQUE,
        email           TEXT NOT NULL UNIQUE,
        password_hash   TEXT NOT NULL,
        selected_model  TEXT NOT NULL DEFAULT 'deepseek',
        created_at      TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS account_overview (
        overview_id     BIGSERIAL PRIMARY KEY,
        user_id         BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
        date            TIMESTAMPTZ NOT NULL,
        impressions     BIGINT,
        likes           BIGINT,
        interactions    BIGINT,
        saves           BIGINT,
        shares          BIGINT,
        new_followers   BIGINT,
        unfollows       BIGINT,
        replies         BIGINT,
        reposts         BIGINT,
        profile_visits  BIGINT,
        posts_created   BIGINT,
        video_plays     BIGINT,
        media_views     BIGINT,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        row_id            BIGSERIAL PRIMARY KEY,
        post_id           BIGINT NOT NULL,
        user_id           BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
        published_at      TIMESTAMPTZ,
        text              TEXT,
        url               TEXT,
        impressions       BIGINT,
        likes             BIGINT,
        interactions      BIGINT,
        saves             BIGINT,
        shares            BIGINT,
        new_followers     BIGINT,
        replies           BIGINT,
        reposts           BIGINT,
        profile_visits    BIGINT,
        detail_expands    BIGINT,
        url_clicks        BIGINT,
        hashtag_clicks    BIGINT,
        permalink_clicks  BIGINT,
        created_at        TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS csv_uploads (
        upload_id      BIGSERIAL PRIMARY KEY,
        user_id        BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
        kind           TEXT NOT NULL,
        file_name      TEXT NOT NULL,
        rows_imported  BIGINT NOT NULL DEFAULT 0,
        uploaded_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ai_analyses (
        analysis_id     BIGSERIAL PRIMARY KEY,
        user_id         BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
        model           TEXT NOT NULL,
        recommendations TEXT NOT NULL,
        virality_score  INTEGER,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_overview_user_created
        ON account_overview (user_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_posts_user_created
        ON posts (user_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_analyses_user_created
        ON ai_analyses (user_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_uploads_user_uploaded
        ON csv_uploads (user_id, uploaded_at)",
];
