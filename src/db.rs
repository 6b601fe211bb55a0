use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use tracing::info;

use crate::error::AppError;

// Open (creating if needed) the SQLite database and make sure both tables exist
pub async fn connect(url: &str, max_connections: u32) -> Result<Pool<Sqlite>, AppError> {
    if !Sqlite::database_exists(url).await.unwrap_or(false) {
        info!("Creating database {}", url);
        Sqlite::create_database(url).await?;
    } else {
        info!("Database already exists");
    }

    // Every connection to an in-memory database sees its own copy, so keep exactly one alive
    let pool = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(url)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?
    };

    create_tables(&pool).await?;
    Ok(pool)
}

async fn create_tables(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL,
        deadline TEXT NOT NULL,
        reminder TEXT NOT NULL,
        user_id TEXT
    );"#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS tasks_user_id ON tasks (user_id);")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS preferences (
        key TEXT PRIMARY KEY NOT NULL,
        value BOOLEAN NOT NULL
    );"#,
    )
    .execute(pool)
    .await?;

    info!("Task and preference tables ready");
    Ok(())
}

#[cfg(test)]
pub async fn memory_pool() -> Pool<Sqlite> {
    connect("sqlite::memory:", 1)
        .await
        .expect("in-memory database")
}
