use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Creates a SQLite connection pool with foreign keys enforced.
///
/// In-memory databases are per-connection in SQLite, so they get a single
/// connection that is never recycled.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Connecting to SQLite at {database_url}...");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?
    };

    info!("SQLite connection pool established");
    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT UNIQUE NOT NULL,
        password TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('applicant', 'employer')),
        profile_picture TEXT,
        description TEXT,
        university TEXT,
        year_of_study INTEGER,
        graduated BOOLEAN NOT NULL DEFAULT FALSE,
        major TEXT CHECK (major IN ('BUS', 'CMPT')),
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS interest_categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        major TEXT NOT NULL CHECK (major IN ('BUS', 'CMPT')),
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profile_tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        major TEXT NOT NULL CHECK (major IN ('BUS', 'CMPT')),
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        employer_id INTEGER NOT NULL,
        company_name TEXT NOT NULL,
        job_name TEXT NOT NULL,
        description TEXT NOT NULL,
        company_photo TEXT,
        location TEXT NOT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (employer_id) REFERENCES users (id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_interest_categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE,
        FOREIGN KEY (category_id) REFERENCES interest_categories (id) ON DELETE CASCADE,
        UNIQUE (user_id, category_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_profile_tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        tag_id INTEGER NOT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE,
        FOREIGN KEY (tag_id) REFERENCES profile_tags (id) ON DELETE CASCADE,
        UNIQUE (user_id, tag_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS job_interest_categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        job_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (job_id) REFERENCES jobs (id) ON DELETE CASCADE,
        FOREIGN KEY (category_id) REFERENCES interest_categories (id) ON DELETE CASCADE,
        UNIQUE (job_id, category_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS applicant_swipes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        applicant_id INTEGER NOT NULL,
        job_id INTEGER NOT NULL,
        direction TEXT NOT NULL CHECK (direction IN ('left', 'right')),
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (applicant_id) REFERENCES users (id) ON DELETE CASCADE,
        FOREIGN KEY (job_id) REFERENCES jobs (id) ON DELETE CASCADE,
        UNIQUE (applicant_id, job_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS matches (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        job_id INTEGER NOT NULL,
        applicant_id INTEGER NOT NULL,
        matched_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (job_id) REFERENCES jobs (id) ON DELETE CASCADE,
        FOREIGN KEY (applicant_id) REFERENCES users (id) ON DELETE CASCADE,
        UNIQUE (job_id, applicant_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS conversations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        applicant_id INTEGER NOT NULL,
        job_id INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'matched', 'closed')),
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (applicant_id) REFERENCES users (id) ON DELETE CASCADE,
        FOREIGN KEY (job_id) REFERENCES jobs (id) ON DELETE CASCADE,
        UNIQUE (applicant_id, job_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        conversation_id INTEGER NOT NULL,
        sender_id INTEGER NOT NULL,
        receiver_id INTEGER NOT NULL,
        content TEXT NOT NULL,
        sent_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (conversation_id) REFERENCES conversations (id) ON DELETE CASCADE,
        FOREIGN KEY (sender_id) REFERENCES users (id) ON DELETE CASCADE,
        FOREIGN KEY (receiver_id) REFERENCES users (id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_jobs_employer ON jobs (employer_id)",
    "CREATE INDEX IF NOT EXISTS idx_jobs_created ON jobs (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_swipes_job ON applicant_swipes (job_id)",
];

const SEED_INTEREST_CATEGORIES: &[(&str, &str)] = &[
    ("Accounting", "BUS"),
    ("Finance", "BUS"),
    ("Marketing", "BUS"),
    ("Operations", "BUS"),
    ("Human Resources", "BUS"),
    ("Backend Development", "CMPT"),
    ("Frontend Development", "CMPT"),
    ("Data Science", "CMPT"),
    ("DevOps", "CMPT"),
    ("Security", "CMPT"),
];

const SEED_PROFILE_TAGS: &[(&str, &str)] = &[
    ("Excel", "BUS"),
    ("Public Speaking", "BUS"),
    ("Financial Modeling", "BUS"),
    ("CRM", "BUS"),
    ("Python", "CMPT"),
    ("Rust", "CMPT"),
    ("React", "CMPT"),
    ("SQL", "CMPT"),
    ("AWS", "CMPT"),
];

/// Creates every table if missing, then seeds reference data into empty tables.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    seed_reference_data(pool).await?;
    info!("Database schema ready");
    Ok(())
}

async fn seed_reference_data(pool: &SqlitePool) -> Result<()> {
    let categories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM interest_categories")
        .fetch_one(pool)
        .await?;
    if categories == 0 {
        for (name, major) in SEED_INTEREST_CATEGORIES {
            sqlx::query("INSERT INTO interest_categories (name, major) VALUES (?, ?)")
                .bind(name)
                .bind(major)
                .execute(pool)
                .await?;
        }
        info!("Seeded {} interest categories", SEED_INTEREST_CATEGORIES.len());
    }

    let tags: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profile_tags")
        .fetch_one(pool)
        .await?;
    if tags == 0 {
        for (name, major) in SEED_PROFILE_TAGS {
            sqlx::query("INSERT INTO profile_tags (name, major) VALUES (?, ?)")
                .bind(name)
                .bind(major)
                .execute(pool)
                .await?;
        }
        info!("Seeded {} profile tags", SEED_PROFILE_TAGS.len());
    }

    Ok(())
}

#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
