//! Embedded schema migrations.
//!
//! Every migration carries SQL for both backends and is recorded in the
//! `_migrations` table once applied, so `run_migrations` is safe to call on
//! every startup.
//!
//! Foreign keys are declared without `ON DELETE` actions: the repositories
//! clear references themselves before deleting a referenced row, so pets,
//! transactions and locations outlive whatever they point at.

use anyhow::{Context, Result};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

#[derive(Debug, Clone)]
pub struct Migration {
    /// Unique, ascending version number
    pub version: i32,
    pub name: &'static str,
    pub up_sqlite: &'static str,
    pub up_mysql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(30) NOT NULL UNIQUE,
                email VARCHAR(254) NOT NULL UNIQUE,
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                bio TEXT NOT NULL DEFAULT '',
                role VARCHAR(10) NOT NULL DEFAULT 'user',
                is_superuser BOOLEAN NOT NULL DEFAULT 0,
                is_staff BOOLEAN NOT NULL DEFAULT 0,
                confirmation_code_hash VARCHAR(255),
                confirmation_code_expires_at TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(30) NOT NULL UNIQUE,
                email VARCHAR(254) NOT NULL UNIQUE,
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                bio TEXT NOT NULL,
                role VARCHAR(10) NOT NULL DEFAULT 'user',
                is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
                is_staff BOOLEAN NOT NULL DEFAULT FALSE,
                confirmation_code_hash VARCHAR(255) NULL,
                confirmation_code_expires_at TIMESTAMP NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_users_email ON users(email);
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id BIGINT NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );
            CREATE INDEX idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_locations",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS countries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(200) NOT NULL,
                slug VARCHAR(300) NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS towns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(200) NOT NULL,
                slug VARCHAR(300) NOT NULL UNIQUE,
                country_id INTEGER,
                FOREIGN KEY (country_id) REFERENCES countries(id)
            );
            CREATE INDEX IF NOT EXISTS idx_towns_country_id ON towns(country_id);
            CREATE TABLE IF NOT EXISTS shelters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(200) NOT NULL,
                slug VARCHAR(300) NOT NULL UNIQUE,
                address VARCHAR(300) NOT NULL DEFAULT '',
                town_id INTEGER,
                FOREIGN KEY (town_id) REFERENCES towns(id)
            );
            CREATE INDEX IF NOT EXISTS idx_shelters_town_id ON shelters(town_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS countries (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(200) NOT NULL,
                slug VARCHAR(300) NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS towns (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(200) NOT NULL,
                slug VARCHAR(300) NOT NULL UNIQUE,
                country_id BIGINT NULL,
                FOREIGN KEY (country_id) REFERENCES countries(id)
            );
            CREATE TABLE IF NOT EXISTS shelters (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(200) NOT NULL,
                slug VARCHAR(300) NOT NULL UNIQUE,
                address VARCHAR(300) NOT NULL DEFAULT '',
                town_id BIGINT NULL,
                FOREIGN KEY (town_id) REFERENCES towns(id)
            );
        "#,
    },
    Migration {
        version: 4,
        name: "create_pets",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS pets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                family VARCHAR(20) NOT NULL,
                name VARCHAR(200) NOT NULL,
                birthday TIMESTAMP NOT NULL,
                pub_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                gender VARCHAR(10) NOT NULL DEFAULT 'male',
                breed VARCHAR(100) NOT NULL DEFAULT 'no breed',
                shelter_id INTEGER,
                taken_home BOOLEAN NOT NULL DEFAULT 0,
                in_favorites INTEGER,
                take_a_walk INTEGER,
                take_a_home INTEGER,
                visit_counter INTEGER,
                FOREIGN KEY (shelter_id) REFERENCES shelters(id)
            );
            CREATE INDEX IF NOT EXISTS idx_pets_shelter_id ON pets(shelter_id);
            CREATE INDEX IF NOT EXISTS idx_pets_in_favorites ON pets(in_favorites);
            CREATE INDEX IF NOT EXISTS idx_pets_birthday ON pets(birthday);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS pets (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                family VARCHAR(20) NOT NULL,
                name VARCHAR(200) NOT NULL,
                birthday TIMESTAMP NOT NULL,
                pub_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                gender VARCHAR(10) NOT NULL DEFAULT 'male',
                breed VARCHAR(100) NOT NULL DEFAULT 'no breed',
                shelter_id BIGINT NULL,
                taken_home BOOLEAN NOT NULL DEFAULT FALSE,
                in_favorites BIGINT NULL,
                take_a_walk BIGINT NULL,
                take_a_home BIGINT NULL,
                visit_counter BIGINT NULL,
                FOREIGN KEY (shelter_id) REFERENCES shelters(id)
            );
            CREATE INDEX idx_pets_in_favorites ON pets(in_favorites);
            CREATE INDEX idx_pets_birthday ON pets(birthday);
        "#,
    },
    Migration {
        version: 5,
        name: "create_care_services",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS care_services (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(200) NOT NULL,
                slug VARCHAR(300) NOT NULL UNIQUE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS care_services (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(200) NOT NULL,
                slug VARCHAR(300) NOT NULL UNIQUE
            );
        "#,
    },
    Migration {
        version: 6,
        name: "create_transactions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER,
                pet_id INTEGER,
                service_id INTEGER,
                donation REAL NOT NULL,
                currency VARCHAR(3) NOT NULL DEFAULT 'rub',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (pet_id) REFERENCES pets(id),
                FOREIGN KEY (service_id) REFERENCES care_services(id)
            );
            CREATE INDEX IF NOT EXISTS idx_transactions_donation ON transactions(donation);
            CREATE INDEX IF NOT EXISTS idx_transactions_pet_id ON transactions(pet_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                user_id BIGINT NULL,
                pet_id BIGINT NULL,
                service_id BIGINT NULL,
                donation DOUBLE NOT NULL,
                currency VARCHAR(3) NOT NULL DEFAULT 'rub',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (pet_id) REFERENCES pets(id),
                FOREIGN KEY (service_id) REFERENCES care_services(id)
            );
            CREATE INDEX idx_transactions_donation ON transactions(donation);
        "#,
    },
];

/// Apply every migration not yet recorded in `_migrations`.
///
/// Returns the number of migrations applied by this call.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = applied_versions(pool).await?;
    let mut count = 0;

    for migration in MIGRATIONS.iter().filter(|m| !applied.contains(&m.version)) {
        tracing::info!("Applying migration {}: {}", migration.version, migration.name);
        apply_migration(pool, migration)
            .await
            .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("Schema is up to date");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn applied_versions(pool: &DynDatabasePool) -> Result<Vec<i32>> {
    let sql = "SELECT version FROM _migrations ORDER BY version";
    let versions = match pool.driver() {
        DatabaseDriver::Sqlite => sqlx::query(sql)
            .fetch_all(pool.sqlite()?)
            .await
            .context("Failed to read applied migrations")?
            .iter()
            .map(|row| row.get::<i64, _>("version") as i32)
            .collect(),
        DatabaseDriver::Mysql => sqlx::query(sql)
            .fetch_all(pool.mysql()?)
            .await
            .context("Failed to read applied migrations")?
            .iter()
            .map(|row| row.get::<i32, _>("version"))
            .collect(),
    };
    Ok(versions)
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => apply_migration_sqlite(pool.sqlite()?, migration).await,
        DatabaseDriver::Mysql => apply_migration_mysql(pool.mysql()?, migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await?;
    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }
    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

// MySQL commits DDL implicitly, so statements run one by one on the pool.
async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }
    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;
    Ok(())
}

fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split a migration body on `;`, dropping empty and comment-only fragments.
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;
    let applied = applied_versions(pool).await?;
    Ok(MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .count())
}

pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

pub fn get_migration(version: i32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    async fn table_exists(pool: &SqlitePool, name: &str) -> bool {
        sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await
            .unwrap()
            .is_some()
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = create_test_pool().await.unwrap();

        let first = run_migrations(&pool).await.unwrap();
        let second = run_migrations(&pool).await.unwrap();

        assert_eq!(first, MIGRATIONS.len());
        assert_eq!(second, 0);
        assert!(is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pending_count_before_migrating() {
        let pool = create_test_pool().await.unwrap();
        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len());
        assert!(!is_up_to_date(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_all_tables_created() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();

        for table in [
            "users",
            "sessions",
            "countries",
            "towns",
            "shelters",
            "pets",
            "care_services",
            "transactions",
        ] {
            assert!(table_exists(sqlite, table).await, "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_pet_defaults() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO pets (family, name, birthday) VALUES ('cat', 'Tom', CURRENT_TIMESTAMP)")
            .execute(sqlite)
            .await
            .unwrap();

        let row = sqlx::query(
            "SELECT gender, breed, taken_home, in_favorites FROM pets WHERE name = 'Tom'",
        )
        .fetch_one(sqlite)
        .await
        .unwrap();

        assert_eq!(row.get::<String, _>("gender"), "male");
        assert_eq!(row.get::<String, _>("breed"), "no breed");
        assert!(!row.get::<bool, _>("taken_home"));
        assert_eq!(row.get::<Option<i64>, _>("in_favorites"), None);
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();

        let result = sqlx::query("INSERT INTO towns (name, slug, country_id) VALUES ('Kazan', 'kazan', 999)")
            .execute(sqlite)
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_slug_uniqueness() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO countries (name, slug) VALUES ('Russia', 'russia')")
            .execute(sqlite)
            .await
            .unwrap();
        let duplicate = sqlx::query("INSERT INTO countries (name, slug) VALUES ('Russia 2', 'russia')")
            .execute(sqlite)
            .await;

        assert!(duplicate.is_err());
    }

    #[test]
    fn test_migration_versions_ascend() {
        let versions: Vec<i32> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(versions, sorted);
        assert_eq!(get_migration(4).map(|m| m.name), Some("create_pets"));
        assert!(get_migration(99).is_none());
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT);\n-- just a note\n;\nCREATE TABLE b (id INT);  ";
        assert_eq!(
            split_sql_statements(sql),
            vec!["CREATE TABLE a (id INT)", "CREATE TABLE b (id INT)"]
        );
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- one\n  -- two"));
        assert!(!is_comment_only("-- one\nSELECT 1"));
    }
}
