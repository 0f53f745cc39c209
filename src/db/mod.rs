//! Database layer
//!
//! SQLite is the default backend; MySQL is selected through
//! `database.driver`. Both sit behind the [`DatabasePool`] trait so
//! repositories can dispatch on the configured driver.
//!
//! ```ignore
//! use petshelter::config::DatabaseConfig;
//! use petshelter::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
