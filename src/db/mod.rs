//! Database layer
//!
//! Database abstraction for the Beyond2C backend:
//! - SQLite (default, single-binary deployment)
//! - MySQL (for larger deployments)
//!
//! The driver is selected from configuration. Repositories are defined as
//! traits with sqlx-backed implementations that dispatch on the driver.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
