pub mod due_dates;
pub mod error;
pub mod grade;
pub mod models;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::path::Path;
use std::time::Duration;
use util::config;

/// Turns `DATABASE_PATH` into a connection URL.
///
/// DSNs are used as-is; anything else is treated as a SQLite file path whose
/// parent directory is created on demand.
pub fn database_url(path_or_url: &str) -> String {
    if path_or_url.starts_with("sqlite:")
        || path_or_url.starts_with("postgres://")
        || path_or_url.starts_with("mysql://")
    {
        path_or_url.to_string()
    } else {
        // SQLite won't create intermediate dirs.
        if let Some(parent) = Path::new(path_or_url).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        format!("sqlite://{path_or_url}?mode=rwc")
    }
}

pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    let path_or_url = config::database_path();
    if path_or_url.is_empty() {
        return Err(DbErr::Custom("DATABASE_PATH is required".into()));
    }
    connect_url(&database_url(&path_or_url)).await
}

pub async fn connect_url(url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(url.to_string());
    options
        .max_connections(16)
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
