use colored::*;
use futures::FutureExt;
use sea_orm_migration::prelude::*;
use std::io::{self, Write};
use std::time::Instant;

use migration::Migrator;

const STATUS_COLUMN: usize = 80;

pub async fn run_all_migrations(url: &str) {
    let db = sea_orm::Database::connect(url)
        .await
        .expect("DB connection failed");

    println!("Running migrations...");

    let pending = Migrator::get_pending_migrations(&db)
        .await
        .expect("Failed to read migration status");

    if pending.is_empty() {
        println!("{}", "Nothing to migrate".dimmed());
        return;
    }

    for migration in pending {
        let name_str = format!("Applying {}", migration.name().bold());
        let dots = ".".repeat(STATUS_COLUMN.saturating_sub(name_str.len()));
        print!("{}{} ", name_str, dots);
        io::stdout().flush().ok();

        let start = Instant::now();
        // Pending migrations are applied in order, so one step applies exactly this one.
        let result = std::panic::AssertUnwindSafe(Migrator::up(&db, Some(1)))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(())) => {
                let time_str = format!("({:.2?})", start.elapsed()).dimmed();
                println!("{} {}", "done".green(), time_str);
            }
            Ok(Err(err)) => {
                println!("{}", "failed".red());
                eprintln!("{err}");
                std::process::exit(1);
            }
            Err(_) => {
                println!("{}", "failed".red());
                std::process::exit(1);
            }
        }
    }
}
