use tempfile::TempDir;

/// A SQLite database file living inside its own temporary directory.
///
/// Keep the value in scope for as long as connections to the database are
/// open; the directory and the file are removed when it is dropped.
pub struct TempDatabase {
    pub dir: TempDir,
    pub url: String,
}

/// Creates a unique temporary directory and returns a `sqlite://` URL for a
/// database file inside it. The file is created on first connect (`mode=rwc`).
///
/// Unlike `sqlite::memory:`, several independent connection pools can open
/// the same URL, which is how separate marking nodes share one store in tests.
pub fn setup_temp_database() -> TempDatabase {
    let dir = TempDir::new().expect("failed to create tempdir");
    let abs = dir
        .path()
        .canonicalize()
        .unwrap_or_else(|_| dir.path().to_path_buf());
    let url = format!("sqlite://{}?mode=rwc", abs.join("marking.db").display());
    TempDatabase { dir, url }
}
