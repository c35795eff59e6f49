// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use shared_database::Database;
use tempfile::TempDir;

/// Build a throwaway database backed by a temp directory.
pub async fn test_db() -> (Database, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");
    let db = Database::init(path.to_str().unwrap()).await.unwrap();
    (db, dir)
}
