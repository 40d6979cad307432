use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

/// Loads `.env.test`, then creates a fresh, migrated database at `url`. An existing database at `url` is replaced.
pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    recreate_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Could not connect to the test database");
    db.migrate().await.expect("Test database migrations failed");
    db.close().await;
    debug!("🧪️ Test database {url} is ready");
}

/// A fresh database URL in the system temp directory.
pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("canteen_test_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

async fn recreate_database(url: &str) {
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        trace!("🧪️ Dropping stale database {url}");
        if let Err(e) = Sqlite::drop_database(url).await {
            warn!("🧪️ Could not drop {url}. {e}");
        }
    }
    Sqlite::create_database(url).await.expect("Could not create the test database");
}
