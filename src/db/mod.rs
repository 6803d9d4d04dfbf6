mod schema;
pub mod from_row;
pub mod queries;

pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::discord::DiscordClient;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool and configuration
#[derive(Clone)]
pub struct AppState {
    /// License record store
    pub db: DbPool,
    /// Static bearer credential for the administrative surface
    pub admin_token: String,
    /// Prefix for generated license keys (e.g. "DASHY")
    pub key_prefix: String,
    /// Discord role-sync client; None when role sync is not configured
    pub discord: Option<Arc<DiscordClient>>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
