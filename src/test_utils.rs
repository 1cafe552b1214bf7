use std::sync::Arc;

use sea_orm::ConnectOptions;

use crate::database::Database;

pub async fn test_db() -> Arc<Database> {
    // A single pooled connection keeps every query on the same in-memory database
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let database = Database::connect(opt).await.unwrap();

    Arc::new(database)
}
