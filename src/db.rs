use anyhow::Context;
use sqlx::MySqlPool;

pub async fn init_db(database_url: &str) -> anyhow::Result<MySqlPool> {
    MySqlPool::connect(database_url)
        .await
        .context("failed to connect to database")
}
