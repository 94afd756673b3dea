// src/utils/db_connect.rs

use anyhow::{bail, Context, Result};
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use log::{info, warn};
use std::time::Duration;
use tokio_postgres::{Config, NoTls};

use crate::utils::config::{AppConfig, DbSettings};

pub type PgPool = Pool<PostgresConnectionManager<NoTls>>;

fn pg_config(db: &DbSettings) -> Config {
    let mut config = Config::new();
    config
        .host(&db.host)
        .port(db.port)
        .dbname(&db.dbname)
        .user(&db.user)
        .password(&db.password)
        .application_name("geo_resolver")
        .connect_timeout(Duration::from_secs(10));
    config
}

/// One pool build plus a `SELECT 1` round trip.
async fn open_pool(app: &AppConfig) -> Result<PgPool> {
    let manager = PostgresConnectionManager::new(pg_config(&app.db), NoTls);
    let pool = Pool::builder()
        .max_size(app.pool_size)
        .min_idle(Some(1))
        .connection_timeout(Duration::from_secs(15))
        .build(manager)
        .await
        .context("Failed to build database connection pool")?;

    pool.get()
        .await
        .context("Failed to get test connection from pool")?
        .query_one("SELECT 1", &[])
        .await
        .context("Test query 'SELECT 1' failed")?;
    Ok(pool)
}

/// Connects to the configured database, retrying with `app.retry` and failing
/// once the attempts run out.
pub async fn connect_with_retry(app: &AppConfig) -> Result<PgPool> {
    let policy = &app.retry;
    let attempts = policy.attempts.max(1);
    info!(
        "Connecting to PostgreSQL {}:{}/{} (pool size {})",
        app.db.host, app.db.port, app.db.dbname, app.pool_size
    );
    for attempt in 1..=attempts {
        match open_pool(app).await {
            Ok(pool) => {
                info!("Database pool ready after {} attempt(s)", attempt);
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                warn!(
                    "Database not reachable (attempt {}/{}): {:#}. Retrying in {:?}...",
                    attempt, attempts, e, policy.backoff
                );
                tokio::time::sleep(policy.backoff).await;
            }
            Err(e) => {
                return Err(e).context(format!(
                    "Giving up on the database after {} attempts",
                    attempts
                ));
            }
        }
    }
    bail!("Connection retry policy allowed no attempts")
}

/// (total connections, idle connections, connections in use)
pub fn get_pool_status(pool: &PgPool) -> (u32, u32, u32) {
    let state = pool.state();
    (
        state.connections,
        state.idle_connections,
        state.connections.saturating_sub(state.idle_connections),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_postgres::config::Host;

    #[test]
    fn test_pg_config_follows_settings() {
        let db = DbSettings {
            host: "db.internal".to_string(),
            port: 6543,
            dbname: "geo_test".to_string(),
            user: "resolver".to_string(),
            password: "secret".to_string(),
        };
        let config = pg_config(&db);
        assert_eq!(config.get_hosts(), &[Host::Tcp("db.internal".to_string())]);
        assert_eq!(config.get_ports(), &[6543]);
        assert_eq!(config.get_dbname(), Some("geo_test"));
        assert_eq!(config.get_user(), Some("resolver"));
        assert_eq!(config.get_password(), Some(&b"secret"[..]));
    }
}
