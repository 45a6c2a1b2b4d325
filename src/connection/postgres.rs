use super::WalControl;
use super::config::DatabaseConfig;
use crate::core::{Result, SweepError};
use async_trait::async_trait;
use tokio_postgres::{Client, NoTls};
use tracing::{Level, event};

pub const SWITCH_WAL_SQL: &str = "SELECT pg_switch_wal()";
pub const CHECKPOINT_SQL: &str = "CHECKPOINT";
pub const CURRENT_SEGMENT_SQL: &str = "SELECT pg_walfile_name(pg_current_wal_lsn())";

/// `WalControl` over a single tokio-postgres connection.
pub struct PostgresControl {
    client: Client,
}

impl PostgresControl {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        config.validate()?;
        let (client, connection) = config
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| SweepError::ConnectionError(format!("{}: {}", config.to_url(), e)))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                event!(Level::ERROR, error = %e, "postgres connection error");
            }
        });

        event!(Level::DEBUG, url = %config.to_url(), "connected");
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WalControl for PostgresControl {
    async fn switch_wal(&self) -> Result<()> {
        self.client.batch_execute(SWITCH_WAL_SQL).await?;
        Ok(())
    }

    async fn checkpoint(&self) -> Result<()> {
        self.client.batch_execute(CHECKPOINT_SQL).await?;
        Ok(())
    }

    async fn current_segment(&self) -> Result<String> {
        let row = self.client.query_one(CURRENT_SEGMENT_SQL, &[]).await?;
        let name: String = row.try_get(0)?;
        Ok(name)
    }
}
