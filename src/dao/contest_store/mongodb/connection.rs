use std::time::Duration;

use mongodb::{Client, Database, bson::doc, error::Error as MongoError};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

/// Delays between initial ping attempts.
///
/// Kept short: the storage supervisor owns long-running reconnection.
#[derive(Debug, Clone, Copy)]
struct PingBackoff {
    remaining: u32,
    delay: Duration,
    max_delay: Duration,
}

impl Default for PingBackoff {
    fn default() -> Self {
        Self {
            remaining: 3,
            delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl Iterator for PingBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.delay;
        self.delay = (self.delay * 2).min(self.max_delay);
        Some(current)
    }
}

/// Round-trip a `ping` command.
pub async fn ping(database: &Database) -> Result<(), MongoError> {
    database.run_command(doc! { "ping": 1 }).await.map(|_| ())
}

/// Build a client for `config` and wait until the database answers a ping.
pub async fn open(config: &MongoConfig) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut backoff = PingBackoff::default();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let err = match ping(&database).await {
            Ok(()) => {
                debug!(database = %config.database_name, attempts, "MongoDB answered ping");
                return Ok((client, database));
            }
            Err(err) => err,
        };

        let Some(delay) = backoff.next() else {
            return Err(MongoDaoError::InitialPing {
                attempts,
                source: err,
            });
        };
        warn!(
            attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "MongoDB ping failed, retrying"
        );
        sleep(delay).await;
    }
}
