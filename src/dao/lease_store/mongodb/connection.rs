use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::{debug, info};

use super::error::{MongoDaoError, MongoResult};

const ATTEMPTS: u32 = 10;

/// Delays between connection attempts: 250 ms doubling up to 5 s.
fn backoff() -> impl Iterator<Item = Duration> {
    std::iter::successors(Some(Duration::from_millis(250)), |delay| {
        Some((*delay * 2).min(Duration::from_secs(5)))
    })
}

/// Open `database_name` and wait until the server answers a ping.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<Database> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut delays = backoff();
    let mut attempt = 0;
    loop {
        attempt += 1;
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                info!(database = database_name, attempt, "connected to MongoDB");
                return Ok(database);
            }
            Err(source) if attempt >= ATTEMPTS => {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                let delay = delays.next().unwrap_or(Duration::from_secs(5));
                debug!(attempt, ?delay, error = %err, "MongoDB not reachable yet");
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let delays: Vec<_> = backoff().take(7).collect();
        assert_eq!(delays[0], Duration::from_millis(250));
        assert_eq!(delays[1], Duration::from_millis(500));
        assert_eq!(delays[4], Duration::from_secs(4));
        assert_eq!(delays[5], Duration::from_secs(5));
        assert_eq!(delays[6], Duration::from_secs(5));
    }
}
