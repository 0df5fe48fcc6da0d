//! Upload workflow orchestration.
//!
//! The [`Client`] drives the full exchange with the collection service:
//! 1. Connect
//! 2. Stream record batches until the source is exhausted
//! 3. Close the upload connection with the shutdown notice
//! 4. Poll for the winners announcement on a fresh connection per attempt
//!
//! ```text
//! Idle -> Connected -> Streaming -> Completed -> Polling -> Announced
//!              |           |                        |
//!              +-----------+------------------------+-----> Failed
//! ```
//!
//! A cancelled shutdown token interrupts the workflow at the next loop
//! boundary; the connection is closed cooperatively and the run surfaces
//! [`TallyError::Interrupted`].
//!
//! # Example
//!
//! ```ignore
//! use tally_client::{Client, ClientConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::load("client.toml")?;
//!     let source = tokio::fs::File::open(config.dataset_path()).await?;
//!
//!     let mut client = Client::new(config, CancellationToken::new());
//!     let announcement = client.run(source).await?;
//!     println!("{} winners", announcement.winners.len());
//!     Ok(())
//! }
//! ```

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::batch::BatchReader;
use crate::config::ClientConfig;
use crate::error::{Result, TallyError};
use crate::protocol::{winners_query, WinnersReply};
use crate::transport::Connection;

/// Workflow phases, in progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connected,
    Streaming,
    Completed,
    Polling,
    Announced,
    Failed,
}

/// The winners announcement that ends a successful workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// Winning document ids for this client, in announcement order.
    pub winners: Vec<String>,
}

/// Drives the upload-then-poll workflow against the collection service.
pub struct Client {
    config: ClientConfig,
    shutdown: CancellationToken,
    phase: Phase,
}

impl Client {
    pub fn new(config: ClientConfig, shutdown: CancellationToken) -> Self {
        Self {
            config,
            shutdown,
            phase: Phase::Idle,
        }
    }

    /// The phase the workflow last entered.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run the full workflow over `source`.
    ///
    /// Validates the configuration, uploads every batch the source
    /// yields, closes the upload connection, then polls until the
    /// service announces the winners. Configuration and transport
    /// errors end the run in [`Phase::Failed`]; a shutdown request
    /// surfaces as [`TallyError::Interrupted`] without marking the run
    /// failed.
    pub async fn run<R: AsyncRead + Unpin>(&mut self, source: R) -> Result<Announcement> {
        match self.drive(source).await {
            Ok(announcement) => Ok(announcement),
            Err(TallyError::Interrupted) => Err(TallyError::Interrupted),
            Err(e) => {
                self.enter(Phase::Failed);
                Err(e)
            }
        }
    }

    async fn drive<R: AsyncRead + Unpin>(&mut self, source: R) -> Result<Announcement> {
        self.config.validate()?;
        self.upload(source).await?;
        self.poll().await
    }

    /// Stream every batch from `source` over one connection, then send
    /// the shutdown notice.
    async fn upload<R: AsyncRead + Unpin>(&mut self, source: R) -> Result<()> {
        let mut conn = Connection::connect(&self.config.server_addr).await?;
        self.enter(Phase::Connected);

        let mut reader =
            BatchReader::new(source, self.config.read_budget(), &self.config.client_id);
        self.enter(Phase::Streaming);

        let mut batches = 0u64;
        let mut records = 0u64;
        loop {
            if self.shutdown.is_cancelled() {
                conn.close().await;
                return Err(TallyError::Interrupted);
            }

            let batch = match reader.next_batch().await {
                Ok(Some(batch)) => batch,
                Ok(None) => break,
                Err(e) => {
                    conn.close().await;
                    return Err(e);
                }
            };

            let payload = batch.encode();
            if payload.is_empty() {
                tracing::debug!(attempted = batch.len(), "batch produced no payload, skipping");
                continue;
            }

            conn.send(&payload, self.config.batch_ack).await?;
            batches += 1;
            records += batch.parsed() as u64;
            tracing::info!(
                client_id = %self.config.client_id,
                batch = batches,
                records = batch.parsed(),
                attempted = batch.len(),
                bytes = payload.len(),
                "batch uploaded"
            );
        }

        self.enter(Phase::Completed);
        tracing::info!(
            client_id = %self.config.client_id,
            batches,
            records,
            "upload complete"
        );

        conn.close().await;
        Ok(())
    }

    /// Query the service for the winners until it answers, one fresh
    /// connection per attempt.
    async fn poll(&mut self) -> Result<Announcement> {
        self.enter(Phase::Polling);
        let query = winners_query(&self.config.client_id);
        let mut attempt = 0u64;

        loop {
            if self.shutdown.is_cancelled() {
                return Err(TallyError::Interrupted);
            }
            attempt += 1;

            let mut conn = Connection::connect(&self.config.server_addr).await?;
            conn.send(&query, false).await?;
            let reply = conn.receive().await?;

            match WinnersReply::decode(&reply) {
                WinnersReply::Waiting => {
                    tracing::debug!(attempt, "winners not announced yet, retrying");
                    conn.close().await;
                    tokio::select! {
                        _ = self.shutdown.cancelled() => return Err(TallyError::Interrupted),
                        _ = tokio::time::sleep(self.config.poll_interval()) => {}
                    }
                }
                WinnersReply::Announced(winners) => {
                    conn.close().await;
                    self.enter(Phase::Announced);
                    tracing::info!(
                        client_id = %self.config.client_id,
                        winners = winners.len(),
                        attempts = attempt,
                        "winners announced"
                    );
                    return Ok(Announcement { winners });
                }
            }
        }
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "phase transition");
        self.phase = phase;
    }
}
