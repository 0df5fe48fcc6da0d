//! # tally-client
//!
//! Rust client for the Tally wager collection protocol.
//!
//! The crate reads a flat delimited record file in bounded batches and
//! uploads each batch to the collection service over a length-prefixed,
//! acknowledgement-gated TCP protocol, then polls the service until it
//! announces the winning records.
//!
//! ## Architecture
//!
//! - **Batch layer** ([`batch`]): resumable chunked parsing of the record
//!   source; no record line is ever split across two uploads
//! - **Wire layer** ([`protocol`], [`transport`]): 4-byte little-endian
//!   length prefixes with a 3-byte acknowledgement handshake per frame
//! - **Workflow** ([`Client`]): connect, stream batches, close, poll for
//!   the announcement
//!
//! ## Example
//!
//! ```ignore
//! use tally_client::{Client, ClientConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::load("client.toml")?;
//!     config.validate()?;
//!
//!     let source = tokio::fs::File::open(config.dataset_path()).await?;
//!     let mut client = Client::new(config, CancellationToken::new());
//!     let announcement = client.run(source).await?;
//!
//!     println!("{} winners", announcement.winners.len());
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod protocol;
pub mod record;
pub mod shutdown;
pub mod transport;

mod client;

pub use batch::{Batch, BatchReader};
pub use client::{Announcement, Client, Phase};
pub use config::ClientConfig;
pub use error::TallyError;
pub use record::Record;
