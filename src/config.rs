//! Client configuration loaded from a TOML file.
//!
//! Every field has a default so a minimal file (or none of the optional
//! keys) still yields a runnable configuration; the binary layers its
//! command-line overrides on top before calling
//! [`validate`](ClientConfig::validate).

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, TallyError};

/// Bytes reserved out of `max_batch_bytes` for framing overhead when
/// sizing source reads.
pub const BATCH_OVERHEAD_BYTES: usize = 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Identifier this client reports to the collection service.
    #[serde(default)]
    pub client_id: String,
    /// Address of the collection service.
    #[serde(default = "default_server_addr")]
    pub server_addr: String,
    /// Directory holding the per-client record files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Upper bound on the bytes of one upload message.
    #[serde(default = "default_max_batch_bytes")]
    pub max_batch_bytes: usize,
    /// Pause between announcement polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Whether batch uploads wait for the payload acknowledgement.
    #[serde(default = "default_batch_ack")]
    pub batch_ack: bool,
}

fn default_server_addr() -> String {
    "127.0.0.1:12345".to_string()
}
fn default_data_dir() -> String {
    "/dataset".to_string()
}
fn default_max_batch_bytes() -> usize {
    8192
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_batch_ack() -> bool {
    true
}

impl ClientConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TallyError::Config(format!("read '{path}': {e}")))?;
        toml::from_str(&content).map_err(|e| TallyError::Config(format!("parse '{path}': {e}")))
    }

    /// Reject configurations the workflow cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(TallyError::Config("client_id must not be empty".into()));
        }
        if self.max_batch_bytes <= BATCH_OVERHEAD_BYTES {
            return Err(TallyError::Config(format!(
                "max_batch_bytes must exceed the {BATCH_OVERHEAD_BYTES} byte overhead"
            )));
        }
        Ok(())
    }

    /// Byte budget for one source read: the batch bound minus framing
    /// overhead, never less than one byte.
    pub fn read_budget(&self) -> usize {
        self.max_batch_bytes.saturating_sub(BATCH_OVERHEAD_BYTES).max(1)
    }

    /// Path of this client's record file: `<data_dir>/agency-<id>.csv`.
    pub fn dataset_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(format!("agency-{}.csv", self.client_id))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
