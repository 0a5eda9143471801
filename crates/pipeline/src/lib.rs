//! Clickstream ingestion: turns Kinesis batches into date-partitioned log objects

/// Wall-clock seam
pub mod clock;

/// Environment configuration
pub mod config;

/// Pipeline errors
pub mod errors;

/// Log object store
pub mod store;

/// Log keys and batch assembly
pub mod traffic;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use errors::Error;
pub use store::{LogStore, S3LogStore};
pub use traffic::{assemble_body, LogKey};
