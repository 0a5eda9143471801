/// Destination keys
pub mod key;

/// Batch body assembly
pub mod batch;

pub use batch::assemble_body;
pub use key::{normalize_prefix, LogKey, DEFAULT_PREFIX, LOG_FILE_NAME};
