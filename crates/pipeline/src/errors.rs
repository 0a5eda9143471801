use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Record {index} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        index: usize,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Failed to write {key}")]
    Write {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Missing configuration: {name}")]
    MissingConfig { name: String },
}
