use thiserror::Error;

#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Duplicate logical id: {id}")]
    DuplicateLogicalId { id: String },

    #[error("{from} references undefined {target}")]
    UnresolvedReference { from: String, target: String },

    #[error("Invalid stack properties: {message}")]
    InvalidProps { message: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
