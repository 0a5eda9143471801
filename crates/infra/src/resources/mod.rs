use crate::{template::Resource, InfraError};

/// Object bucket
pub mod bucket;

/// Ingestion stream
pub mod stream;

/// Execution roles and policies
pub mod iam;

/// Lambda functions
pub mod function;

/// Stream to function binding
pub mod event_source;

/// Bucket emptying on teardown
pub mod custom;

pub use bucket::Bucket;
pub use custom::AutoDeleteObjects;
pub use event_source::{EventBinding, RetryPolicy, StartingPosition};
pub use function::{Architecture, Function};
pub use iam::{ExecutionRole, RolePolicy};
pub use stream::{Stream, StreamMode};

/// A declared resource that can be placed in a template under its logical id.
pub trait Construct {
    fn logical_id(&self) -> &str;

    fn resource(&self) -> Result<Resource, InfraError>;
}
