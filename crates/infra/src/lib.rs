//! Provisioning for the clickstream pipeline, rendered as a CloudFormation template

/// Infrastructure errors
pub mod errors;

/// Resource declarations
pub mod resources;

/// Stack wiring
pub mod stack;

/// Template model and rendering
pub mod template;

pub use errors::InfraError;
pub use stack::{ClickstreamStack, StackProps};
pub use template::{Expr, Template};
