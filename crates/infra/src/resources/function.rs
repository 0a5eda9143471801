use std::collections::BTreeMap;

use serde::Serialize;

use super::Construct;
use crate::{template::Resource, Expr, InfraError};

pub const RUNTIME: &str = "provided.al2023";
pub const HANDLER: &str = "bootstrap";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Arm64,
    #[serde(rename = "x86_64")]
    X86_64,
}

/// A Lambda function deployed as a custom-runtime `bootstrap` binary from an
/// S3 artifact.
#[derive(Clone, Debug)]
pub struct Function {
    pub logical_id: String,
    pub role_arn: Expr,
    pub code_bucket: Expr,
    pub code_key: Expr,
    pub architecture: Architecture,
    pub memory_mb: u32,
    pub timeout_secs: u32,
    pub environment: BTreeMap<String, Expr>,
    /// Resources that must exist before the function, e.g. the role's policy.
    pub depends_on: Vec<String>,
}

impl Function {
    pub fn name(&self) -> Expr {
        Expr::reference(&self.logical_id)
    }

    pub fn arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Code {
    s3_bucket: Expr,
    s3_key: Expr,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Environment {
    variables: BTreeMap<String, Expr>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct FunctionProperties {
    runtime: &'static str,
    handler: &'static str,
    architectures: Vec<Architecture>,
    code: Code,
    role: Expr,
    memory_size: u32,
    timeout: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment: Option<Environment>,
}

impl Construct for Function {
    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn resource(&self) -> Result<Resource, InfraError> {
        let properties = FunctionProperties {
            runtime: RUNTIME,
            handler: HANDLER,
            architectures: vec![self.architecture],
            code: Code {
                s3_bucket: self.code_bucket.clone(),
                s3_key: self.code_key.clone(),
            },
            role: self.role_arn.clone(),
            memory_size: self.memory_mb,
            timeout: self.timeout_secs,
            environment: (!self.environment.is_empty()).then(|| Environment {
                variables: self.environment.clone(),
            }),
        };

        let resource = Resource::new("AWS::Lambda::Function", &properties)?;
        Ok(self
            .depends_on
            .iter()
            .fold(resource, |resource, id| resource.depends_on(id.clone())))
    }
}
