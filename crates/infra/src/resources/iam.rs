use serde::Serialize;

use super::{Bucket, Construct};
use crate::{template::Resource, Expr, InfraError};

pub const POLICY_VERSION: &str = "2012-10-17";
pub const LAMBDA_SERVICE: &str = "lambda.amazonaws.com";
pub const BASIC_EXECUTION_POLICY: &str = "service-role/AWSLambdaBasicExecutionRole";
pub const KINESIS_READ_ONLY_POLICY: &str = "AmazonKinesisReadOnlyAccess";

/// Object write actions. No delete or list actions.
pub const BUCKET_WRITE_ACTIONS: [&str; 6] = [
    "s3:PutObject",
    "s3:PutObjectLegalHold",
    "s3:PutObjectRetention",
    "s3:PutObjectTagging",
    "s3:PutObjectVersionTagging",
    "s3:Abort*",
];

/// Bucket-level actions the auto-delete provider needs to find objects.
pub const BUCKET_PURGE_ACTIONS: [&str; 2] = ["s3:GetBucketTagging", "s3:ListBucket"];

pub const OBJECT_PURGE_ACTIONS: [&str; 1] = ["s3:DeleteObject"];

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    pub service: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub effect: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub action: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<Expr>,
}

impl Statement {
    pub fn allow(actions: &[&str], resources: Vec<Expr>) -> Self {
        Statement {
            effect: "Allow",
            principal: None,
            action: actions.iter().map(|a| a.to_string()).collect(),
            resource: resources,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: &'static str,
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    pub fn new(statement: Vec<Statement>) -> Self {
        PolicyDocument {
            version: POLICY_VERSION,
            statement,
        }
    }
}

/// Identity assumed by a Lambda function of the stack.
#[derive(Clone, Debug)]
pub struct ExecutionRole {
    pub logical_id: String,
    pub service: String,
    pub managed_policies: Vec<String>,
}

impl ExecutionRole {
    /// Lambda role with logging only.
    pub fn basic(logical_id: &str) -> Self {
        ExecutionRole {
            logical_id: logical_id.to_string(),
            service: LAMBDA_SERVICE.to_string(),
            managed_policies: vec![BASIC_EXECUTION_POLICY.to_string()],
        }
    }

    /// Lambda role with logging and read-only stream access.
    pub fn for_stream_consumer(logical_id: &str) -> Self {
        let mut role = Self::basic(logical_id);
        role.managed_policies.push(KINESIS_READ_ONLY_POLICY.to_string());
        role
    }

    pub fn name(&self) -> Expr {
        Expr::reference(&self.logical_id)
    }

    pub fn arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RoleProperties {
    assume_role_policy_document: PolicyDocument,
    managed_policy_arns: Vec<Expr>,
}

impl Construct for ExecutionRole {
    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn resource(&self) -> Result<Resource, InfraError> {
        let trust = Statement {
            effect: "Allow",
            principal: Some(Principal {
                service: self.service.clone(),
            }),
            action: vec!["sts:AssumeRole".to_string()],
            resource: Vec::new(),
        };

        let properties = RoleProperties {
            assume_role_policy_document: PolicyDocument::new(vec![trust]),
            managed_policy_arns: self
                .managed_policies
                .iter()
                .map(|name| Expr::sub(format!("arn:${{AWS::Partition}}:iam::aws:policy/{}", name)))
                .collect(),
        };

        Resource::new("AWS::IAM::Role", &properties)
    }
}

/// Inline policy attached to one role.
#[derive(Clone, Debug)]
pub struct RolePolicy {
    pub logical_id: String,
    pub role: Expr,
    pub statements: Vec<Statement>,
}

impl RolePolicy {
    /// Object writes into `bucket`.
    pub fn bucket_write(logical_id: &str, role: &ExecutionRole, bucket: &Bucket) -> Self {
        RolePolicy {
            logical_id: logical_id.to_string(),
            role: role.name(),
            statements: vec![Statement::allow(
                &BUCKET_WRITE_ACTIONS,
                vec![bucket.arn(), bucket.objects_arn()],
            )],
        }
    }

    /// Tag lookup, listing and object deletion in `bucket`, for the provider
    /// that empties it.
    pub fn bucket_purge(logical_id: &str, role: &ExecutionRole, bucket: &Bucket) -> Self {
        RolePolicy {
            logical_id: logical_id.to_string(),
            role: role.name(),
            statements: vec![
                Statement::allow(&BUCKET_PURGE_ACTIONS, vec![bucket.arn()]),
                Statement::allow(&OBJECT_PURGE_ACTIONS, vec![bucket.objects_arn()]),
            ],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PolicyProperties {
    policy_name: String,
    policy_document: PolicyDocument,
    roles: Vec<Expr>,
}

impl Construct for RolePolicy {
    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn resource(&self) -> Result<Resource, InfraError> {
        let properties = PolicyProperties {
            policy_name: self.logical_id.clone(),
            policy_document: PolicyDocument::new(self.statements.clone()),
            roles: vec![self.role.clone()],
        };

        Resource::new("AWS::IAM::Policy", &properties)
    }
}
