use serde::Serialize;

use super::Construct;
use crate::{
    template::{RemovalPolicy, Resource},
    Expr, InfraError,
};

/// Tag the auto-delete provider checks before emptying a bucket. Removing it
/// from a live bucket turns the emptying off.
pub const AUTO_DELETE_TAG: &str = "aws-cdk:auto-delete-objects";

#[derive(Clone, Debug)]
pub struct Bucket {
    pub logical_id: String,
    pub removal_policy: RemovalPolicy,
    /// Pairs the bucket with an [`AutoDeleteObjects`](super::AutoDeleteObjects)
    /// resource that empties it on stack deletion.
    pub auto_delete_objects: bool,
}

impl Bucket {
    /// Bucket that is emptied and deleted with the stack. Non-production use.
    pub fn disposable(logical_id: &str) -> Self {
        Bucket {
            logical_id: logical_id.to_string(),
            removal_policy: RemovalPolicy::Delete,
            auto_delete_objects: true,
        }
    }

    pub fn name(&self) -> Expr {
        Expr::reference(&self.logical_id)
    }

    pub fn arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }

    /// ARN pattern covering every object in the bucket.
    pub fn objects_arn(&self) -> Expr {
        Expr::sub(format!("${{{}.Arn}}/*", self.logical_id))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Tag {
    key: String,
    value: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct BucketProperties {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<Tag>,
}

impl Construct for Bucket {
    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn resource(&self) -> Result<Resource, InfraError> {
        let mut tags = Vec::new();
        if self.auto_delete_objects {
            tags.push(Tag {
                key: AUTO_DELETE_TAG.to_string(),
                value: "true".to_string(),
            });
        }

        Ok(Resource::new("AWS::S3::Bucket", &BucketProperties { tags })?
            .removal_policy(self.removal_policy))
    }
}
