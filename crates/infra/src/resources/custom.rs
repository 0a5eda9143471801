use serde::Serialize;

use super::{Bucket, Construct, Function};
use crate::{template::Resource, Expr, InfraError};

pub const AUTO_DELETE_RESOURCE_TYPE: &str = "Custom::S3AutoDeleteObjects";

/// Custom resource that empties a bucket when it is deleted. CloudFormation
/// deletes it before the bucket, because it references the bucket name, and
/// the provider function behind `service_token` removes every object.
#[derive(Clone, Debug)]
pub struct AutoDeleteObjects {
    pub logical_id: String,
    pub service_token: Expr,
    pub bucket_name: Expr,
    /// The provider's policy must outlive this resource so the delete call
    /// still has its permissions.
    pub depends_on: Vec<String>,
}

impl AutoDeleteObjects {
    pub fn for_bucket(
        logical_id: &str,
        bucket: &Bucket,
        provider: &Function,
        provider_policy_id: &str,
    ) -> Self {
        AutoDeleteObjects {
            logical_id: logical_id.to_string(),
            service_token: provider.arn(),
            bucket_name: bucket.name(),
            depends_on: vec![provider_policy_id.to_string()],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AutoDeleteProperties {
    service_token: Expr,
    bucket_name: Expr,
}

impl Construct for AutoDeleteObjects {
    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn resource(&self) -> Result<Resource, InfraError> {
        let properties = AutoDeleteProperties {
            service_token: self.service_token.clone(),
            bucket_name: self.bucket_name.clone(),
        };

        let resource = Resource::new(AUTO_DELETE_RESOURCE_TYPE, &properties)?;
        Ok(self
            .depends_on
            .iter()
            .fold(resource, |resource, id| resource.depends_on(id.clone())))
    }
}
