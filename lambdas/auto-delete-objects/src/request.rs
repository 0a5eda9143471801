use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub(crate) enum RequestType {
    Create,
    Update,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AutoDeleteProperties {
    pub bucket_name: String,
}

/// CloudFormation custom resource request for `Custom::S3AutoDeleteObjects`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CustomResourceRequest {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    pub resource_properties: AutoDeleteProperties,
    #[serde(default)]
    pub old_resource_properties: Option<AutoDeleteProperties>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum ResponseStatus {
    Success,
    Failed,
}

/// Body PUT to the presigned `ResponseURL`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CustomResourceResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
}

impl CustomResourceResponse {
    /// The physical id stays the bucket name so updates never look like a
    /// replacement to CloudFormation.
    pub fn for_request(
        request: &CustomResourceRequest,
        status: ResponseStatus,
        reason: Option<String>,
    ) -> Self {
        CustomResourceResponse {
            status,
            reason,
            physical_resource_id: request
                .physical_resource_id
                .clone()
                .unwrap_or_else(|| request.resource_properties.bucket_name.clone()),
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn delete_request_is_parsed() {
        let request: CustomResourceRequest = serde_json::from_value(json!({
            "RequestType": "Delete",
            "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:AutoDeleteObjectsProvider",
            "ResponseURL": "https://cloudformation-custom-resource-response-useast1.s3.amazonaws.com/abc?sig=1",
            "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/clickstream/guid",
            "RequestId": "unique-id-1",
            "ResourceType": "Custom::S3AutoDeleteObjects",
            "LogicalResourceId": "WebsiteTrafficBucketAutoDeleteObjects",
            "PhysicalResourceId": "clickstream-websitetrafficbucket-1a2b3c",
            "ResourceProperties": {
                "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:AutoDeleteObjectsProvider",
                "BucketName": "clickstream-websitetrafficbucket-1a2b3c"
            }
        }))
        .unwrap();

        assert_eq!(request.request_type, RequestType::Delete);
        assert_eq!(
            request.resource_properties.bucket_name,
            "clickstream-websitetrafficbucket-1a2b3c"
        );
        assert!(request.old_resource_properties.is_none());
    }

    #[test]
    fn response_uses_cloudformation_field_names() {
        let request: CustomResourceRequest = serde_json::from_value(json!({
            "RequestType": "Create",
            "ResponseURL": "https://example.com/response",
            "StackId": "stack",
            "RequestId": "req",
            "LogicalResourceId": "WebsiteTrafficBucketAutoDeleteObjects",
            "ResourceProperties": { "BucketName": "traffic" }
        }))
        .unwrap();

        let response = CustomResourceResponse::for_request(
            &request,
            ResponseStatus::Failed,
            Some("AccessDenied".to_string()),
        );

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "Status": "FAILED",
                "Reason": "AccessDenied",
                "PhysicalResourceId": "traffic",
                "StackId": "stack",
                "RequestId": "req",
                "LogicalResourceId": "WebsiteTrafficBucketAutoDeleteObjects"
            })
        );
    }
}
