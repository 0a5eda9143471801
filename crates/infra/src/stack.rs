use std::collections::BTreeMap;

use pipeline::config::{BUCKET_NAME_VAR, KEY_PREFIX_VAR};
use pipeline::traffic::{normalize_prefix, DEFAULT_PREFIX};

use crate::{
    resources::{
        AutoDeleteObjects, Architecture, Bucket, EventBinding, ExecutionRole, Function,
        RetryPolicy, RolePolicy, StartingPosition, Stream,
    },
    template::Parameter,
    Expr, InfraError, Template,
};

pub const BUCKET_ID: &str = "WebsiteTrafficBucket";
pub const STREAM_ID: &str = "WebsiteClickStream";
pub const ROLE_ID: &str = "LambdaExecutionRole";
pub const WRITE_POLICY_ID: &str = "LambdaExecutionRoleDefaultPolicy";
pub const FUNCTION_ID: &str = "KinesisToS3Function";
pub const EVENT_SOURCE_ID: &str = "KinesisToS3FunctionKinesisEventSource";
pub const AUTO_DELETE_ID: &str = "WebsiteTrafficBucketAutoDeleteObjects";
pub const AUTO_DELETE_ROLE_ID: &str = "AutoDeleteObjectsProviderRole";
pub const AUTO_DELETE_POLICY_ID: &str = "AutoDeleteObjectsProviderRoleDefaultPolicy";
pub const AUTO_DELETE_FUNCTION_ID: &str = "AutoDeleteObjectsProvider";
pub const CODE_BUCKET_PARAM: &str = "CodeBucket";
pub const CODE_KEY_PARAM: &str = "CodeKey";
pub const AUTO_DELETE_CODE_KEY_PARAM: &str = "AutoDeleteCodeKey";

pub const BUCKET_NAME_OUTPUT: &str = "BucketName";
pub const STREAM_NAME_OUTPUT: &str = "StreamName";
pub const FUNCTION_NAME_OUTPUT: &str = "LambdaFunctionName";

pub const MAX_BATCH_SIZE: u32 = 10_000;
pub const MAX_TIMEOUT_SECS: u32 = 900;
pub const MIN_MEMORY_MB: u32 = 128;
pub const MAX_MEMORY_MB: u32 = 10_240;
pub const MAX_RETRY_ATTEMPTS: i32 = 10_000;

/// Tunables of the pipeline stack.
#[derive(Clone, Debug)]
pub struct StackProps {
    pub description: Option<String>,
    pub batch_size: u32,
    pub starting_position: StartingPosition,
    pub timeout_secs: u32,
    pub memory_mb: u32,
    pub architecture: Architecture,
    pub key_prefix: String,
    pub retry: RetryPolicy,
}

impl Default for StackProps {
    fn default() -> Self {
        StackProps {
            description: Some("Kinesis clickstream to S3 traffic logs".to_string()),
            batch_size: 100,
            starting_position: StartingPosition::Latest,
            timeout_secs: 30,
            memory_mb: 128,
            architecture: Architecture::Arm64,
            key_prefix: DEFAULT_PREFIX.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl StackProps {
    pub fn validate(&self) -> Result<(), InfraError> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(invalid(format!(
                "batch size {} outside 1..={}",
                self.batch_size, MAX_BATCH_SIZE
            )));
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.timeout_secs) {
            return Err(invalid(format!(
                "timeout {}s outside 1..={}",
                self.timeout_secs, MAX_TIMEOUT_SECS
            )));
        }
        if !(MIN_MEMORY_MB..=MAX_MEMORY_MB).contains(&self.memory_mb) {
            return Err(invalid(format!(
                "memory {}MB outside {}..={}",
                self.memory_mb, MIN_MEMORY_MB, MAX_MEMORY_MB
            )));
        }
        if let Some(attempts) = self.retry.maximum_retry_attempts {
            if !(-1..=MAX_RETRY_ATTEMPTS).contains(&attempts) {
                return Err(invalid(format!(
                    "maximum retry attempts {} outside -1..={}",
                    attempts, MAX_RETRY_ATTEMPTS
                )));
            }
        }
        if let Some(arn) = &self.retry.on_failure_destination {
            if !arn.starts_with("arn:") {
                return Err(invalid(format!("on-failure destination {} is not an ARN", arn)));
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> InfraError {
    InfraError::InvalidProps { message }
}

/// Stream, bucket, role and consumer function wired into one template, plus
/// the provider that empties the bucket on teardown.
#[derive(Debug)]
pub struct ClickstreamStack {
    template: Template,
}

impl ClickstreamStack {
    pub fn new(props: StackProps) -> Result<Self, InfraError> {
        props.validate()?;

        let mut template = Template::new(props.description.clone());

        let code_bucket = template.add_parameter(
            CODE_BUCKET_PARAM,
            Parameter::string("Bucket holding the function bootstrap archives"),
        )?;
        let code_key = template.add_parameter(
            CODE_KEY_PARAM,
            Parameter::string("Object key of the consumer bootstrap archive"),
        )?;

        let bucket = Bucket::disposable(BUCKET_ID);
        template.add(&bucket)?;

        let mut auto_delete_dependency = Vec::new();
        if bucket.auto_delete_objects {
            let provider_code_key = template.add_parameter(
                AUTO_DELETE_CODE_KEY_PARAM,
                Parameter::string("Object key of the auto-delete provider bootstrap archive"),
            )?;
            add_auto_delete(&mut template, &bucket, code_bucket.clone(), provider_code_key)?;
            auto_delete_dependency.push(AUTO_DELETE_ID.to_string());
        }

        let stream = Stream::on_demand(STREAM_ID);
        template.add(&stream)?;

        let role = ExecutionRole::for_stream_consumer(ROLE_ID);
        template.add(&role)?;

        let write_policy = RolePolicy::bucket_write(WRITE_POLICY_ID, &role, &bucket);
        template.add(&write_policy)?;

        let mut environment = BTreeMap::new();
        environment.insert(BUCKET_NAME_VAR.to_string(), bucket.name());
        let key_prefix =
            normalize_prefix(&props.key_prefix).unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        if key_prefix != DEFAULT_PREFIX {
            environment.insert(KEY_PREFIX_VAR.to_string(), Expr::str(key_prefix));
        }

        let function = Function {
            logical_id: FUNCTION_ID.to_string(),
            role_arn: role.arn(),
            code_bucket,
            code_key,
            architecture: props.architecture,
            memory_mb: props.memory_mb,
            timeout_secs: props.timeout_secs,
            environment,
            depends_on: vec![ROLE_ID.to_string(), WRITE_POLICY_ID.to_string()],
        };
        template.add(&function)?;

        let binding = EventBinding {
            logical_id: EVENT_SOURCE_ID.to_string(),
            function_name: function.name(),
            stream_arn: stream.arn(),
            batch_size: props.batch_size,
            starting_position: props.starting_position,
            retry: props.retry,
            depends_on: auto_delete_dependency,
        };
        template.add(&binding)?;

        template.add_output(BUCKET_NAME_OUTPUT, "Traffic log bucket", bucket.name())?;
        template.add_output(STREAM_NAME_OUTPUT, "Click event stream", stream.name())?;
        template.add_output(FUNCTION_NAME_OUTPUT, "Batch consumer function", function.name())?;

        template.validate()?;

        Ok(ClickstreamStack { template })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn synth(&self) -> Result<String, InfraError> {
        self.template.to_json_pretty()
    }
}

/// Provider role, its bucket-scoped policy, the provider function and the
/// custom resource that calls it.
fn add_auto_delete(
    template: &mut Template,
    bucket: &Bucket,
    code_bucket: Expr,
    code_key: Expr,
) -> Result<(), InfraError> {
    let role = ExecutionRole::basic(AUTO_DELETE_ROLE_ID);
    template.add(&role)?;

    let policy = RolePolicy::bucket_purge(AUTO_DELETE_POLICY_ID, &role, bucket);
    template.add(&policy)?;

    let provider = Function {
        logical_id: AUTO_DELETE_FUNCTION_ID.to_string(),
        role_arn: role.arn(),
        code_bucket,
        code_key,
        architecture: Architecture::Arm64,
        memory_mb: MIN_MEMORY_MB,
        timeout_secs: MAX_TIMEOUT_SECS,
        environment: BTreeMap::new(),
        depends_on: vec![AUTO_DELETE_ROLE_ID.to_string()],
    };
    template.add(&provider)?;

    let auto_delete =
        AutoDeleteObjects::for_bucket(AUTO_DELETE_ID, bucket, &provider, AUTO_DELETE_POLICY_ID);
    template.add(&auto_delete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn rendered(props: StackProps) -> Value {
        ClickstreamStack::new(props).unwrap().template().to_value().unwrap()
    }

    #[test]
    fn stream_is_on_demand() {
        let template = rendered(StackProps::default());

        let stream = &template["Resources"][STREAM_ID];
        assert_eq!(stream["Type"], json!("AWS::Kinesis::Stream"));
        assert_eq!(
            stream["Properties"]["StreamModeDetails"]["StreamMode"],
            json!("ON_DEMAND")
        );
        assert!(stream["Properties"].get("ShardCount").is_none());
    }

    #[test]
    fn bucket_is_destroyed_with_stack() {
        let template = rendered(StackProps::default());

        let bucket = &template["Resources"][BUCKET_ID];
        assert_eq!(bucket["DeletionPolicy"], json!("Delete"));
        assert_eq!(bucket["UpdateReplacePolicy"], json!("Delete"));
        assert_eq!(
            bucket["Properties"]["Tags"],
            json!([{ "Key": "aws-cdk:auto-delete-objects", "Value": "true" }])
        );
    }

    #[test]
    fn bucket_is_emptied_by_auto_delete_provider() {
        let template = rendered(StackProps::default());
        let resources = &template["Resources"];

        let auto_delete = &resources[AUTO_DELETE_ID];
        assert_eq!(auto_delete["Type"], json!("Custom::S3AutoDeleteObjects"));
        assert_eq!(
            auto_delete["Properties"],
            json!({
                "ServiceToken": { "Fn::GetAtt": [AUTO_DELETE_FUNCTION_ID, "Arn"] },
                "BucketName": { "Ref": BUCKET_ID }
            })
        );
        assert_eq!(auto_delete["DependsOn"], json!([AUTO_DELETE_POLICY_ID]));

        let provider = &resources[AUTO_DELETE_FUNCTION_ID];
        assert_eq!(provider["Type"], json!("AWS::Lambda::Function"));
        assert_eq!(
            provider["Properties"]["Role"],
            json!({ "Fn::GetAtt": [AUTO_DELETE_ROLE_ID, "Arn"] })
        );
        assert_eq!(
            provider["Properties"]["Code"]["S3Key"],
            json!({ "Ref": AUTO_DELETE_CODE_KEY_PARAM })
        );
        assert_eq!(provider["Properties"]["Timeout"], json!(900));

        assert_eq!(
            resources[AUTO_DELETE_ROLE_ID]["Properties"]["ManagedPolicyArns"],
            json!([{ "Fn::Sub": "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole" }])
        );
    }

    #[test]
    fn provider_policy_is_scoped_to_traffic_bucket() {
        let template = rendered(StackProps::default());

        let policy = &template["Resources"][AUTO_DELETE_POLICY_ID]["Properties"];
        assert_eq!(policy["Roles"], json!([{ "Ref": AUTO_DELETE_ROLE_ID }]));
        assert_eq!(
            policy["PolicyDocument"]["Statement"],
            json!([
                {
                    "Effect": "Allow",
                    "Action": ["s3:GetBucketTagging", "s3:ListBucket"],
                    "Resource": [{ "Fn::GetAtt": [BUCKET_ID, "Arn"] }]
                },
                {
                    "Effect": "Allow",
                    "Action": ["s3:DeleteObject"],
                    "Resource": [{ "Fn::Sub": "${WebsiteTrafficBucket.Arn}/*" }]
                }
            ])
        );
    }

    #[test]
    fn binding_stops_before_bucket_is_emptied() {
        let template = rendered(StackProps::default());

        assert_eq!(
            template["Resources"][EVENT_SOURCE_ID]["DependsOn"],
            json!([AUTO_DELETE_ID])
        );
    }

    #[test]
    fn role_has_logging_and_stream_read() {
        let template = rendered(StackProps::default());

        let role = &template["Resources"][ROLE_ID]["Properties"];
        assert_eq!(
            role["AssumeRolePolicyDocument"]["Statement"][0]["Principal"]["Service"],
            json!("lambda.amazonaws.com")
        );
        assert_eq!(
            role["ManagedPolicyArns"],
            json!([
                { "Fn::Sub": "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole" },
                { "Fn::Sub": "arn:${AWS::Partition}:iam::aws:policy/AmazonKinesisReadOnlyAccess" }
            ])
        );
    }

    #[test]
    fn write_policy_is_scoped_to_bucket_and_cannot_delete() {
        let template = rendered(StackProps::default());

        let policy = &template["Resources"][WRITE_POLICY_ID]["Properties"];
        let statement = &policy["PolicyDocument"]["Statement"][0];
        assert_eq!(policy["Roles"], json!([{ "Ref": ROLE_ID }]));
        assert_eq!(
            statement["Resource"],
            json!([
                { "Fn::GetAtt": [BUCKET_ID, "Arn"] },
                { "Fn::Sub": "${WebsiteTrafficBucket.Arn}/*" }
            ])
        );

        let actions: Vec<&str> = statement["Action"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a.as_str().unwrap())
            .collect();
        assert!(actions.contains(&"s3:PutObject"));
        assert!(actions.iter().all(|a| !a.starts_with("s3:Delete")));
        assert!(actions.iter().all(|a| !a.starts_with("s3:List")));
        assert!(actions.iter().all(|a| a.starts_with("s3:")));
    }

    #[test]
    fn function_runs_bootstrap_with_bucket_env() {
        let template = rendered(StackProps::default());

        let function = &template["Resources"][FUNCTION_ID];
        let properties = &function["Properties"];
        assert_eq!(properties["Runtime"], json!("provided.al2023"));
        assert_eq!(properties["Handler"], json!("bootstrap"));
        assert_eq!(properties["Architectures"], json!(["arm64"]));
        assert_eq!(properties["Timeout"], json!(30));
        assert_eq!(properties["Role"], json!({ "Fn::GetAtt": [ROLE_ID, "Arn"] }));
        assert_eq!(
            properties["Code"],
            json!({ "S3Bucket": { "Ref": "CodeBucket" }, "S3Key": { "Ref": "CodeKey" } })
        );
        assert_eq!(
            properties["Environment"]["Variables"],
            json!({ "BUCKET_NAME": { "Ref": BUCKET_ID } })
        );
        assert_eq!(function["DependsOn"], json!([ROLE_ID, WRITE_POLICY_ID]));
    }

    #[test]
    fn binding_reads_latest_in_batches_of_100_with_default_retry() {
        let template = rendered(StackProps::default());

        let mapping = &template["Resources"][EVENT_SOURCE_ID]["Properties"];
        assert_eq!(mapping["BatchSize"], json!(100));
        assert_eq!(mapping["StartingPosition"], json!("LATEST"));
        assert_eq!(mapping["FunctionName"], json!({ "Ref": FUNCTION_ID }));
        assert_eq!(
            mapping["EventSourceArn"],
            json!({ "Fn::GetAtt": [STREAM_ID, "Arn"] })
        );
        assert!(mapping.get("MaximumRetryAttempts").is_none());
        assert!(mapping.get("BisectBatchOnFunctionError").is_none());
        assert!(mapping.get("DestinationConfig").is_none());
    }

    #[test]
    fn explicit_retry_policy_is_rendered() {
        let props = StackProps {
            retry: RetryPolicy {
                maximum_retry_attempts: Some(3),
                bisect_batch_on_function_error: Some(true),
                on_failure_destination: Some(
                    "arn:aws:sqs:us-east-1:123456789012:traffic-dlq".to_string(),
                ),
            },
            ..Default::default()
        };

        let template = rendered(props);

        let mapping = &template["Resources"][EVENT_SOURCE_ID]["Properties"];
        assert_eq!(mapping["MaximumRetryAttempts"], json!(3));
        assert_eq!(mapping["BisectBatchOnFunctionError"], json!(true));
        assert_eq!(
            mapping["DestinationConfig"]["OnFailure"]["Destination"],
            json!("arn:aws:sqs:us-east-1:123456789012:traffic-dlq")
        );
    }

    #[test]
    fn custom_prefix_reaches_function_env() {
        let props = StackProps {
            key_prefix: "clicks".to_string(),
            ..Default::default()
        };

        let template = rendered(props);

        assert_eq!(
            template["Resources"][FUNCTION_ID]["Properties"]["Environment"]["Variables"]
                ["LOG_KEY_PREFIX"],
            json!("clicks")
        );
    }

    #[test]
    fn prefix_is_trimmed_before_reaching_function_env() {
        let props = StackProps {
            key_prefix: "/clicks/".to_string(),
            ..Default::default()
        };

        let template = rendered(props);

        assert_eq!(
            template["Resources"][FUNCTION_ID]["Properties"]["Environment"]["Variables"]
                ["LOG_KEY_PREFIX"],
            json!("clicks")
        );
    }

    #[test]
    fn default_prefix_with_slashes_is_not_rendered() {
        let props = StackProps {
            key_prefix: "/website-data/".to_string(),
            ..Default::default()
        };

        let template = rendered(props);

        assert_eq!(
            template["Resources"][FUNCTION_ID]["Properties"]["Environment"]["Variables"],
            json!({ "BUCKET_NAME": { "Ref": BUCKET_ID } })
        );
    }

    #[test]
    fn outputs_expose_bucket_stream_and_function() {
        let stack = ClickstreamStack::new(StackProps::default()).unwrap();

        let ids: Vec<&str> = stack.template().output_ids().collect();
        assert_eq!(ids, vec!["BucketName", "LambdaFunctionName", "StreamName"]);
        assert_eq!(
            stack.template().output(STREAM_NAME_OUTPUT).unwrap().value,
            Expr::reference(STREAM_ID)
        );
    }

    #[test]
    fn synth_renders_valid_json() {
        let json = ClickstreamStack::new(StackProps::default())
            .unwrap()
            .synth()
            .unwrap();

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["Resources"].as_object().unwrap().len(), 10);
        assert_eq!(
            value["Parameters"].as_object().unwrap().keys().collect::<Vec<_>>(),
            vec!["AutoDeleteCodeKey", "CodeBucket", "CodeKey"]
        );
    }

    #[test]
    fn out_of_range_props_are_rejected() {
        let cases = [
            StackProps {
                batch_size: 0,
                ..Default::default()
            },
            StackProps {
                batch_size: 10_001,
                ..Default::default()
            },
            StackProps {
                timeout_secs: 0,
                ..Default::default()
            },
            StackProps {
                timeout_secs: 901,
                ..Default::default()
            },
            StackProps {
                memory_mb: 127,
                ..Default::default()
            },
            StackProps {
                memory_mb: 10_241,
                ..Default::default()
            },
            StackProps {
                retry: RetryPolicy {
                    maximum_retry_attempts: Some(-2),
                    ..Default::default()
                },
                ..Default::default()
            },
            StackProps {
                retry: RetryPolicy {
                    on_failure_destination: Some("traffic-dlq".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        ];

        for props in cases {
            assert!(matches!(
                ClickstreamStack::new(props),
                Err(InfraError::InvalidProps { .. })
            ));
        }
    }

    #[test]
    fn boundary_props_are_accepted() {
        let cases = [
            StackProps {
                batch_size: 1,
                timeout_secs: 1,
                memory_mb: 128,
                ..Default::default()
            },
            StackProps {
                batch_size: 10_000,
                timeout_secs: 900,
                memory_mb: 10_240,
                retry: RetryPolicy {
                    maximum_retry_attempts: Some(-1),
                    ..Default::default()
                },
                ..Default::default()
            },
        ];

        for props in cases {
            assert!(ClickstreamStack::new(props).is_ok());
        }
    }
}
