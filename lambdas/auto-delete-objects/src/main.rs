use std::time::Duration;

use aws_config::BehaviorVersion;
use lambda_runtime::{service_fn, Error, LambdaEvent};

mod handler;
mod purger;
mod request;
mod responder;

use handler::HandlerDeps;
use purger::S3BucketPurger;
use request::CustomResourceRequest;
use responder::HttpResponder;

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let aws_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let s3_client = aws_sdk_s3::Client::new(&aws_config);
    let http_client = reqwest::Client::builder()
        .timeout(RESPONSE_TIMEOUT)
        .build()?;

    let deps = HandlerDeps::new(S3BucketPurger::new(s3_client), HttpResponder::new(http_client));

    lambda_runtime::run(service_fn(
        |event: LambdaEvent<CustomResourceRequest>| async { handler::handle(&deps, event).await },
    ))
    .await
}
