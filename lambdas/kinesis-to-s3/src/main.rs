use aws_config::BehaviorVersion;
use aws_lambda_events::kinesis::KinesisEvent;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use pipeline::{Config, S3LogStore, SystemClock};

mod handler;

use handler::HandlerDeps;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;
    tracing::info!("Writing traffic logs to bucket {}", config.bucket_name);

    let aws_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let s3_client = aws_sdk_s3::Client::new(&aws_config);

    let deps = HandlerDeps::new(
        S3LogStore::new(s3_client, config.bucket_name),
        SystemClock,
        config.key_prefix,
    );

    lambda_runtime::run(service_fn(|event: LambdaEvent<KinesisEvent>| async {
        handler::handle(&deps, event).await
    }))
    .await
}
