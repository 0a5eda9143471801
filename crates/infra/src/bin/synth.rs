use std::{env, fs, str::FromStr};

use anyhow::{bail, Context, Result};
use infra::{
    resources::{Architecture, RetryPolicy, StartingPosition},
    ClickstreamStack, StackProps,
};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let props = props_from_env()?;
    tracing::info!(
        "Synthesizing stack: batch size {}, timeout {}s, retry {:?}",
        props.batch_size,
        props.timeout_secs,
        props.retry
    );

    let template = ClickstreamStack::new(props)?.synth()?;

    match env::args().nth(1) {
        Some(path) => {
            fs::write(&path, template).with_context(|| format!("writing {}", path))?;
            tracing::info!("Template written to {}", path);
        }
        None => println!("{}", template),
    }

    Ok(())
}

fn props_from_env() -> Result<StackProps> {
    let defaults = StackProps::default();

    let starting_position = match env::var("STARTING_POSITION").ok().as_deref() {
        None | Some("LATEST") => StartingPosition::Latest,
        Some("TRIM_HORIZON") => StartingPosition::TrimHorizon,
        Some(other) => bail!("STARTING_POSITION must be LATEST or TRIM_HORIZON, got {}", other),
    };

    let architecture = match env::var("FUNCTION_ARCHITECTURE").ok().as_deref() {
        None | Some("arm64") => Architecture::Arm64,
        Some("x86_64") => Architecture::X86_64,
        Some(other) => bail!("FUNCTION_ARCHITECTURE must be arm64 or x86_64, got {}", other),
    };

    Ok(StackProps {
        description: env::var("STACK_DESCRIPTION").ok().or(defaults.description),
        batch_size: parse_var("BATCH_SIZE")?.unwrap_or(defaults.batch_size),
        starting_position,
        timeout_secs: parse_var("FUNCTION_TIMEOUT_SECONDS")?.unwrap_or(defaults.timeout_secs),
        memory_mb: parse_var("FUNCTION_MEMORY_MB")?.unwrap_or(defaults.memory_mb),
        architecture,
        key_prefix: env::var("LOG_KEY_PREFIX").unwrap_or(defaults.key_prefix),
        retry: RetryPolicy {
            maximum_retry_attempts: parse_var("MAX_RETRY_ATTEMPTS")?,
            bisect_batch_on_function_error: parse_var("BISECT_BATCH_ON_ERROR")?,
            on_failure_destination: env::var("ON_FAILURE_DESTINATION_ARN").ok(),
        },
    })
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid {}: {}", name, value)),
        Err(_) => Ok(None),
    }
}
