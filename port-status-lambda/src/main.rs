//! Lambda entry point for querying the Goldilock FireBreak API for the
//! activation status of all ports. The event carries no parameters; any
//! fields present are ignored.

use firebreak_core::client::DeviceClient;
use firebreak_core::config::Config;
use firebreak_core::error::HandlerError;
use firebreak_core::port::to_physical_records;
use firebreak_core::response::{InvocationTimer, PortListBody, ResponseEnvelope};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_ansi(false)
        .without_time()
        .compact()
        .init();

    lambda_runtime::run(service_fn(handler)).await
}

/// Converts every outcome, success or failure, into a completed response
/// envelope. Nothing propagates past this boundary as a runtime error.
async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let timer = InvocationTimer::start();
    let (event, _ctx) = event.into_parts();

    info!("FireBreak port status Lambda invoked: {}", event);

    let envelope = match run(&timer).await {
        Ok(envelope) => envelope,
        Err(e) => {
            error!("Port status failed: {}", e);
            ResponseEnvelope::error(&e, &timer)
        }
    };

    Ok(serde_json::to_value(envelope)?)
}

async fn run(timer: &InvocationTimer) -> Result<ResponseEnvelope, HandlerError> {
    let config = Config::from_env()?;
    run_with_config(&config, timer).await
}

/// The handler body with the configuration injected, so tests can drive it
/// without touching the environment.
async fn run_with_config(config: &Config, timer: &InvocationTimer) -> Result<ResponseEnvelope, HandlerError> {
    let client = DeviceClient::new(config)?;
    let ports = client.get_all_status().await?;

    info!("Fetched status for {} ports", ports.len());

    Ok(ResponseEnvelope::ok(&PortListBody {
        ports: to_physical_records(ports, config.port_offset),
        execution_time_ms: timer.elapsed_ms(),
    }))
}
