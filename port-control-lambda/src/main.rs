//! Lambda entry point for activating and deactivating Goldilock FireBreak
//! ports. The event carries a port selector (a number or `"all"`) and an
//! `activate` boolean, either directly or wrapped in an API Gateway `body`
//! string.

use firebreak_core::client::{ControlOutcome, DeviceClient};
use firebreak_core::config::Config;
use firebreak_core::error::HandlerError;
use firebreak_core::port::{to_physical_numbering, to_physical_records, PortSelector};
use firebreak_core::response::{InvocationTimer, PortControlBody, PortListBody, ResponseEnvelope};
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

    info!("FireBreak port control Lambda invoked: {}", event);

    let envelope = match run(&event, &timer).await {
        Ok(envelope) => envelope,
        Err(e) => {
            error!("Port control failed: {}", e);
            ResponseEnvelope::error(&e, &timer)
        }
    };

    Ok(serde_json::to_value(envelope)?)
}

async fn run(event: &Value, timer: &InvocationTimer) -> Result<ResponseEnvelope, HandlerError> {
    let config = Config::from_env()?;
    run_with_config(&config, event, timer).await
}

/// The handler body with the configuration injected, so tests can drive it
/// without touching the environment.
async fn run_with_config(
    config: &Config,
    event: &Value,
    timer: &InvocationTimer,
) -> Result<ResponseEnvelope, HandlerError> {
    let (selector, activate) = parse_control_request(event, config.port_offset)?;

    info!("Controlling FireBreak port {:?}, activate={}", selector, activate);

    let client = DeviceClient::new(config)?;
    let outcome = client.port_control(&selector, activate).await?;

    Ok(match outcome {
        ControlOutcome::Single(record) => ResponseEnvelope::ok(&PortControlBody {
            active: record.active,
            port: to_physical_numbering(record.port, config.port_offset),
            execution_time_ms: timer.elapsed_ms(),
        }),
        ControlOutcome::All { ports } => ResponseEnvelope::ok(&PortListBody {
            ports: to_physical_records(ports, config.port_offset),
            execution_time_ms: timer.elapsed_ms(),
        }),
    })
}

/// Extracts and validates the `port` and `activate` parameters.
///
/// Parameters are read from the event object directly, or from an API
/// Gateway proxy event whose `body` field holds the request as a JSON
/// string. `activate` must be a JSON boolean - no coercion of numbers or
/// strings. The returned selector is already in API numbering.
fn parse_control_request(event: &Value, offset_enabled: bool) -> Result<(PortSelector, bool), HandlerError> {
    let params = match event.get("body") {
        Some(Value::String(body)) => serde_json::from_str::<Value>(body)
            .map_err(|_| HandlerError::Validation("Invalid JSON in request body".to_owned()))?,
        _ => event.clone(),
    };

    let port = match params.get("port") {
        Some(v) if !v.is_null() => v,
        _ => return Err(HandlerError::Validation("Missing required parameter: port".to_owned())),
    };

    let activate = match params.get("activate") {
        Some(Value::Bool(b)) => *b,
        Some(v) if !v.is_null() => {
            return Err(HandlerError::Validation(format!(
                "Invalid value for 'activate': expected a boolean, got: {}",
                v
            )))
        }
        _ => {
            return Err(HandlerError::Validation(
                "Missing required parameter: activate".to_owned(),
            ))
        }
    };

    let selector = PortSelector::parse(port, offset_enabled)?;
    Ok((selector, activate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn test_config(api_host: String, port_offset: bool) -> Config {
        Config {
            api_host,
            api_token: "test-token".to_owned(),
            port_offset,
            disable_ssl_verify: true,
            request_timeout: Duration::from_millis(250),
        }
    }

    #[test]
    fn specific_port_is_translated_to_api_numbering() {
        let (selector, activate) = parse_control_request(&json!({"port": 5, "activate": true}), true).unwrap();
        assert_eq!(selector, PortSelector::Specific(4));
        assert!(activate);

        let (selector, _) = parse_control_request(&json!({"port": 5, "activate": true}), false).unwrap();
        assert_eq!(selector, PortSelector::Specific(5));
    }

    #[test]
    fn all_is_accepted_in_both_offset_modes() {
        for offset in [false, true] {
            let (selector, activate) =
                parse_control_request(&json!({"port": "all", "activate": true}), offset).unwrap();
            assert_eq!(selector, PortSelector::All);
            assert!(activate);
        }
    }

    #[test]
    fn out_of_range_port_names_value_and_range() {
        let err = parse_control_request(&json!({"port": 15, "activate": true}), false).unwrap_err();
        assert_eq!(err.status_code(), 400);
        let msg = err.to_string();
        assert!(msg.contains("15"));
        assert!(msg.contains("0-11"));
    }

    #[test]
    fn twelve_is_only_valid_with_the_offset_enabled() {
        assert!(parse_control_request(&json!({"port": 12, "activate": true}), false).is_err());

        let (selector, _) = parse_control_request(&json!({"port": 12, "activate": true}), true).unwrap();
        assert_eq!(selector, PortSelector::Specific(11));
    }

    #[test]
    fn missing_parameters_are_rejected() {
        let err = parse_control_request(&json!({"activate": true}), false).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("port"));

        let err = parse_control_request(&json!({"port": 3}), false).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("activate"));

        let err = parse_control_request(&json!({"port": 3, "activate": null}), false).unwrap_err();
        assert!(err.to_string().contains("activate"));
    }

    #[test]
    fn activate_must_be_a_json_boolean() {
        for bad in [json!(1), json!("true"), json!("yes"), json!(0.0)] {
            let err = parse_control_request(&json!({"port": 3, "activate": bad}), false).unwrap_err();
            assert_eq!(err.status_code(), 400);
            assert!(err.to_string().contains("activate"));
        }
    }

    #[test]
    fn gateway_body_string_is_unwrapped() {
        let event = json!({"body": "{\"port\": \"all\", \"activate\": false}"});
        let (selector, activate) = parse_control_request(&event, false).unwrap();
        assert_eq!(selector, PortSelector::All);
        assert!(!activate);
    }

    #[test]
    fn invalid_gateway_body_is_a_400() {
        let event = json!({"body": "{not json"});
        let err = parse_control_request(&event, false).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn single_control_response_round_trips_the_port_number() {
        // device answered {"active": 1, "port": 4} for physical port 5
        let record = firebreak_core::port::PortRecord { port: 4, active: 1 };
        let body = PortControlBody {
            active: record.active,
            port: to_physical_numbering(record.port, true),
            execution_time_ms: 0.1,
        };
        assert_eq!(body.port, 5);
        assert_eq!(body.active, 1);
    }

    #[tokio::test]
    async fn validation_happens_before_any_device_call() {
        // no device anywhere near this host; a validation failure must
        // surface before a connection is attempted
        let config = test_config("192.0.2.1".to_owned(), false);
        let timer = InvocationTimer::start();

        let err = run_with_config(&config, &json!({"port": 15, "activate": true}), &timer)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn device_failure_becomes_a_502_envelope() {
        // bound but never served, so the call times out
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = test_config(listener.local_addr().unwrap().to_string(), false);
        let timer = InvocationTimer::start();

        let err = run_with_config(&config, &json!({"port": "all", "activate": false}), &timer)
            .await
            .unwrap_err();
        let envelope = ResponseEnvelope::error(&err, &timer);

        assert_eq!(envelope.status_code, 502);
        let body: Value = serde_json::from_str(&envelope.body).unwrap();
        assert!(!body["error"].as_str().unwrap().is_empty());
        assert!(body["executionTimeMs"].as_f64().unwrap() >= 0.0);
    }
}
