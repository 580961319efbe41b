//! The response envelope returned to the hosting transport and the scoped
//! elapsed-time measurement included in every body, success or error.

use crate::error::HandlerError;
use crate::port::PortRecord;
use serde::Serialize;
use std::time::Instant;

/// Scoped elapsed-time measurement. Started once at handler entry; read at
/// every exit path, including error paths, so every body carries a
/// measurement up to the point the response was built.
#[derive(Debug, Clone, Copy)]
pub struct InvocationTimer(Instant);

impl InvocationTimer {
    pub fn start() -> Self {
        Self(Instant::now())
    }

    /// Milliseconds since the timer was started, rounded to 2 decimal places.
    pub fn elapsed_ms(&self) -> f64 {
        (self.0.elapsed().as_secs_f64() * 100_000.0).round() / 100.0
    }
}

/// Body of a successful status query or all-ports control call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortListBody {
    pub ports: Vec<PortRecord>,
    pub execution_time_ms: f64,
}

/// Body of a successful individual port control call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortControlBody {
    pub active: u8,
    pub port: i64,
    pub execution_time_ms: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    execution_time_ms: f64,
}

#[derive(Debug, Serialize)]
struct ResponseHeaders {
    #[serde(rename = "Content-Type")]
    content_type: &'static str,
}

/// The completed invocation result handed back to the Lambda runtime,
/// shaped for an API Gateway proxy integration: a status code plus the
/// body pre-serialized as a JSON string.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    headers: ResponseHeaders,
    pub body: String,
}

impl ResponseEnvelope {
    /// Wraps a success body with status 200.
    pub fn ok<T: Serialize>(body: &T) -> Self {
        Self::new(200, body)
    }

    /// Wraps a handler error with its status code, carrying the elapsed
    /// time measured up to the point of failure.
    pub fn error(err: &HandlerError, timer: &InvocationTimer) -> Self {
        Self::new(
            err.status_code(),
            &ErrorBody {
                error: err.to_string(),
                execution_time_ms: timer.elapsed_ms(),
            },
        )
    }

    fn new<T: Serialize>(status_code: u16, body: &T) -> Self {
        Self {
            status_code,
            headers: ResponseHeaders {
                content_type: "application/json",
            },
            // our body types serialize infallibly
            body: serde_json::to_string(body).expect("Failed to serialize response body. It's a bug."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn success_envelope_carries_a_json_string_body() {
        let envelope = ResponseEnvelope::ok(&PortListBody {
            ports: vec![PortRecord { port: 0, active: 1 }],
            execution_time_ms: 1.25,
        });
        assert_eq!(envelope.status_code, 200);

        let body: Value = serde_json::from_str(&envelope.body).unwrap();
        assert_eq!(body["ports"][0]["port"], 0);
        assert_eq!(body["ports"][0]["active"], 1);
        assert_eq!(body["executionTimeMs"], 1.25);

        let outer = serde_json::to_value(&envelope).unwrap();
        assert_eq!(outer["statusCode"], 200);
        assert_eq!(outer["headers"]["Content-Type"], "application/json");
        assert!(outer["body"].is_string());
    }

    #[test]
    fn error_envelope_keeps_the_timer_reading() {
        let timer = InvocationTimer::start();
        let err = HandlerError::UpstreamUnreachable("timed out".into());
        let envelope = ResponseEnvelope::error(&err, &timer);
        assert_eq!(envelope.status_code, 502);

        let body: Value = serde_json::from_str(&envelope.body).unwrap();
        let error_text = body["error"].as_str().unwrap();
        assert!(!error_text.is_empty());
        assert!(error_text.contains("timed out"));
        assert!(body["executionTimeMs"].as_f64().unwrap() >= 0.0);
    }

    #[test]
    fn elapsed_ms_is_non_negative_and_rounded() {
        let timer = InvocationTimer::start();
        let ms = timer.elapsed_ms();
        assert!(ms >= 0.0);
        // two decimal places at most
        assert!(((ms * 100.0).round() - ms * 100.0).abs() < 1e-6);
    }

    #[test]
    fn individual_control_body_shape() {
        let body = serde_json::to_value(PortControlBody {
            active: 1,
            port: 5,
            execution_time_ms: 0.5,
        })
        .unwrap();
        assert_eq!(body["active"], 1);
        assert_eq!(body["port"], 5);
        assert_eq!(body["executionTimeMs"], 0.5);
    }
}
