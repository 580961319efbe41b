use crate::error::HandlerError;
use regex::Regex;
use std::env::var;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

/// Default whole-request timeout for the outbound device call.
/// Overridable via `REQUEST_TIMEOUT_SECONDS`.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Compiled once, reused across invocations of the same runtime sandbox.
static DNS_HOST_REGEX: OnceLock<Regex> = OnceLock::new();

/// One configuration snapshot per invocation, read from the environment at
/// handler entry and passed by reference into every component. Nothing here
/// is shared or mutated across invocations.
#[derive(Debug, Clone)]
pub struct Config {
    /// Device host or host:port, e.g. `192.168.1.20` or `firebreak.local:8443`
    pub api_host: String,
    /// Bearer token for the device API
    pub api_token: String,
    /// `true`: callers use physical numbering (1-12), translated to API
    /// numbering (0-11) at the boundary. `false`: API numbering end to end.
    pub port_offset: bool,
    /// Skip certificate verification on the outbound call. Development use only.
    pub disable_ssl_verify: bool,
    /// Whole-request timeout for the device call
    pub request_timeout: Duration,
}

impl Config {
    /// Reads the configuration from environment variables.
    /// A missing or invalid `API_IP` or `API_TOKEN` is a fatal configuration
    /// error for the invocation and surfaces as a 500 envelope.
    pub fn from_env() -> Result<Self, HandlerError> {
        let api_host = var("API_IP")
            .map_err(|_| HandlerError::Configuration("API_IP environment variable is missing".to_owned()))?;
        if !is_valid_api_host(&api_host) {
            return Err(HandlerError::Configuration(format!(
                "Invalid API_IP environment variable: {}",
                api_host
            )));
        }

        let api_token = var("API_TOKEN")
            .map_err(|_| HandlerError::Configuration("API_TOKEN environment variable is missing".to_owned()))?;
        if api_token.is_empty() {
            return Err(HandlerError::Configuration(
                "API_TOKEN environment variable is missing".to_owned(),
            ));
        }

        let request_timeout = match var("REQUEST_TIMEOUT_SECONDS") {
            Ok(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(HandlerError::Configuration(format!(
                        "Invalid REQUEST_TIMEOUT_SECONDS environment variable: {}",
                        v
                    )))
                }
            },
            Err(_) => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            api_host,
            api_token,
            port_offset: env_flag("PORT_OFFSET"),
            disable_ssl_verify: env_flag("DISABLE_SSL_VERIFY"),
            request_timeout,
        })
    }
}

/// Reads an optional boolean env var. Only a case-insensitive `true` enables
/// the flag; anything else, including an unset var, is `false`.
fn env_flag(name: &str) -> bool {
    match var(name) {
        Ok(v) => v.eq_ignore_ascii_case("true"),
        Err(_) => false,
    }
}

/// Validates the device host[:port] to prevent URL injection and SSRF.
///
/// Accepts `localhost`, an IPv4 address, or an RFC 1123 DNS name, with an
/// optional `:port` in 1-65535. Rejects anything containing `@ / \ ? #`
/// and anything with more than one `:` segment.
pub fn is_valid_api_host(host: &str) -> bool {
    if host.is_empty() || host.contains(['@', '/', '\\', '?', '#']) {
        return false;
    }

    let (name, port) = match host.split_once(':') {
        Some((name, port)) => {
            // only a single host:port split is supported
            if port.contains(':') {
                return false;
            }
            (name, Some(port))
        }
        None => (host, None),
    };

    if let Some(port) = port {
        match port.parse::<u32>() {
            Ok(p) if (1..=65535).contains(&p) => {}
            _ => return false,
        }
    }

    if name == "localhost" || Ipv4Addr::from_str(name).is_ok() {
        return true;
    }

    // the regex crate has no lookahead, so the total-length cap is separate
    if name.len() > 253 {
        return false;
    }
    let dns = DNS_HOST_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
            .expect("Invalid DNS host regex. It's a bug.")
    });
    dns.is_match(name)
}
