use std::fmt;
use std::str::FromStr;

use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt as fmt_layer};

use crate::session_layer::{SessionEventLayer, SessionLogEvent};

const DEFAULT_FILTER: &str = "info";

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. `RUST_LOG` overrides the `info` default.
///
/// Log lines go to stderr so command output on stdout stays clean.
pub fn init_tracing(format: LogFormat) -> Result<(), TryInitError> {
    install(format)
}

/// Streams newsjob events to the returned channel instead of writing log lines.
///
/// Interactive front ends use this so log output does not tear the prompt.
pub fn init_tracing_with_events() -> Result<mpsc::UnboundedReceiver<SessionLogEvent>, TryInitError>
{
    let (layer, receiver) = SessionEventLayer::channel();
    tracing_subscriber::registry()
        .with(env_filter())
        .with(layer)
        .try_init()?;
    Ok(receiver)
}

fn install(format: LogFormat) -> Result<(), TryInitError> {
    let (pretty, json) = match format {
        LogFormat::Pretty => (
            Some(
                fmt_layer::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(fmt_layer::layer().json().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(pretty)
        .with(json)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_format() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::default().to_string(), "pretty");
    }
}
