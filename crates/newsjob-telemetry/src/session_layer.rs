//! Tracing layer that streams session log events to a channel.
//!
//! The REPL subscribes to it to show what the sessions are doing while the
//! player types. Only events whose target starts with `newsjob` are sent.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

use crate::init::LogFormat;

const TARGET_PREFIX: &str = "newsjob";

/// A log event emitted by one of the newsjob crates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionLogEvent {
    /// Event target (e.g., "newsjob_core::session::payout")
    pub target: String,
    /// Log level (INFO, DEBUG, WARN, ERROR)
    pub level: String,
    pub message: String,
    /// Structured fields of the event (session_id, actor, ...)
    pub fields: HashMap<String, Value>,
    /// Fields of the enclosing spans, outermost first
    pub span: HashMap<String, Value>,
    pub timestamp: String,
}

impl SessionLogEvent {
    /// The `session_id` field, from the event or its spans.
    pub fn session_id(&self) -> Option<&str> {
        self.fields
            .get("session_id")
            .or_else(|| self.span.get("session_id"))
            .and_then(Value::as_str)
    }

    /// One display line in the given format. Fields are sorted by name.
    pub fn render(&self, format: LogFormat) -> String {
        match format {
            LogFormat::Json => serde_json::to_string(self)
                .unwrap_or_else(|err| format!("{{\"error\":\"{err}\"}}")),
            LogFormat::Pretty => {
                let mut fields: Vec<_> = self.fields.iter().collect();
                fields.sort_by(|a, b| a.0.cmp(b.0));
                let mut line = format!("[{}] {}", self.level, self.message);
                for (name, value) in fields {
                    match value.as_str() {
                        Some(text) => line.push_str(&format!(" {name}={text}")),
                        None => line.push_str(&format!(" {name}={value}")),
                    }
                }
                line
            }
        }
    }
}

/// Span fields recorded when the span is created.
struct SpanFields(HashMap<String, Value>);

/// Sends every newsjob event to an unbounded channel.
pub struct SessionEventLayer {
    sender: mpsc::UnboundedSender<SessionLogEvent>,
}

impl SessionEventLayer {
    pub fn new(sender: mpsc::UnboundedSender<SessionLogEvent>) -> Self {
        Self { sender }
    }

    /// Creates a layer together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionLogEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl<S> Layer<S> for SessionEventLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let target = event.metadata().target();
        if !target.starts_with(TARGET_PREFIX) {
            return;
        }

        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));

        let mut span_fields = HashMap::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(stored) = span.extensions().get::<SpanFields>() {
                    span_fields.extend(stored.0.clone());
                }
            }
        }

        let message = fields
            .remove("message")
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default();

        let session_event = SessionLogEvent {
            target: target.to_string(),
            level: event.metadata().level().to_string(),
            message,
            fields,
            span: span_fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        // Nobody listening is fine.
        let _ = self.sender.send(session_event);
    }
}

/// Field visitor that extracts tracing fields into a HashMap
struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(
            field.name().to_string(),
            serde_json::json!(format!("{:?}", value)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_forwards_only_newsjob_events() {
        let (layer, mut receiver) = SessionEventLayer::channel();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "newsjob_core::session", minutes = 3u64, "Upload paid");
            tracing::info!(target: "hyper::client", "unrelated");
        });

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.target, "newsjob_core::session");
        assert_eq!(event.level, "INFO");
        assert_eq!(event.message, "Upload paid");
        assert_eq!(event.fields["minutes"], serde_json::json!(3));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_render_pretty_and_json() {
        let event = SessionLogEvent {
            target: "newsjob_core::session".to_string(),
            level: "INFO".to_string(),
            message: "Upload paid".to_string(),
            fields: HashMap::from([
                ("minutes".to_string(), serde_json::json!(2)),
                ("actor".to_string(), serde_json::json!("actor-1")),
            ]),
            span: HashMap::new(),
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
        };

        assert_eq!(
            event.render(LogFormat::Pretty),
            "[INFO] Upload paid actor=actor-1 minutes=2"
        );
        let json: Value = serde_json::from_str(&event.render(LogFormat::Json)).unwrap();
        assert_eq!(json["message"], "Upload paid");
        assert_eq!(json["fields"]["minutes"], 2);
    }

    #[test]
    fn test_session_id_comes_from_span() {
        let (layer, mut receiver) = SessionEventLayer::channel();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("shift", session_id = "abc-123");
            let _guard = span.enter();
            tracing::warn!(target: "newsjob_application", "Command rejected");
        });

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.session_id(), Some("abc-123"));
        assert_eq!(event.level, "WARN");
    }
}
