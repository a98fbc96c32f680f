//! Routes records through `tracing`.
//!
//! A record becomes an event on the [`TARGET`] target carrying `channel`,
//! `user`, `severity` and `message` fields. [`SinkLayer`] turns such events
//! back into records and hands them to a [`LogSink`].

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

use crate::error::LogError;
use crate::level::Level;
use crate::sink::{LogRecord, LogSink};

pub const TARGET: &str = "emeset_logs";

/// Emits `record` as a `tracing` event.
pub fn emit(record: &LogRecord) {
    let severity = u64::from(record.level.value());
    macro_rules! event_at {
        ($lvl:expr) => {
            tracing::event!(
                target: TARGET,
                $lvl,
                channel = record.channel.as_str(),
                user = record.user.as_str(),
                severity,
                message = record.message.as_str()
            )
        };
    }
    match record.level {
        Level::Info | Level::Notice => event_at!(tracing::Level::INFO),
        Level::Warning => event_at!(tracing::Level::WARN),
        _ => event_at!(tracing::Level::ERROR),
    }
}

/// Writes `record` through a scoped subscriber whose only layer feeds `sink`.
///
/// Any globally installed subscriber is bypassed for the duration of the
/// call.
pub fn dispatch(sink: Arc<dyn LogSink>, record: &LogRecord) -> Result<(), LogError> {
    let layer = SinkLayer::new(sink);
    let outcome = layer.outcome();
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, || emit(record));

    let taken = match outcome.lock() {
        Ok(mut slot) => slot.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    taken.unwrap_or(Err(LogError::Dropped))
}

type Outcome = Arc<Mutex<Option<Result<(), LogError>>>>;

/// Layer that writes events on [`TARGET`] to a sink.
pub struct SinkLayer {
    sink: Arc<dyn LogSink>,
    outcome: Outcome,
}

impl SinkLayer {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            outcome: Arc::new(Mutex::new(None)),
        }
    }

    /// Result of the last write.
    fn outcome(&self) -> Outcome {
        Arc::clone(&self.outcome)
    }
}

impl<S: Subscriber> Layer<S> for SinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() != TARGET {
            return;
        }
        let mut fields = RecordFields::default();
        event.record(&mut fields);

        let level = fields
            .severity
            .and_then(Level::from_value)
            .unwrap_or_default();
        let record = LogRecord::now(
            fields.channel.unwrap_or_default(),
            fields.user.unwrap_or_default(),
            level,
            fields.message.unwrap_or_default(),
        );

        let result = self.sink.write(&record);
        match self.outcome.lock() {
            Ok(mut slot) => *slot = Some(result),
            Err(poisoned) => *poisoned.into_inner() = Some(result),
        }
    }
}

#[derive(Default)]
struct RecordFields {
    channel: Option<String>,
    user: Option<String>,
    message: Option<String>,
    severity: Option<u64>,
}

impl Visit for RecordFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        let slot = match field.name() {
            "channel" => &mut self.channel,
            "user" => &mut self.user,
            "message" => &mut self.message,
            _ => return,
        };
        *slot = Some(value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "severity" {
            self.severity = Some(value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" && self.message.is_none() {
            self.message = Some(format!("{:?}", value));
        }
    }
}
