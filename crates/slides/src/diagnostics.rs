//! Where skipped-slide messages go.

use std::sync::Mutex;

/// Sink for non-fatal resolution messages. Must not fail.
pub trait Diagnostics: Send + Sync {
    fn log(&self, message: &str);
}

/// Emits each message as a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn log(&self, message: &str) {
        tracing::warn!(target: "slides", "{}", message);
    }
}

/// Keeps every message, for callers that report them afterwards.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    messages: Mutex<Vec<String>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn log(&self, message: &str) {
        if let Ok(mut guard) = self.messages.lock() {
            guard.push(message.to_string());
        }
    }
}
