//! Structured logging via `tracing`
//!
//! - Level-based filtering, overridable with `RUST_LOG`
//! - Spans for stage timing
//! - Idempotent initialization (tests and the binary may both call it)

use std::sync::Once;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub default_level: LogLevel,
    pub module_filters: Vec<(String, LogLevel)>,
    pub show_targets: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Info,
            module_filters: vec![
                ("meso_fetcher".to_string(), LogLevel::Info),
                ("sqlx".to_string(), LogLevel::Warn),
            ],
            show_targets: false,
        }
    }
}

impl TracingConfig {
    pub fn to_env_filter_string(&self) -> String {
        let mut parts = vec![self.default_level.as_str().to_string()];
        for (module, level) in &self.module_filters {
            parts.push(format!("{}={}", module, level.as_str()));
        }
        parts.join(",")
    }
}

static TRACING_INIT: Once = Once::new();

pub fn init_tracing_default() {
    init_tracing(&TracingConfig::default());
}

/// Initialize tracing (first call wins)
pub fn init_tracing(config: &TracingConfig) {
    let filter_str = config.to_env_filter_string();
    let show_targets = config.show_targets;
    TRACING_INIT.call_once(move || {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(show_targets)
            .with_level(true)
            .compact();

        // A test harness may already have installed one
        let _ = subscriber.try_init();
    });
}

/// Named span for one pipeline stage; logs its duration on drop.
/// Not entered, so it can be held across `.await`.
pub struct TimingSpan {
    span: tracing::Span,
    started: Instant,
}

impl TimingSpan {
    pub fn new(name: &'static str) -> Self {
        Self {
            span: tracing::info_span!("stage", name = name),
            started: Instant::now(),
        }
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

impl Drop for TimingSpan {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        self.span.in_scope(|| tracing::debug!(elapsed_ms, "stage finished"));
    }
}
