// [crates/telemetry/src/lib.rs]
//! Tracing subscriber setup shared by every stage invocation: a dynamic
//! `EnvFilter`, dev/prod dual-mode formatting, and a panic hook that logs
//! through `tracing` instead of to stderr.

use std::panic;

use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber for `service_name`.
///
/// Development builds get compact, human-readable output; release builds
/// get flattened JSON suitable for ingestion by a log pipeline. Panics
/// set a hook that logs the panic location and message as an `error`
/// event before the thread unwinds, so a crash inside a background
/// dispatch task still leaves a trace.
///
/// Panics if a global subscriber is already set.
pub fn init_tracing(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{service_name}={level},tower_http=warn,hyper=warn",
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    if cfg!(debug_assertions) {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true))
            .init();
    }

    let service_name = service_name.to_string();
    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "unknown location".to_string());
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("no panic message");

        error!(
            target: "panic",
            service = %service_name,
            location = %location,
            "thread panicked: {message}"
        );
    }));
}
