// [crates/notify/src/lib.rs]
//! Verbosity-filtered webhook delivery of pipeline progress and outcome
//! events (§4.6). Pure dispatch: no retry, no queue, no persistence —
//! failures are logged and dropped.

pub mod event;
pub mod level;
pub mod notifier;

pub use event::{is_critical, is_verbose_only, should_deliver, EventSeverity};
pub use level::VerbosityLevel;
pub use notifier::WebhookNotifier;
