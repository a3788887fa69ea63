// [crates/notify/src/event.rs]
use crate::level::VerbosityLevel;

/// Event severity, independent of verbosity: `Error` events are always
/// delivered regardless of level (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSeverity {
    Info,
    Error,
}

/// Job lifecycle events, always delivered regardless of level, plus
/// dispatch failures, storage connection failures, enhancement request
/// successes, and finalize entry (§4.6).
const CRITICAL_EVENTS: &[&str] = &[
    "job_started",
    "job_completed",
    "job_failed",
    "job_partial_success",
    "dispatch_failed",
    "storage_connection_failed",
    "enhancement_requested",
    "finalize_entered",
];

/// Suppressed below `verbose`: status polls, upload attempt traces, token
/// refresh attempts, retry bookkeeping (§4.6).
const VERBOSE_ONLY_EVENTS: &[&str] = &[
    "status_poll",
    "upload_attempt",
    "token_refresh_attempt",
    "retry_scheduled",
    "bracket_grouped",
];

/// At `minimal`, delivered in addition to critical events (§4.6).
const MINIMAL_MILESTONE_EVENTS: &[&str] = &["bracket_processed", "file_downloaded"];

/// Event-name tag for the business-class job-result callback, unfiltered
/// by verbosity (§4.6). Carried under the `event` key; the payload's
/// `status` field still carries the job's real lifecycle status.
pub const JOB_RESULT_EVENT: &str = "job_result";

pub fn is_critical(event_name: &str) -> bool {
    CRITICAL_EVENTS.contains(&event_name)
}

pub fn is_verbose_only(event_name: &str) -> bool {
    VERBOSE_ONLY_EVENTS.contains(&event_name)
}

/// Decides whether an event should be delivered at the given level
/// (§4.6). `send_job_result` bypasses this function entirely; callers
/// use a dedicated always-deliver path for it.
pub fn should_deliver(event_name: &str, severity: EventSeverity, level: VerbosityLevel) -> bool {
    if severity == EventSeverity::Error {
        return true;
    }
    if is_critical(event_name) {
        return true;
    }
    if is_verbose_only(event_name) {
        return level >= VerbosityLevel::Verbose;
    }
    match level {
        VerbosityLevel::ErrorsOnly => false,
        VerbosityLevel::Minimal => MINIMAL_MILESTONE_EVENTS.contains(&event_name),
        VerbosityLevel::Standard | VerbosityLevel::Verbose => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_severity_always_delivers() {
        assert!(should_deliver(
            "anything",
            EventSeverity::Error,
            VerbosityLevel::ErrorsOnly
        ));
    }

    #[test]
    fn critical_events_bypass_errors_only() {
        assert!(should_deliver(
            "job_completed",
            EventSeverity::Info,
            VerbosityLevel::ErrorsOnly
        ));
    }

    #[test]
    fn verbose_only_events_are_suppressed_below_verbose() {
        assert!(!should_deliver(
            "status_poll",
            EventSeverity::Info,
            VerbosityLevel::Standard
        ));
        assert!(should_deliver(
            "status_poll",
            EventSeverity::Info,
            VerbosityLevel::Verbose
        ));
    }

    #[test]
    fn minimal_only_delivers_milestones_and_critical() {
        assert!(should_deliver(
            "bracket_processed",
            EventSeverity::Info,
            VerbosityLevel::Minimal
        ));
        assert!(!should_deliver(
            "file_downloaded".replace("_downloaded", "_touched").as_str(),
            EventSeverity::Info,
            VerbosityLevel::Minimal
        ));
    }
}
