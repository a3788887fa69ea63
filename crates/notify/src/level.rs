// [crates/notify/src/level.rs]
use serde::{Deserialize, Serialize};

/// Caller-supplied delivery verbosity, ordered `errors_only < minimal <
/// standard < verbose` (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbosityLevel {
    ErrorsOnly,
    Minimal,
    Standard,
    Verbose,
}

impl VerbosityLevel {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            Some("errors_only") => VerbosityLevel::ErrorsOnly,
            Some("minimal") => VerbosityLevel::Minimal,
            Some("verbose") => VerbosityLevel::Verbose,
            _ => VerbosityLevel::Standard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_errors_only_below_verbose() {
        assert!(VerbosityLevel::ErrorsOnly < VerbosityLevel::Minimal);
        assert!(VerbosityLevel::Minimal < VerbosityLevel::Standard);
        assert!(VerbosityLevel::Standard < VerbosityLevel::Verbose);
    }

    #[test]
    fn unknown_or_absent_level_defaults_to_standard() {
        assert_eq!(VerbosityLevel::parse(None), VerbosityLevel::Standard);
        assert_eq!(VerbosityLevel::parse(Some("garbage")), VerbosityLevel::Standard);
    }
}
