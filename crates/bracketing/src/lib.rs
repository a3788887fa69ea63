// [crates/bracketing/src/lib.rs]
//! Capture-timestamp bracketing: turns a bag of file metadata records into
//! an ordered sequence of exposure brackets.
//!
//! Pure and synchronous: no network or filesystem access. `exif` reads
//! already-fetched bytes; `aggregate` and `group` operate on in-memory
//! records.

pub mod aggregate;
pub mod error;
pub mod exif;
pub mod group;

pub use aggregate::group_from_aggregated_json;
pub use error::BracketingError;
pub use exif::extract_capture_time;
pub use group::group;
