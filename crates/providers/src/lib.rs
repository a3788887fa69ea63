// [crates/providers/src/lib.rs]
//! Uniform provider contracts over two storage backend families and two
//! enhancement backend families, with a fixed, compile-time factory
//! registry per family (§4.2, §4.3, §9).

pub mod enhancement;
pub mod error;
pub mod file_types;
pub mod storage;

pub use enhancement::{create_enhancement_provider, EnhancementOptions, EnhancementProvider};
pub use error::ProviderError;
pub use file_types::{FileKind, RAW_HEADER_BYTES};
pub use storage::{create_storage_provider, normalize_path, StorageProvider, StorageUserInfo};
