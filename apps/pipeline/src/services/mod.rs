// [apps/pipeline/src/services/mod.rs]
pub mod dispatch;
