//! Application services — thing orchestration and action execution.

pub mod executor;
pub mod thing_handle;
