// src/engine/common.rs
//
// Common utilities shared across engine modules.

use crate::error::{Result, ShrinkImageError};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run a codec closure under the global panic policy.
///
/// The FFI-backed codecs (mozjpeg, libwebp) can abort the process if a panic
/// unwinds across the boundary; catching here turns a codec panic into a
/// reportable `InternalPanic` instead. The stage label ends up in the error
/// message (e.g. "encode:jpeg").
pub fn run_with_panic_policy<T>(
    stage: &'static str,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            Err(ShrinkImageError::internal_panic(format!(
                "{stage}: {message}"
            )))
        }
    }
}
