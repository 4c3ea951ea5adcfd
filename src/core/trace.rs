//! Diagnostic trace capture.
//!
//! Failures are reported to callers with the full error chain and a stack
//! backtrace, so tool bugs can be diagnosed from the response body alone.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt::Write;

/// Render an error chain plus a backtrace.
///
/// anyhow only captures a backtrace when `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE`
/// is set; otherwise one is forced here, at the point the failure is observed.
pub fn capture(err: &anyhow::Error) -> String {
    let mut trace = format!("{err:?}");
    if err.backtrace().status() != BacktraceStatus::Captured {
        let _ = write!(&mut trace, "\n\nStack backtrace:\n{}", Backtrace::force_capture());
    }
    trace
}

/// Capture a trace for any standard error.
pub fn capture_std<E>(err: E) -> String
where
    E: std::error::Error + Send + Sync + 'static,
{
    capture(&anyhow::Error::new(err))
}
