//! Progress and diagnostics channel.

/// Receives progress and status text from long-running operations.
///
/// The mask engine never constructs one; the host passes it through so that
/// recoverable failures (missing linked mask, unreadable external file) can
/// be surfaced to the user without aborting the render.
pub trait ProgressListener {
    /// Fractional progress in 0..1.
    fn set_progress(&self, progress: f64);

    /// Free-form status line.
    fn set_progress_str(&self, status: &str);

    /// Non-fatal error report. Defaults to a status line.
    fn error(&self, description: &str) {
        self.set_progress_str(description);
    }
}

/// Report `description` to `listener` if one is attached.
pub(crate) fn report_error(listener: Option<&dyn ProgressListener>, description: &str) {
    if let Some(listener) = listener {
        listener.error(description);
    }
}
