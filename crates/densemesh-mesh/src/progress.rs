//! Progress reporting for long-running passes.

/// Receives progress updates at well-defined checkpoints.
///
/// Implementations must be cheap; they are called from the hot loop of
/// subdivision and once per camera during visibility computation.
pub trait ProgressSink: Sync {
    /// `done` out of `total` units of `stage` are finished. `total` may be an
    /// upper bound rather than an exact count.
    fn report(&self, stage: &str, done: usize, total: usize);
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _stage: &str, _done: usize, _total: usize) {}
}
