//! Progress reporting hooks for long-running phases.

/// Receives `(label, current, total)` updates while a phase runs.
pub trait ProgressSink {
    fn report(&self, label: &str, current: usize, total: usize);
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _label: &str, _current: usize, _total: usize) {}
}

impl<F> ProgressSink for F
where
    F: Fn(&str, usize, usize),
{
    fn report(&self, label: &str, current: usize, total: usize) {
        self(label, current, total)
    }
}
