use indicatif::ProgressBar;

/// Progress is reported once per this many completed iterations.
pub fn log_interval(total: u64) -> u64 {
    (total / 100).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTick {
    /// Completed iterations, counted across all shards.
    pub iteration: u64,
    pub total: u64,
}

impl ProgressTick {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.iteration as f64 / self.total as f64 * 100.0
    }
}

/// Observer for a running simulation. Called from worker threads; must not block.
pub trait ProgressSink: Send + Sync {
    fn report(&self, tick: ProgressTick);
}

/// Writes `Progress: x.x% - Iteration i of n` through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, tick: ProgressTick) {
        log::info!(
            "Progress: {:.1}% - Iteration {} of {}",
            tick.percent(),
            tick.iteration,
            tick.total
        );
    }
}

impl ProgressSink for ProgressBar {
    fn report(&self, tick: ProgressTick) {
        self.set_position(tick.iteration);
    }
}

/// Adapts a closure into a [`ProgressSink`].
pub struct FnProgress<F>(pub F);

impl<F> ProgressSink for FnProgress<F>
where
    F: Fn(ProgressTick) + Send + Sync,
{
    fn report(&self, tick: ProgressTick) {
        (self.0)(tick)
    }
}
