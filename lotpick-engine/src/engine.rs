use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::{DrawConfig, EngineConfig};
use crate::derive::iteration_total;
use crate::draw::DrawSimulator;
use crate::error::{EngineError, Result};
use crate::progress::{ProgressSink, ProgressTick, log_interval};
use crate::select::top_n;
use crate::tally::{Tally, merge_all};

/// Outcome of one run. The engine keeps nothing once this is returned.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionResult {
    pub main_numbers: Vec<u32>,
    pub secondary_numbers: Vec<u32>,
    pub total_iterations: u64,
    pub elapsed: Duration,
}

impl SelectionResult {
    pub fn elapsed_millis(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// Seconds rounded to two decimals.
    pub fn elapsed_seconds(&self) -> f64 {
        (self.elapsed_millis() as f64 / 10.0).round() / 100.0
    }
}

/// Shared flag a caller flips to abandon a run in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A contiguous slice of the run's iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardPlan {
    pub index: usize,
    pub start: u64,
    pub len: u64,
}

/// Splits `total` into at most `shards` contiguous, non-empty pieces.
/// The first `total % shards` pieces take one extra iteration.
pub fn plan_shards(total: u64, shards: usize) -> Vec<ShardPlan> {
    let shards = shards.max(1) as u64;
    let base = total / shards;
    let extra = total % shards;

    let mut plans = Vec::with_capacity(shards as usize);
    let mut start = 0u64;
    for index in 0..shards {
        let len = base + u64::from(index < extra);
        if len == 0 {
            break;
        }
        plans.push(ShardPlan {
            index: index as usize,
            start,
            len,
        });
        start += len;
    }
    plans
}

/// State shared by all shards of one run.
struct RunContext<'a> {
    total: u64,
    interval: u64,
    completed: AtomicU64,
    /// Set when a shard fails; the others stop at their next chunk.
    halted: AtomicBool,
    progress: Option<&'a dyn ProgressSink>,
    cancel: &'a CancelToken,
    started: Instant,
    time_limit: Option<Duration>,
}

impl<'a> RunContext<'a> {
    fn new(
        total: u64,
        progress: Option<&'a dyn ProgressSink>,
        cancel: &'a CancelToken,
        time_limit: Option<Duration>,
    ) -> Self {
        Self {
            total,
            interval: log_interval(total),
            completed: AtomicU64::new(0),
            halted: AtomicBool::new(false),
            progress,
            cancel,
            started: Instant::now(),
            time_limit,
        }
    }

    /// Books `done` finished iterations and returns the run-wide count.
    /// `done` never exceeds the interval, so at most one report boundary is
    /// crossed per call.
    fn checkpoint(&self, done: u64) -> u64 {
        let before = self.completed.fetch_add(done, Ordering::Relaxed);
        let after = before + done;

        if let Some(sink) = self.progress {
            if after / self.interval > before / self.interval {
                sink.report(ProgressTick {
                    iteration: after / self.interval * self.interval,
                    total: self.total,
                });
            }
        }
        after
    }

    fn check_bounds(&self, completed: u64) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled {
                completed,
                total: self.total,
            });
        }
        if let Some(limit) = self.time_limit {
            if self.started.elapsed() >= limit {
                return Err(EngineError::TimedOut {
                    limit,
                    completed,
                    total: self.total,
                });
            }
        }
        Ok(())
    }
}

/// Tallies one shard. `Ok(None)` means the shard stopped because a sibling failed.
fn run_shard(sim: &DrawSimulator, plan: ShardPlan, seed: u64, ctx: &RunContext<'_>) -> Result<Option<Tally>> {
    ctx.check_bounds(ctx.completed.load(Ordering::Relaxed))?;

    let config = sim.config();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(plan.index as u64);

    let mut tally = Tally::new(config.main_max(), config.secondary_max())?;

    let mut remaining = plan.len;
    while remaining > 0 {
        if ctx.halted.load(Ordering::Relaxed) {
            return Ok(None);
        }
        let chunk = remaining.min(ctx.interval);
        for _ in 0..chunk {
            sim.record_into(&mut rng, &mut tally);
        }
        remaining -= chunk;
        let completed = ctx.checkpoint(chunk);
        // Bounds only stop work still to do; a finished slice is kept.
        if remaining > 0 {
            ctx.check_bounds(completed)?;
        }
    }

    Ok(Some(tally))
}

/// Runs popularity simulations with a fixed [`EngineConfig`].
///
/// An `Engine` holds no per-run state: every call to [`Engine::run`] allocates
/// its own tables and random streams, so one engine can serve many requests.
pub struct Engine {
    config: EngineConfig,
    progress: Option<Arc<dyn ProgressSink>>,
    cancel: CancelToken,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            progress: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Derives the iteration count and enforces the ceiling. No draw happens here.
    pub fn iteration_count<S: AsRef<str>>(&self, strings: &[S], prior_numbers: &[i64], bias: i64) -> Result<u64> {
        let requested = iteration_total(strings, prior_numbers, bias)?;
        let ceiling = self.config.max_iterations;
        if requested > u128::from(ceiling) {
            return Err(EngineError::ExcessiveIterations { requested, ceiling });
        }
        Ok(requested as u64)
    }

    pub fn run<S: AsRef<str>>(
        &self,
        draw: &DrawConfig,
        strings: &[S],
        prior_numbers: &[i64],
        bias: i64,
    ) -> Result<SelectionResult> {
        let total = self.iteration_count(strings, prior_numbers, bias)?;
        log::info!("Total times to run based on calculations: {total}");
        self.run_iterations(draw, total)
    }

    /// Simulates exactly `total` draws and picks the most frequent numbers.
    pub fn run_iterations(&self, draw: &DrawConfig, total: u64) -> Result<SelectionResult> {
        let started = Instant::now();
        let tally = self.simulate(draw, total)?;

        let main_numbers = top_n(&tally.main, draw.main_count() as usize);
        let secondary_numbers = top_n(&tally.secondary, draw.secondary_count() as usize);
        let elapsed = started.elapsed();

        let result = SelectionResult {
            main_numbers,
            secondary_numbers,
            total_iterations: total,
            elapsed,
        };
        log::info!(
            "Winning numbers {:?}:{:?} after {} iterations in {:.2}s",
            result.main_numbers,
            result.secondary_numbers,
            total,
            result.elapsed_seconds()
        );
        Ok(result)
    }

    /// Runs the draw loop across shards and returns the merged tally.
    pub fn simulate(&self, draw: &DrawConfig, total: u64) -> Result<Tally> {
        let sim = DrawSimulator::new(*draw)?;
        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        let plans = plan_shards(total, self.config.shard_count());
        let ctx = RunContext::new(total, self.progress.as_deref(), &self.cancel, self.config.time_limit());
        log::info!(
            "Simulating {total} draws on {} shards, progress every {} iterations",
            plans.len(),
            ctx.interval
        );
        log::debug!("Run seed {seed}");

        let parts = plans
            .par_iter()
            .map(|plan| {
                let part = run_shard(&sim, *plan, seed, &ctx);
                if let Err(e) = &part {
                    log::debug!("Shard {} failed: {e}", plan.index);
                    ctx.halted.store(true, Ordering::Relaxed);
                }
                part
            })
            .collect::<Result<Vec<Option<Tally>>>>()?;
        // Halted shards only exist alongside a failed one, which the collect above reports.
        let parts: Vec<Tally> = parts.into_iter().flatten().collect();

        match merge_all(parts)? {
            Some(tally) => Ok(tally),
            None => Tally::new(draw.main_max(), draw.secondary_max()),
        }
    }
}
