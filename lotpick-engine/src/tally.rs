use crate::draw::DrawResult;
use crate::error::{EngineError, Result};

/// Per-number draw counts for one pool, indexed directly by number (`0..=max`).
///
/// Slot 0 exists so that indexing needs no offset; draws never land there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: Vec<u64>,
}

impl FrequencyTable {
    pub fn with_max(max: u32) -> Result<Self> {
        let slots = max as usize + 1;
        let mut counts = Vec::new();
        counts
            .try_reserve_exact(slots)
            .map_err(|e| EngineError::Internal(format!("cannot allocate {slots} tally slots: {e}")))?;
        counts.resize(slots, 0);
        Ok(Self { counts })
    }

    pub fn from_counts(counts: Vec<u64>) -> Self {
        Self { counts }
    }

    pub fn max(&self) -> u32 {
        self.counts.len().saturating_sub(1) as u32
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Counts one occurrence of `number`. Numbers above [`FrequencyTable::max`]
    /// are outside the pool and are ignored.
    #[inline]
    pub fn record(&mut self, number: u32) {
        if let Some(slot) = self.counts.get_mut(number as usize) {
            *slot += 1;
        }
    }

    #[inline]
    pub fn record_all(&mut self, numbers: &[u32]) {
        for &n in numbers {
            self.record(n);
        }
    }

    pub fn count(&self, number: u32) -> u64 {
        self.counts.get(number as usize).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Elementwise sum. Both tables must cover the same pool.
    pub fn merge(&mut self, other: &FrequencyTable) -> Result<()> {
        if self.counts.len() != other.counts.len() {
            return Err(EngineError::Internal(format!(
                "cannot merge a {}-slot table into a {}-slot table",
                other.counts.len(),
                self.counts.len()
            )));
        }
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        Ok(())
    }
}

/// Main and secondary tables for one run (or one shard of it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub main: FrequencyTable,
    pub secondary: FrequencyTable,
}

impl Tally {
    pub fn new(main_max: u32, secondary_max: u32) -> Result<Self> {
        Ok(Self {
            main: FrequencyTable::with_max(main_max)?,
            secondary: FrequencyTable::with_max(secondary_max)?,
        })
    }

    #[inline]
    pub fn record(&mut self, draw: &DrawResult) {
        self.main.record_all(&draw.main);
        self.secondary.record_all(&draw.secondary);
    }

    pub fn merge(&mut self, other: &Tally) -> Result<()> {
        self.main.merge(&other.main)?;
        self.secondary.merge(&other.secondary)
    }
}

/// Counts every number of every draw into `table`.
pub fn tally<'a>(table: &mut Tally, draws: impl IntoIterator<Item = &'a DrawResult>) {
    for draw in draws {
        table.record(draw);
    }
}

/// Folds shard tallies into one. Order does not matter.
pub fn merge_all(mut parts: Vec<Tally>) -> Result<Option<Tally>> {
    let Some(mut acc) = parts.pop() else {
        return Ok(None);
    };
    for part in &parts {
        acc.merge(part)?;
    }
    Ok(Some(acc))
}
