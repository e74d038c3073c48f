use rand::Rng;
use rand::distr::Uniform;

use crate::config::DrawConfig;
use crate::error::{EngineError, Result};
use crate::tally::Tally;

/// One simulated round. Numbers within a pool may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawResult {
    pub main: Vec<u32>,
    pub secondary: Vec<u32>,
}

fn buffer(count: u32) -> Result<Vec<u32>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(count as usize)
        .map_err(|e| EngineError::Internal(format!("cannot allocate a {count}-number draw: {e}")))?;
    Ok(buf)
}

impl DrawResult {
    pub fn with_capacity(config: &DrawConfig) -> Result<Self> {
        Ok(Self {
            main: buffer(config.main_count())?,
            secondary: buffer(config.secondary_count())?,
        })
    }
}

fn pool_distribution(count: u32, max: u32) -> Result<Option<Uniform<u32>>> {
    if count == 0 || max == 0 {
        return Ok(None);
    }
    Uniform::new_inclusive(1, max)
        .map(Some)
        .map_err(|e| EngineError::Internal(format!("sampler for 1..={max}: {e}")))
}

/// Samples draws for a fixed [`DrawConfig`]; the distributions are built once per run.
#[derive(Debug, Clone)]
pub struct DrawSimulator {
    config: DrawConfig,
    main: Option<Uniform<u32>>,
    secondary: Option<Uniform<u32>>,
}

impl DrawSimulator {
    pub fn new(config: DrawConfig) -> Result<Self> {
        Ok(Self {
            main: pool_distribution(config.main_count(), config.main_max())?,
            secondary: pool_distribution(config.secondary_count(), config.secondary_max())?,
            config,
        })
    }

    pub fn config(&self) -> &DrawConfig {
        &self.config
    }

    /// Overwrites `out` with a fresh draw, reusing its buffers.
    pub fn draw_into<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut DrawResult) {
        out.main.clear();
        if let Some(dist) = self.main {
            out.main.extend((0..self.config.main_count()).map(|_| rng.sample(dist)));
        }
        out.secondary.clear();
        if let Some(dist) = self.secondary {
            out.secondary.extend((0..self.config.secondary_count()).map(|_| rng.sample(dist)));
        }
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<DrawResult> {
        let mut out = DrawResult::with_capacity(&self.config)?;
        self.draw_into(rng, &mut out);
        Ok(out)
    }

    /// Draws one round straight into `tally`, without materializing it.
    ///
    /// Consumes the rng exactly like [`DrawSimulator::draw_into`].
    #[inline]
    pub fn record_into<R: Rng + ?Sized>(&self, rng: &mut R, tally: &mut Tally) {
        if let Some(dist) = self.main {
            for _ in 0..self.config.main_count() {
                tally.main.record(rng.sample(dist));
            }
        }
        if let Some(dist) = self.secondary {
            for _ in 0..self.config.secondary_count() {
                tally.secondary.record(rng.sample(dist));
            }
        }
    }
}

pub fn simulate_draw<R: Rng + ?Sized>(config: &DrawConfig, rng: &mut R) -> Result<DrawResult> {
    DrawSimulator::new(*config)?.draw(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::config::GamePreset;

    #[test]
    fn test_draw_lengths_and_ranges() {
        let config = GamePreset::Powerball.draw_config();
        let sim = DrawSimulator::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let draw = sim.draw(&mut rng).unwrap();
            assert_eq!(draw.main.len(), 5);
            assert_eq!(draw.secondary.len(), 1);
            assert!(draw.main.iter().all(|&n| (1..=69).contains(&n)));
            assert!(draw.secondary.iter().all(|&n| (1..=26).contains(&n)));
        }
    }

    #[test]
    fn test_empty_pools() {
        let mut rng = StdRng::seed_from_u64(1);

        let no_main = DrawConfig::new(0, 69, 1, 26).unwrap();
        let draw = simulate_draw(&no_main, &mut rng).unwrap();
        assert!(draw.main.is_empty());
        assert_eq!(draw.secondary.len(), 1);

        let zero_max = DrawConfig::new(0, 0, 0, 0).unwrap();
        let draw = simulate_draw(&zero_max, &mut rng).unwrap();
        assert!(draw.main.is_empty());
        assert!(draw.secondary.is_empty());

        let gimme = GamePreset::Gimme5.draw_config();
        let draw = simulate_draw(&gimme, &mut rng).unwrap();
        assert_eq!(draw.main.len(), 5);
        assert!(draw.secondary.is_empty());
    }

    #[test]
    fn test_samples_may_repeat() {
        // 10 picks out of 1..=2 must repeat.
        let config = DrawConfig::new(10, 2, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let draw = simulate_draw(&config, &mut rng).unwrap();
        assert_eq!(draw.main.len(), 10);
        assert!(draw.main.iter().all(|&n| n == 1 || n == 2));
    }

    #[test]
    fn test_max_one_always_draws_one() {
        let config = DrawConfig::new(3, 1, 2, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let draw = simulate_draw(&config, &mut rng).unwrap();
        assert_eq!(draw.main, vec![1, 1, 1]);
        assert_eq!(draw.secondary, vec![1, 1]);
    }

    #[test]
    fn test_seeded_draws_reproducible() {
        let sim = DrawSimulator::new(GamePreset::MegaMillions.draw_config()).unwrap();
        let mut rng1 = StdRng::seed_from_u64(2024);
        let mut rng2 = StdRng::seed_from_u64(2024);
        for _ in 0..50 {
            assert_eq!(sim.draw(&mut rng1).unwrap(), sim.draw(&mut rng2).unwrap());
        }
    }

    #[test]
    fn test_draw_into_reuses_buffer() {
        let sim = DrawSimulator::new(GamePreset::Powerball.draw_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut out = DrawResult::with_capacity(sim.config()).unwrap();
        for _ in 0..10 {
            sim.draw_into(&mut rng, &mut out);
            assert_eq!(out.main.len(), 5);
            assert_eq!(out.secondary.len(), 1);
        }
    }

    #[test]
    fn test_record_into_matches_draw_into() {
        let config = GamePreset::Powerball.draw_config();
        let sim = DrawSimulator::new(config).unwrap();
        let mut direct = Tally::new(config.main_max(), config.secondary_max()).unwrap();
        let mut buffered = direct.clone();

        let mut rng1 = StdRng::seed_from_u64(31);
        let mut rng2 = StdRng::seed_from_u64(31);
        let mut out = DrawResult::default();
        for _ in 0..500 {
            sim.record_into(&mut rng1, &mut direct);
            sim.draw_into(&mut rng2, &mut out);
            buffered.record(&out);
        }
        assert_eq!(direct, buffered);
        assert_eq!(direct.main.total(), 2_500);
    }

    #[test]
    fn test_large_count_needs_no_draw_buffer() {
        // Far more numbers per draw than the pool holds; only the tally is allocated.
        let config = DrawConfig::new(1_000_000, 3, 0, 0).unwrap();
        let sim = DrawSimulator::new(config).unwrap();
        let mut tally = Tally::new(3, 0).unwrap();
        sim.record_into(&mut StdRng::seed_from_u64(8), &mut tally);
        assert_eq!(tally.main.total(), 1_000_000);
        assert_eq!(tally.main.count(0), 0);
    }

    #[test]
    fn test_roughly_uniform() {
        let config = DrawConfig::new(1, 6, 0, 0).unwrap();
        let sim = DrawSimulator::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(77);
        let mut counts = [0u32; 7];
        for _ in 0..60_000 {
            counts[sim.draw(&mut rng).unwrap().main[0] as usize] += 1;
        }
        assert_eq!(counts[0], 0);
        for &c in &counts[1..] {
            assert!((9_000..11_000).contains(&c), "count {c} too far from 10000");
        }
    }
}
