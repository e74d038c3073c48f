use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Default ceiling on the derived iteration count.
pub const DEFAULT_MAX_ITERATIONS: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GamePreset {
    Powerball,
    #[clap(name = "megamillions")]
    MegaMillions,
    Megabucks,
    #[clap(name = "lucky4life")]
    Lucky4Life,
    Gimme5,
}

impl GamePreset {
    pub const ALL: [GamePreset; 5] = [
        GamePreset::Powerball,
        GamePreset::MegaMillions,
        GamePreset::Megabucks,
        GamePreset::Lucky4Life,
        GamePreset::Gimme5,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            GamePreset::Powerball => "powerball",
            GamePreset::MegaMillions => "megamillions",
            GamePreset::Megabucks => "megabucks",
            GamePreset::Lucky4Life => "lucky4life",
            GamePreset::Gimme5 => "gimme5",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GamePreset::Powerball => "Powerball",
            GamePreset::MegaMillions => "Mega Millions",
            GamePreset::Megabucks => "Megabucks",
            GamePreset::Lucky4Life => "Lucky 4 Life",
            GamePreset::Gimme5 => "Gimme 5",
        }
    }

    /// (main count, main max, secondary count, secondary max)
    pub fn layout(&self) -> (u32, u32, u32, u32) {
        match self {
            GamePreset::Powerball => (5, 69, 1, 26),
            GamePreset::MegaMillions => (5, 70, 1, 25),
            GamePreset::Megabucks => (5, 41, 1, 6),
            GamePreset::Lucky4Life => (5, 48, 1, 18),
            GamePreset::Gimme5 => (5, 39, 0, 0),
        }
    }

    pub fn draw_config(&self) -> DrawConfig {
        let (main_count, main_max, secondary_count, secondary_max) = self.layout();
        DrawConfig::from_parts(main_count, main_max, secondary_count, secondary_max)
    }
}

/// Shape of one simulated draw: how many numbers per pool, and each pool's upper bound.
///
/// Built through [`DrawConfig::new`], which rejects what the engine cannot draw.
/// A secondary pool with max 0 is an absent pool and its count is forced to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawConfig {
    main_count: u32,
    main_max: u32,
    secondary_count: u32,
    secondary_max: u32,
}

fn non_negative(name: &str, value: i64) -> Result<u32> {
    if value < 0 {
        return Err(EngineError::invalid(format!("{name} is negative ({value})")));
    }
    u32::try_from(value)
        .map_err(|_| EngineError::invalid(format!("{name} is too large ({value})")))
}

impl DrawConfig {
    pub fn new(main_count: i64, main_max: i64, secondary_count: i64, secondary_max: i64) -> Result<Self> {
        let main_count = non_negative("mainCount", main_count)?;
        let main_max = non_negative("mainMax", main_max)?;
        let secondary_count = non_negative("secondaryCount", secondary_count)?;
        let secondary_max = non_negative("secondaryMax", secondary_max)?;

        if main_count > 0 && main_max == 0 {
            return Err(EngineError::invalid(format!(
                "cannot draw {main_count} main numbers from an empty pool (mainMax is 0)"
            )));
        }

        Ok(Self::from_parts(main_count, main_max, secondary_count, secondary_max))
    }

    fn from_parts(main_count: u32, main_max: u32, secondary_count: u32, secondary_max: u32) -> Self {
        let secondary_count = if secondary_max == 0 { 0 } else { secondary_count };
        Self {
            main_count,
            main_max,
            secondary_count,
            secondary_max,
        }
    }

    pub fn main_count(&self) -> u32 {
        self.main_count
    }

    pub fn main_max(&self) -> u32 {
        self.main_max
    }

    pub fn secondary_count(&self) -> u32 {
        self.secondary_count
    }

    pub fn secondary_max(&self) -> u32 {
        self.secondary_max
    }
}

/// Run-level knobs, loaded from JSON. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ceiling on the derived iteration count.
    pub max_iterations: u64,
    /// Worker shards; `None` uses the rayon pool size.
    pub shards: Option<usize>,
    /// Run seed; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Wall-clock bound on the simulation loop.
    pub time_limit_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            shards: None,
            seed: None,
            time_limit_secs: None,
        }
    }
}

impl EngineConfig {
    pub fn shard_count(&self) -> usize {
        match self.shards {
            Some(n) if n > 0 => n,
            _ => rayon::current_num_threads().max(1),
        }
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(Duration::from_secs)
    }
}

pub fn save_config(config: &EngineConfig, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let json = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&json)?;
    Ok(config)
}
