use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// How a pick was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickMethod {
    Generator,
    RandomPicker,
    BallDrop,
}

impl PickMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickMethod::Generator => "generator",
            PickMethod::RandomPicker => "random_picker",
            PickMethod::BallDrop => "ball_drop",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PickMethod::Generator => "Algorithm Generator",
            PickMethod::RandomPicker => "Random Picker",
            PickMethod::BallDrop => "Ball Drop Game",
        }
    }
}

impl std::str::FromStr for PickMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "generator" => Ok(PickMethod::Generator),
            "random_picker" => Ok(PickMethod::RandomPicker),
            "ball_drop" => Ok(PickMethod::BallDrop),
            other => bail!("Unknown pick method '{other}'"),
        }
    }
}

impl std::fmt::Display for PickMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_iterations: u64,
    pub elapsed_seconds: f64,
}

/// An entry as handed to the store, before it gets an id and a timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHistoryEntry {
    pub method: PickMethod,
    pub preset: Option<String>,
    pub main_numbers: Vec<u32>,
    pub secondary_numbers: Vec<u32>,
    pub stats: Option<HistoryStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub timestamp: String,
    pub method: PickMethod,
    pub preset: Option<String>,
    pub main_numbers: Vec<u32>,
    pub secondary_numbers: Vec<u32>,
    pub stats: Option<HistoryStats>,
}
