use serde::{Deserialize, Serialize};

use crate::config::{DrawConfig, GamePreset};
use crate::engine::{Engine, SelectionResult};
use crate::error::{EngineError, Result};

fn default_main_count() -> i64 {
    GamePreset::Powerball.layout().0 as i64
}

fn default_main_max() -> i64 {
    GamePreset::Powerball.layout().1 as i64
}

fn default_secondary_count() -> i64 {
    GamePreset::Powerball.layout().2 as i64
}

fn default_secondary_max() -> i64 {
    GamePreset::Powerball.layout().3 as i64
}

/// Caller-facing request. Counts are signed so that bad input reaches validation
/// instead of failing deserialization with an unhelpful message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub prior_numbers: Vec<i64>,
    pub generation_strings: Vec<String>,
    #[serde(default = "default_main_count")]
    pub main_count: i64,
    #[serde(default = "default_main_max")]
    pub main_max: i64,
    #[serde(default = "default_secondary_count")]
    pub secondary_count: i64,
    #[serde(default = "default_secondary_max")]
    pub secondary_max: i64,
    #[serde(default)]
    pub bias: i64,
}

impl GenerateRequest {
    pub fn for_preset(preset: GamePreset, generation_strings: Vec<String>) -> Self {
        let (main_count, main_max, secondary_count, secondary_max) = preset.layout();
        Self {
            prior_numbers: Vec::new(),
            generation_strings,
            main_count: main_count as i64,
            main_max: main_max as i64,
            secondary_count: secondary_count as i64,
            secondary_max: secondary_max as i64,
            bias: 0,
        }
    }

    pub fn draw_config(&self) -> Result<DrawConfig> {
        DrawConfig::new(self.main_count, self.main_max, self.secondary_count, self.secondary_max)
    }

    /// Request-level checks that go beyond [`DrawConfig::new`].
    pub fn validate(&self) -> Result<DrawConfig> {
        if self.generation_strings.is_empty() {
            return Err(EngineError::invalid("generationStrings must contain at least one string"));
        }
        self.draw_config()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub main_numbers: Vec<u32>,
    pub secondary_numbers: Vec<u32>,
    pub total_iterations: u64,
    pub elapsed_millis: u64,
    pub elapsed_seconds: f64,
}

impl From<&SelectionResult> for GenerateResponse {
    fn from(result: &SelectionResult) -> Self {
        Self {
            main_numbers: result.main_numbers.clone(),
            secondary_numbers: result.secondary_numbers.clone(),
            total_iterations: result.total_iterations,
            elapsed_millis: result.elapsed_millis(),
            elapsed_seconds: result.elapsed_seconds(),
        }
    }
}

/// Validates, runs and shapes the response. Nothing partial is ever returned.
pub fn generate(engine: &Engine, request: &GenerateRequest) -> Result<GenerateResponse> {
    let draw = request.validate()?;
    let result = engine.run(&draw, &request.generation_strings, &request.prior_numbers, request.bias)?;
    Ok(GenerateResponse::from(&result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            seed: Some(11),
            shards: Some(2),
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_request_defaults() {
        let request: GenerateRequest = serde_json::from_str(r#"{"generationStrings": ["test"]}"#).unwrap();
        assert!(request.prior_numbers.is_empty());
        assert_eq!(
            (request.main_count, request.main_max, request.secondary_count, request.secondary_max),
            (5, 69, 1, 26)
        );
        assert_eq!(request.bias, 0);
    }

    #[test]
    fn test_generate_scenario() {
        let request: GenerateRequest = serde_json::from_str(
            r#"{
                "priorNumbers": [1, 2, 3],
                "generationStrings": ["test"],
                "mainCount": 5,
                "mainMax": 69,
                "secondaryCount": 1,
                "secondaryMax": 26,
                "bias": 0
            }"#,
        )
        .unwrap();
        let response = generate(&engine(), &request).unwrap();
        assert_eq!(response.total_iterations, 70);
        assert_eq!(response.main_numbers.len(), 5);
        assert_eq!(response.secondary_numbers.len(), 1);
    }

    #[test]
    fn test_response_field_names() {
        let request = GenerateRequest::for_preset(GamePreset::Megabucks, vec!["abc".to_string()]);
        let response = generate(&engine(), &request).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        for key in ["mainNumbers", "secondaryNumbers", "totalIterations", "elapsedMillis", "elapsedSeconds"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["totalIterations"], 6);
    }

    #[test]
    fn test_empty_generation_strings_rejected() {
        let request = GenerateRequest::for_preset(GamePreset::Powerball, Vec::new());
        assert!(matches!(generate(&engine(), &request), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_negative_fields_rejected() {
        let mut request = GenerateRequest::for_preset(GamePreset::Powerball, vec!["x".to_string()]);
        request.secondary_max = -1;
        assert!(matches!(generate(&engine(), &request), Err(EngineError::InvalidConfig(_))));

        let mut request = GenerateRequest::for_preset(GamePreset::Powerball, vec!["x".to_string()]);
        request.bias = -1;
        assert!(matches!(generate(&engine(), &request), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_main_count_without_pool_rejected() {
        let mut request = GenerateRequest::for_preset(GamePreset::Powerball, vec!["x".to_string()]);
        request.main_max = 0;
        let err = generate(&engine(), &request).unwrap_err();
        assert!(err.to_string().contains("mainMax is 0"));
    }
}
