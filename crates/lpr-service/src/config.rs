use anyhow::{ensure, Context, Result};
use std::env;

/// Service configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct LprServiceConfig {
    /// Address to bind the HTTP server to
    pub bind_addr: String,

    /// Path to the plate detection ONNX model
    pub plate_model_path: String,

    /// Path to the character detection ONNX model
    pub char_model_path: String,

    /// Confidence threshold for plate detections
    pub plate_confidence_threshold: f32,

    /// Confidence threshold for character detections
    pub char_confidence_threshold: f32,

    /// Origins allowed by the CORS layer (dashboard hosts)
    pub allowed_origins: Vec<String>,
}

impl LprServiceConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr =
            env::var("LPR_SERVICE_ADDR").unwrap_or_else(|_| "0.0.0.0:8086".to_string());

        let plate_model_path = env::var("LPR_PLATE_MODEL")
            .unwrap_or_else(|_| "models/plate_detector.onnx".to_string());
        let char_model_path =
            env::var("LPR_CHAR_MODEL").unwrap_or_else(|_| "models/char_detector.onnx".to_string());

        let plate_confidence_threshold = parse_threshold("LPR_PLATE_CONFIDENCE", 0.5)?;
        let char_confidence_threshold = parse_threshold("LPR_CHAR_CONFIDENCE", 0.25)?;

        let allowed_origins = env::var("LPR_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            bind_addr,
            plate_model_path,
            char_model_path,
            plate_confidence_threshold,
            char_confidence_threshold,
            allowed_origins,
        })
    }
}

fn parse_threshold(var: &str, default: f32) -> Result<f32> {
    match env::var(var) {
        Ok(raw) => {
            let value: f32 = raw
                .parse()
                .with_context(|| format!("invalid {}: {}", var, raw))?;
            ensure!(
                (0.0..=1.0).contains(&value),
                "{} must be within [0, 1], got {}",
                var,
                value
            );
            Ok(value)
        }
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        env::remove_var("LPR_SERVICE_ADDR");
        env::remove_var("LPR_PLATE_CONFIDENCE");
        env::remove_var("LPR_CHAR_CONFIDENCE");
        env::remove_var("LPR_ALLOWED_ORIGINS");

        let config = LprServiceConfig::from_env().unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8086");
        assert_eq!(config.plate_confidence_threshold, 0.5);
        assert_eq!(config.char_confidence_threshold, 0.25);
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn test_parse_threshold_bounds() {
        env::set_var("TEST_LPR_THRESHOLD", "0.75");
        assert_eq!(parse_threshold("TEST_LPR_THRESHOLD", 0.5).unwrap(), 0.75);

        env::set_var("TEST_LPR_THRESHOLD", "1.5");
        assert!(parse_threshold("TEST_LPR_THRESHOLD", 0.5).is_err());

        env::set_var("TEST_LPR_THRESHOLD", "not-a-number");
        assert!(parse_threshold("TEST_LPR_THRESHOLD", 0.5).is_err());

        env::remove_var("TEST_LPR_THRESHOLD");
        assert_eq!(parse_threshold("TEST_LPR_THRESHOLD", 0.5).unwrap(), 0.5);
    }
}
