use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Env var naming an optional JSON config file
pub const CONFIG_PATH_VAR: &str = "HEART_MORPH_CONFIG";
pub const SEED_VAR: &str = "HEART_MORPH_SEED";
pub const PARTICLES_VAR: &str = "HEART_MORPH_PARTICLES";

/// Runtime knobs. Every default reproduces the stock animation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub particle_count: usize,
    /// Fixed RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
    pub theme_interval_ms: u64,
    /// `None` disables the redirect
    pub redirect_after_ms: Option<u64>,
    pub redirect_target: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_pixel_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            particle_count: 10_000,
            seed: None,
            theme_interval_ms: 5_000,
            redirect_after_ms: Some(12_000),
            redirect_target: "Heart.html".to_string(),
            window_width: 1280,
            window_height: 720,
            max_pixel_ratio: 2.0,
        }
    }
}

impl Config {
    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Defaults, then the file named by `HEART_MORPH_CONFIG`, then single-value overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => {
                log::info!("Loading config from {}", path);
                Self::from_file(Path::new(&path))?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()
    }

    /// Apply `HEART_MORPH_*` overrides looked up through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(SEED_VAR) {
            self.seed = Some(parse_var(SEED_VAR, &raw)?);
        }
        if let Some(raw) = lookup(PARTICLES_VAR) {
            self.particle_count = parse_var(PARTICLES_VAR, &raw)?;
        }
        Ok(())
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::Invalid("particle_count must be at least 1".into()));
        }
        if self.theme_interval_ms == 0 {
            return Err(ConfigError::Invalid("theme_interval_ms must be positive".into()));
        }
        if !(self.max_pixel_ratio.is_finite() && self.max_pixel_ratio > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_pixel_ratio must be a positive number, got {}",
                self.max_pixel_ratio
            )));
        }
        Ok(self)
    }

    pub fn theme_interval(&self) -> Duration {
        Duration::from_millis(self.theme_interval_ms)
    }

    pub fn redirect_after(&self) -> Option<Duration> {
        self.redirect_after_ms.map(Duration::from_millis)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::BadVar {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_animation() {
        let config = Config::default();
        assert_eq!(config.particle_count, 10_000);
        assert_eq!(config.theme_interval(), Duration::from_secs(5));
        assert_eq!(config.redirect_after(), Some(Duration::from_secs(12)));
        assert_eq!(config.redirect_target, "Heart.html");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json_str(r#"{ "seed": 42, "redirect_after_ms": null }"#).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.redirect_after(), None);
        assert_eq!(config.particle_count, 10_000);
    }

    #[test]
    fn rejects_empty_cloud() {
        let err = Config::from_json_str(r#"{ "particle_count": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unusable_pixel_ratio() {
        for json in [r#"{ "max_pixel_ratio": 0 }"#, r#"{ "max_pixel_ratio": -1.5 }"#] {
            let err = Config::from_json_str(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{json}");
        }
        let nan = Config {
            max_pixel_ratio: f64::NAN,
            ..Config::default()
        };
        assert!(matches!(nan.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config
            .apply_overrides(|key| match key {
                SEED_VAR => Some("7".into()),
                PARTICLES_VAR => Some(" 400 ".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.particle_count, 400);
    }

    #[test]
    fn bad_override_is_reported() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|key| (key == SEED_VAR).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::BadVar { .. }));
    }
}
