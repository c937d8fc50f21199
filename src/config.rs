//! Configuration management for gridspline.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. JSON config file
//! 3. Default values (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

use crate::error::{GridSplineError, Result};
use crate::interpolation::{BoundarySpec, InterpOptions, Method, PeriodSpec};
use crate::logging::{log_error, log_operation_end, log_operation_start};

/// Environment variable overriding the interpolation method
pub const ENV_METHOD: &str = "GRIDSPLINE_METHOD";
/// Environment variable overriding extrapolation (`true`/`false`)
pub const ENV_EXTRAPOLATE: &str = "GRIDSPLINE_EXTRAPOLATE";
/// Environment variable overriding the cardinal tension
pub const ENV_TENSION: &str = "GRIDSPLINE_TENSION";
/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "GRIDSPLINE_LOG_LEVEL";

/// Interpolation defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolationConfig {
    /// Default interpolation method
    #[serde(default)]
    pub method: Method,

    /// Behaviour outside the node range, shared or per axis
    #[serde(default)]
    pub extrapolation: BoundarySpec,

    /// Axis periods (None = no periodic axes)
    #[serde(default)]
    pub period: Option<PeriodSpec>,

    /// Tension of the cardinal method
    #[serde(default)]
    pub tension: f64,
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Interpolation configuration
    #[serde(default)]
    pub interpolation: InterpolationConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let start = Instant::now();
        let source = path.map(|p| p.display().to_string());
        log_operation_start("load_config", source.as_deref());

        let result = Self::load_layers(path);
        if let Err(e) = &result {
            log_error(e, "loading configuration");
        }
        log_operation_end("load_config", start, result.is_ok());
        result
    }

    fn load_layers(path: Option<&Path>) -> Result<Self> {
        // Start with defaults
        let mut config = Config::default();

        // Load from JSON file if provided
        if let Some(path) = path {
            let json_config = Self::load_from_file(path)?;
            config.merge(json_config);
        }

        // Override with environment variables
        config.apply_overrides(|key| std::env::var(key).ok())?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        self.interpolation.method = other.interpolation.method;
        self.interpolation.extrapolation = other.interpolation.extrapolation;
        if other.interpolation.period.is_some() {
            self.interpolation.period = other.interpolation.period;
        }
        self.interpolation.tension = other.interpolation.tension;
        self.log_level = other.log_level;
    }

    /// Apply overrides looked up by variable name
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(method) = lookup(ENV_METHOD) {
            self.interpolation.method = method.parse()?;
        }

        if let Some(flag) = lookup(ENV_EXTRAPOLATE) {
            let extrapolate = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(GridSplineError::Config {
                        message: format!("Invalid value for {}: {}", ENV_EXTRAPOLATE, flag),
                    })
                }
            };
            self.interpolation.extrapolation = extrapolate.into();
        }

        if let Some(tension) = lookup(ENV_TENSION) {
            self.interpolation.tension =
                tension.trim().parse().map_err(|_| GridSplineError::Config {
                    message: format!("Invalid value for {}: {}", ENV_TENSION, tension),
                })?;
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate log level
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(GridSplineError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        // Validate tension
        if !(0.0..=1.0).contains(&self.interpolation.tension) {
            return Err(GridSplineError::Config {
                message: format!(
                    "Invalid tension: {}. Must lie in [0, 1]",
                    self.interpolation.tension
                ),
            });
        }

        // Validate periods
        self.options().validate().map_err(|e| GridSplineError::Config {
            message: e.to_string(),
        })?;

        Ok(())
    }

    /// Interpolation options described by this configuration
    pub fn options(&self) -> InterpOptions {
        let mut options =
            InterpOptions::new(self.interpolation.method).with_tension(self.interpolation.tension);
        options.extrapolation = self.interpolation.extrapolation.clone();
        options.period = self.interpolation.period.clone();
        options
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpolation: InterpolationConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            method: Method::default(),
            extrapolation: BoundarySpec::default(),
            period: None,
            tension: 0.0,
        }
    }
}

// Default value functions for serde
fn default_log_level() -> String {
    "info".to_string()
}
