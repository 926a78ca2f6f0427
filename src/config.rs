use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::seeker::LevelRules;

/// Standard audiometric frequencies (octave steps).
pub const STANDARD_FREQUENCIES: [u32; 6] = [250, 500, 1000, 2000, 4000, 8000];

/// Octave and inter-octave frequencies.
pub const EXTENDED_FREQUENCIES: [u32; 11] = [
    125, 250, 500, 750, 1000, 1500, 2000, 3000, 4000, 6000, 8000,
];

/// Key frequencies for the short screening run.
pub const QUICK_FREQUENCIES: [u32; 3] = [1000, 4000, 8000];

/// Errors raised while building or loading a test configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("frequency list is empty")]
    EmptyFrequencies,
    #[error("frequency must be a positive number of Hz")]
    ZeroFrequency,
    #[error("frequency {0} Hz is listed more than once")]
    DuplicateFrequency(u32),
    #[error("{0} must be finite")]
    NonFinite(&'static str),
    #[error("min_level {min} is above start_level {start}")]
    MinAboveStart { min: f32, start: f32 },
    #[error("start_level {start} is above max_level {max}")]
    StartAboveMax { start: f32, max: f32 },
    #[error("{0} must be greater than zero")]
    NonPositiveStep(&'static str),
    #[error("{0} is too small to change the level between min_level and max_level")]
    StepTooSmall(&'static str),
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Static parameters of one sweep. Immutable once a session owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    pub frequencies: Vec<u32>,
    pub start_level: f32,
    pub min_level: f32,
    pub max_level: f32,
    /// dB added after "not heard".
    pub step_up: f32,
    /// dB removed after "heard" while descending.
    pub step_down: f32,
    pub tone_duration_ms: u64,
    pub response_timeout_ms: u64,
}

impl TestConfig {
    pub fn standard() -> Self {
        let levels = LevelRules::default();
        Self {
            frequencies: STANDARD_FREQUENCIES.to_vec(),
            start_level: levels.start,
            min_level: levels.min,
            max_level: levels.max,
            step_up: levels.step_up,
            step_down: levels.step_down,
            tone_duration_ms: 1500,
            response_timeout_ms: 3000,
        }
    }

    /// Three key frequencies with shorter tones and a faster response window.
    pub fn quick() -> Self {
        Self {
            frequencies: QUICK_FREQUENCIES.to_vec(),
            tone_duration_ms: 1000,
            response_timeout_ms: 2500,
            ..Self::standard()
        }
    }

    pub fn detailed() -> Self {
        Self {
            frequencies: EXTENDED_FREQUENCIES.to_vec(),
            ..Self::standard()
        }
    }

    pub fn with_frequencies(mut self, frequencies: impl Into<Vec<u32>>) -> Self {
        self.frequencies = frequencies.into();
        self
    }

    pub fn with_levels(mut self, levels: LevelRules) -> Self {
        self.start_level = levels.start;
        self.min_level = levels.min;
        self.max_level = levels.max;
        self.step_up = levels.step_up;
        self.step_down = levels.step_down;
        self
    }

    pub fn level_rules(&self) -> LevelRules {
        LevelRules {
            start: self.start_level,
            min: self.min_level,
            max: self.max_level,
            step_up: self.step_up,
            step_down: self.step_down,
        }
    }

    pub fn tone_duration(&self) -> Duration {
        Duration::from_millis(self.tone_duration_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Reject configurations that could only fail mid-sweep.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frequencies.is_empty() {
            return Err(ConfigError::EmptyFrequencies);
        }
        let mut seen = BTreeSet::new();
        for &f in &self.frequencies {
            if f == 0 {
                return Err(ConfigError::ZeroFrequency);
            }
            if !seen.insert(f) {
                return Err(ConfigError::DuplicateFrequency(f));
            }
        }

        let named = [
            ("start_level", self.start_level),
            ("min_level", self.min_level),
            ("max_level", self.max_level),
            ("step_up", self.step_up),
            ("step_down", self.step_down),
        ];
        for (name, value) in named {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(name));
            }
        }
        if self.min_level > self.start_level {
            return Err(ConfigError::MinAboveStart {
                min: self.min_level,
                start: self.start_level,
            });
        }
        if self.start_level > self.max_level {
            return Err(ConfigError::StartAboveMax {
                start: self.start_level,
                max: self.max_level,
            });
        }
        if self.step_up <= 0.0 {
            return Err(ConfigError::NonPositiveStep("step_up"));
        }
        if self.step_down <= 0.0 {
            return Err(ConfigError::NonPositiveStep("step_down"));
        }
        // A step below one f32 ulp at the largest level is lost on addition
        // and the staircase never reaches the floor or ceiling.
        let magnitude = self.min_level.abs().max(self.max_level.abs()).max(1.0);
        for (name, step) in [("step_up", self.step_up), ("step_down", self.step_down)] {
            if step < f32::EPSILON * magnitude {
                return Err(ConfigError::StepTooSmall(name));
            }
        }
        if self.tone_duration_ms == 0 {
            return Err(ConfigError::ZeroDuration("tone_duration_ms"));
        }
        if self.response_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("response_timeout_ms"));
        }
        Ok(())
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TestMode {
    #[default]
    Full,
    Quick,
    Detailed,
}

impl TestMode {
    pub fn preset(self) -> TestConfig {
        match self {
            TestMode::Full => TestConfig::standard(),
            TestMode::Quick => TestConfig::quick(),
            TestMode::Detailed => TestConfig::detailed(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TestMode::Full => "Full Test",
            TestMode::Quick => "Quick Test",
            TestMode::Detailed => "Detailed Test",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSettings {
    #[serde(default)]
    pub mode: TestMode,
    /// Overrides the mode's frequency list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequencies: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone_duration_ms: Option<u64>,
    #[serde(
        default,
        alias = "response_duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub response_timeout_ms: Option<u64>,
    /// Kept last so it serializes as a `[test.levels]` sub-table.
    #[serde(default)]
    pub levels: LevelRules,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            mode: TestMode::default(),
            frequencies: None,
            tone_duration_ms: None,
            response_timeout_ms: None,
            levels: LevelRules::default(),
        }
    }
}

impl TestSettings {
    /// Mode preset with the file's overrides applied, validated.
    pub fn resolve(&self) -> Result<TestConfig, ConfigError> {
        let mut cfg = self.mode.preset().with_levels(self.levels);
        if let Some(freqs) = &self.frequencies {
            cfg.frequencies = freqs.clone();
        }
        if let Some(ms) = self.tone_duration_ms {
            cfg.tone_duration_ms = ms;
        }
        if let Some(ms) = self.response_timeout_ms {
            cfg.response_timeout_ms = ms;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset.
    #[serde(default = "LoggingConfig::default_filter")]
    pub filter: String,
}

impl LoggingConfig {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub test: TestSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Read `path`, or write the defaults there (commented out) and return them.
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match Self::from_toml_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        eprintln!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    eprintln!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                if let Err(err) = fs::write(path_obj, comment_out_values(&text)) {
                    eprintln!("Failed to write default config to {path}: {err}");
                }
            }
            Err(_) => eprintln!("Failed to serialize default config; continuing with defaults"),
        }
        default_cfg
    }
}

/// Keep table headers, comment out every key so the file documents defaults
/// without pinning them.
fn comment_out_values(text: &str) -> String {
    let mut commented = String::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            commented.push('\n');
        } else if trimmed.starts_with('[') && trimmed.ends_with(']') {
            commented.push_str(line);
            commented.push('\n');
        } else {
            commented.push_str("# ");
            commented.push_str(line);
            commented.push('\n');
        }
    }
    commented
}
