use formats::PlaybackConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl Speed {
    pub fn delay_ms(self, config: &PlaybackConfig) -> f64 {
        match self {
            Speed::Slow => config.slow_ms,
            Speed::Normal => config.normal_ms,
            Speed::Fast => config.fast_ms,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Speed::Slow => "slow",
            Speed::Normal => "normal",
            Speed::Fast => "fast",
        }
    }
}

impl std::fmt::Display for Speed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Speed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slow" => Ok(Speed::Slow),
            "normal" => Ok(Speed::Normal),
            "fast" => Ok(Speed::Fast),
            other => Err(format!("unknown speed '{other}' (slow, normal, fast)")),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EngineState {
    Idle,
    /// A single confirmed hop whose handler has not finished yet.
    Navigating,
    Sequential,
    SequentialPaused,
}

/// Read-only autoplay progress for the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Index of the last path element visited, if any.
    pub current_index: Option<usize>,
    pub total_steps: usize,
    pub active: bool,
    pub paused: bool,
    pub speed: Speed,
}
