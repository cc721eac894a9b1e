use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationSettings {
    /// Navigate to each narrated span before highlighting it
    pub auto_navigate: bool,
    pub active_class: String,
    /// Seconds before the visible part finishes narrating at which to flip
    pub early_offset: f64,
    /// Items shorter than this never schedule a flip
    pub min_flip_duration: f64,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            auto_navigate: true,
            active_class: "media-overlay-active".to_string(),
            early_offset: 1.0,
            min_flip_duration: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSettings {
    pub size_per_loc: f64,
    pub size_per_time_unit: f64,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            size_per_loc: 1500.0,
            size_per_time_unit: 1600.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub context_length: usize,
    pub match_case: bool,
    pub match_diacritics: bool,
    pub match_whole_words: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            context_length: 50,
            match_case: false,
            match_diacritics: false,
            match_whole_words: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub history_limit: usize,
    pub narration: NarrationSettings,
    pub progress: ProgressSettings,
    pub search: SearchSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_limit: 100,
            narration: NarrationSettings::default(),
            progress: ProgressSettings::default(),
            search: SearchSettings::default(),
        }
    }
}
