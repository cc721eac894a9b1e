use crate::settings::Settings;
use eyre::Result;
use std::{
    fs,
    path::{Path, PathBuf},
};

const APP_DIR: &str = "folio";
const CONFIG_FILE: &str = "configuration.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    filepath: PathBuf,
}

impl Config {
    /// Load `configuration.json` from the app data prefix, writing the
    /// defaults on first run.
    pub fn new() -> Result<Self> {
        let filepath = get_app_data_prefix()?.join(CONFIG_FILE);
        let config = Self::load_from(filepath)?;
        if !config.filepath.exists() {
            config.save()?;
        }
        Ok(config)
    }

    /// Get the configuration file path
    pub fn filepath(&self) -> &PathBuf {
        &self.filepath
    }

    /// Directory holding the configuration and the state database.
    pub fn data_dir(&self) -> Option<&Path> {
        self.filepath.parent()
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<()> {
        let config_json = serde_json::json!({
            "Setting": self.settings,
        });
        let config_str = serde_json::to_string_pretty(&config_json)?;
        if let Some(parent) = self.filepath.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.filepath, config_str)?;
        Ok(())
    }

    /// Load configuration from a custom path. Missing or malformed files
    /// fall back to the defaults; missing keys keep their default values.
    pub fn load_from(filepath: PathBuf) -> Result<Self> {
        let mut settings = Settings::default();
        if filepath.exists() {
            let config_str = fs::read_to_string(&filepath)?;
            match serde_json::from_str::<serde_json::Value>(&config_str) {
                Ok(user_config) => {
                    if let Some(user_settings) = user_config.get("Setting") {
                        match serde_json::from_value(user_settings.clone()) {
                            Ok(parsed) => settings = parsed,
                            Err(err) => log::warn!(
                                "Ignoring invalid settings in {}: {}",
                                filepath.display(),
                                err
                            ),
                        }
                    }
                }
                Err(err) => log::warn!(
                    "Could not parse {}, using defaults: {}",
                    filepath.display(),
                    err
                ),
            }
        }
        Ok(Self { settings, filepath })
    }
}

pub fn get_app_data_prefix() -> Result<PathBuf> {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(config_home).join(APP_DIR));
    } else if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home.clone()).join(".config").join(APP_DIR);
        if path.exists() {
            return Ok(path);
        }
        return Ok(PathBuf::from(home).join(format!(".{}", APP_DIR)));
    } else if let Some(user_profile) = std::env::var_os("USERPROFILE") {
        return Ok(PathBuf::from(user_profile).join(format!(".{}", APP_DIR)));
    }

    Err(eyre::eyre!("Could not determine application data directory"))
}
