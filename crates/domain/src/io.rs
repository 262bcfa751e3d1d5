use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{error::DomainError, settings::PracticeSettings};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Yaml,
}

impl SettingsFormat {
    /// Picks the format from the file extension; anything unknown is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                SettingsFormat::Yaml
            }
            _ => SettingsFormat::Json,
        }
    }
}

pub fn parse_settings(text: &str, format: SettingsFormat) -> Result<PracticeSettings, DomainError> {
    let settings: PracticeSettings = match format {
        SettingsFormat::Json => serde_json::from_str(text)
            .map_err(|err| DomainError::Serialization(err.to_string()))?,
        SettingsFormat::Yaml => serde_yaml::from_str(text)
            .map_err(|err| DomainError::Serialization(err.to_string()))?,
    };
    if let Err(err) = settings.validate() {
        warn!(%err, "rejecting practice settings");
        return Err(err);
    }
    Ok(settings)
}

pub fn render_settings(
    settings: &PracticeSettings,
    format: SettingsFormat,
) -> Result<String, DomainError> {
    match format {
        SettingsFormat::Json => serde_json::to_string_pretty(settings)
            .map_err(|err| DomainError::Serialization(err.to_string())),
        SettingsFormat::Yaml => serde_yaml::to_string(settings)
            .map_err(|err| DomainError::Serialization(err.to_string())),
    }
}

pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<PracticeSettings, DomainError> {
    let path = path.as_ref();
    debug!(?path, "loading practice settings");
    let text = fs::read_to_string(path).map_err(|err| DomainError::io(path, err))?;
    parse_settings(&text, SettingsFormat::from_path(path))
}

pub fn save_settings<P: AsRef<Path>>(
    settings: &PracticeSettings,
    path: P,
) -> Result<(), DomainError> {
    let path = path.as_ref();
    let text = render_settings(settings, SettingsFormat::from_path(path))?;
    fs::write(path, text).map_err(|err| DomainError::io(path, err))?;
    debug!(?path, "saved practice settings");
    Ok(())
}
