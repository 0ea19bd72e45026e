use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use archsketch_core::{AiSettings, ProviderKind};

/// Resolve the config directory (~/.archsketch/).
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".archsketch")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Read settings, falling back to defaults when the file is missing or unreadable.
pub fn read_settings(path: &Path) -> AiSettings {
    if !path.exists() {
        return AiSettings::default();
    }
    match fs::read_to_string(path).map(|s| serde_json::from_str::<AiSettings>(&s)) {
        Ok(Ok(settings)) => settings,
        Ok(Err(e)) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings file");
            AiSettings::default()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read settings file");
            AiSettings::default()
        }
    }
}

/// Write settings atomically (temp file + rename).
pub fn write_settings(path: &Path, settings: &AiSettings) -> anyhow::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let json = serde_json::to_string_pretty(settings)?;
    let tmp = dir.join(".settings.json.tmp");
    write_private(&tmp, json.as_bytes()).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

/// The file holds the API key in plain text, so it is readable by the owner only.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on create; a stale temp file keeps its old bits
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::write(path, contents)
}

/// Values given on the command line or through the environment.
#[derive(Clone, Default)]
pub struct Overrides {
    pub provider: Option<ProviderKind>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, mut settings: AiSettings) -> AiSettings {
        if let Some(provider) = self.provider {
            if provider != settings.provider {
                // Model names and endpoints don't carry over between providers.
                settings.model = None;
                settings.endpoint = None;
            }
            settings.provider = provider;
        }
        // Empty key means "keep existing"
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            settings.api_key = key.clone();
        }
        if let Some(model) = &self.model {
            settings.model = Some(model.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            settings.endpoint = Some(endpoint.clone());
        }
        if let Some(timeout) = self.timeout_secs {
            settings.timeout_secs = timeout;
        }
        settings
    }
}
