use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use gpui::*;
use gpui_component::{Theme, ThemeMode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snafu::{ResultExt, Snafu};
use vidchat_service::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_SERVICE_URL, ServiceConfig};
use vidchat_session::{DEFAULT_STEP_DELAY, SessionConfig};

pub const SETTINGS_DIRECTORY_NAME: &str = "vidchat";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
/// Environment variables with this prefix override the settings file.
pub const SETTINGS_ENV_PREFIX: &str = "VIDCHAT_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default = "default_service_url")]
    pub service_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    #[serde(default = "default_load_random_video_on_start")]
    pub load_random_video_on_start: bool,
    #[serde(
        default = "default_theme_mode",
        serialize_with = "serialize_theme_mode",
        deserialize_with = "deserialize_theme_mode"
    )]
    pub theme_mode: ThemeMode,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            request_timeout_secs: default_request_timeout_secs(),
            step_delay_ms: default_step_delay_ms(),
            load_random_video_on_start: default_load_random_video_on_start(),
            theme_mode: default_theme_mode(),
        }
    }
}

impl ClientSettings {
    pub fn normalized(mut self) -> Self {
        self.service_url = if self.service_url.trim().is_empty() {
            default_service_url()
        } else {
            self.service_url.trim().to_string()
        };

        // A zero timeout would fail every request before it is sent.
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout_secs();
        }

        self
    }

    pub fn to_service_config(&self) -> ServiceConfig {
        ServiceConfig::new(&self.service_url)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
    }

    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            step_delay: Duration::from_millis(self.step_delay_ms),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            fetch_initial_video: self.load_random_video_on_start,
        }
    }

    pub fn with_toggled_theme_mode(mut self) -> Self {
        self.theme_mode = if self.theme_mode.is_dark() {
            ThemeMode::Light
        } else {
            ThemeMode::Dark
        };
        self
    }

    pub fn apply_theme(&self, window: Option<&mut Window>, cx: &mut App) {
        Theme::change(self.theme_mode, window, cx);
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<ClientSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".vidchat"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn settings(&self) -> Arc<ClientSettings> {
        self.settings.load_full()
    }

    /// Switches the theme and saves it over the file layer only, so values that
    /// came from `VIDCHAT_*` variables never end up in the settings file.
    pub fn set_theme_mode(&self, theme_mode: ThemeMode) -> Result<(), SettingsError> {
        let file_settings = ClientSettings {
            theme_mode,
            ..Self::file_settings(&self.config_path)
        };
        self.persist(&file_settings)?;

        let effective = ClientSettings {
            theme_mode,
            ..self.settings().as_ref().clone()
        };
        self.settings.store(Arc::new(effective));
        Ok(())
    }

    fn file_layer(path: &Path) -> Figment {
        let figment = Figment::from(Serialized::defaults(ClientSettings::default()));
        if path.exists() {
            figment.merge(Json::file(path))
        } else {
            tracing::info!(path = ?path, "settings file not found, using defaults");
            figment
        }
    }

    fn file_settings(path: &Path) -> ClientSettings {
        Self::extract_or_default(Self::file_layer(path), path)
    }

    fn load_from_disk(path: &Path) -> ClientSettings {
        let figment = Self::file_layer(path).merge(Env::prefixed(SETTINGS_ENV_PREFIX));
        Self::extract_or_default(figment, path)
    }

    fn extract_or_default(figment: Figment, path: &Path) -> ClientSettings {
        match figment.extract::<ClientSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    path = ?path,
                    error = %error,
                    "failed to parse settings, using defaults"
                );
                ClientSettings::default()
            }
        }
    }

    fn persist(&self, settings: &ClientSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
            stage: "serialize-settings-json",
        })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-settings-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-settings-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!(path = ?self.config_path, "saved settings");
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_step_delay_ms() -> u64 {
    DEFAULT_STEP_DELAY.as_millis() as u64
}

fn default_load_random_video_on_start() -> bool {
    true
}

fn default_theme_mode() -> ThemeMode {
    ThemeMode::Light
}

fn serialize_theme_mode<S>(value: &ThemeMode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.name())
}

fn deserialize_theme_mode<'de, D>(deserializer: D) -> Result<ThemeMode, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(parse_theme_mode(&value))
}

fn parse_theme_mode(value: &str) -> ThemeMode {
    if value.trim().eq_ignore_ascii_case("dark") {
        ThemeMode::Dark
    } else {
        ThemeMode::Light
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("vidchat-settings-{name}-{}", std::process::id()))
            .join(SETTINGS_FILE_NAME)
    }

    #[::core::prelude::v1::test]
    fn normalization_restores_blank_url_and_zero_timeout() {
        let settings = ClientSettings {
            service_url: "   ".to_string(),
            request_timeout_secs: 0,
            ..ClientSettings::default()
        }
        .normalized();

        assert_eq!(settings.service_url, DEFAULT_SERVICE_URL);
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[::core::prelude::v1::test]
    fn settings_map_to_service_and_session_configs() {
        let settings = ClientSettings {
            service_url: " http://10.0.0.5:9000/api ".to_string(),
            request_timeout_secs: 12,
            step_delay_ms: 250,
            load_random_video_on_start: false,
            ..ClientSettings::default()
        }
        .normalized();

        let service_config = settings.to_service_config();
        assert_eq!(service_config.base_url, "http://10.0.0.5:9000/api");
        assert_eq!(service_config.request_timeout, Duration::from_secs(12));

        let session_config = settings.to_session_config();
        assert_eq!(session_config.step_delay, Duration::from_millis(250));
        assert_eq!(session_config.request_timeout, Duration::from_secs(12));
        assert!(!session_config.fetch_initial_video);
    }

    #[::core::prelude::v1::test]
    fn default_step_delay_matches_session_default() {
        let settings = ClientSettings::default();
        assert_eq!(settings.to_session_config().step_delay, DEFAULT_STEP_DELAY);
        assert!(settings.to_session_config().fetch_initial_video);
    }

    #[::core::prelude::v1::test]
    fn theme_change_keeps_file_values_and_reloads() {
        let path = scratch_path("roundtrip");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("scratch dir");
        }
        std::fs::write(
            &path,
            r#"{ "service_url": "http://example.test:8000", "step_delay_ms": 250 }"#,
        )
        .expect("seed settings file");
        let store = SettingsStore::new(path.clone());

        let toggled = store.settings().as_ref().clone().with_toggled_theme_mode();
        store
            .set_theme_mode(toggled.theme_mode)
            .expect("theme mode persists");

        let on_disk = SettingsStore::file_settings(&path);
        assert_eq!(on_disk.service_url, "http://example.test:8000");
        assert_eq!(on_disk.step_delay_ms, 250);
        assert!(on_disk.theme_mode.is_dark());
        assert!(!path.with_extension("json.tmp").exists());

        if let Some(parent) = path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[::core::prelude::v1::test]
    fn theme_toggle_saves_only_the_file_layer() {
        let path = scratch_path("theme-only");
        let store = SettingsStore::new(path.clone());
        // Stands in for a service URL supplied through VIDCHAT_SERVICE_URL.
        store.settings.store(Arc::new(ClientSettings {
            service_url: "http://override.test:9000".to_string(),
            ..ClientSettings::default()
        }));

        store
            .set_theme_mode(ThemeMode::Dark)
            .expect("theme mode persists");

        assert_eq!(store.settings().service_url, "http://override.test:9000");
        assert!(store.settings().theme_mode.is_dark());

        let on_disk = SettingsStore::file_settings(&path);
        assert_eq!(on_disk.service_url, DEFAULT_SERVICE_URL);
        assert!(on_disk.theme_mode.is_dark());

        if let Some(parent) = path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[::core::prelude::v1::test]
    fn unknown_theme_mode_falls_back_to_light() {
        assert!(parse_theme_mode(" DARK ").is_dark());
        assert!(!parse_theme_mode("sepia").is_dark());
    }
}
