use std::path::PathBuf;

use homeguard_core::{AlertPolicy, RecognitionSettings, DEFAULT_MATCH_THRESHOLD};

use crate::engine::EngineSettings;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Euclidean distance below which a face counts as recognized.
    pub match_threshold: f32,
    /// Alert even when the face belongs to an enrolled identity.
    pub alert_on_recognized: bool,
    /// Whether alerts are handed to the notifier at all.
    pub notifications_enabled: bool,
    /// Serve on the session bus instead of the system bus.
    pub session_bus: bool,
}

impl Config {
    /// Load configuration from `HOMEGUARD_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("homeguard");

        let db_path = std::env::var("HOMEGUARD_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("homeguard.db"));

        let match_threshold = match env_f32("HOMEGUARD_MATCH_THRESHOLD", DEFAULT_MATCH_THRESHOLD) {
            t if t > 0.0 && t.is_finite() => t,
            t => {
                tracing::warn!(value = t, "invalid HOMEGUARD_MATCH_THRESHOLD; using default");
                DEFAULT_MATCH_THRESHOLD
            }
        };

        Self {
            db_path,
            match_threshold,
            alert_on_recognized: env_flag("HOMEGUARD_ALERT_ON_RECOGNIZED", false),
            notifications_enabled: env_flag("HOMEGUARD_NOTIFICATIONS", true),
            session_bus: env_flag("HOMEGUARD_SESSION_BUS", false),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            recognition: RecognitionSettings {
                match_threshold: self.match_threshold,
                policy: AlertPolicy {
                    alert_on_recognized: self.alert_on_recognized,
                },
            },
            notifications_enabled: self.notifications_enabled,
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key).map(|v| v != "0").unwrap_or(default)
}
